//! Major catalog backing the signup form's searchable dropdown.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Major {
    pub slug: &'static str,
    pub label: &'static str,
}

pub const MAJORS: &[Major] = &[
    Major { slug: "aerospace-studies", label: "Aerospace Studies" },
    Major { slug: "african-studies", label: "African, African American, and Diaspora Studies" },
    Major { slug: "american-studies", label: "American Studies" },
    Major { slug: "anthropology", label: "Anthropology" },
    Major { slug: "applied-sciences", label: "Applied Sciences" },
    Major { slug: "archaeology", label: "Archaeology" },
    Major { slug: "art-history", label: "Art History" },
    Major { slug: "asian-studies", label: "Asian Studies" },
    Major { slug: "astronomy", label: "Astronomy" },
    Major { slug: "biology", label: "Biology" },
    Major { slug: "biomedical-engineering", label: "Biomedical Engineering" },
    Major { slug: "biostatistics", label: "Biostatistics" },
    Major { slug: "business-administration", label: "Business Administration" },
    Major { slug: "chemistry", label: "Chemistry" },
    Major { slug: "classics", label: "Classics" },
    Major { slug: "clinical-lab-science", label: "Clinical Laboratory Science" },
    Major { slug: "communication", label: "Communication Studies" },
    Major { slug: "comparative-literature", label: "Comparative Literature" },
    Major { slug: "computer-science", label: "Computer Science" },
    Major { slug: "european-studies", label: "Contemporary European Studies" },
    Major { slug: "data-science", label: "Data Science" },
    Major { slug: "dental-hygiene", label: "Dental Hygiene" },
    Major { slug: "dramatic-art", label: "Dramatic Art" },
    Major { slug: "earth-marine-sciences", label: "Earth and Marine Sciences" },
    Major { slug: "economics", label: "Economics" },
    Major { slug: "english", label: "English and Comparative Literature" },
    Major { slug: "environmental-health", label: "Environmental Health Sciences" },
    Major { slug: "environmental-science", label: "Environmental Science" },
    Major { slug: "environmental-studies", label: "Environmental Studies" },
    Major { slug: "exercise-sport-science", label: "Exercise and Sport Science" },
    Major { slug: "geography", label: "Geography" },
    Major { slug: "geological-sciences", label: "Geological Sciences" },
    Major { slug: "germanic-slavic", label: "Germanic and Slavic Languages and Literatures" },
    Major { slug: "global-studies", label: "Global Studies" },
    Major { slug: "health-policy", label: "Health Policy and Management" },
    Major { slug: "history", label: "History" },
    Major { slug: "human-org-dev", label: "Human and Organizational Leadership Development" },
    Major { slug: "human-development", label: "Human Development and Family Science" },
    Major { slug: "information-science", label: "Information Science" },
    Major { slug: "interdisciplinary-studies", label: "Interdisciplinary Studies" },
    Major { slug: "latin-american-studies", label: "Latin American Studies" },
    Major { slug: "linguistics", label: "Linguistics" },
    Major { slug: "management-society", label: "Management and Society" },
    Major { slug: "mathematics", label: "Mathematics" },
    Major { slug: "media-journalism", label: "Media and Journalism" },
    Major { slug: "medical-anthropology", label: "Medical Anthropology" },
    Major { slug: "music", label: "Music" },
    Major { slug: "neurodiagnostics", label: "Neurodiagnostics and Sleep Science" },
    Major { slug: "neuroscience", label: "Neuroscience" },
    Major { slug: "nursing", label: "Nursing" },
    Major { slug: "nutrition", label: "Nutrition" },
    Major { slug: "peace-war-defense", label: "Peace, War, and Defense" },
    Major { slug: "philosophy", label: "Philosophy" },
    Major { slug: "physics", label: "Physics" },
    Major { slug: "political-science", label: "Political Science" },
    Major { slug: "psychology", label: "Psychology" },
    Major { slug: "public-policy", label: "Public Policy" },
    Major { slug: "radiologic-science", label: "Radiologic Science" },
    Major { slug: "religious-studies", label: "Religious Studies" },
    Major { slug: "romance-languages", label: "Romance Languages" },
    Major { slug: "sociology", label: "Sociology" },
    Major { slug: "statistics", label: "Statistics and Analytics" },
    Major { slug: "studio-art", label: "Studio Art" },
    Major { slug: "womens-gender-studies", label: "Women's and Gender Studies" },
    Major { slug: "undeclared", label: "Undeclared" },
];

/// Case-insensitive substring match on the display label. An empty query
/// returns the whole catalog.
pub fn search_majors(query: &str) -> Vec<Major> {
    let needle = query.to_lowercase();
    MAJORS
        .iter()
        .copied()
        .filter(|major| major.label.to_lowercase().contains(&needle))
        .collect()
}

pub fn is_known_major(slug: &str) -> bool {
    MAJORS.iter().any(|major| major.slug == slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_returns_full_catalog() {
        assert_eq!(search_majors("").len(), MAJORS.len());
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let hits = search_majors("comput");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].slug, "computer-science");

        let hits = search_majors("STUDIES");
        assert!(hits.len() > 5);
        assert!(hits.iter().all(|m| m.label.to_lowercase().contains("studies")));
    }

    #[test]
    fn no_match_yields_empty() {
        assert!(search_majors("underwater basket weaving").is_empty());
    }

    #[test]
    fn slug_lookup() {
        assert!(is_known_major("undeclared"));
        assert!(!is_known_major("basket-weaving"));
    }
}
