use std::collections::HashMap;

use shared::domain::{Course, UserId};

/// Result of a cache read. `Stale` still carries the last known list so the
/// sidebar can keep rendering it while a refresh is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Fresh(Vec<Course>),
    Stale(Vec<Course>),
    Miss,
}

#[derive(Debug)]
struct CachedCourseList {
    courses: Vec<Course>,
    fresh: bool,
}

/// Per-user cache of the last fetched course list. Entries are namespaced
/// by user id; invalidating one user never touches another. The map lives
/// inside the session client and is cleared on logout.
#[derive(Debug, Default)]
pub struct CourseListCache {
    entries: HashMap<UserId, CachedCourseList>,
}

impl CourseListCache {
    pub fn get(&self, user_id: &UserId) -> CacheLookup {
        match self.entries.get(user_id) {
            Some(entry) if entry.fresh => CacheLookup::Fresh(entry.courses.clone()),
            Some(entry) => CacheLookup::Stale(entry.courses.clone()),
            None => CacheLookup::Miss,
        }
    }

    pub fn put(&mut self, user_id: UserId, courses: Vec<Course>) {
        self.entries.insert(
            user_id,
            CachedCourseList {
                courses,
                fresh: true,
            },
        );
    }

    /// Marks the entry stale without deleting it. A missing entry is left
    /// missing; there is nothing to mark.
    pub fn invalidate(&mut self, user_id: &UserId) {
        if let Some(entry) = self.entries.get_mut(user_id) {
            entry.fresh = false;
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
