use std::{collections::HashMap, fs};

use anyhow::{ensure, Context, Result};
use url::Url;

#[derive(Debug)]
pub struct Settings {
    pub server_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8443".into(),
        }
    }
}

/// Defaults, overridden by studyhub.toml, overridden by environment.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("studyhub.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("server_url") {
                settings.server_url = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = std::env::var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    settings
}

pub fn validate_server_url(raw: &str) -> Result<()> {
    let url = Url::parse(raw).with_context(|| format!("invalid server url '{raw}'"))?;
    ensure!(
        matches!(url.scheme(), "http" | "https"),
        "server url must be http or https, got '{}'",
        url.scheme()
    );
    Ok(())
}
