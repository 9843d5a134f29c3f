use std::{collections::HashMap, fs, path::PathBuf};

use anyhow::Context;
use url::Url;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_url: String,
    pub receipt_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000/api".into(),
            receipt_dir: PathBuf::from("."),
        }
    }
}

/// Defaults, overridden by an optional `teller.toml`, overridden by
/// environment variables. CLI flags win over all of these.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("teller.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("server_url") {
                settings.server_url = v.clone();
            }
            if let Some(v) = file_cfg.get("receipt_dir") {
                settings.receipt_dir = PathBuf::from(v);
            }
        }
    }

    if let Ok(v) = std::env::var("ACUPAY_SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = std::env::var("ACUPAY_RECEIPT_DIR") {
        settings.receipt_dir = PathBuf::from(v);
    }

    settings.server_url = normalize_server_url(&settings.server_url);
    settings
}

pub fn normalize_server_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Settings::default().server_url;
    }
    trimmed.to_owned()
}

pub fn validate_server_url(raw: &str) -> anyhow::Result<()> {
    let parsed = Url::parse(raw).with_context(|| format!("invalid server url '{raw}'"))?;
    anyhow::ensure!(
        matches!(parsed.scheme(), "http" | "https"),
        "server url must use http or https, got '{}'",
        parsed.scheme()
    );
    Ok(())
}
