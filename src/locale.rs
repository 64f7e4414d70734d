use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

static LOCALE: OnceLock<Locale> = OnceLock::new();

/// Language used for user-visible messages and catalog labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "en" => Some(Locale::En),
            "es" => Some(Locale::Es),
            _ => None,
        }
    }

    /// Makes this the process-wide locale. Only the first call wins.
    pub fn install(self) {
        let _ = LOCALE.set(self);
    }

    /// Process-wide locale; falls back to `APP_LOCALE` when none was installed.
    pub fn current() -> Self {
        *LOCALE.get_or_init(|| {
            std::env::var("APP_LOCALE")
                .ok()
                .and_then(|value| Locale::parse(&value))
                .unwrap_or_default()
        })
    }
}
