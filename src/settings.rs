use std::path::PathBuf;

use crate::errors::AppError;
use crate::locale::Locale;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_INVITE_REDIRECT: &str = "http://localhost:4200/verify";

/// What to do when a facility already has a role with the same normalized name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleNamePolicy {
    #[default]
    Reject,
    Allow,
}

/// Whether removing an employee also removes their identity account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmployeeDeleteMode {
    /// Membership and, when it was the last one, the identity.
    #[default]
    Hard,
    /// Membership only; the identity stays authenticatable.
    Soft,
}

#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub locale: Locale,
    pub role_name_policy: RoleNamePolicy,
    pub employee_delete_mode: EmployeeDeleteMode,
    pub invite_redirect_url: String,
    pub tls: Option<TlsPaths>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            locale: Locale::default(),
            role_name_policy: RoleNamePolicy::default(),
            employee_delete_mode: EmployeeDeleteMode::default(),
            invite_redirect_url: DEFAULT_INVITE_REDIRECT.to_string(),
            tls: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut settings = Settings::default();

        if let Some(port) = lookup("APP_PORT") {
            settings.port = port
                .parse()
                .map_err(|_| AppError::configuration("APP_PORT must be a valid port number"))?;
        }

        if let Some(locale) = lookup("APP_LOCALE") {
            settings.locale = Locale::parse(&locale)
                .ok_or_else(|| AppError::configuration("APP_LOCALE must be 'en' or 'es'"))?;
        }

        if let Some(policy) = lookup("ROLE_NAME_POLICY") {
            settings.role_name_policy = match policy.to_lowercase().as_str() {
                "reject" => RoleNamePolicy::Reject,
                "allow" => RoleNamePolicy::Allow,
                _ => return Err(AppError::configuration("ROLE_NAME_POLICY must be 'reject' or 'allow'")),
            };
        }

        if let Some(mode) = lookup("EMPLOYEE_DELETE_MODE") {
            settings.employee_delete_mode = match mode.to_lowercase().as_str() {
                "hard" => EmployeeDeleteMode::Hard,
                "soft" => EmployeeDeleteMode::Soft,
                _ => return Err(AppError::configuration("EMPLOYEE_DELETE_MODE must be 'hard' or 'soft'")),
            };
        }

        if let Some(url) = lookup("INVITE_REDIRECT_URL") {
            settings.invite_redirect_url = url;
        }

        settings.tls = match (lookup("TLS_CERT_PATH"), lookup("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => {
                return Err(AppError::configuration(
                    "TLS_CERT_PATH and TLS_KEY_PATH must be set together",
                ))
            }
        };

        Ok(settings)
    }
}
