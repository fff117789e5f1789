//! Configuration management

use crate::error::{ErrorContext, MockOrbitError, MockOrbitResult};
use crate::logging::LoggingConfig;
use crate::types::Role;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable pointing at an alternative config file
pub const CONFIG_ENV_VAR: &str = "MOCKORBIT_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MockOrbitConfig {
    pub storage: StorageConfig,
    pub routes: RouteConfig,
    pub logging: LoggingConfig,
}

/// Where and under which keys the session record is persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the session file; a leading `~` expands to the home directory
    pub data_dir: String,
    pub file_name: String,
    pub token_key: String,
    pub identity_key: String,
    pub active_role_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.mockorbit".to_string(),
            file_name: "session.json".to_string(),
            token_key: "authToken".to_string(),
            identity_key: "authUser".to_string(),
            active_role_key: "activeRole".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn resolved_data_dir(&self) -> PathBuf {
        match self.data_dir.strip_prefix('~') {
            Some(rest) => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(rest.trim_start_matches(['/', '\\'])),
            None => PathBuf::from(&self.data_dir),
        }
    }

    pub fn session_file(&self) -> PathBuf {
        self.resolved_data_dir().join(&self.file_name)
    }
}

/// Application paths the route guard reasons about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Public page reachable in any state
    pub landing_path: String,
    /// Login and registration live under this prefix
    pub auth_prefix: String,
    /// Where unauthenticated visitors are sent
    pub login_path: String,
    /// Role dashboards live at `{dashboard_root}/{role}`
    pub dashboard_root: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            landing_path: "/".to_string(),
            auth_prefix: "/auth".to_string(),
            login_path: "/auth/login".to_string(),
            dashboard_root: "/dashboard".to_string(),
        }
    }
}

impl RouteConfig {
    pub fn dashboard_for(&self, role: Role) -> String {
        format!("{}/{}", self.dashboard_root, role)
    }

    pub fn validate(&self) -> MockOrbitResult<()> {
        for (field, value) in [
            ("routes.landing_path", &self.landing_path),
            ("routes.auth_prefix", &self.auth_prefix),
            ("routes.login_path", &self.login_path),
            ("routes.dashboard_root", &self.dashboard_root),
        ] {
            if !value.starts_with('/') {
                return Err(invalid(field, format!("{} must be an absolute path", field)));
            }
        }

        for (field, value) in [
            ("routes.auth_prefix", &self.auth_prefix),
            ("routes.dashboard_root", &self.dashboard_root),
        ] {
            if value == "/" || value.ends_with('/') {
                return Err(invalid(
                    field,
                    format!("{} must name a path segment without a trailing slash", field),
                ));
            }
        }

        // The login page has to be an auth page, otherwise an anonymous visitor
        // is redirected to a page that redirects again.
        if !is_within(&self.login_path, &self.auth_prefix) {
            return Err(invalid(
                "routes.login_path",
                format!(
                    "login path {} must lie under the auth prefix {}",
                    self.login_path, self.auth_prefix
                ),
            ));
        }

        if is_within(&self.dashboard_root, &self.auth_prefix)
            || self.dashboard_root == self.landing_path
        {
            return Err(invalid(
                "routes.dashboard_root",
                "dashboard root must not overlap the auth prefix or landing page",
            ));
        }

        // A signed-in user is sent from auth pages to their dashboard, so no dashboard
        // may itself be an auth page.
        if let Some(role) = Role::ALL
            .into_iter()
            .find(|role| is_within(&self.dashboard_for(*role), &self.auth_prefix))
        {
            return Err(invalid(
                "routes.auth_prefix",
                format!(
                    "auth prefix {} must not contain the {} dashboard",
                    self.auth_prefix, role
                ),
            ));
        }

        Ok(())
    }
}

/// `path` equals `prefix` or sits below it as a whole segment
pub fn is_within(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn invalid(field: &str, message: impl Into<String>) -> MockOrbitError {
    MockOrbitError::Validation {
        message: message.into(),
        field: Some(field.to_string()),
        context: ErrorContext::new("config")
            .during("validate")
            .hint("Fix the value in your configuration file"),
    }
}

impl MockOrbitConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> MockOrbitResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| MockOrbitError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .during("read_file")
                .at_path(path)
                .hint("Run 'mockorbit config --init' to create a default config"),
        })?;

        toml::from_str(&content).map_err(|e| MockOrbitError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .during("parse_toml")
                .at_path(path)
                .hint("Check TOML syntax in config file"),
        })
    }

    /// Save configuration to a file, creating the parent directory if needed
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> MockOrbitResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| MockOrbitError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").during("serialize_toml"),
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content).map_err(|e| MockOrbitError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .during("write_file")
                .at_path(path)
                .hint("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Default config location: `<config dir>/mockorbit/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mockorbit").join("config.toml"))
    }

    /// Resolve and load configuration.
    ///
    /// An explicit path must exist. Otherwise `MOCKORBIT_CONFIG`, then the default
    /// location are tried, falling back to built-in defaults.
    pub fn load(explicit: Option<&Path>) -> MockOrbitResult<Self> {
        let config = if let Some(path) = explicit {
            Self::from_file(path)?
        } else {
            let candidate = std::env::var_os(CONFIG_ENV_VAR)
                .map(PathBuf::from)
                .or_else(Self::default_path);

            match candidate {
                Some(path) if path.exists() => {
                    tracing::debug!(path = %path.display(), "Loading configuration");
                    Self::from_file(path)?
                }
                _ => Self::default(),
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> MockOrbitResult<()> {
        self.routes.validate()?;

        let keys = [
            ("storage.token_key", &self.storage.token_key),
            ("storage.identity_key", &self.storage.identity_key),
            ("storage.active_role_key", &self.storage.active_role_key),
        ];
        for (field, key) in keys {
            if key.trim().is_empty() {
                return Err(invalid(field, format!("{} must not be empty", field)));
            }
        }
        if keys[0].1 == keys[1].1 || keys[0].1 == keys[2].1 || keys[1].1 == keys[2].1 {
            return Err(invalid(
                "storage",
                "token, identity and active role keys must be distinct",
            ));
        }

        if self.storage.file_name.trim().is_empty() {
            return Err(invalid("storage.file_name", "file name must not be empty"));
        }

        Ok(())
    }
}
