//! Client configuration.
//!
//! Settings are built once (usually through [`Settings::from_env`]) and moved
//! into the `RestClient`, which only ever reads them.
//!
//! ## Environment Variables
//! - `PAYREST_SANDBOX`: talk to the sandbox host (true/false)
//! - `PAYREST_SANDBOX_HOST`: sandbox base URL
//! - `PAYREST_PRODUCTION_HOST`: production base URL
//! - `PAYREST_DEFAULT_POSTFIX`: path segment placed between host and endpoint
//! - `PAYREST_REST_TIMEOUT`: agent-wide timeout in seconds
//! - `PAYREST_PROXY`: proxy URI
//! - `PAYREST_DEBUG`: log requests and failures (true/false)
//! - `PAYREST_USE_MOCK_RESPONSE`: replay fixtures instead of calling out
//! - `PAYREST_SAVE_MOCK_RESPONSE`: record live exchanges as fixtures
//! - `PAYREST_MOCK_RESPONSES_DIR`: fixture directory
//! - `PAYREST_LOG_FILE_PATH`: directory for daily debug log files
//!
//! Unset variables keep their [`Settings::default`] value.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ClientError;

const ENV_PREFIX: &str = "PAYREST_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub sandbox: bool,
    pub sandbox_host: String,
    pub production_host: String,
    pub default_postfix: String,
    pub rest_timeout: Duration,
    pub proxy: Option<String>,
    pub debug: bool,
    pub use_mock_response: bool,
    pub save_mock_response: bool,
    pub mock_responses_dir: PathBuf,
    /// Directory receiving `YYYY-MM-DD.log` files; see `logging`.
    pub log_file_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sandbox: true,
            sandbox_host: "https://sandbox.example.com/".to_string(),
            production_host: "https://api.example.com/".to_string(),
            default_postfix: "oauth/rest".to_string(),
            rest_timeout: Duration::from_secs(15),
            proxy: None,
            debug: false,
            use_mock_response: false,
            save_mock_response: false,
            mock_responses_dir: PathBuf::from("mock_responses"),
            log_file_path: None,
        }
    }
}

/// How a call is satisfied. Evaluated once per call from the mock flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockMode {
    /// Plain live call.
    Live,
    /// Live call, then persist the exchange as a fixture.
    Record,
    /// Answer from fixtures without touching the network.
    Replay,
}

impl Settings {
    /// Load settings from `PAYREST_*` environment variables.
    ///
    /// # Errors
    /// Returns `ClientError::Config` when a variable is set to a value that
    /// does not parse (e.g. a non-numeric timeout).
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Settings::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(format!("{ENV_PREFIX}{name}").as_str()).filter(|v| !v.is_empty());
        let defaults = Settings::default();

        let rest_timeout = match var("REST_TIMEOUT") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ClientError::Config(format!("Invalid rest timeout {raw:?}: {e}")))?,
            None => defaults.rest_timeout,
        };

        Ok(Settings {
            sandbox: env_bool(var("SANDBOX"), "SANDBOX", defaults.sandbox)?,
            sandbox_host: var("SANDBOX_HOST").unwrap_or(defaults.sandbox_host),
            production_host: var("PRODUCTION_HOST").unwrap_or(defaults.production_host),
            default_postfix: var("DEFAULT_POSTFIX").unwrap_or(defaults.default_postfix),
            rest_timeout,
            proxy: var("PROXY").or(defaults.proxy),
            debug: env_bool(var("DEBUG"), "DEBUG", defaults.debug)?,
            use_mock_response: env_bool(
                var("USE_MOCK_RESPONSE"),
                "USE_MOCK_RESPONSE",
                defaults.use_mock_response,
            )?,
            save_mock_response: env_bool(
                var("SAVE_MOCK_RESPONSE"),
                "SAVE_MOCK_RESPONSE",
                defaults.save_mock_response,
            )?,
            mock_responses_dir: var("MOCK_RESPONSES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.mock_responses_dir),
            log_file_path: var("LOG_FILE_PATH").map(PathBuf::from).or(defaults.log_file_path),
        })
    }

    /// Base host for the current environment.
    pub fn host(&self) -> &str {
        if self.sandbox {
            &self.sandbox_host
        } else {
            &self.production_host
        }
    }

    pub fn mock_mode(&self) -> MockMode {
        if self.save_mock_response {
            MockMode::Record
        } else if self.use_mock_response {
            MockMode::Replay
        } else {
            MockMode::Live
        }
    }
}

fn env_bool(value: Option<String>, name: &str, default: bool) -> Result<bool, ClientError> {
    let Some(raw) = value else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ClientError::Config(format!(
            "Invalid boolean for {ENV_PREFIX}{name}: {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Settings, ClientError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(load(&[]).unwrap(), Settings::default());
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = load(&[
            ("PAYREST_SANDBOX", "false"),
            ("PAYREST_PRODUCTION_HOST", "https://pay.internal/"),
            ("PAYREST_REST_TIMEOUT", "30"),
            ("PAYREST_PROXY", "http://proxy:8080"),
            ("PAYREST_SAVE_MOCK_RESPONSE", "1"),
            ("PAYREST_MOCK_RESPONSES_DIR", "/tmp/fixtures"),
            ("PAYREST_LOG_FILE_PATH", "/var/log/payrest"),
        ])
        .unwrap();
        assert!(!settings.sandbox);
        assert_eq!(settings.host(), "https://pay.internal/");
        assert_eq!(settings.rest_timeout, Duration::from_secs(30));
        assert_eq!(settings.proxy.as_deref(), Some("http://proxy:8080"));
        assert!(settings.save_mock_response);
        assert_eq!(settings.mock_responses_dir, PathBuf::from("/tmp/fixtures"));
        assert_eq!(settings.log_file_path, Some(PathBuf::from("/var/log/payrest")));
    }

    #[test]
    fn malformed_values_are_config_errors() {
        let err = load(&[("PAYREST_REST_TIMEOUT", "soon")]).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));

        let err = load(&[("PAYREST_DEBUG", "maybe")]).unwrap_err();
        assert!(err.to_string().contains("PAYREST_DEBUG"));
    }

    #[test]
    fn host_follows_sandbox_flag() {
        let mut settings = Settings::default();
        assert_eq!(settings.host(), "https://sandbox.example.com/");
        settings.sandbox = false;
        assert_eq!(settings.host(), "https://api.example.com/");
    }

    #[test]
    fn mock_mode_selection() {
        let mut settings = Settings::default();
        assert_eq!(settings.mock_mode(), MockMode::Live);

        settings.use_mock_response = true;
        assert_eq!(settings.mock_mode(), MockMode::Replay);

        // Recording wins regardless of the replay flag.
        settings.save_mock_response = true;
        assert_eq!(settings.mock_mode(), MockMode::Record);

        settings.use_mock_response = false;
        assert_eq!(settings.mock_mode(), MockMode::Record);
    }
}
