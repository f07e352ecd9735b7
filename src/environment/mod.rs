//! # Environments & Configuration
//!
//! Resolves the API settings a run executes against. Settings come from
//! process environment variables (with `.env` support) on top of the dev
//! defaults; a named environment (dev / staging / prod) contributes
//! variables that are interpolated into `{{placeholder}}` slots in the
//! base URL and endpoint.

use std::collections::HashMap;
use std::env;

use crate::error::IntakeError;

/// A single variable entry within an environment.
#[derive(Debug, Clone)]
pub struct Variable {
    pub key: String,
    pub value: String,
    pub enabled: bool,
}

impl Variable {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }
}

/// A named set of variables (dev / staging / prod).
#[derive(Debug, Clone)]
pub struct Environment {
    pub name: String,
    pub variables: Vec<Variable>,
}

impl Environment {
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|v| v.enabled && v.key == key)
            .map(|v| v.value.as_str())
    }
}

/// Holds all known environments and resolves their variables.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentManager {
    pub globals: Vec<Variable>,
    pub environments: Vec<Environment>,
}

impl EnvironmentManager {
    /// The environments the intake service is deployed to.
    pub fn builtin() -> Self {
        let stage = |name: &str, host: &str| Environment {
            name: name.to_string(),
            variables: vec![
                Variable::new("apim_host", host),
                Variable::new("base_url", format!("https://{host}")),
            ],
        };

        Self {
            globals: vec![Variable::new(
                "intake_path",
                "/api/v1/intelligent-builder-intake/process",
            )],
            environments: vec![
                stage("dev", "bldr-sq-apim-dev.azure-api.net"),
                stage("staging", "bldr-sq-apim-stg.azure-api.net"),
                stage("prod", "bldr-sq-apim.azure-api.net"),
            ],
        }
    }

    pub fn find(&self, name: &str) -> Result<&Environment, IntakeError> {
        self.environments
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| IntakeError::UnknownEnvironment(name.to_string()))
    }

    /// Build a merged variable map. Environment variables override globals.
    pub fn resolve(&self, environment: Option<&Environment>) -> HashMap<String, String> {
        let mut variables = HashMap::new();

        for v in &self.globals {
            if v.enabled && !v.key.is_empty() {
                variables.insert(v.key.clone(), v.value.clone());
            }
        }

        if let Some(env) = environment {
            for v in &env.variables {
                if v.enabled && !v.key.is_empty() {
                    variables.insert(v.key.clone(), v.value.clone());
                }
            }
        }

        variables
    }
}

/// Interpolate `{{key}}` placeholders using the provided variable map.
///
/// Unknown placeholders are left intact.
pub fn interpolate(input: &str, variables: &HashMap<String, String>) -> String {
    let mut result = input.to_string();
    for (key, value) in variables {
        result = result.replace(&format!("{{{{{key}}}}}"), value);
    }
    result
}

/// Connection settings for one suite run.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub endpoint: String,
    pub auth_path: String,
    pub timeout_ms: u64,
    pub retry_count: u32,
    pub retry_delay_ms: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://bldr-sq-apim-dev.azure-api.net".into(),
            endpoint: "/api/v1/intelligent-builder-intake/process".into(),
            auth_path: "/api/Authenticate/Login".into(),
            timeout_ms: 30_000,
            retry_count: 3,
            retry_delay_ms: 1_000,
        }
    }
}

impl ApiSettings {
    /// Resolve settings for an optional named environment.
    ///
    /// Precedence per field: defaults, then the selected environment's
    /// `base_url`, then process environment variables. `{{var}}`
    /// placeholders are interpolated last, so an explicit
    /// `BASE_URL=https://{{apim_host}}` still resolves against the
    /// selected environment.
    pub fn from_env(environment: Option<&Environment>) -> Result<Self, IntakeError> {
        let _ = dotenvy::dotenv();

        let mut settings = Self::default();
        if let Some(env) = environment {
            if let Some(base_url) = env.value_of("base_url") {
                settings.base_url = base_url.to_string();
            }
        }

        if let Ok(value) = env::var("BASE_URL") {
            settings.base_url = value;
        }
        if let Ok(value) = env::var("API_ENDPOINT") {
            settings.endpoint = value;
        }
        if let Ok(value) = env::var("AUTH_PATH") {
            settings.auth_path = value;
        }
        settings.timeout_ms = parse_var("REQUEST_TIMEOUT_MS", settings.timeout_ms)?;
        settings.retry_count = parse_var("REQUEST_RETRIES", settings.retry_count)?;
        settings.retry_delay_ms = parse_var("REQUEST_RETRY_DELAY_MS", settings.retry_delay_ms)?;

        let manager = EnvironmentManager::builtin();
        let variables = manager.resolve(environment);
        settings.base_url = interpolate(&settings.base_url, &variables);
        settings.endpoint = interpolate(&settings.endpoint, &variables);

        Ok(settings)
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, IntakeError>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|err| IntakeError::Config {
            key,
            message: format!("{err}"),
        }),
        Err(_) => Ok(default),
    }
}
