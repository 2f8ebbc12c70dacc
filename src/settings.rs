use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use std::{env, fmt, str::FromStr};
use url::Url;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default)]
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default)]
    pub secret_key: String,

    #[serde(default)]
    pub storage_url: String,

    #[serde(default)]
    pub storage_key: String,

    #[serde(default = "default_bucket")]
    pub storage_bucket: String,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Portfolio-Projects".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_max_connections() -> u32 {
    20
}
fn default_bucket() -> String {
    "portfolio-media".to_string()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_max_upload_mb() -> usize {
    50
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .ignore_empty(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        // The unprefixed names are what older deployments export
        config.database_url = fill_or_env(config.database_url, &["APP_DATABASE_URL", "DATABASE_URL"])?;
        config.secret_key = fill_or_env(config.secret_key, &["APP_SECRET_KEY", "SECRET_KEY"])?;
        config.storage_url = fill_or_env(config.storage_url, &["APP_STORAGE_URL", "SUPABASE_URL"])?;
        config.storage_key = fill_or_env(config.storage_key, &["APP_STORAGE_KEY", "SUPABASE_KEY"])?;
        if let Ok(bucket) = env::var("BUCKET_NAME") {
            if env::var("APP_STORAGE_BUCKET").is_err() && !bucket.trim().is_empty() {
                config.storage_bucket = bucket;
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database_url.trim().is_empty() {
            errors.push("DATABASE_URL cannot be empty");
        }
        if self.secret_key.len() < 32 {
            errors.push("SECRET_KEY must be at least 32 characters");
        }
        match Url::parse(&self.storage_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => errors.push("STORAGE_URL must be an http(s) URL"),
        }
        if self.storage_key.trim().is_empty() {
            errors.push("STORAGE_KEY cannot be empty");
        }
        if self.worker_count == 0 {
            errors.push("WORKER_COUNT must be at least 1");
        }
        if self.storage_bucket.trim().is_empty() {
            errors.push("STORAGE_BUCKET cannot be empty");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn fill_or_env(current: String, env_keys: &[&str]) -> Result<String, ConfigError> {
    if !current.trim().is_empty() {
        return Ok(current);
    }
    env_keys
        .iter()
        .find_map(|key| env::var(key).ok().filter(|v| !v.trim().is_empty()))
        .ok_or_else(|| ConfigError::Message(format!("{} must be set", env_keys[0])))
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("database_url", &self.database_url.redact())
            .field("database_max_connections", &self.database_max_connections)
            .field("secret_key", &self.secret_key.redact())
            .field("storage_url", &self.storage_url)
            .field("storage_key", &self.storage_key.redact())
            .field("storage_bucket", &self.storage_bucket)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("max_upload_mb", &self.max_upload_mb)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            env: AppEnvironment::Testing,
            name: "test".into(),
            port: 0,
            host: "127.0.0.1".into(),
            worker_count: 1,
            database_url: "postgres://localhost/portfolio".into(),
            database_max_connections: 5,
            secret_key: "k".repeat(32),
            storage_url: "https://abc.supabase.co".into(),
            storage_key: "service-role-key".into(),
            storage_bucket: "portfolio-media".into(),
            cors_allowed_origins: vec!["*".into()],
            max_upload_mb: 5,
        }
    }

    #[test]
    fn accepts_a_complete_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn reports_every_problem() {
        let cfg = AppConfig {
            secret_key: "short".into(),
            storage_url: "not a url".into(),
            storage_key: String::new(),
            ..config()
        };
        let message = cfg.validate().unwrap_err().to_string();
        assert!(message.contains("SECRET_KEY"));
        assert!(message.contains("STORAGE_URL"));
        assert!(message.contains("STORAGE_KEY"));
    }

    #[test]
    fn wildcard_cors_is_rejected_in_production() {
        let cfg = AppConfig { env: AppEnvironment::Production, ..config() };
        assert!(cfg.validate().unwrap_err().to_string().contains("Wildcard CORS"));

        let cfg = AppConfig {
            env: AppEnvironment::Production,
            cors_allowed_origins: vec!["https://me.dev, https://www.me.dev".into()],
            ..config()
        };
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.cors_origins(), vec!["https://me.dev", "https://www.me.dev"]);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("service-role-key"));
        assert!(!rendered.contains("postgres://"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn parses_environment_names() {
        assert_eq!("Production".parse::<AppEnvironment>().unwrap(), AppEnvironment::Production);
        assert!("staging".parse::<AppEnvironment>().is_err());
    }
}
