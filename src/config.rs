use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::crawl::{CrawlSettings, DEFAULT_CRAWL_RADIUS, DEFAULT_DISPLAY_RADIUS};
use crate::fetch::SessionCredentials;
use crate::graph::{NodeId, UNKNOWN_DISTANCE};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "FRIENDGRAPH_CONFIG";

/// Config file looked up in the working directory when `FRIENDGRAPH_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "friendgraph.toml";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            crawl: CrawlConfig::default(),
            cache: CacheConfig::default(),
            output: OutputConfig::default(),
            log_level: default_log_level(),
        }
    }
}

/// Login session for the friend-list service
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Email of the account to log in as
    pub email: Option<String>,
    /// Numeric id of the account to log in as
    pub user_id: Option<String>,
    /// Name of the environment variable holding the password
    #[serde(default = "default_password_env")]
    pub password_env: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_login_url")]
    pub login_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            email: None,
            user_id: None,
            password_env: default_password_env(),
            base_url: default_base_url(),
            login_url: default_login_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Which part of the graph to crawl and display
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Node the graph is centred on
    pub target: Option<String>,
    /// A friend of the target to start crawling from
    pub start: Option<String>,
    #[serde(default = "default_crawl_radius")]
    pub crawl_radius: u32,
    #[serde(default = "default_display_radius")]
    pub display_radius: u32,
    /// Offline friend-list fixture used instead of the live service
    pub fixture: Option<PathBuf>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            target: None,
            start: None,
            crawl_radius: default_crawl_radius(),
            display_radius: default_display_radius(),
            fixture: None,
        }
    }
}

/// Persisted cache configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
    /// SQLite cache file; no caching when absent
    pub path: Option<PathBuf>,
}

/// Where the DOT file goes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Output file; stdout when absent
    pub path: Option<PathBuf>,
}

/// Values given on the command line; each one set wins over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub email: Option<String>,
    pub user_id: Option<String>,
    pub target: Option<String>,
    pub start: Option<String>,
    pub crawl_radius: Option<u32>,
    pub display_radius: Option<u32>,
    pub cache_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub fixture: Option<PathBuf>,
    pub log_level: Option<String>,
}

fn default_password_env() -> String {
    "FRIENDGRAPH_PASSWORD".to_string()
}

fn default_base_url() -> String {
    "http://www.facebook.com".to_string()
}

fn default_login_url() -> String {
    "http://m.facebook.com/login.php".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_crawl_radius() -> u32 {
    DEFAULT_CRAWL_RADIUS
}

fn default_display_radius() -> u32 {
    DEFAULT_DISPLAY_RADIUS
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration
    ///
    /// Loads environment variables from .env file (if present) first.
    /// Looks for a config file in this order:
    /// 1. `explicit` (the `--config` flag)
    /// 2. Path in the FRIENDGRAPH_CONFIG environment variable
    /// 3. ./friendgraph.toml, if it exists
    ///
    /// Without any file every setting takes its default. Overrides are
    /// applied last, then the result is validated.
    pub fn load(explicit: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        // Optional: a missing .env is not an error
        let _ = dotenv::dotenv();

        let config_path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from))
            .or_else(|| {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                local.exists().then_some(local)
            });

        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None => Config::default(),
        };

        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file without validating it.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply command-line overrides on top of file values.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(email) = overrides.email {
            self.session.email = Some(email);
        }
        if let Some(user_id) = overrides.user_id {
            self.session.user_id = Some(user_id);
        }
        if let Some(target) = overrides.target {
            self.crawl.target = Some(target);
        }
        if let Some(start) = overrides.start {
            self.crawl.start = Some(start);
        }
        if let Some(radius) = overrides.crawl_radius {
            self.crawl.crawl_radius = radius;
        }
        if let Some(radius) = overrides.display_radius {
            self.crawl.display_radius = radius;
        }
        if let Some(path) = overrides.cache_path {
            self.cache.path = Some(path);
        }
        if let Some(path) = overrides.output_path {
            self.output.path = Some(path);
        }
        if let Some(path) = overrides.fixture {
            self.crawl.fixture = Some(path);
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let settings = self.crawl_settings()?;

        if settings.target == settings.start {
            anyhow::bail!("crawl.target and crawl.start must be different users");
        }

        // Nodes never reached sit at UNKNOWN_DISTANCE and must stay out of the crawl
        if settings.crawl_radius >= UNKNOWN_DISTANCE {
            anyhow::bail!("crawl.crawl_radius must be less than {}", UNKNOWN_DISTANCE);
        }

        if settings.display_radius == 0 {
            anyhow::bail!("crawl.display_radius must be greater than 0");
        }

        if self.crawl.fixture.is_none() {
            // Live crawling needs a full login
            self.credentials()?;
        }

        Ok(())
    }

    /// The plain settings handed to the crawler.
    pub fn crawl_settings(&self) -> Result<CrawlSettings> {
        let target = parse_required_id(self.crawl.target.as_deref(), "target (-t/--target)")?;
        let start = parse_required_id(self.crawl.start.as_deref(), "start (-s/--start)")?;
        Ok(CrawlSettings {
            target,
            start,
            crawl_radius: self.crawl.crawl_radius,
            display_radius: self.crawl.display_radius,
        })
    }

    /// Login credentials; the password comes from the environment only.
    pub fn credentials(&self) -> Result<SessionCredentials> {
        let email = self
            .session
            .email
            .clone()
            .filter(|e| !e.trim().is_empty())
            .context("session.email (-e/--email) is required for live crawling")?;
        let user_id = parse_required_id(self.session.user_id.as_deref(), "session.user_id (-u/--userid)")?;
        let password = std::env::var(&self.session.password_env).with_context(|| {
            format!(
                "Environment variable {} not set. Set it in your .env file or as an environment variable with the account password.",
                self.session.password_env
            )
        })?;

        Ok(SessionCredentials { email, password, user_id })
    }
}

fn parse_required_id(value: Option<&str>, what: &str) -> Result<NodeId> {
    let raw = value.with_context(|| format!("{} is required", what))?;
    raw.parse::<NodeId>()
        .map_err(|e| anyhow::anyhow!("{}: {}", what, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    const PASSWORD_ENV: &str = "FRIENDGRAPH_TEST_PASSWORD";

    fn full_config_toml() -> String {
        format!(
            r#"
log_level = "info"

[session]
email = "me@example.com"
user_id = "1000"
password_env = "{}"

[crawl]
target = "1"
start = "2"
crawl_radius = 1
"#,
            PASSWORD_ENV
        )
    }

    fn with_password(password: Option<&str>, f: impl FnOnce()) {
        let original = std::env::var(PASSWORD_ENV).ok();
        match password {
            Some(p) => std::env::set_var(PASSWORD_ENV, p),
            None => std::env::remove_var(PASSWORD_ENV),
        }
        f();
        std::env::remove_var(PASSWORD_ENV);
        if let Some(val) = original {
            std::env::set_var(PASSWORD_ENV, val);
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.crawl.crawl_radius, 2);
        assert_eq!(config.crawl.display_radius, 3);
        assert_eq!(config.session.password_env, "FRIENDGRAPH_PASSWORD");
        assert_eq!(config.session.timeout_secs, 30);
        assert_eq!(config.log_level, "warn");
        assert!(config.cache.path.is_none());
        assert!(config.output.path.is_none());
    }

    #[test]
    fn test_default_matches_empty_file() {
        let config = Config::default();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.crawl.crawl_radius, 2);
        assert_eq!(config.session.password_env, "FRIENDGRAPH_PASSWORD");
    }

    #[test]
    fn test_config_load_from_explicit_file() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("friendgraph.toml");
        fs::write(&config_path, full_config_toml()).unwrap();

        with_password(Some("hunter2"), || {
            let config = Config::load(Some(&config_path), ConfigOverrides::default());
            assert!(config.is_ok(), "Config::load() failed: {:?}", config.err());
            let config = config.unwrap();
            assert_eq!(config.log_level, "info");
            assert_eq!(config.crawl.crawl_radius, 1);

            let settings = config.crawl_settings().unwrap();
            assert_eq!(settings.target, NodeId(1));
            assert_eq!(settings.start, NodeId(2));

            let credentials = config.credentials().unwrap();
            assert_eq!(credentials.password, "hunter2");
            assert_eq!(credentials.user_id, NodeId(1000));
        });
    }

    #[test]
    fn test_config_missing_password() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("friendgraph.toml");
        fs::write(&config_path, full_config_toml()).unwrap();

        with_password(None, || {
            let err = Config::load(Some(&config_path), ConfigOverrides::default()).unwrap_err();
            assert!(err.to_string().contains(PASSWORD_ENV));
        });
    }

    #[test]
    fn test_fixture_run_needs_no_login() {
        let mut config = Config::from_toml("").unwrap();
        config.apply(ConfigOverrides {
            target: Some("1".into()),
            start: Some("2".into()),
            fixture: Some(PathBuf::from("friends.json")),
            ..ConfigOverrides::default()
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut config = Config::from_toml(&full_config_toml()).unwrap();
        config.apply(ConfigOverrides {
            target: Some("5".into()),
            display_radius: Some(4),
            output_path: Some(PathBuf::from("out.dot")),
            cache_path: Some(PathBuf::from("cache.db")),
            ..ConfigOverrides::default()
        });
        assert_eq!(config.crawl.target.as_deref(), Some("5"));
        assert_eq!(config.crawl.start.as_deref(), Some("2"));
        assert_eq!(config.crawl.display_radius, 4);
        assert_eq!(config.output.path, Some(PathBuf::from("out.dot")));
        assert_eq!(config.cache.path, Some(PathBuf::from("cache.db")));
    }

    #[test]
    fn test_validate_rejects_missing_target() {
        let mut config = Config::from_toml("").unwrap();
        config.apply(ConfigOverrides {
            start: Some("2".into()),
            fixture: Some(PathBuf::from("f.json")),
            ..ConfigOverrides::default()
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("target"));
    }

    #[test]
    fn test_validate_rejects_same_target_and_start() {
        let mut config = Config::from_toml("").unwrap();
        config.apply(ConfigOverrides {
            target: Some("2".into()),
            start: Some("2".into()),
            fixture: Some(PathBuf::from("f.json")),
            ..ConfigOverrides::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_display_radius() {
        let mut config = Config::from_toml("").unwrap();
        config.apply(ConfigOverrides {
            target: Some("1".into()),
            start: Some("2".into()),
            display_radius: Some(0),
            fixture: Some(PathBuf::from("f.json")),
            ..ConfigOverrides::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_caps_crawl_radius() {
        let mut config = Config::from_toml("").unwrap();
        config.apply(ConfigOverrides {
            target: Some("1".into()),
            start: Some("2".into()),
            crawl_radius: Some(UNKNOWN_DISTANCE),
            fixture: Some(PathBuf::from("f.json")),
            ..ConfigOverrides::default()
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("crawl_radius"));

        config.crawl.crawl_radius = UNKNOWN_DISTANCE - 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_numeric_ids() {
        let mut config = Config::from_toml("").unwrap();
        config.apply(ConfigOverrides {
            target: Some("jesse".into()),
            start: Some("2".into()),
            fixture: Some(PathBuf::from("f.json")),
            ..ConfigOverrides::default()
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("target"));
    }

    #[test]
    fn test_config_invalid_path() {
        let result = Config::load(Some(Path::new("nonexistent.toml")), ConfigOverrides::default());
        assert!(result.is_err());
    }
}
