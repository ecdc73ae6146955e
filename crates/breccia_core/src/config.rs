//! Process-wide settings.
//!
//! # Responsibility
//! - Resolve deployment settings from an optional `settings.toml` and the
//!   process environment, environment taking precedence.
//! - Publish one immutable [`Settings`] value before request handling starts.
//!
//! # Invariants
//! - `SECRET_KEY` is required; every other key has a default.
//! - [`init_settings`] succeeds at most once per process.

use log::info;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_DATABASE_URL: &str = "sqlite://db.sqlite3";
const DEFAULT_PROJECT_SHORT_NAME: &str = "breccia";

static SETTINGS: OnceCell<Settings> = OnceCell::new();

/// Errors raised while resolving settings.
#[derive(Debug)]
pub enum ConfigError {
    /// A required key has no value in any source.
    Missing(&'static str),
    /// A key is present but cannot be cast to its expected type.
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
    /// `DATABASE_URL` uses a scheme other than `sqlite`.
    UnsupportedDatabase(String),
    /// The settings file exists but cannot be read.
    Io { path: PathBuf, source: std::io::Error },
    /// The settings file is not valid TOML.
    Parse(toml::de::Error),
    /// [`init_settings`] was called a second time.
    AlreadyInitialized,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "required setting `{key}` is not set"),
            Self::Invalid {
                key,
                value,
                expected,
            } => write!(f, "setting `{key}` has value `{value}`, expected {expected}"),
            Self::UnsupportedDatabase(url) => {
                write!(f, "unsupported DATABASE_URL `{url}`; only sqlite:// is supported")
            }
            Self::Io { path, source } => {
                write!(f, "failed to read settings file `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid settings file: {err}"),
            Self::AlreadyInitialized => write!(f, "settings are already initialized"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Where the SQLite database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    Memory,
}

/// Outgoing mail transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailBackend {
    /// Messages are appended to a local file; used when no SMTP host is set.
    File { path: PathBuf },
    Smtp {
        host: String,
        port: u16,
        user: Option<String>,
        password: Option<String>,
        use_tls: bool,
        use_ssl: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSettings {
    pub default_from_email: String,
    pub backend: EmailBackend,
}

/// Immutable deployment settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub secret_key: String,
    pub debug: bool,
    pub allowed_hosts: Vec<String>,
    pub database: DatabaseLocation,
    pub dbbackup_storage_location: PathBuf,
    pub language_code: String,
    pub time_zone: String,
    pub log_level: String,
    pub log_filename: PathBuf,
    pub log_days: usize,
    pub email: EmailSettings,
    pub google_maps_api_key: Option<String>,
}

/// The subset of settings exposed to page contexts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportedSettings {
    pub debug: bool,
    pub google_maps_api_key: Option<String>,
}

/// Typed contents of `settings.toml`, keys in lowercase.
///
/// Every key is optional. Keys whose default depends on another key stay
/// `None` until [`Settings::from_sources`] resolves them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub allowed_hosts: Option<Vec<String>>,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_dbbackup_storage_location")]
    pub dbbackup_storage_location: PathBuf,
    #[serde(default = "default_language_code")]
    pub language_code: String,
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_filename")]
    pub log_filename: PathBuf,
    #[serde(default = "default_log_days")]
    pub log_days: usize,
    #[serde(default)]
    pub email_host: Option<String>,
    #[serde(default = "default_from_email")]
    pub default_from_email: String,
    #[serde(default = "default_email_file_path")]
    pub email_file_path: PathBuf,
    #[serde(default)]
    pub email_host_user: Option<String>,
    #[serde(default)]
    pub email_host_password: Option<String>,
    #[serde(default = "default_email_port")]
    pub email_port: u16,
    #[serde(default)]
    pub email_use_tls: Option<bool>,
    #[serde(default)]
    pub email_use_ssl: Option<bool>,
    #[serde(default)]
    pub google_maps_api_key: Option<String>,
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            secret_key: None,
            debug: false,
            allowed_hosts: None,
            database_url: default_database_url(),
            dbbackup_storage_location: default_dbbackup_storage_location(),
            language_code: default_language_code(),
            time_zone: default_time_zone(),
            log_level: default_log_level(),
            log_filename: default_log_filename(),
            log_days: default_log_days(),
            email_host: None,
            default_from_email: default_from_email(),
            email_file_path: default_email_file_path(),
            email_host_user: None,
            email_host_password: None,
            email_port: default_email_port(),
            email_use_tls: None,
            email_use_ssl: None,
            google_maps_api_key: None,
        }
    }
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}
fn default_dbbackup_storage_location() -> PathBuf {
    PathBuf::from(".dbbackup")
}
fn default_language_code() -> String {
    "en-gb".to_string()
}
fn default_time_zone() -> String {
    "UTC".to_string()
}
fn default_log_level() -> String {
    "INFO".to_string()
}
fn default_log_filename() -> PathBuf {
    PathBuf::from("debug.log")
}
fn default_log_days() -> usize {
    14
}
fn default_from_email() -> String {
    format!("{DEFAULT_PROJECT_SHORT_NAME}@localhost.localdomain")
}
fn default_email_file_path() -> PathBuf {
    PathBuf::from("mail.log")
}
fn default_email_port() -> u16 {
    25
}

impl SettingsFile {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Overrides fields with every non-empty environment-style value.
    fn apply_overrides<F>(&mut self, source: &Source<'_, F>) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        set(&mut self.secret_key, source.string("SECRET_KEY").map(Some));
        set(&mut self.debug, source.bool("DEBUG")?);
        set(
            &mut self.allowed_hosts,
            source.string("ALLOWED_HOSTS").map(|value| Some(parse_csv(&value))),
        );
        set(&mut self.database_url, source.string("DATABASE_URL"));
        set(
            &mut self.dbbackup_storage_location,
            source.string("DBBACKUP_STORAGE_LOCATION").map(PathBuf::from),
        );
        set(&mut self.language_code, source.string("LANGUAGE_CODE"));
        set(&mut self.time_zone, source.string("TIME_ZONE"));
        set(&mut self.log_level, source.string("LOG_LEVEL"));
        set(
            &mut self.log_filename,
            source.string("LOG_FILENAME").map(PathBuf::from),
        );
        set(
            &mut self.log_days,
            source.parse("LOG_DAYS", "a whole number of days")?,
        );
        set(&mut self.email_host, source.string("EMAIL_HOST").map(Some));
        set(
            &mut self.default_from_email,
            source.string("DEFAULT_FROM_EMAIL"),
        );
        set(
            &mut self.email_file_path,
            source.string("EMAIL_FILE_PATH").map(PathBuf::from),
        );
        set(
            &mut self.email_host_user,
            source.string("EMAIL_HOST_USER").map(Some),
        );
        set(
            &mut self.email_host_password,
            source.string("EMAIL_HOST_PASSWORD").map(Some),
        );
        set(&mut self.email_port, source.parse("EMAIL_PORT", "a port number")?);
        set(&mut self.email_use_tls, source.bool("EMAIL_USE_TLS")?.map(Some));
        set(&mut self.email_use_ssl, source.bool("EMAIL_USE_SSL")?.map(Some));
        set(
            &mut self.google_maps_api_key,
            source.string("GOOGLE_MAPS_API_KEY").map(Some),
        );
        Ok(())
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

impl Settings {
    /// Loads `settings_file` (if it exists), then applies the environment.
    pub fn load(settings_file: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match settings_file {
            Some(path) if path.exists() => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                SettingsFile::parse(&text)?
            }
            _ => SettingsFile::default(),
        };

        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Resolves settings from defaults plus a key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_sources(SettingsFile::default(), lookup)
    }

    /// Resolves settings from file values overridden by a key lookup.
    ///
    /// Empty lookup values count as unset.
    pub fn from_sources<F>(mut file: SettingsFile, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        file.apply_overrides(&Source { lookup: &lookup })?;

        let secret_key = non_blank(file.secret_key).ok_or(ConfigError::Missing("SECRET_KEY"))?;
        let allowed_hosts = match file.allowed_hosts {
            Some(hosts) => hosts,
            None if file.debug => vec!["*".to_string()],
            None => parse_csv("127.0.0.1,localhost,localhost.localdomain"),
        };
        let database = parse_database_url(&file.database_url)?;

        let backend = match non_blank(file.email_host) {
            None => EmailBackend::File {
                path: file.email_file_path,
            },
            Some(host) => EmailBackend::Smtp {
                host,
                port: file.email_port,
                user: non_blank(file.email_host_user),
                password: non_blank(file.email_host_password),
                use_tls: file.email_use_tls.unwrap_or(file.email_port == 587),
                use_ssl: file.email_use_ssl.unwrap_or(file.email_port == 465),
            },
        };

        Ok(Self {
            secret_key,
            debug: file.debug,
            allowed_hosts,
            database,
            dbbackup_storage_location: file.dbbackup_storage_location,
            language_code: file.language_code,
            time_zone: file.time_zone,
            log_level: file.log_level,
            log_filename: file.log_filename,
            log_days: file.log_days,
            email: EmailSettings {
                default_from_email: file.default_from_email,
                backend,
            },
            google_maps_api_key: non_blank(file.google_maps_api_key),
        })
    }

    pub fn exported(&self) -> ExportedSettings {
        ExportedSettings {
            debug: self.debug,
            google_maps_api_key: self.google_maps_api_key.clone(),
        }
    }
}

/// Publishes `settings` as the process-wide configuration.
pub fn init_settings(settings: Settings) -> Result<(), ConfigError> {
    SETTINGS
        .set(settings)
        .map_err(|_| ConfigError::AlreadyInitialized)?;
    if let Some(active) = SETTINGS.get() {
        info!(
            "event=settings_init module=config status=ok debug={} time_zone={} log_days={}",
            active.debug, active.time_zone, active.log_days
        );
    }
    Ok(())
}

/// Returns the process-wide settings, `None` before [`init_settings`].
pub fn settings() -> Option<&'static Settings> {
    SETTINGS.get()
}

/// Environment-style lookup; values are strings cast on demand.
struct Source<'a, F: Fn(&str) -> Option<String>> {
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<String>> Source<'_, F> {
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn bool(&self, key: &'static str) -> Result<Option<bool>, ConfigError> {
        match self.string(key) {
            None => Ok(None),
            Some(value) => parse_bool(&value).map(Some).ok_or(ConfigError::Invalid {
                key,
                value,
                expected: "a boolean",
            }),
        }
    }

    fn parse<T: std::str::FromStr>(
        &self,
        key: &'static str,
        expected: &'static str,
    ) -> Result<Option<T>, ConfigError> {
        match self.string(key) {
            None => Ok(None),
            Some(value) => value.parse::<T>().map(Some).map_err(|_| ConfigError::Invalid {
                key,
                value,
                expected,
            }),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" | "t" => Some(true),
        "0" | "false" | "no" | "n" | "off" | "f" => Some(false),
        _ => None,
    }
}

fn parse_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses a `sqlite://` url into a database location.
///
/// `sqlite://db.sqlite3` is relative, `sqlite:////abs/db.sqlite3` and
/// `sqlite:///abs/db.sqlite3` are absolute, `sqlite://` and
/// `sqlite://:memory:` are in-memory.
pub fn parse_database_url(url: &str) -> Result<DatabaseLocation, ConfigError> {
    let rest = url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ConfigError::UnsupportedDatabase(url.to_string()))?;

    match rest {
        "" | ":memory:" | "/:memory:" => Ok(DatabaseLocation::Memory),
        path if path.starts_with("//") => Ok(DatabaseLocation::File(PathBuf::from(&path[1..]))),
        path => Ok(DatabaseLocation::File(PathBuf::from(path))),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        parse_database_url, ConfigError, DatabaseLocation, EmailBackend, Settings, SettingsFile,
    };
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: BTreeMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn secret_key_is_required() {
        let err = Settings::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SECRET_KEY")));
    }

    #[test]
    fn defaults_apply_when_only_secret_key_is_set() {
        let settings = Settings::from_lookup(lookup_from(&[("SECRET_KEY", "s3cret")])).unwrap();
        assert!(!settings.debug);
        assert_eq!(
            settings.allowed_hosts,
            vec!["127.0.0.1", "localhost", "localhost.localdomain"]
        );
        assert_eq!(
            settings.database,
            DatabaseLocation::File(PathBuf::from("db.sqlite3"))
        );
        assert_eq!(settings.log_days, 14);
        assert_eq!(settings.log_filename, PathBuf::from("debug.log"));
        assert_eq!(settings.language_code, "en-gb");
        assert_eq!(
            settings.email.default_from_email,
            "breccia@localhost.localdomain"
        );
        assert_eq!(
            settings.email.backend,
            EmailBackend::File {
                path: PathBuf::from("mail.log")
            }
        );
        assert_eq!(settings.google_maps_api_key, None);
    }

    #[test]
    fn debug_allows_all_hosts_by_default() {
        let settings =
            Settings::from_lookup(lookup_from(&[("SECRET_KEY", "x"), ("DEBUG", "True")])).unwrap();
        assert!(settings.debug);
        assert_eq!(settings.allowed_hosts, vec!["*"]);
    }

    #[test]
    fn smtp_tls_defaults_follow_port() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("SECRET_KEY", "x"),
            ("EMAIL_HOST", "smtp.example.com"),
            ("EMAIL_PORT", "587"),
        ]))
        .unwrap();
        match settings.email.backend {
            EmailBackend::Smtp {
                port,
                use_tls,
                use_ssl,
                ..
            } => {
                assert_eq!(port, 587);
                assert!(use_tls);
                assert!(!use_ssl);
            }
            other => panic!("unexpected backend: {other:?}"),
        }
    }

    #[test]
    fn invalid_log_days_is_rejected() {
        let err = Settings::from_lookup(lookup_from(&[("SECRET_KEY", "x"), ("LOG_DAYS", "two")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "LOG_DAYS", .. }));
    }

    #[test]
    fn database_url_forms() {
        assert_eq!(
            parse_database_url("sqlite://").unwrap(),
            DatabaseLocation::Memory
        );
        assert_eq!(
            parse_database_url("sqlite:////var/lib/breccia/db.sqlite3").unwrap(),
            DatabaseLocation::File(PathBuf::from("/var/lib/breccia/db.sqlite3"))
        );
        assert!(matches!(
            parse_database_url("postgres://localhost/breccia"),
            Err(ConfigError::UnsupportedDatabase(_))
        ));
    }

    #[test]
    fn settings_file_is_typed_and_defaults_missing_keys() {
        let file = SettingsFile::parse(
            "secret_key = \"abc\"\ndebug = true\nlog_days = 7\nallowed_hosts = [\"a\", \"b\"]\n",
        )
        .unwrap();
        assert_eq!(file.secret_key.as_deref(), Some("abc"));
        assert!(file.debug);
        assert_eq!(file.log_days, 7);
        assert_eq!(
            file.allowed_hosts,
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(file.database_url, "sqlite://db.sqlite3");
        assert_eq!(file.email_port, 25);
        assert_eq!(file, SettingsFile {
            secret_key: Some("abc".to_string()),
            debug: true,
            log_days: 7,
            allowed_hosts: Some(vec!["a".to_string(), "b".to_string()]),
            ..SettingsFile::default()
        });
    }

    #[test]
    fn settings_file_rejects_mistyped_values() {
        let err = SettingsFile::parse("log_days = \"two\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn environment_overrides_file_values() {
        let file = SettingsFile::parse(
            "secret_key = \"from-file\"\nlog_days = 7\nemail_host = \"smtp.example.com\"\nemail_port = 465\n",
        )
        .unwrap();
        let settings = Settings::from_sources(
            file,
            lookup_from(&[("SECRET_KEY", "from-env"), ("EMAIL_USE_SSL", "false")]),
        )
        .unwrap();
        assert_eq!(settings.secret_key, "from-env");
        assert_eq!(settings.log_days, 7);
        match settings.email.backend {
            EmailBackend::Smtp { port, use_ssl, .. } => {
                assert_eq!(port, 465);
                assert!(!use_ssl);
            }
            other => panic!("unexpected backend: {other:?}"),
        }
    }
}
