use std::time::Duration;

use ::config::{ConfigError, Environment};
use serde::{de, Deserialize, Deserializer};
use sqlx::postgres::PgConnectOptions;
use tracing::Level;

/// The whole process configuration, read once at startup and passed into
/// the adapters that need it.
#[derive(Debug, Clone)]
pub struct Config {
	pub server: ServerConfig,
	pub database: DatabaseConfig,
	pub search: SearchConfig,
	pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
	#[serde(default = "default_port")]
	pub port: u16,
}

/// Connection parameters for the relational store.
///
/// `DATABASE_URL` takes precedence over the individual parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
	#[serde(rename = "database_url")]
	pub url: Option<String>,
	#[serde(rename = "database_host", default = "default_database_host")]
	pub host: String,
	#[serde(rename = "database_port", default = "default_database_port")]
	pub port: u16,
	#[serde(rename = "database_user")]
	pub username: Option<String>,
	#[serde(rename = "database_password")]
	pub password: Option<String>,
	#[serde(rename = "database_name")]
	pub name: Option<String>,
}

/// Connection parameters for the search engine and the index all
/// documents are written to.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
	#[serde(rename = "elasticsearch_host")]
	pub host: String,
	#[serde(rename = "elasticsearch_user")]
	pub username: Option<String>,
	#[serde(rename = "elasticsearch_password")]
	pub password: Option<String>,
	#[serde(rename = "elasticsearch_index_name")]
	pub index: String,
	#[serde(rename = "elasticsearch_max_retries", default = "default_max_retries")]
	pub max_retries: u32,
	#[serde(
		rename = "elasticsearch_request_timeout_ms",
		default = "default_timeout",
		deserialize_with = "millis"
	)]
	pub request_timeout: Duration,
	#[serde(
		rename = "elasticsearch_ping_timeout_ms",
		default = "default_timeout",
		deserialize_with = "millis"
	)]
	pub ping_timeout: Duration,
	#[serde(rename = "elasticsearch_refresh", default)]
	pub refresh: Refresh,
}

/// The `refresh` parameter sent with document writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Refresh {
	#[default]
	#[serde(rename = "false")]
	False,
	#[serde(rename = "true")]
	True,
	#[serde(rename = "wait_for")]
	WaitFor,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
	#[serde(rename = "log_level", default = "default_level", deserialize_with = "level")]
	pub level: Level,
	#[serde(rename = "otel_enabled", default)]
	pub otlp: bool,
}

fn default_port() -> u16 {
	3000
}

fn default_database_host() -> String {
	"localhost".into()
}

fn default_database_port() -> u16 {
	5432
}

fn default_max_retries() -> u32 {
	7
}

fn default_timeout() -> Duration {
	Duration::from_secs(30)
}

fn default_level() -> Level {
	Level::INFO
}

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
	u64::deserialize(deserializer).map(Duration::from_millis)
}

fn level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Level, D::Error> {
	String::deserialize(deserializer)?
		.parse()
		.map_err(de::Error::custom)
}

impl Refresh {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::False => "false",
			Self::True => "true",
			Self::WaitFor => "wait_for",
		}
	}
}

impl DatabaseConfig {
	/// Builds the connection options for the pool.
	pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
		if let Some(url) = &self.url {
			return url.parse();
		}

		let mut options = PgConnectOptions::new().host(&self.host).port(self.port);

		if let Some(username) = &self.username {
			options = options.username(username);
		}

		if let Some(password) = &self.password {
			options = options.password(password);
		}

		if let Some(name) = &self.name {
			options = options.database(name);
		}

		Ok(options)
	}
}

impl Config {
	/// Reads the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_environment(Environment::default())
	}

	/// Reads the configuration from `environment`. Variable names are
	/// case-insensitive and empty values count as unset.
	pub fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
		let source = ::config::Config::builder()
			.add_source(environment.ignore_empty(true))
			.build()?;

		Ok(Self {
			server: source.clone().try_deserialize()?,
			database: source.clone().try_deserialize()?,
			search: source.clone().try_deserialize()?,
			telemetry: source.try_deserialize()?,
		})
	}
}
