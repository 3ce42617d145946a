use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BIND_IP: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SOCKET_NAME: &str = "app.sock";
const DEFAULT_POSTGRES_PORT: u16 = 5432;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_DB_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has invalid value `{value}`")]
    Invalid { key: &'static str, value: String },

    #[error("cannot locate executable directory: {0}")]
    ExecutableDir(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listen {
    Tcp { bind_ip: String, port: u16 },
    Socket { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub listen: Listen,
    pub database: DatabaseConfig,
    pub request_timeout: Duration,
    pub shutdown_timeout: Duration,
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Reads the configuration from the process environment.
    /// Call after `dotenv()` so a local `.env` file is honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen = match lookup("LISTEN_TYPE").as_deref() {
            None | Some("port") => Listen::Tcp {
                bind_ip: lookup("BIND_IP").unwrap_or_else(|| DEFAULT_BIND_IP.to_string()),
                port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            },
            Some("socket") => Listen::Socket {
                path: match lookup("SOCKET_PATH") {
                    Some(path) => PathBuf::from(path),
                    None => default_socket_path()?,
                },
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "LISTEN_TYPE",
                    value: other.to_string(),
                });
            }
        };

        let database = DatabaseConfig {
            url: database_url(&lookup)?,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            connect_timeout: seconds_or(&lookup, "DB_CONNECT_TIMEOUT_SECS", DEFAULT_DB_CONNECT_TIMEOUT)?,
        };

        Ok(Config {
            listen,
            database,
            request_timeout: seconds_or(&lookup, "REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT)?,
            shutdown_timeout: seconds_or(&lookup, "SHUTDOWN_TIMEOUT_SECS", DEFAULT_SHUTDOWN_TIMEOUT)?,
            log_file: lookup("LOG_FILE").map(PathBuf::from),
        })
    }
}

fn database_url<F>(lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("DATABASE_URL") {
        return Ok(url);
    }

    let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));
    let user = required("POSTGRES_USER").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
    let password = required("POSTGRES_PASSWORD")?;
    let host = required("POSTGRES_HOST")?;
    let db_name = required("POSTGRES_DB")?;
    let port: u16 = parse_or(lookup, "POSTGRES_PORT", DEFAULT_POSTGRES_PORT)?;

    Ok(format!("postgresql://{user}:{password}@{host}:{port}/{db_name}"))
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

fn seconds_or<F>(lookup: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(lookup, key, default.as_secs()).map(Duration::from_secs)
}

fn default_socket_path() -> Result<PathBuf, ConfigError> {
    let exe = env::current_exe()?;
    let dir = exe.parent().map(PathBuf::from).unwrap_or_default();
    Ok(dir.join(DEFAULT_SOCKET_NAME))
}
