use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Extra wait on every PUT and DELETE, so optimistic and pessimistic updates feel different.
    pub mutation_delay: Duration,
    /// Simulated store latency. Single-record lookups take half of it.
    pub db_latency: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            mutation_delay: Duration::from_millis(1500),
            db_latency: Duration::from_millis(100),
        }
    }
}

impl Config {
    /// Reads `TODO_BIND_ADDR`, `TODO_MUTATION_DELAY_MS` and `TODO_DB_LATENCY_MS`, loading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            log::warn!("Ignoring unreadable .env file: {e}");
        }

        let defaults = Self::default();
        Ok(Self {
            bind_addr: var("TODO_BIND_ADDR", "a socket address")?.unwrap_or(defaults.bind_addr),
            mutation_delay: var("TODO_MUTATION_DELAY_MS", "a number of milliseconds")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.mutation_delay),
            db_latency: var("TODO_DB_LATENCY_MS", "a number of milliseconds")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.db_latency),
        })
    }

    /// Ephemeral port, no artificial delays.
    pub fn for_tests() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            mutation_delay: Duration::ZERO,
            db_latency: Duration::ZERO,
        }
    }
}

fn var<T: FromStr>(name: &'static str, expected: &'static str) -> Result<Option<T>, ConfigError> {
    let Ok(value) = std::env::var(name) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::Invalid {
            name,
            value,
            expected,
        })
}
