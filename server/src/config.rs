use chrono::Duration;
use recipebox_core::DifficultyPolicy;
use std::{env, fmt::Display, ops::RangeInclusive, str::FromStr};
use thiserror::Error;
use tracing::info;

/// Sessions may live between one day and ten years.
pub const SESSION_TTL_DAYS_RANGE: RangeInclusive<i64> = 1..=3650;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Settings read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub bind_address: String,
    pub session_ttl: Duration,
    pub difficulty: DifficultyPolicy,
    /// Adds an X-DB-Query-Count header to every response
    pub track_db_query_count: bool,
    /// Minimal argon2 parameters. Dev/test only.
    pub insecure_password_hashing: bool,
    /// Mark the session cookie `Secure` (HTTPS only)
    pub secure_cookies: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            bind_address: "0.0.0.0:3000".to_string(),
            session_ttl: Duration::days(30),
            difficulty: DifficultyPolicy::default(),
            track_db_query_count: false,
            insecure_password_hashing: false,
            secure_cookies: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();
        let default_policy = defaults.difficulty;

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok(),
            bind_address: try_load("BIND_ADDRESS", defaults.bind_address)?,
            session_ttl: session_ttl(try_load("SESSION_TTL_DAYS", 30i64)?)?,
            difficulty: DifficultyPolicy {
                short_time_minutes: in_range(
                    "DIFFICULTY_SHORT_TIME_MINUTES",
                    try_load(
                        "DIFFICULTY_SHORT_TIME_MINUTES",
                        default_policy.short_time_minutes,
                    )?,
                    0..=i32::MAX,
                )?,
                few_ingredients: try_load(
                    "DIFFICULTY_FEW_INGREDIENTS",
                    default_policy.few_ingredients,
                )?,
            },
            track_db_query_count: flag("TRACK_DB_QUERY_COUNT"),
            insecure_password_hashing: env::var("INSECURE_PASSWORD_HASHING").is_ok(),
            secure_cookies: flag("SESSION_COOKIE_SECURE"),
        })
    }

    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL"))
    }
}

fn try_load<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value,
            reason: e.to_string(),
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn in_range<T>(key: &'static str, value: T, range: RangeInclusive<T>) -> Result<T, ConfigError>
where
    T: PartialOrd + Display,
{
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: format!("must be between {} and {}", range.start(), range.end()),
        })
    }
}

fn session_ttl(days: i64) -> Result<Duration, ConfigError> {
    let days = in_range("SESSION_TTL_DAYS", days, SESSION_TTL_DAYS_RANGE)?;
    Duration::try_days(days).ok_or_else(|| ConfigError::Invalid {
        key: "SESSION_TTL_DAYS",
        value: days.to_string(),
        reason: "out of range".to_string(),
    })
}

fn flag(key: &str) -> bool {
    env::var(key).map(|v| v == "1").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.session_ttl, Duration::days(30));
        assert_eq!(config.difficulty.short_time_minutes, 10);
        assert_eq!(config.difficulty.few_ingredients, 4);
        assert!(matches!(
            config.require_database_url(),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
    }

    #[test]
    fn test_try_load_parses_and_rejects() {
        // Keys unique to this test so parallel tests don't collide
        env::set_var("RECIPEBOX_TEST_NUMBER", " 42 ");
        assert_eq!(try_load("RECIPEBOX_TEST_NUMBER", 7i32).unwrap(), 42);

        env::set_var("RECIPEBOX_TEST_BAD", "soon");
        assert!(matches!(
            try_load("RECIPEBOX_TEST_BAD", 7i32),
            Err(ConfigError::Invalid { key: "RECIPEBOX_TEST_BAD", .. })
        ));

        assert_eq!(try_load("RECIPEBOX_TEST_UNSET", 7i32).unwrap(), 7);
    }

    #[test]
    fn test_session_ttl_bounds() {
        assert_eq!(session_ttl(30).unwrap(), Duration::days(30));
        assert_eq!(session_ttl(3650).unwrap(), Duration::days(3650));

        for days in [0, -5, 3651, 100_000_000, i64::MAX, i64::MIN] {
            assert!(
                matches!(
                    session_ttl(days),
                    Err(ConfigError::Invalid { key: "SESSION_TTL_DAYS", .. })
                ),
                "{days} days accepted"
            );
        }
    }

    #[test]
    fn test_longest_session_ttl_fits_in_a_timestamp() {
        let ttl = session_ttl(*SESSION_TTL_DAYS_RANGE.end()).unwrap();
        assert!(chrono::Utc::now().checked_add_signed(ttl).is_some());
    }

    #[test]
    fn test_negative_short_time_rejected() {
        assert_eq!(in_range("DIFFICULTY_SHORT_TIME_MINUTES", 0, 0..=i32::MAX).unwrap(), 0);
        let err = in_range("DIFFICULTY_SHORT_TIME_MINUTES", -1, 0..=i32::MAX).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid DIFFICULTY_SHORT_TIME_MINUTES value \"-1\": must be between 0 and 2147483647"
        );
    }
}
