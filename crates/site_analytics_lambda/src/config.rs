use std::time::Duration;

use crate::error::ConfigError;
use crate::runtime::contract::{DEFAULT_COUNTER_TABLE, DEFAULT_DATABASE, DEFAULT_TABLE};
use crate::runtime::queries::Denylist;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 30;

pub const ENV_OUTPUT_LOCATION: &str = "ATHENA_OUTPUT_LOCATION";
pub const ENV_TOPIC_ARN: &str = "SNS_TOPIC_ARN";
pub const ENV_FILTERED_IPS: &str = "FILTERED_IPS";
pub const ENV_DATABASE: &str = "DATABASE";
pub const ENV_TABLE: &str = "TABLE";
pub const ENV_POLL_INTERVAL_MS: &str = "QUERY_POLL_INTERVAL_MS";
pub const ENV_MAX_POLL_ATTEMPTS: &str = "QUERY_MAX_POLL_ATTEMPTS";
pub const ENV_COUNTER_TABLE: &str = "COUNTER_TABLE";

/// Bounded busy-poll: `max_attempts` status checks, `interval` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    pub database: String,
    pub table: String,
    pub output_location: String,
    pub topic_arn: String,
    pub denylist: Denylist,
    pub poll: PollSettings,
}

impl ReportConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let denylist = lookup(ENV_FILTERED_IPS)
            .map(|raw| Denylist::parse(&raw))
            .ok_or(ConfigError::Missing(ENV_FILTERED_IPS))?;

        let interval = match non_empty(&lookup, ENV_POLL_INTERVAL_MS) {
            Some(raw) => Duration::from_millis(parse_number(ENV_POLL_INTERVAL_MS, &raw)?),
            None => DEFAULT_POLL_INTERVAL,
        };
        let max_attempts = match non_empty(&lookup, ENV_MAX_POLL_ATTEMPTS) {
            Some(raw) => parse_number(ENV_MAX_POLL_ATTEMPTS, &raw)?,
            None => DEFAULT_MAX_POLL_ATTEMPTS,
        };
        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                name: ENV_MAX_POLL_ATTEMPTS,
                message: "must be a positive integer".to_string(),
            });
        }

        Ok(Self {
            database: non_empty(&lookup, ENV_DATABASE)
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            table: non_empty(&lookup, ENV_TABLE).unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            output_location: required(&lookup, ENV_OUTPUT_LOCATION)?,
            topic_arn: required(&lookup, ENV_TOPIC_ARN)?,
            denylist,
            poll: PollSettings {
                interval,
                max_attempts,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterConfig {
    pub table: String,
}

impl CounterConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            table: non_empty(&lookup, ENV_COUNTER_TABLE)
                .unwrap_or_else(|| DEFAULT_COUNTER_TABLE.to_string()),
        }
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    non_empty(lookup, name).ok_or(ConfigError::Missing(name))
}

fn parse_number<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|error: T::Err| ConfigError::Invalid {
        name,
        message: error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| values.get(name).cloned()
    }

    fn required_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_OUTPUT_LOCATION, "s3://athena-results/"),
            (ENV_TOPIC_ARN, "arn:aws:sns:us-east-1:123456789012:reports"),
            (ENV_FILTERED_IPS, "1.2.3.4, 5.6.7.8"),
        ]
    }

    #[test]
    fn applies_defaults_for_optional_values() {
        let config = ReportConfig::from_lookup(lookup(&required_vars())).expect("config loads");

        assert_eq!(config.database, "cloudfront_logs_db");
        assert_eq!(config.table, "cloudfront_logs");
        assert_eq!(config.poll, PollSettings::default());
        assert_eq!(config.poll.max_attempts, 30);
        assert_eq!(config.poll.interval, Duration::from_secs(1));
        assert_eq!(config.denylist.addresses(), ["1.2.3.4", "5.6.7.8"]);
    }

    #[test]
    fn rejects_missing_topic() {
        let vars: Vec<_> = required_vars()
            .into_iter()
            .filter(|(key, _)| *key != ENV_TOPIC_ARN)
            .collect();

        let error = ReportConfig::from_lookup(lookup(&vars)).expect_err("topic is required");
        assert_eq!(error, ConfigError::Missing(ENV_TOPIC_ARN));
        assert_eq!(error.to_string(), "SNS_TOPIC_ARN must be configured");
    }

    #[test]
    fn empty_filtered_ips_is_allowed_but_absence_is_not() {
        let mut vars = required_vars();
        vars.retain(|(key, _)| *key != ENV_FILTERED_IPS);

        let error = ReportConfig::from_lookup(lookup(&vars)).expect_err("denylist is required");
        assert_eq!(error, ConfigError::Missing(ENV_FILTERED_IPS));

        vars.push((ENV_FILTERED_IPS, ""));
        let config = ReportConfig::from_lookup(lookup(&vars)).expect("empty denylist loads");
        assert!(config.denylist.is_empty());
    }

    #[test]
    fn overrides_poll_settings() {
        let mut vars = required_vars();
        vars.push((ENV_POLL_INTERVAL_MS, "250"));
        vars.push((ENV_MAX_POLL_ATTEMPTS, "12"));

        let config = ReportConfig::from_lookup(lookup(&vars)).expect("config loads");
        assert_eq!(
            config.poll,
            PollSettings {
                interval: Duration::from_millis(250),
                max_attempts: 12,
            }
        );
    }

    #[test]
    fn rejects_zero_or_malformed_attempts() {
        let mut vars = required_vars();
        vars.push((ENV_MAX_POLL_ATTEMPTS, "0"));
        assert!(matches!(
            ReportConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid {
                name: ENV_MAX_POLL_ATTEMPTS,
                ..
            })
        ));

        let mut vars = required_vars();
        vars.push((ENV_POLL_INTERVAL_MS, "soon"));
        assert!(matches!(
            ReportConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid {
                name: ENV_POLL_INTERVAL_MS,
                ..
            })
        ));
    }

    #[test]
    fn counter_table_defaults_and_overrides() {
        assert_eq!(
            CounterConfig::from_lookup(lookup(&[])).table,
            "cloud-resume-visitor-counter"
        );
        assert_eq!(
            CounterConfig::from_lookup(lookup(&[(ENV_COUNTER_TABLE, "visits")])).table,
            "visits"
        );
    }
}
