// Service configuration, read from the environment. Every value has a
// default so a bare `cargo run` talks to a broker on localhost:1883.
use std::time::Duration;

use anyhow::anyhow;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MQTT_PORT: u16 = 1883;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub mqtt: MqttConfig,
    pub feeder: FeederCommand,
}

#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub credentials: Option<Credentials>,
    pub client_prefix: String,
    pub keep_alive: Duration,
    /// Upper bound for connect + publish + acknowledgement.
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub pass: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("pass", &"*******")
            .finish()
    }
}

/// What a `TurnOn` sends to the feeder. Always published retained so a
/// feeder that reconnects still picks up the last command.
#[derive(Debug, Clone, PartialEq)]
pub struct FeederCommand {
    pub topic: String,
    pub payload: String,
}

impl Default for FeederCommand {
    fn default() -> Self {
        FeederCommand {
            topic: "feeder".to_string(),
            payload: "7".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (host, port) = match (lookup("MQTT_HOST"), lookup("MQTT_PORT")) {
            (None, None) => ("localhost".to_string(), DEFAULT_MQTT_PORT),
            (Some(host), Some(port)) => {
                let port = port.trim().parse::<u16>().map_err(|e| {
                    anyhow!("Invalid MQTT_PORT value, expected a number, got: {}", e)
                })?;
                (host, port)
            }
            (Some(host), None) => (host, DEFAULT_MQTT_PORT),
            (None, Some(_)) => {
                return Err(anyhow!("MQTT_HOST must be set if MQTT_PORT is provided"));
            }
        };

        let credentials = match (lookup("MQTT_USER"), lookup("MQTT_PASS")) {
            (Some(user), Some(pass)) => Some(Credentials { user, pass }),
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!(
                    "MQTT credentials incomplete: both MQTT_USER and MQTT_PASS must be set to enable auth"
                );
                None
            }
            (None, None) => None,
        };

        let defaults = FeederCommand::default();

        Ok(Config {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            mqtt: MqttConfig {
                host,
                port,
                credentials,
                client_prefix: lookup("MQTT_CLIENT_PREFIX")
                    .unwrap_or_else(|| "feeder_skill_".to_string()),
                keep_alive: Duration::from_secs(parse_secs_or(&lookup, "MQTT_KEEP_ALIVE_SECS", 5)),
                timeout: Duration::from_secs(parse_secs_or(&lookup, "MQTT_TIMEOUT_SECS", 10)),
            },
            feeder: FeederCommand {
                topic: lookup("FEEDER_TOPIC").unwrap_or(defaults.topic),
                payload: lookup("FEEDER_PAYLOAD").unwrap_or(defaults.payload),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(val) => match val.trim().parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, key, e);
                default
            }
        },
        None => default,
    }
}

/// Like `parse_or`, but a zero duration would fail every publish at once,
/// so it falls back to the default too.
fn parse_secs_or<F>(lookup: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(lookup, key, default) {
        0 => {
            tracing::warn!("{} must be greater than zero. Using default {}.", key, default);
            default
        }
        secs => secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.mqtt.host, "localhost");
        assert_eq!(config.mqtt.port, 1883);
        assert!(config.mqtt.credentials.is_none());
        assert_eq!(config.mqtt.timeout, Duration::from_secs(10));
        assert_eq!(config.feeder, FeederCommand::default());
        assert_eq!(config.feeder.topic, "feeder");
        assert_eq!(config.feeder.payload, "7");
    }

    #[test]
    fn test_host_and_port() {
        let config = config_from(&[("MQTT_HOST", "m23.example.com"), ("MQTT_PORT", " 13469 ")]).unwrap();
        assert_eq!(config.mqtt.host, "m23.example.com");
        assert_eq!(config.mqtt.port, 13469);

        let host_only = config_from(&[("MQTT_HOST", "broker")]).unwrap();
        assert_eq!(host_only.mqtt.port, DEFAULT_MQTT_PORT);
    }

    #[test]
    fn test_port_errors() {
        assert!(config_from(&[("MQTT_PORT", "1883")]).is_err());
        assert!(config_from(&[("MQTT_HOST", "broker"), ("MQTT_PORT", "abc")]).is_err());
    }

    #[test]
    fn test_credentials_need_both_halves() {
        let full = config_from(&[("MQTT_USER", "feeder"), ("MQTT_PASS", "secret")]).unwrap();
        let creds = full.mqtt.credentials.expect("credentials set");
        assert_eq!(creds.user, "feeder");
        assert!(!format!("{:?}", creds).contains("secret"));

        let half = config_from(&[("MQTT_USER", "feeder")]).unwrap();
        assert!(half.mqtt.credentials.is_none());
    }

    #[test]
    fn test_bad_timeout_falls_back() {
        let config = config_from(&[("MQTT_TIMEOUT_SECS", "soon"), ("FEEDER_PAYLOAD", "3")]).unwrap();
        assert_eq!(config.mqtt.timeout, Duration::from_secs(10));
        assert_eq!(config.feeder.payload, "3");
    }

    #[test]
    fn test_zero_durations_fall_back() {
        let config = config_from(&[("MQTT_TIMEOUT_SECS", "0"), ("MQTT_KEEP_ALIVE_SECS", "0")]).unwrap();
        assert_eq!(config.mqtt.timeout, Duration::from_secs(10));
        assert_eq!(config.mqtt.keep_alive, Duration::from_secs(5));

        let custom = config_from(&[("MQTT_TIMEOUT_SECS", "3")]).unwrap();
        assert_eq!(custom.mqtt.timeout, Duration::from_secs(3));
    }
}
