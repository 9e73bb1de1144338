//! Bot configuration from the environment.

use crate::engine::EngineConfig;
use crate::error::{Error, Result};
use grapevine_invites::RegistryLimits;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// How long an issued invite link stays usable.
pub const INVITE_VALIDITY: Duration = Duration::from_secs(5 * 60);

const DEFAULT_API_URL: &str = "https://api.telegram.org";
const DEFAULT_ROOM_NAME: &str = "the group";
const DEFAULT_INVITE_COMMAND: &str = "/invite";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_INVITE_RETENTION_SECS: u64 = 2 * 5 * 60;
const DEFAULT_INVITE_CAPACITY: usize = 10_000;

/// Configuration for the bot process.
#[derive(Clone)]
pub struct BotConfig {
    /// Append-only graph log
    pub graph_log_path: PathBuf,

    /// Bot API credential
    pub api_token: String,

    /// Room that invite links admit to
    pub room_id: i64,

    /// Room name used in invite replies
    pub room_name: String,

    /// Command that requests an invite link
    pub invite_command: String,

    /// Bot API base URL
    pub api_url: String,

    /// Long-poll timeout for getUpdates
    pub poll_timeout: Duration,

    /// How long registered invites stay resolvable
    pub invite_retention: Duration,

    /// Maximum number of live registered invites
    pub invite_capacity: usize,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("graph_log_path", &self.graph_log_path)
            .field("api_token", &"<redacted>")
            .field("room_id", &self.room_id)
            .field("room_name", &self.room_name)
            .field("invite_command", &self.invite_command)
            .field("api_url", &self.api_url)
            .field("poll_timeout", &self.poll_timeout)
            .field("invite_retention", &self.invite_retention)
            .field("invite_capacity", &self.invite_capacity)
            .finish()
    }
}

impl BotConfig {
    /// Load config from environment variables.
    ///
    /// `GRAPH_LOG_PATH`, `TELEGRAM_BOT_API_KEY` and `ROOM_ID` are required;
    /// the `GRAPEVINE_*` variables fall back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let graph_log_path = get("GRAPH_LOG_PATH")
            .map(PathBuf::from)
            .ok_or(Error::MissingVar("GRAPH_LOG_PATH"))?;
        let api_token = get("TELEGRAM_BOT_API_KEY").ok_or(Error::MissingVar("TELEGRAM_BOT_API_KEY"))?;
        let room_id = get("ROOM_ID").ok_or(Error::MissingVar("ROOM_ID"))?;
        let room_id = parse_var("ROOM_ID", &room_id)?;

        let room_name = get("GRAPEVINE_ROOM_NAME").unwrap_or_else(|| DEFAULT_ROOM_NAME.to_string());
        let invite_command =
            get("GRAPEVINE_INVITE_COMMAND").unwrap_or_else(|| DEFAULT_INVITE_COMMAND.to_string());
        let api_url = get("GRAPEVINE_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let poll_timeout = match get("GRAPEVINE_POLL_TIMEOUT_SECS") {
            Some(v) => parse_var("GRAPEVINE_POLL_TIMEOUT_SECS", &v)?,
            None => DEFAULT_POLL_TIMEOUT_SECS,
        };
        let invite_retention = match get("GRAPEVINE_INVITE_RETENTION_SECS") {
            Some(v) => parse_var("GRAPEVINE_INVITE_RETENTION_SECS", &v)?,
            None => DEFAULT_INVITE_RETENTION_SECS,
        };
        let invite_capacity = match get("GRAPEVINE_INVITE_CAPACITY") {
            Some(v) => parse_var("GRAPEVINE_INVITE_CAPACITY", &v)?,
            None => DEFAULT_INVITE_CAPACITY,
        };

        if !invite_command.starts_with('/') {
            return Err(Error::InvalidVar {
                name: "GRAPEVINE_INVITE_COMMAND",
                reason: format!("{:?} does not start with '/'", invite_command),
            });
        }
        if invite_capacity == 0 {
            return Err(Error::InvalidVar {
                name: "GRAPEVINE_INVITE_CAPACITY",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            graph_log_path,
            api_token,
            room_id,
            room_name,
            invite_command,
            api_url,
            poll_timeout: Duration::from_secs(poll_timeout),
            invite_retention: Duration::from_secs(invite_retention),
            invite_capacity,
        })
    }

    /// HTTP timeout for Bot API calls; must outlast a long poll.
    pub fn request_timeout(&self) -> Duration {
        self.poll_timeout + Duration::from_secs(15)
    }

    /// Bounds for the invite registry.
    pub fn registry_limits(&self) -> RegistryLimits {
        RegistryLimits {
            retention: Some(self.invite_retention),
            capacity: Some(self.invite_capacity),
        }
    }

    /// Settings for the attribution engine.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            target_room: self.room_id,
            room_name: self.room_name.clone(),
            invite_command: self.invite_command.clone(),
            ..EngineConfig::new(self.room_id)
        }
    }
}

fn parse_var<T>(name: &'static str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| Error::InvalidVar {
        name,
        reason: format!("{:?}: {}", value, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("GRAPH_LOG_PATH", "/var/lib/grapevine/graph.jsonl"),
        ("TELEGRAM_BOT_API_KEY", "123:abc"),
        ("ROOM_ID", "-1001234567890"),
    ];

    #[test]
    fn required_vars_with_defaults() {
        let config = BotConfig::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.graph_log_path, PathBuf::from("/var/lib/grapevine/graph.jsonl"));
        assert_eq!(config.room_id, -1001234567890);
        assert_eq!(config.invite_command, "/invite");
        assert_eq!(config.api_url, "https://api.telegram.org");
        assert_eq!(config.poll_timeout, Duration::from_secs(60));
        assert_eq!(config.invite_retention, Duration::from_secs(600));
        assert_eq!(config.registry_limits().capacity, Some(10_000));
    }

    #[test]
    fn each_required_var_is_enforced() {
        for missing in ["GRAPH_LOG_PATH", "TELEGRAM_BOT_API_KEY", "ROOM_ID"] {
            let vars: Vec<_> = REQUIRED.iter().copied().filter(|(k, _)| *k != missing).collect();
            match BotConfig::from_lookup(lookup(&vars)) {
                Err(Error::MissingVar(name)) => assert_eq!(name, missing),
                other => panic!("expected missing {}, got {:?}", missing, other),
            }
        }
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let mut vars = REQUIRED.to_vec();
        vars[1] = ("TELEGRAM_BOT_API_KEY", "");
        assert!(matches!(
            BotConfig::from_lookup(lookup(&vars)),
            Err(Error::MissingVar("TELEGRAM_BOT_API_KEY"))
        ));
    }

    #[test]
    fn non_numeric_room_is_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars[2] = ("ROOM_ID", "hackerdrinks");
        assert!(matches!(
            BotConfig::from_lookup(lookup(&vars)),
            Err(Error::InvalidVar { name: "ROOM_ID", .. })
        ));
    }

    #[test]
    fn overrides_are_applied() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("GRAPEVINE_ROOM_NAME", "hackerdrinks"));
        vars.push(("GRAPEVINE_API_URL", "http://localhost:8081/"));
        vars.push(("GRAPEVINE_POLL_TIMEOUT_SECS", "5"));
        vars.push(("GRAPEVINE_INVITE_CAPACITY", "3"));

        let config = BotConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.room_name, "hackerdrinks");
        assert_eq!(config.api_url, "http://localhost:8081");
        assert_eq!(config.request_timeout(), Duration::from_secs(20));
        assert_eq!(config.invite_capacity, 3);
        assert_eq!(config.engine_config().room_name, "hackerdrinks");
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("GRAPEVINE_INVITE_CAPACITY", "0"));
        assert!(BotConfig::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let config = BotConfig::from_lookup(lookup(&REQUIRED)).unwrap();
        assert!(!format!("{:?}", config).contains("123:abc"));
    }
}
