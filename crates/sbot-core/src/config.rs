use std::{env, fs, path::Path, path::PathBuf, time::Duration};

use crate::{domain::ChatId, errors::Error, supervisor::FailurePolicy, Result};

/// Channel that mirrors every approval confirmation. Admin rights are checked here too.
pub const BROADCAST_CHANNEL_ID: ChatId = ChatId(-1002156421934);

/// Channel that receives handler failure reports.
pub const ERROR_CHANNEL_ID: ChatId = ChatId(-1002156421934);

const DEFAULT_DATABASE: &str = "rishi";
const DEFAULT_COLLECTION: &str = "users";

/// Typed configuration for the bot.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub mongodb_collection: String,

    // Fixed channels
    pub broadcast_channel: ChatId,
    pub error_channel: ChatId,

    // Polling
    pub poll_timeout: Duration,
    pub restart_delay: Duration,
    pub failure_policy: FailurePolicy,

    // Audit
    pub audit_log_path: Option<PathBuf>,
    pub audit_log_json: bool,
}

impl Config {
    /// Load from `.env` (if present) and the process environment.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // Required env vars
        let telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;
        let mongodb_uri = lookup("MONGODB_URI").and_then(non_empty).ok_or_else(|| {
            Error::Config("MONGODB_URI environment variable is required".to_string())
        })?;

        let mongodb_database = lookup("MONGODB_DATABASE")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let mongodb_collection = lookup("MONGODB_COLLECTION")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());

        // Polling
        let poll_timeout =
            Duration::from_secs(parse_u64(&lookup, "POLL_TIMEOUT_SECS")?.unwrap_or(20));
        let restart_delay =
            Duration::from_millis(parse_u64(&lookup, "POLL_RESTART_DELAY_MS")?.unwrap_or(1000));
        let failure_policy = match lookup("POLL_FAILURE_POLICY").and_then(non_empty) {
            None => FailurePolicy::Restart,
            Some(v) => v.parse::<FailurePolicy>()?,
        };

        // Audit logging
        let audit_log_path = lookup("AUDIT_LOG_PATH")
            .and_then(non_empty)
            .map(PathBuf::from);
        let audit_log_json = lookup("AUDIT_LOG_JSON")
            .map(|s| parse_bool(&s))
            .unwrap_or(false);

        Ok(Self {
            telegram_bot_token,
            mongodb_uri,
            mongodb_database,
            mongodb_collection,
            broadcast_channel: BROADCAST_CHANNEL_ID,
            error_channel: ERROR_CHANNEL_ID,
            poll_timeout,
            restart_delay,
            failure_policy,
            audit_log_path,
            audit_log_json,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = &val[1..val.len() - 1];
        }

        out.push((key.to_string(), val.to_string()));
    }
    out
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    let Some(raw) = lookup(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
