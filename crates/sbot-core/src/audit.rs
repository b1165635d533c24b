use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::Serialize;

use crate::{errors::Error, Result};

#[derive(Clone, Debug, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: String,

    pub admin_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl AuditEvent {
    fn base(event: &str, admin_id: Option<i64>, admin_username: Option<&str>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event: event.to_string(),
            admin_id,
            admin_username: admin_username.map(|s| s.to_string()),
            target_id: None,
            plan: None,
            valid_until: None,
            command: None,
        }
    }

    pub fn approval(
        event: &str,
        admin_id: i64,
        admin_username: Option<&str>,
        target_id: i64,
        plan: i64,
        valid_until: &str,
    ) -> Self {
        Self {
            target_id: Some(target_id),
            plan: Some(plan),
            valid_until: Some(valid_until.to_string()),
            ..Self::base(event, Some(admin_id), admin_username)
        }
    }

    pub fn denied(user_id: Option<i64>, username: Option<&str>, command: &str) -> Self {
        Self {
            command: Some(command.to_string()),
            ..Self::base("denied", user_id, username)
        }
    }
}

/// Append-only audit file for admin actions.
#[derive(Clone, Debug)]
pub struct AuditLogger {
    path: PathBuf,
    json: bool,
}

impl AuditLogger {
    pub fn new(path: impl Into<PathBuf>, json: bool) -> Self {
        Self {
            path: path.into(),
            json,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, event: &AuditEvent) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if self.json {
            let line = serde_json::to_string(event)?;
            writeln!(file, "{line}")?;
            return Ok(());
        }

        // Plain text format for readability.
        let mut out = String::new();
        out.push('\n');
        out.push_str(&"=".repeat(60));

        let value = serde_json::to_value(event)?;
        let Some(obj) = value.as_object() else {
            return Err(Error::External(
                "audit event is not a JSON object".to_string(),
            ));
        };
        for (k, v) in obj {
            out.push('\n');
            out.push_str(k);
            out.push_str(": ");
            match v {
                serde_json::Value::String(s) => out.push_str(s),
                serde_json::Value::Null => out.push('-'),
                other => out.push_str(&other.to_string()),
            }
        }
        out.push('\n');

        file.write_all(out.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn tmp_file(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_millis();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}.log"))
    }

    #[test]
    fn json_lines_append() {
        let log = AuditLogger::new(tmp_file("sbot-audit-json"), true);
        log.write(&AuditEvent::approval("approve", 1, Some("boss"), 42, 2, "2026-11-18"))
            .unwrap();
        log.write(&AuditEvent::approval("disapprove", 1, None, 42, 0, "")).unwrap();

        let written = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<serde_json::Value> = written
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "approve");
        assert_eq!(lines[0]["target_id"], 42);
        assert_eq!(lines[0]["valid_until"], "2026-11-18");
        assert_eq!(lines[1]["event"], "disapprove");
        assert!(lines[1].get("admin_username").is_none());

        let _ = std::fs::remove_file(log.path());
    }

    #[test]
    fn text_blocks_list_fields() {
        let log = AuditLogger::new(tmp_file("sbot-audit-text"), false);
        log.write(&AuditEvent::denied(None, Some("mallory"), "approve"))
            .unwrap();

        let written = std::fs::read_to_string(log.path()).unwrap();
        assert!(written.contains("event: denied"));
        assert!(written.contains("admin_id: -"));
        assert!(written.contains("command: approve"));

        let _ = std::fs::remove_file(log.path());
    }
}
