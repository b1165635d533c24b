use chrono::{Days, NaiveDate};

use crate::{approval::model::ApprovalUpdate, domain::UserId};

pub const FORMAT_HELP: &str =
    "Invalid command format. Use /approve <user_id> <plan> <days> or /disapprove <user_id>.";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("missing arguments")]
    MissingArgs,

    #[error("argument {position} is not a valid number: {value:?}")]
    InvalidNumber { position: usize, value: String },
}

/// Split `/cmd@botname arg1 ...` into the command name and its raw arguments.
///
/// The name keeps its case: `/Approve` is not `/approve`.
pub fn parse_command(text: &str) -> (String, String) {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_string();

    (cmd, rest)
}

/// `/approve` or `/disapprove` with validated arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdminCommand {
    Approve { target: UserId, plan: i64, days: i64 },
    Disapprove { target: UserId },
}

impl AdminCommand {
    /// Parse the arguments that follow `approve`/`disapprove`.
    ///
    /// Positions count the command itself as 1, so the target id is position 2.
    pub fn parse(approve: bool, args: &str) -> Result<Self, CommandError> {
        let tokens: Vec<&str> = args.split_whitespace().collect();
        let Some(raw_target) = tokens.first() else {
            return Err(CommandError::MissingArgs);
        };
        let target = UserId(parse_int(raw_target, 2)?);

        if !approve {
            return Ok(Self::Disapprove { target });
        }

        let plan = tokens.get(1).map(|t| parse_int(t, 3)).transpose()?.unwrap_or(0);
        if plan < 0 {
            return Err(CommandError::InvalidNumber {
                position: 3,
                value: plan.to_string(),
            });
        }
        let days = tokens.get(2).map(|t| parse_int(t, 4)).transpose()?.unwrap_or(0);

        Ok(Self::Approve { target, plan, days })
    }

    pub fn target(&self) -> UserId {
        match self {
            Self::Approve { target, .. } | Self::Disapprove { target } => *target,
        }
    }

    /// Fields to store for this command, with expiry computed from `today`.
    pub fn update_on(&self, today: NaiveDate) -> Result<ApprovalUpdate, CommandError> {
        match *self {
            Self::Approve { plan, days, .. } => {
                Ok(ApprovalUpdate::approve(plan, expiry_date(today, days)?))
            }
            Self::Disapprove { .. } => Ok(ApprovalUpdate::disapprove()),
        }
    }

    /// Confirmation text sent to the requester and the broadcast channel.
    pub fn confirmation(&self) -> String {
        match self {
            Self::Approve { target, plan, days } => {
                format!("User {} approved with plan {plan} for {days} days.", target.0)
            }
            Self::Disapprove { target } => {
                format!("User {} disapproved and reverted to free.", target.0)
            }
        }
    }
}

/// `today + days` calendar days when `days > 0`, otherwise `today`.
pub fn expiry_date(today: NaiveDate, days: i64) -> Result<NaiveDate, CommandError> {
    if days <= 0 {
        return Ok(today);
    }
    today
        .checked_add_days(Days::new(days as u64))
        .ok_or(CommandError::InvalidNumber {
            position: 4,
            value: days.to_string(),
        })
}

fn parse_int(token: &str, position: usize) -> Result<i64, CommandError> {
    token
        .parse::<i64>()
        .map_err(|_| CommandError::InvalidNumber {
            position,
            value: token.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_command_strips_bot_suffix() {
        assert_eq!(
            parse_command("/approve@secure_bot 1 2 3"),
            ("approve".to_string(), "1 2 3".to_string())
        );
        assert_eq!(
            parse_command("/APPROVE 1 2 3"),
            ("APPROVE".to_string(), "1 2 3".to_string())
        );
        assert_eq!(
            parse_command("/disapprove"),
            ("disapprove".to_string(), "".to_string())
        );
    }

    #[test]
    fn approve_defaults_plan_and_days() {
        assert_eq!(
            AdminCommand::parse(true, "123"),
            Ok(AdminCommand::Approve {
                target: UserId(123),
                plan: 0,
                days: 0
            })
        );
    }

    #[test]
    fn approve_ignores_extra_tokens() {
        assert_eq!(
            AdminCommand::parse(true, "5 2 30 junk more"),
            Ok(AdminCommand::Approve {
                target: UserId(5),
                plan: 2,
                days: 30
            })
        );
    }

    #[test]
    fn missing_target_is_reported() {
        assert_eq!(AdminCommand::parse(true, ""), Err(CommandError::MissingArgs));
        assert_eq!(AdminCommand::parse(false, "  "), Err(CommandError::MissingArgs));
    }

    #[test]
    fn non_integer_tokens_are_reported() {
        assert_eq!(
            AdminCommand::parse(true, "abc"),
            Err(CommandError::InvalidNumber {
                position: 2,
                value: "abc".to_string()
            })
        );
        assert_eq!(
            AdminCommand::parse(true, "1 gold"),
            Err(CommandError::InvalidNumber {
                position: 3,
                value: "gold".to_string()
            })
        );
        assert_eq!(
            AdminCommand::parse(true, "1 2 3.5"),
            Err(CommandError::InvalidNumber {
                position: 4,
                value: "3.5".to_string()
            })
        );
        assert!(AdminCommand::parse(true, "1 -1").is_err());
    }

    #[test]
    fn disapprove_ignores_trailing_tokens() {
        assert_eq!(
            AdminCommand::parse(false, "9 not numbers"),
            Ok(AdminCommand::Disapprove { target: UserId(9) })
        );
    }

    #[test]
    fn expiry_uses_calendar_days() {
        let today = date(2024, 2, 28);
        assert_eq!(expiry_date(today, 0).unwrap(), today);
        assert_eq!(expiry_date(today, -3).unwrap(), today);
        assert_eq!(expiry_date(today, 1).unwrap(), date(2024, 2, 29));
        assert_eq!(expiry_date(today, 2).unwrap(), date(2024, 3, 1));
        assert_eq!(expiry_date(date(2026, 12, 31), 1).unwrap(), date(2027, 1, 1));
        assert!(expiry_date(today, i64::MAX).is_err());
    }

    #[test]
    fn confirmations_match_command() {
        let a = AdminCommand::Approve {
            target: UserId(1),
            plan: 2,
            days: 30,
        };
        assert_eq!(a.confirmation(), "User 1 approved with plan 2 for 30 days.");
        let d = AdminCommand::Disapprove { target: UserId(1) };
        assert_eq!(d.confirmation(), "User 1 disapproved and reverted to free.");
        assert_eq!(d.update_on(date(2026, 1, 1)), Ok(ApprovalUpdate::disapprove()));
    }
}
