use chrono::NaiveDate;

use crate::domain::UserId;

/// Subscription record for one user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserApproval {
    pub user_id: UserId,
    /// `0` means not approved (free tier); any positive value is an active tier.
    pub plan: i64,
    /// Expiry date as stored (ISO `YYYY-MM-DD`). `None` when absent or empty.
    pub valid_until: Option<String>,
    pub access_count: i64,
}

impl UserApproval {
    /// A record counts as approved only while its plan is positive.
    pub fn is_approved(&self) -> bool {
        self.plan > 0
    }

    pub fn role_label(&self) -> &'static str {
        if self.is_approved() {
            "User"
        } else {
            NOT_APPROVED
        }
    }

    pub fn expiry_label(&self) -> &str {
        self.valid_until.as_deref().unwrap_or(NOT_APPROVED)
    }
}

pub const NOT_APPROVED: &str = "Not Approved";

/// The full set of fields written by an approve/disapprove transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApprovalUpdate {
    pub plan: i64,
    pub valid_until: Option<NaiveDate>,
    pub access_count: i64,
}

impl ApprovalUpdate {
    pub fn approve(plan: i64, valid_until: NaiveDate) -> Self {
        Self {
            plan,
            valid_until: Some(valid_until),
            access_count: 0,
        }
    }

    pub fn disapprove() -> Self {
        Self {
            plan: 0,
            valid_until: None,
            access_count: 0,
        }
    }

    /// Stored form of `valid_until`: ISO date, or the empty string when revoked.
    pub fn valid_until_str(&self) -> String {
        self.valid_until
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }

    /// The record a store holds after applying this update to `user_id`.
    pub fn to_record(&self, user_id: UserId) -> UserApproval {
        let valid_until = Some(self.valid_until_str()).filter(|s| !s.is_empty());
        UserApproval {
            user_id,
            plan: self.plan,
            valid_until,
            access_count: self.access_count,
        }
    }
}
