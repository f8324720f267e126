//! Craftsman subscription lifecycle.
//!
//! State machine over a craftsman's subscription: INACTIVE -> ACTIVE via an
//! administrative approval, ACTIVE -> EXPIRED once the paid window lapses,
//! any state -> INACTIVE via rejection. Expiry is evaluated lazily at read
//! time; an operator CLI command persists lapsed rows in bulk.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Fixed policy window granted on approval.
pub const SUBSCRIPTION_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "ACTIVE",
            SubscriptionStatus::Inactive => "INACTIVE",
            SubscriptionStatus::Expired => "EXPIRED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ACTIVE" => Some(SubscriptionStatus::Active),
            "INACTIVE" => Some(SubscriptionStatus::Inactive),
            "EXPIRED" => Some(SubscriptionStatus::Expired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionPlan {
    Basic,
    Premium,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Basic => "BASIC",
            SubscriptionPlan::Premium => "PREMIUM",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "BASIC" => Some(SubscriptionPlan::Basic),
            "PREMIUM" => Some(SubscriptionPlan::Premium),
            _ => None,
        }
    }
}

/// Field changes produced by an approval. Valid from any state; re-approval
/// re-anchors the window to the time of the last call, it is not cumulative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    pub verified: bool,
    pub status: SubscriptionStatus,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

pub fn approve(now: DateTime<Utc>) -> Activation {
    Activation {
        verified: true,
        status: SubscriptionStatus::Active,
        start: now,
        end: now + Duration::days(SUBSCRIPTION_WINDOW_DAYS),
    }
}

/// Field changes produced by a rejection. Valid from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    pub verified: bool,
    pub status: SubscriptionStatus,
}

pub fn reject() -> Rejection {
    Rejection {
        verified: false,
        status: SubscriptionStatus::Inactive,
    }
}

/// Lazy expiry: the status a reader observes. Only ACTIVE rows expire; a
/// rejected (INACTIVE) row stays INACTIVE no matter how old its window is.
pub fn effective_status(
    stored: SubscriptionStatus,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> SubscriptionStatus {
    match (stored, end) {
        (SubscriptionStatus::Active, Some(end)) if now > end => SubscriptionStatus::Expired,
        _ => stored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approve_grants_a_thirty_day_window() {
        let now = Utc::now();
        let activation = approve(now);
        assert!(activation.verified);
        assert_eq!(activation.status, SubscriptionStatus::Active);
        assert_eq!(activation.start, now);
        assert_eq!(activation.end - activation.start, Duration::days(30));
    }

    #[test]
    fn reapproval_reanchors_instead_of_accumulating() {
        let first = approve(Utc::now());
        let later = first.start + Duration::days(10);
        let second = approve(later);
        assert_eq!(second.end, later + Duration::days(30));
        assert!(second.end < first.end + Duration::days(30));
    }

    #[test]
    fn reject_clears_verification_from_any_state() {
        let rejection = reject();
        assert!(!rejection.verified);
        assert_eq!(rejection.status, SubscriptionStatus::Inactive);
    }

    #[test]
    fn active_rows_expire_lazily() {
        let now = Utc::now();
        let lapsed = now - Duration::days(1);
        assert_eq!(
            effective_status(SubscriptionStatus::Active, Some(lapsed), now),
            SubscriptionStatus::Expired
        );
        assert_eq!(
            effective_status(SubscriptionStatus::Active, Some(now + Duration::days(5)), now),
            SubscriptionStatus::Active
        );
    }

    #[test]
    fn inactive_rows_never_auto_expire() {
        let now = Utc::now();
        let lapsed = now - Duration::days(400);
        assert_eq!(
            effective_status(SubscriptionStatus::Inactive, Some(lapsed), now),
            SubscriptionStatus::Inactive
        );
        assert_eq!(
            effective_status(SubscriptionStatus::Expired, None, now),
            SubscriptionStatus::Expired
        );
    }
}
