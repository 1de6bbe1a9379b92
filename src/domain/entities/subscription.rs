use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    PastDue,
    Unpaid,
    Trialing,
    Incomplete,
    IncompleteExpired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::IncompleteExpired => "incomplete_expired",
        }
    }

    /// Convert from the billing provider's subscription status string.
    /// Unknown strings map to `Incomplete` - never grant access by default.
    pub fn from_provider(s: &str) -> Self {
        match s {
            "active" => SubscriptionStatus::Active,
            "canceled" => SubscriptionStatus::Canceled,
            "past_due" => SubscriptionStatus::PastDue,
            "unpaid" => SubscriptionStatus::Unpaid,
            "trialing" => SubscriptionStatus::Trialing,
            "incomplete" => SubscriptionStatus::Incomplete,
            "incomplete_expired" => SubscriptionStatus::IncompleteExpired,
            _ => SubscriptionStatus::Incomplete,
        }
    }
}

/// Local mirror of a billing-provider subscription, owned one-to-one by a user.
///
/// Mutated exclusively through the reconciler and the cancel workflow; never
/// hard-deleted by the billing subsystem (cancellation is a status change).
#[derive(Debug, Clone, Serialize)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: SubscriptionStatus,
    pub provider_subscription_id: Option<String>,
    pub provider_customer_id: Option<String>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub trial_end: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Subscription {
    /// Active means the status grants access and the paid period has not
    /// lapsed. A missing period end counts as active (trial-only records).
    pub fn is_active(&self) -> bool {
        match self.status {
            SubscriptionStatus::Active | SubscriptionStatus::Trialing => {
                match self.current_period_end {
                    Some(end) => Utc::now() < end,
                    None => true,
                }
            }
            _ => false,
        }
    }

    pub fn is_in_trial(&self) -> bool {
        self.status == SubscriptionStatus::Trialing
            && self.trial_end.is_some_and(|end| Utc::now() < end)
    }

    pub fn days_until_renewal(&self) -> Option<i64> {
        self.current_period_end
            .map(|end| (end - Utc::now()).num_days().max(0))
    }
}
