//! Accessor over the billing provider's subscription payloads.
//!
//! The same subscription fields arrive in two shapes: classic billing keeps
//! the current period on the top-level object, flexible (itemized) billing
//! moves it onto the first line item, and an older line-item shape nests it
//! under `period`. Wrapping the raw JSON in one accessor keeps that shape
//! juggling out of the reconciler.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

/// Billing-period timestamps as Unix seconds. Either side may be absent.
pub type PeriodBounds = (Option<i64>, Option<i64>);

pub fn timestamp_to_utc(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0)
}

#[derive(Debug, Clone, Copy)]
pub struct SubscriptionPayload<'a>(&'a JsonValue);

impl<'a> SubscriptionPayload<'a> {
    pub fn new(value: &'a JsonValue) -> Self {
        Self(value)
    }

    pub fn str_field(&self, field: &str) -> Option<&'a str> {
        self.0.get(field).and_then(JsonValue::as_str)
    }

    pub fn i64_field(&self, field: &str) -> Option<i64> {
        self.0.get(field).and_then(JsonValue::as_i64)
    }

    pub fn bool_field(&self, field: &str) -> Option<bool> {
        self.0.get(field).and_then(JsonValue::as_bool)
    }

    pub fn id(&self) -> Option<&'a str> {
        self.str_field("id")
    }

    pub fn status(&self) -> Option<&'a str> {
        self.str_field("status")
    }

    pub fn customer_id(&self) -> Option<&'a str> {
        self.str_field("customer")
    }

    pub fn trial_end(&self) -> Option<DateTime<Utc>> {
        self.i64_field("trial_end").and_then(timestamp_to_utc)
    }

    pub fn cancel_at_period_end(&self) -> bool {
        self.bool_field("cancel_at_period_end").unwrap_or(false)
    }

    fn first_item(&self) -> Option<&'a JsonValue> {
        self.0
            .get("items")
            .and_then(|items| items.get("data"))
            .and_then(JsonValue::as_array)
            .and_then(|data| data.first())
    }

    /// Extract the current billing period, handling classic and flexible
    /// shapes. Each side resolves independently, first hit wins:
    ///
    /// 1. top-level `current_period_start` / `current_period_end`
    /// 2. first item's `current_period_start` / `current_period_end`
    /// 3. first item's `period.start` / `period.end`
    ///
    /// `(None, None)` is a valid outcome; callers must tolerate a missing
    /// period.
    pub fn extract_period(&self) -> PeriodBounds {
        let mut start = self.i64_field("current_period_start");
        let mut end = self.i64_field("current_period_end");

        if let Some(item) = self.first_item() {
            let item = SubscriptionPayload::new(item);

            if start.is_none() {
                start = item.i64_field("current_period_start");
            }
            if end.is_none() {
                end = item.i64_field("current_period_end");
            }

            if let Some(period) = item.0.get("period") {
                let period = SubscriptionPayload::new(period);
                if start.is_none() {
                    start = period.i64_field("start");
                }
                if end.is_none() {
                    end = period.i64_field("end");
                }
            }
        }

        (start, end)
    }
}
