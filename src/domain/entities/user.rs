use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: Option<DateTime<Utc>>,
}

impl User {
    /// Staff and superusers bypass the subscription gate entirely.
    pub fn bypasses_subscription_gate(&self) -> bool {
        self.is_staff || self.is_superuser
    }
}
