//! Test data factories. Each factory builds a valid default fixture and lets
//! the caller override fields through a closure.

use chrono::Utc;
use uuid::Uuid;

use crate::domain::entities::{
    subscription::{Subscription, SubscriptionStatus},
    user::User,
};

pub fn create_test_user(customize: impl FnOnce(&mut User)) -> User {
    let id = Uuid::new_v4();
    let mut user = User {
        id,
        email: format!("user-{id}@example.com"),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        is_staff: false,
        is_superuser: false,
        is_active: true,
        date_joined: Some(Utc::now()),
    };
    customize(&mut user);
    user
}

pub fn create_test_subscription(customize: impl FnOnce(&mut Subscription)) -> Subscription {
    let mut subscription = Subscription {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        status: SubscriptionStatus::Incomplete,
        provider_subscription_id: None,
        provider_customer_id: None,
        current_period_start: None,
        current_period_end: None,
        cancel_at_period_end: false,
        trial_end: None,
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
    };
    customize(&mut subscription);
    subscription
}
