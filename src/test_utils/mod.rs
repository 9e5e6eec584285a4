//! Test helpers shared by unit and integration tests.

pub mod mocks;

pub use mocks::{MOCK_GATEWAY_SECRET, MockConfig, MockDatabaseClient, MockPaymentGateway};

use chrono::Utc;

use crate::domain::{User, UserRole};

/// Regular user with the given id
#[must_use]
pub fn test_user(id: &str) -> User {
    User {
        id: id.to_string(),
        first_name: "Ada".to_string(),
        last_name: "Obi".to_string(),
        email: format!("{}@farmeely.com", id),
        phone: Some("+2348012345678".to_string()),
        role: UserRole::User,
        created_at: Utc::now(),
    }
}

/// Administrator with the given id
#[must_use]
pub fn test_admin(id: &str) -> User {
    User {
        role: UserRole::Admin,
        ..test_user(id)
    }
}
