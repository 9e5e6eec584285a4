//! Payment gateway implementations.

pub mod paystack;

pub use paystack::{DEFAULT_PAYSTACK_BASE_URL, PaystackConfig, PaystackGateway, sign_webhook_payload};
