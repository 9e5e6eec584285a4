//! The API layer, containing web handlers and routing.

pub mod admin;
pub mod extract;
pub mod groups;
pub mod handlers;
pub mod router;
pub mod wallet;

pub use extract::{AdminUser, AuthUser, ValidatedJson, bearer_token};
pub use groups::GroupListParams;
pub use handlers::{ApiDoc, PAYSTACK_SIGNATURE_HEADER, PaymentRoute, PaymentRouteError};
pub use router::{RateLimitConfig, create_router, create_router_with_rate_limit};
