//! Farmeely backend: group livestock investment with Paystack wallet funding.

pub mod api;
pub mod app;
pub mod client;
pub mod domain;
pub mod infra;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
