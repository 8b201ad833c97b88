//! Wire types shared by the BookingGen billing API and its client SDK.
//!
//! This crate provides:
//! - Request/response bodies for the subscription endpoints
//! - The profile response returned to the dashboard
//! - API error codes

mod errors;
mod profile;
mod subscription;

pub use errors::{ErrorCode, ErrorResponse};
pub use profile::ProfileResponse;
pub use subscription::{
    CancelSubscriptionRequest, CancelSubscriptionResponse, CheckActivateRequest,
    CheckActivateResponse, CreateSubscriptionRequest, CreateSubscriptionResponse,
    SubscriptionStatusResponse,
};
