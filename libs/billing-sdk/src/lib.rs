//! Rust client for the BookingGen billing API.
//!
//! # Features
//!
//! - **Typed client** - Create, inspect and cancel subscriptions, read the profile
//! - **Activation poller** - After the PayPal redirect, poll `check-activate`
//!   until the membership is confirmed or the attempts run out
//!
//! # Example
//!
//! ```rust,ignore
//! use bookinggen_billing_sdk::{ActivationPoller, BillingClient, BillingConfig, PollOutcome};
//!
//! let client = BillingClient::new(BillingConfig {
//!     base_url: "https://bookinggen.app/api".to_string(),
//!     access_token: session_token,
//! })?;
//!
//! let handle = ActivationPoller::new(client, Default::default()).spawn(subscription_id);
//! match handle.await? {
//!     PollOutcome::Confirmed { .. } => println!("Welcome to Pro!"),
//!     PollOutcome::NotYetConfirmed { message, .. } => println!("{message}"),
//! }
//! ```

mod client;
mod error;
mod poller;

pub use client::{BillingClient, BillingConfig};
pub use error::BillingSdkError;
pub use poller::{ActivationCheck, ActivationPoller, PROCESSING_MESSAGE, PollOutcome, PollerConfig};

// Re-export shared types for convenience
pub use billing_types::{
    CancelSubscriptionResponse, CheckActivateResponse, CreateSubscriptionRequest,
    CreateSubscriptionResponse, ErrorCode, ProfileResponse, SubscriptionStatusResponse,
};
