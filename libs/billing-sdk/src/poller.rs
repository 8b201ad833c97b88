//! Post-checkout activation polling.
//!
//! After PayPal redirects the browser back, the subscription is usually
//! `APPROVAL_PENDING` or `ACTIVE` but not yet recorded locally. The poller
//! calls check-activate on a fixed schedule until the membership is
//! confirmed or the attempt budget runs out.

use std::future::Future;
use std::time::Duration;

use billing_types::CheckActivateResponse;
use tokio::task::JoinHandle;

use crate::error::BillingSdkError;

/// Shown when polling gives up. The webhook path will still activate the membership.
pub const PROCESSING_MESSAGE: &str =
    "Your subscription is being processed. This may take up to 5 minutes.";

#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Wait before the first check
    pub initial_delay: Duration,
    /// Wait between subsequent checks
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            interval: Duration::from_secs(3),
            max_attempts: 8,
        }
    }
}

/// One activation check. Implemented by `BillingClient`.
pub trait ActivationCheck: Send + Sync + 'static {
    fn check(
        &self,
        subscription_id: &str,
    ) -> impl Future<Output = Result<CheckActivateResponse, BillingSdkError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Confirmed {
        attempts: u32,
        response: CheckActivateResponse,
    },
    NotYetConfirmed {
        attempts: u32,
        message: String,
    },
}

impl PollOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Confirmed { attempts, .. } | Self::NotYetConfirmed { attempts, .. } => *attempts,
        }
    }
}

pub struct ActivationPoller<C> {
    check: C,
    config: PollerConfig,
}

impl<C: ActivationCheck> ActivationPoller<C> {
    pub fn new(check: C, config: PollerConfig) -> Self {
        Self { check, config }
    }

    /// Poll until confirmed or `max_attempts` checks have been made.
    ///
    /// Failed checks count as attempts and are otherwise ignored.
    pub async fn run(&self, subscription_id: &str) -> PollOutcome {
        tokio::time::sleep(self.config.initial_delay).await;

        let mut attempts = 0;
        while attempts < self.config.max_attempts {
            if attempts > 0 {
                tokio::time::sleep(self.config.interval).await;
            }
            attempts += 1;

            match self.check.check(subscription_id).await {
                Ok(response) if response.is_confirmed() => {
                    tracing::info!(subscription_id, attempts, "Subscription confirmed");
                    return PollOutcome::Confirmed { attempts, response };
                }
                Ok(response) => {
                    tracing::debug!(
                        subscription_id,
                        attempts,
                        status = ?response.status,
                        "Subscription not active yet"
                    );
                }
                Err(e) => {
                    tracing::warn!(subscription_id, attempts, error = %e, "Activation check failed");
                }
            }
        }

        PollOutcome::NotYetConfirmed {
            attempts,
            message: PROCESSING_MESSAGE.to_string(),
        }
    }

    /// Run the poller on the tokio runtime.
    pub fn spawn(self, subscription_id: String) -> JoinHandle<PollOutcome> {
        tokio::spawn(async move { self.run(&subscription_id).await })
    }
}
