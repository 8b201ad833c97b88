use thiserror::Error;

pub use billing_types::ErrorCode;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found")]
    NotFound,

    #[error("Subscription does not belong to the current user")]
    OwnershipMismatch,

    /// Token exchange with the payment provider failed.
    #[error("Payment provider authentication failed: {0}")]
    ProviderAuth(String),

    /// Provider rejected the subscription or returned no approval link.
    #[error("Subscription creation failed: {0}")]
    SubscriptionCreate(String),

    #[error("Payment provider error: {0}")]
    Provider(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::OwnershipMismatch => ErrorCode::OwnershipMismatch,
            AppError::ProviderAuth(_) => ErrorCode::ProviderUnavailable,
            AppError::SubscriptionCreate(_) => ErrorCode::SubscriptionCreateFailed,
            AppError::Provider(_) => ErrorCode::ProviderError,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Transient failures where a later retry may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Database(_)
            | AppError::Internal(_)
            | AppError::ProviderAuth(_)
            | AppError::Provider(_) => true,

            AppError::InvalidCredentials
            | AppError::InvalidInput(_)
            | AppError::NotFound
            | AppError::OwnershipMismatch
            | AppError::SubscriptionCreate(_) => false,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
