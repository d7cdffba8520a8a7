pub mod contact;
pub mod hold;
pub mod location;
pub mod payment;
pub mod pii;

pub use hold::{BookingHold, DriverAssignment, HoldStatus, PassengerRecord};
pub use payment::{CardDetails, PaymentSession, PaymentStatus};
pub use pii::Masked;

/// Domain-level error taxonomy. Every operation exposed by the engine
/// returns one of these; none panics on caller input.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("expired: {0}")]
    Expired(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("payment required: {0}")]
    PaymentRequired(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
