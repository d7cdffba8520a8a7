//! Payment side of the reservation engine: stateless card validation and
//! the PaymentSession lifecycle against the shared store.

pub mod card;
pub mod manager;

pub use card::{validate_card, CardError, CardIssuer};
pub use manager::PaymentManager;
