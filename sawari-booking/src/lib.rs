pub mod drivers;
pub mod manager;
pub mod sweep;

pub use manager::{BookingConfirmation, BookingSummary, HoldManager, PassengerSummary};
pub use sweep::{sweep, SweepReport};
