use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Booking hold status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HoldStatus {
    Held,
    PassengerAdded,
    PaymentPending,
    PaymentSuccess,
    Confirmed,
    Cancelled,
    Expired,
}

impl HoldStatus {
    /// Confirmed, cancelled and expired holds never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            HoldStatus::Confirmed | HoldStatus::Cancelled | HoldStatus::Expired
        )
    }
}

impl std::fmt::Display for HoldStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HoldStatus::Held => "held",
            HoldStatus::PassengerAdded => "passenger_added",
            HoldStatus::PaymentPending => "payment_pending",
            HoldStatus::PaymentSuccess => "payment_success",
            HoldStatus::Confirmed => "confirmed",
            HoldStatus::Cancelled => "cancelled",
            HoldStatus::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// The single expiry predicate. Both the lazy per-call check and the
/// background sweep go through here so the two paths cannot diverge.
pub fn is_past_expiry(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expires_at < now
}

/// Snapshot of the priced offer taken when the hold is created, so later
/// catalog changes cannot alter an existing reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CabSnapshot {
    pub cab_type: String,
    pub price: i64,
    pub pickup: String,
    pub drop: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassengerRecord {
    pub name: String,
    /// Normalized to +91 followed by 10 digits.
    pub phone: String,
    pub email: Option<String>,
    pub special_request: Option<String>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverAssignment {
    pub name: String,
    pub phone: String,
    pub vehicle_number: String,
    pub vehicle_model: String,
    pub rating: f32,
}

/// A time-boxed reservation of a priced cab offer: the central aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingHold {
    pub hold_id: String,
    pub cab_id: String,
    pub status: HoldStatus,
    pub cab_details: CabSnapshot,
    pub price: i64,
    pub pickup: String,
    pub drop: String,
    pub departure_date: NaiveDate,
    pub passenger: Option<PassengerRecord>,
    pub booking_id: Option<String>,
    pub driver: Option<DriverAssignment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl BookingHold {
    /// Create a fresh hold. `expires_at` is fixed here and never extended.
    pub fn new(
        hold_id: String,
        cab_id: String,
        cab_details: CabSnapshot,
        departure_date: NaiveDate,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Self {
        let price = cab_details.price;
        let pickup = cab_details.pickup.clone();
        let drop = cab_details.drop.clone();
        Self {
            hold_id,
            cab_id,
            status: HoldStatus::Held,
            cab_details,
            price,
            pickup,
            drop,
            departure_date,
            passenger: None,
            booking_id: None,
            driver: None,
            created_at: now,
            updated_at: now,
            expires_at: now + ttl,
            confirmed_at: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        is_past_expiry(self.expires_at, now)
    }

    /// Advance the status and refresh `updated_at`.
    pub fn set_status(&mut self, status: HoldStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_hold(now: DateTime<Utc>) -> BookingHold {
        BookingHold::new(
            "HOLD_1001".to_string(),
            "CAB_sedan_650".to_string(),
            CabSnapshot {
                cab_type: "sedan".to_string(),
                price: 650,
                pickup: "igi airport".to_string(),
                drop: "connaught place".to_string(),
            },
            now.date_naive(),
            now,
            Duration::minutes(15),
        )
    }

    #[test]
    fn test_expiry_fixed_at_creation() {
        let now = Utc::now();
        let mut hold = sample_hold(now);
        assert_eq!(hold.expires_at, now + Duration::minutes(15));

        // Mutations never move the expiry.
        hold.set_status(HoldStatus::PassengerAdded, now + Duration::minutes(5));
        assert_eq!(hold.expires_at, now + Duration::minutes(15));
        assert!(!hold.is_expired(now + Duration::minutes(14)));
        assert!(hold.is_expired(now + Duration::minutes(16)));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(HoldStatus::Confirmed.is_terminal());
        assert!(HoldStatus::Expired.is_terminal());
        assert!(HoldStatus::Cancelled.is_terminal());
        assert!(!HoldStatus::PaymentSuccess.is_terminal());
        assert!(!HoldStatus::Held.is_terminal());
    }

    #[test]
    fn test_hold_roundtrips_through_json() {
        let now = Utc::now();
        let hold = sample_hold(now);
        let json = serde_json::to_string(&hold).unwrap();
        let back: BookingHold = serde_json::from_str(&json).unwrap();
        assert_eq!(back.hold_id, hold.hold_id);
        assert_eq!(back.expires_at, hold.expires_at);
        assert_eq!(back.status, HoldStatus::Held);
    }
}
