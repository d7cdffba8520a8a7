use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use sawari_catalog as catalog;
use sawari_core::hold::CabSnapshot;
use sawari_core::{
    contact, BookingHold, DomainError, DomainResult, DriverAssignment, HoldStatus, PassengerRecord,
    PaymentSession, PaymentStatus,
};
use sawari_store::app_config::BusinessRules;
use sawari_store::{IdKind, RecordKind, StoreHandle, Versioned};

use crate::drivers;

/// Owns the BookingHold lifecycle: creation, passenger attachment, lazy
/// expiry and confirmation. All state lives in the shared store; the
/// manager itself is a cheap handle.
#[derive(Clone)]
pub struct HoldManager {
    store: StoreHandle,
    rules: BusinessRules,
}

#[derive(Debug, Clone, Serialize)]
pub struct PassengerSummary {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingSummary {
    pub booking_id: Option<String>,
    pub hold_id: String,
    pub cab_type: String,
    pub price: i64,
    pub pickup: String,
    pub drop: String,
    pub departure_date: NaiveDate,
    pub passenger: Option<PassengerSummary>,
    pub status: HoldStatus,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub driver: Option<DriverAssignment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    pub booking_id: String,
    pub hold_id: String,
    pub status: HoldStatus,
    pub driver: DriverAssignment,
    pub booking_summary: BookingSummary,
    pub confirmed_at: DateTime<Utc>,
}

impl HoldManager {
    pub fn new(store: StoreHandle, rules: BusinessRules) -> Self {
        Self { store, rules }
    }

    fn hold_ttl(&self) -> Duration {
        Duration::minutes(self.rules.hold_ttl_minutes)
    }

    /// Create a 15-minute hold on a priced offer. The offer must resolve in
    /// the fare catalog for this route; otherwise nothing is written.
    pub fn create_hold(
        &self,
        cab_id: &str,
        pickup: &str,
        drop: &str,
        departure_date: NaiveDate,
    ) -> DomainResult<BookingHold> {
        let now = Utc::now();
        if departure_date < now.date_naive() {
            return Err(DomainError::Validation(
                "departure_date must be today or a future date".to_string(),
            ));
        }

        let pickup = catalog::normalize_place(pickup);
        let drop = catalog::normalize_place(drop);
        let offer = catalog::find_offer(&pickup, &drop, cab_id).ok_or_else(|| {
            DomainError::NotFound(format!("cab offer not found for this route: {cab_id}"))
        })?;

        let hold_id = self.store.allocate_id(IdKind::Hold)?;
        let hold = BookingHold::new(
            hold_id.clone(),
            offer.offer_id.clone(),
            CabSnapshot {
                cab_type: offer.cab_type,
                price: offer.price,
                pickup,
                drop,
            },
            departure_date,
            now,
            self.hold_ttl(),
        );
        self.store.insert(RecordKind::Holds, &hold_id, &hold)?;

        tracing::info!(%hold_id, cab_id, price = hold.price, "hold created");
        Ok(hold)
    }

    pub fn get_hold(&self, hold_id: &str) -> DomainResult<BookingHold> {
        Ok(self.fetch(hold_id)?.record)
    }

    /// Attach (or overwrite) passenger details on a live hold. Contact
    /// details are validated before anything is written.
    pub fn attach_passenger(
        &self,
        hold_id: &str,
        name: &str,
        phone: &str,
        email: Option<&str>,
        special_request: Option<&str>,
    ) -> DomainResult<BookingHold> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation(
                "passenger name must not be empty".to_string(),
            ));
        }
        let phone = contact::normalize_phone(phone)?;
        if let Some(email) = email {
            contact::validate_email(email)?;
        }

        let now = Utc::now();
        let (mut hold, version) = self.fetch_live(hold_id, now)?;

        if !matches!(
            hold.status,
            HoldStatus::Held | HoldStatus::PassengerAdded
        ) {
            return Err(DomainError::InvalidState(format!(
                "passenger details can only be attached while the hold is held or passenger_added, current status: {}",
                hold.status
            )));
        }

        let passenger = PassengerRecord {
            name: name.to_string(),
            phone,
            email: email.map(str::to_string),
            special_request: special_request.map(str::to_string),
            added_at: now,
        };

        // Two independent writes, not a transaction: the keyed passenger
        // record first, then the hold snapshot.
        self.store
            .upsert(RecordKind::Passengers, hold_id, &passenger)?;

        hold.passenger = Some(passenger);
        hold.set_status(HoldStatus::PassengerAdded, now);
        self.store
            .update(RecordKind::Holds, hold_id, version, &hold)?;

        tracing::info!(%hold_id, "passenger attached");
        Ok(hold)
    }

    /// Expiry predicate with a side effect: an overdue hold that is still
    /// non-terminal is flipped to expired on the spot, independent of the
    /// background sweep.
    pub fn is_expired(&self, hold_id: &str) -> DomainResult<bool> {
        let now = Utc::now();
        let versioned = self.fetch(hold_id)?;
        let (hold, _) = self.lazy_expire(versioned, now)?;
        Ok(hold.is_expired(now))
    }

    /// Finalize a paid hold: assign a driver, mint a booking id and stamp
    /// the confirmation. Calling it again on a confirmed hold returns the
    /// existing confirmation unchanged.
    pub fn confirm(&self, hold_id: &str) -> DomainResult<BookingConfirmation> {
        let now = Utc::now();
        let versioned = self.fetch(hold_id)?;

        if versioned.record.status == HoldStatus::Confirmed {
            return Self::existing_confirmation(&versioned.record);
        }

        let (mut hold, version) = self.lazy_expire(versioned, now)?;
        if hold.status == HoldStatus::Expired {
            return Err(DomainError::Expired(format!("hold has expired: {hold_id}")));
        }

        if hold.status != HoldStatus::PaymentSuccess {
            return Err(DomainError::PaymentRequired(format!(
                "payment must be completed before confirming, current status: {}",
                hold.status
            )));
        }

        // Payment success after the hold window must not confirm: require a
        // completed session that finished inside the window.
        let sessions = self
            .store
            .load_all::<PaymentSession>(RecordKind::Payments)?;
        let timely_payment = sessions.values().any(|s| {
            s.record.hold_id == hold_id
                && s.record.status == PaymentStatus::Completed
                && s.record
                    .completed_at
                    .is_some_and(|t| t <= hold.expires_at)
        });
        if !timely_payment {
            return Err(DomainError::PaymentRequired(format!(
                "no payment completed within the hold window for: {hold_id}"
            )));
        }

        let booking_id = self.store.allocate_id(IdKind::Booking)?;
        let driver = drivers::assign_driver();

        hold.booking_id = Some(booking_id.clone());
        hold.driver = Some(driver.clone());
        hold.confirmed_at = Some(now);
        hold.set_status(HoldStatus::Confirmed, now);
        self.store
            .update(RecordKind::Holds, hold_id, version, &hold)?;

        tracing::info!(%hold_id, %booking_id, driver = %driver.name, "booking confirmed");
        Ok(BookingConfirmation {
            booking_id,
            hold_id: hold_id.to_string(),
            status: HoldStatus::Confirmed,
            driver,
            booking_summary: Self::summary(&hold),
            confirmed_at: now,
        })
    }

    /// Assemble the caller-facing booking summary from a hold snapshot.
    pub fn summary(hold: &BookingHold) -> BookingSummary {
        BookingSummary {
            booking_id: hold.booking_id.clone(),
            hold_id: hold.hold_id.clone(),
            cab_type: hold.cab_details.cab_type.clone(),
            price: hold.price,
            pickup: hold.pickup.clone(),
            drop: hold.drop.clone(),
            departure_date: hold.departure_date,
            passenger: hold.passenger.as_ref().map(|p| PassengerSummary {
                name: p.name.clone(),
                phone: p.phone.clone(),
                email: p.email.clone(),
            }),
            status: hold.status,
            created_at: hold.created_at,
            confirmed_at: hold.confirmed_at,
            driver: hold.driver.clone(),
        }
    }

    fn existing_confirmation(hold: &BookingHold) -> DomainResult<BookingConfirmation> {
        let booking_id = hold.booking_id.clone().ok_or_else(|| {
            DomainError::Internal(format!("confirmed hold missing booking id: {}", hold.hold_id))
        })?;
        let driver = hold.driver.clone().ok_or_else(|| {
            DomainError::Internal(format!("confirmed hold missing driver: {}", hold.hold_id))
        })?;
        let confirmed_at = hold.confirmed_at.ok_or_else(|| {
            DomainError::Internal(format!(
                "confirmed hold missing confirmation time: {}",
                hold.hold_id
            ))
        })?;
        Ok(BookingConfirmation {
            booking_id,
            hold_id: hold.hold_id.clone(),
            status: HoldStatus::Confirmed,
            driver,
            booking_summary: Self::summary(hold),
            confirmed_at,
        })
    }

    fn fetch(&self, hold_id: &str) -> DomainResult<Versioned<BookingHold>> {
        self.store
            .get::<BookingHold>(RecordKind::Holds, hold_id)?
            .ok_or_else(|| DomainError::NotFound(format!("hold not found: {hold_id}")))
    }

    /// Fetch a hold and fail if it is expired, flipping the stored status
    /// when the lazy check catches it first.
    fn fetch_live(&self, hold_id: &str, now: DateTime<Utc>) -> DomainResult<(BookingHold, u64)> {
        let versioned = self.fetch(hold_id)?;
        let (hold, version) = self.lazy_expire(versioned, now)?;
        if hold.status == HoldStatus::Expired {
            return Err(DomainError::Expired(format!("hold has expired: {hold_id}")));
        }
        Ok((hold, version))
    }

    fn lazy_expire(
        &self,
        versioned: Versioned<BookingHold>,
        now: DateTime<Utc>,
    ) -> DomainResult<(BookingHold, u64)> {
        let Versioned {
            record: mut hold,
            version,
        } = versioned;
        if !hold.status.is_terminal() && hold.is_expired(now) {
            hold.set_status(HoldStatus::Expired, now);
            let version = self
                .store
                .update(RecordKind::Holds, &hold.hold_id, version, &hold)?;
            tracing::info!(hold_id = %hold.hold_id, "hold lazily expired");
            return Ok((hold, version));
        }
        Ok((hold, version))
    }
}
