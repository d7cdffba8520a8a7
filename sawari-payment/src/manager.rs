use chrono::{DateTime, Duration, Utc};

use sawari_core::{
    BookingHold, CardDetails, DomainError, DomainResult, HoldStatus, PaymentSession, PaymentStatus,
};
use sawari_store::app_config::BusinessRules;
use sawari_store::{IdKind, RecordKind, StoreHandle, Versioned};

use crate::card;

/// Owns the PaymentSession lifecycle: session creation against a live hold,
/// card submission and status reads. Shares the store with the hold side;
/// the manager itself is a cheap handle.
#[derive(Clone)]
pub struct PaymentManager {
    store: StoreHandle,
    rules: BusinessRules,
}

impl PaymentManager {
    pub fn new(store: StoreHandle, rules: BusinessRules) -> Self {
        Self { store, rules }
    }

    fn session_ttl(&self) -> Duration {
        Duration::minutes(self.rules.payment_ttl_minutes)
    }

    /// Open a 30-minute payment session against a hold. The hold must still
    /// be live, carry passenger details and have no other pending session,
    /// and the amount must match the held price exactly.
    pub fn create_session(&self, hold_id: &str, amount: i64) -> DomainResult<PaymentSession> {
        let now = Utc::now();
        let (mut hold, version) = self.fetch_live_hold(hold_id, now)?;

        match hold.status {
            HoldStatus::PassengerAdded | HoldStatus::PaymentPending => {}
            HoldStatus::Held => {
                return Err(DomainError::InvalidState(
                    "passenger details must be added before initiating payment".to_string(),
                ));
            }
            other => {
                return Err(DomainError::InvalidState(format!(
                    "payment cannot be initiated in status: {other}"
                )));
            }
        }

        if amount != hold.price {
            return Err(DomainError::Validation(format!(
                "amount mismatch: hold price is {}, got {amount}",
                hold.price
            )));
        }

        // At most one pending, unexpired session per hold.
        let sessions = self
            .store
            .load_all::<PaymentSession>(RecordKind::Payments)?;
        if let Some(open) = sessions
            .values()
            .find(|s| s.record.hold_id == hold_id && s.record.is_mutable(now))
        {
            return Err(DomainError::Conflict(format!(
                "a payment session is already open for this hold: {}",
                open.record.session_id
            )));
        }

        let session_id = self.store.allocate_id(IdKind::Payment)?;
        let session = PaymentSession::new(
            session_id.clone(),
            hold_id.to_string(),
            amount,
            now,
            self.session_ttl(),
        );
        self.store
            .insert(RecordKind::Payments, &session_id, &session)?;

        if hold.status == HoldStatus::PassengerAdded {
            hold.set_status(HoldStatus::PaymentPending, now);
            self.store
                .update(RecordKind::Holds, hold_id, version, &hold)?;
        }

        tracing::info!(%session_id, %hold_id, amount, "payment session opened");
        Ok(session)
    }

    /// Run the submitted card through validation and settle the session.
    /// A rejected card fails the session permanently; the hold stays in
    /// payment_pending so the caller can open a fresh session.
    pub fn submit_payment(
        &self,
        session_id: &str,
        card: &CardDetails,
    ) -> DomainResult<PaymentSession> {
        let now = Utc::now();
        let versioned = self.fetch_session(session_id)?;
        let Versioned {
            record: mut session,
            version,
        } = versioned;

        match session.status {
            PaymentStatus::Completed => {
                return Err(DomainError::InvalidState(format!(
                    "payment already completed for session: {session_id}"
                )));
            }
            PaymentStatus::Failed => {
                return Err(DomainError::InvalidState(format!(
                    "session has failed, initiate a new payment session: {session_id}"
                )));
            }
            PaymentStatus::Pending => {}
        }
        if session.is_expired(now) {
            return Err(DomainError::Expired(format!(
                "payment session has expired: {session_id}"
            )));
        }

        let validated = card::validate_card(
            card.card_number.expose(),
            card.cvv.expose(),
            &card.expiry,
            &card.cardholder_name,
            now,
        );
        let issuer = match validated {
            Ok(issuer) => issuer,
            Err(reason) => {
                session.status = PaymentStatus::Failed;
                self.store
                    .update(RecordKind::Payments, session_id, version, &session)?;
                tracing::info!(%session_id, %reason, "card rejected, session failed");
                return Err(DomainError::Validation(reason.to_string()));
            }
        };

        session.status = PaymentStatus::Completed;
        session.completed_at = Some(now);
        session.card_last4 = Some(card::card_last4(card.card_number.expose()));
        self.store
            .update(RecordKind::Payments, session_id, version, &session)?;

        self.mark_hold_paid(&session.hold_id, now)?;

        tracing::info!(%session_id, hold_id = %session.hold_id, %issuer, "payment completed");
        Ok(session)
    }

    pub fn get_session(&self, session_id: &str) -> DomainResult<PaymentSession> {
        Ok(self.fetch_session(session_id)?.record)
    }

    /// Flip the hold to payment_success if it is still waiting on this
    /// payment. A hold that expired or moved on keeps its status; the
    /// confirmation step re-checks payment timing anyway.
    fn mark_hold_paid(&self, hold_id: &str, now: DateTime<Utc>) -> DomainResult<()> {
        let Some(versioned) = self.store.get::<BookingHold>(RecordKind::Holds, hold_id)? else {
            tracing::warn!(%hold_id, "paid session references a missing hold");
            return Ok(());
        };
        let Versioned {
            record: mut hold,
            version,
        } = versioned;
        if hold.status == HoldStatus::PaymentPending && !hold.is_expired(now) {
            hold.set_status(HoldStatus::PaymentSuccess, now);
            self.store
                .update(RecordKind::Holds, hold_id, version, &hold)?;
        }
        Ok(())
    }

    fn fetch_session(&self, session_id: &str) -> DomainResult<Versioned<PaymentSession>> {
        self.store
            .get::<PaymentSession>(RecordKind::Payments, session_id)?
            .ok_or_else(|| {
                DomainError::NotFound(format!("payment session not found: {session_id}"))
            })
    }

    fn fetch_live_hold(
        &self,
        hold_id: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<(BookingHold, u64)> {
        let versioned = self
            .store
            .get::<BookingHold>(RecordKind::Holds, hold_id)?
            .ok_or_else(|| DomainError::NotFound(format!("hold not found: {hold_id}")))?;
        let Versioned {
            record: mut hold,
            version,
        } = versioned;
        if !hold.status.is_terminal() && hold.is_expired(now) {
            hold.set_status(HoldStatus::Expired, now);
            let version = self
                .store
                .update(RecordKind::Holds, hold_id, version, &hold)?;
            tracing::info!(%hold_id, "hold lazily expired");
            return Ok((hold, version));
        }
        if hold.status == HoldStatus::Expired {
            return Err(DomainError::Expired(format!("hold has expired: {hold_id}")));
        }
        Ok((hold, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sawari_core::hold::CabSnapshot;
    use sawari_core::pii::Masked;
    use tempfile::TempDir;

    fn manager() -> (TempDir, PaymentManager, StoreHandle) {
        let dir = TempDir::new().unwrap();
        let store = StoreHandle::open(dir.path()).unwrap();
        let manager = PaymentManager::new(store.clone(), BusinessRules::default());
        (dir, manager, store)
    }

    fn seed_hold(store: &StoreHandle, status: HoldStatus) -> BookingHold {
        let now = Utc::now();
        let hold_id = store.allocate_id(IdKind::Hold).unwrap();
        let mut hold = BookingHold::new(
            hold_id.clone(),
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
        );
        hold.set_status(status, now);
        store.insert(RecordKind::Holds, &hold_id, &hold).unwrap();
        hold
    }

    fn visa_card() -> CardDetails {
        CardDetails {
            card_number: Masked("4532015112830366".to_string()),
            cvv: Masked("123".to_string()),
            expiry: "12/30".to_string(),
            cardholder_name: "Asha Rao".to_string(),
        }
    }

    fn hold_status(store: &StoreHandle, hold_id: &str) -> HoldStatus {
        store
            .get::<BookingHold>(RecordKind::Holds, hold_id)
            .unwrap()
            .unwrap()
            .record
            .status
    }

    #[test]
    fn test_create_session_moves_hold_to_payment_pending() {
        let (_dir, manager, store) = manager();
        let hold = seed_hold(&store, HoldStatus::PassengerAdded);

        let session = manager.create_session(&hold.hold_id, 650).unwrap();
        assert!(session.session_id.starts_with("PAY_"));
        assert_eq!(session.status, PaymentStatus::Pending);
        assert_eq!(session.expires_at, session.created_at + Duration::minutes(30));
        assert_eq!(hold_status(&store, &hold.hold_id), HoldStatus::PaymentPending);
    }

    #[test]
    fn test_create_session_requires_passenger() {
        let (_dir, manager, store) = manager();
        let hold = seed_hold(&store, HoldStatus::Held);
        let err = manager.create_session(&hold.hold_id, 650).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn test_create_session_rejects_amount_mismatch() {
        let (_dir, manager, store) = manager();
        let hold = seed_hold(&store, HoldStatus::PassengerAdded);
        let err = manager.create_session(&hold.hold_id, 651).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_second_open_session_conflicts() {
        let (_dir, manager, store) = manager();
        let hold = seed_hold(&store, HoldStatus::PassengerAdded);
        manager.create_session(&hold.hold_id, 650).unwrap();
        let err = manager.create_session(&hold.hold_id, 650).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn test_create_session_on_expired_hold() {
        let (_dir, manager, store) = manager();
        let hold = seed_hold(&store, HoldStatus::PassengerAdded);
        let versioned = store
            .get::<BookingHold>(RecordKind::Holds, &hold.hold_id)
            .unwrap()
            .unwrap();
        let mut stale = versioned.record;
        stale.expires_at = Utc::now() - Duration::minutes(1);
        store
            .update(RecordKind::Holds, &hold.hold_id, versioned.version, &stale)
            .unwrap();

        let err = manager.create_session(&hold.hold_id, 650).unwrap_err();
        assert!(matches!(err, DomainError::Expired(_)));
        assert_eq!(hold_status(&store, &hold.hold_id), HoldStatus::Expired);
    }

    #[test]
    fn test_successful_payment_completes_session_and_hold() {
        let (_dir, manager, store) = manager();
        let hold = seed_hold(&store, HoldStatus::PassengerAdded);
        let session = manager.create_session(&hold.hold_id, 650).unwrap();

        let settled = manager
            .submit_payment(&session.session_id, &visa_card())
            .unwrap();
        assert_eq!(settled.status, PaymentStatus::Completed);
        assert!(settled.completed_at.is_some());
        assert_eq!(settled.card_last4.as_deref(), Some("0366"));
        assert_eq!(hold_status(&store, &hold.hold_id), HoldStatus::PaymentSuccess);
    }

    #[test]
    fn test_rejected_card_fails_session_but_not_hold() {
        let (_dir, manager, store) = manager();
        let hold = seed_hold(&store, HoldStatus::PassengerAdded);
        let session = manager.create_session(&hold.hold_id, 650).unwrap();

        let bad = CardDetails {
            card_number: Masked("1234567890123456".to_string()),
            ..visa_card()
        };
        let err = manager.submit_payment(&session.session_id, &bad).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let stored = manager.get_session(&session.session_id).unwrap();
        assert_eq!(stored.status, PaymentStatus::Failed);
        // The hold stays payment-eligible so a new session can be opened.
        assert_eq!(hold_status(&store, &hold.hold_id), HoldStatus::PaymentPending);
        manager.create_session(&hold.hold_id, 650).unwrap();
    }

    #[test]
    fn test_double_submit_is_rejected() {
        let (_dir, manager, store) = manager();
        let hold = seed_hold(&store, HoldStatus::PassengerAdded);
        let session = manager.create_session(&hold.hold_id, 650).unwrap();
        manager
            .submit_payment(&session.session_id, &visa_card())
            .unwrap();

        let err = manager
            .submit_payment(&session.session_id, &visa_card())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn test_submit_on_expired_session() {
        let (_dir, manager, store) = manager();
        let hold = seed_hold(&store, HoldStatus::PassengerAdded);
        let session = manager.create_session(&hold.hold_id, 650).unwrap();

        let versioned = store
            .get::<PaymentSession>(RecordKind::Payments, &session.session_id)
            .unwrap()
            .unwrap();
        let mut stale = versioned.record;
        stale.expires_at = Utc::now() - Duration::seconds(1);
        store
            .update(
                RecordKind::Payments,
                &session.session_id,
                versioned.version,
                &stale,
            )
            .unwrap();

        let err = manager
            .submit_payment(&session.session_id, &visa_card())
            .unwrap_err();
        assert!(matches!(err, DomainError::Expired(_)));
    }

    #[test]
    fn test_unknown_session_is_not_found() {
        let (_dir, manager, _store) = manager();
        let err = manager.get_session("PAY_9999").unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
