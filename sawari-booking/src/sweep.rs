use chrono::{Duration, Utc};

use sawari_core::hold::is_past_expiry;
use sawari_core::{BookingHold, DomainResult, HoldStatus};
use sawari_store::app_config::BusinessRules;
use sawari_store::{RecordKind, StoreError, StoreHandle};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Holds flipped to expired in this pass.
    pub expired: usize,
    /// Holds (and their passenger records) deleted after the grace period.
    pub purged: usize,
}

/// One pass of the background garbage collector: mark overdue active holds
/// expired, and drop holds that have sat expired beyond the grace period.
/// Shares the expiry predicate with the lazy per-call check.
pub fn sweep(store: &StoreHandle, rules: &BusinessRules) -> DomainResult<SweepReport> {
    let now = Utc::now();
    let grace = Duration::minutes(rules.purge_grace_minutes);
    let mut report = SweepReport::default();

    let holds = store.load_all::<BookingHold>(RecordKind::Holds)?;
    for (hold_id, versioned) in holds {
        let mut hold = versioned.record;
        let overdue = is_past_expiry(hold.expires_at, now);

        match hold.status {
            HoldStatus::Held | HoldStatus::PassengerAdded | HoldStatus::PaymentPending
                if overdue =>
            {
                hold.set_status(HoldStatus::Expired, now);
                match store.update(RecordKind::Holds, &hold_id, versioned.version, &hold) {
                    Ok(_) => {
                        tracing::info!(%hold_id, "sweep expired hold");
                        report.expired += 1;
                    }
                    // Another writer touched the hold mid-sweep; it will be
                    // re-evaluated on the next pass.
                    Err(StoreError::Conflict { .. }) => {
                        tracing::warn!(%hold_id, "sweep skipped hold after concurrent update");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            HoldStatus::Expired if is_past_expiry(hold.expires_at + grace, now) => {
                store.remove(RecordKind::Holds, &hold_id)?;
                store.remove(RecordKind::Passengers, &hold_id)?;
                tracing::info!(%hold_id, "sweep purged expired hold");
                report.purged += 1;
            }
            _ => {}
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sawari_core::hold::CabSnapshot;
    use sawari_core::PassengerRecord;
    use tempfile::TempDir;

    fn hold_created_minutes_ago(hold_id: &str, minutes: i64, status: HoldStatus) -> BookingHold {
        let created = Utc::now() - Duration::minutes(minutes);
        let mut hold = BookingHold::new(
            hold_id.to_string(),
            "CAB_sedan_650".to_string(),
            CabSnapshot {
                cab_type: "sedan".to_string(),
                price: 650,
                pickup: "igi airport".to_string(),
                drop: "connaught place".to_string(),
            },
            NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            created,
            Duration::minutes(15),
        );
        hold.status = status;
        hold
    }

    #[test]
    fn test_sweep_expires_overdue_active_holds() {
        let dir = TempDir::new().unwrap();
        let store = StoreHandle::open(dir.path()).unwrap();
        let rules = BusinessRules::default();

        let overdue = hold_created_minutes_ago("HOLD_1001", 20, HoldStatus::Held);
        let fresh = hold_created_minutes_ago("HOLD_1002", 5, HoldStatus::PassengerAdded);
        store.insert(RecordKind::Holds, "HOLD_1001", &overdue).unwrap();
        store.insert(RecordKind::Holds, "HOLD_1002", &fresh).unwrap();

        let report = sweep(&store, &rules).unwrap();
        assert_eq!(report, SweepReport { expired: 1, purged: 0 });

        let swept = store
            .get::<BookingHold>(RecordKind::Holds, "HOLD_1001")
            .unwrap()
            .unwrap();
        assert_eq!(swept.record.status, HoldStatus::Expired);
        let kept = store
            .get::<BookingHold>(RecordKind::Holds, "HOLD_1002")
            .unwrap()
            .unwrap();
        assert_eq!(kept.record.status, HoldStatus::PassengerAdded);
    }

    #[test]
    fn test_sweep_purges_after_grace_period() {
        let dir = TempDir::new().unwrap();
        let store = StoreHandle::open(dir.path()).unwrap();
        let rules = BusinessRules::default();

        // Expired 90 minutes ago: past the 60-minute grace.
        let stale = hold_created_minutes_ago("HOLD_1001", 105, HoldStatus::Expired);
        store.insert(RecordKind::Holds, "HOLD_1001", &stale).unwrap();
        let passenger = PassengerRecord {
            name: "Asha Rao".to_string(),
            phone: "+919876543210".to_string(),
            email: None,
            special_request: None,
            added_at: Utc::now(),
        };
        store
            .insert(RecordKind::Passengers, "HOLD_1001", &passenger)
            .unwrap();

        // Expired recently: inside the grace window, kept for now.
        let recent = hold_created_minutes_ago("HOLD_1002", 30, HoldStatus::Expired);
        store.insert(RecordKind::Holds, "HOLD_1002", &recent).unwrap();

        let report = sweep(&store, &rules).unwrap();
        assert_eq!(report, SweepReport { expired: 0, purged: 1 });

        assert!(store
            .get::<BookingHold>(RecordKind::Holds, "HOLD_1001")
            .unwrap()
            .is_none());
        assert!(store
            .get::<PassengerRecord>(RecordKind::Passengers, "HOLD_1001")
            .unwrap()
            .is_none());
        assert!(store
            .get::<BookingHold>(RecordKind::Holds, "HOLD_1002")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_sweep_leaves_terminal_holds_alone() {
        let dir = TempDir::new().unwrap();
        let store = StoreHandle::open(dir.path()).unwrap();
        let rules = BusinessRules::default();

        let mut confirmed = hold_created_minutes_ago("HOLD_1001", 120, HoldStatus::Confirmed);
        confirmed.booking_id = Some("BOOK_2001".to_string());
        store
            .insert(RecordKind::Holds, "HOLD_1001", &confirmed)
            .unwrap();

        let report = sweep(&store, &rules).unwrap();
        assert_eq!(report, SweepReport::default());
        assert!(store
            .get::<BookingHold>(RecordKind::Holds, "HOLD_1001")
            .unwrap()
            .is_some());
    }
}
