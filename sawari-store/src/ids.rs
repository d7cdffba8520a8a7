use serde_json::Value;

use crate::file_store::{RecordKind, StoreError, StoreHandle};

const COUNTERS_FILE: &str = "id_counters.json";

/// Identifier families. Each carries a prefix and a fixed floor so the
/// first id ever issued is `<PREFIX>_<floor + 1>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Hold,
    Payment,
    Booking,
}

impl IdKind {
    pub fn prefix(self) -> &'static str {
        match self {
            IdKind::Hold => "HOLD",
            IdKind::Payment => "PAY",
            IdKind::Booking => "BOOK",
        }
    }

    fn floor(self) -> u64 {
        match self {
            IdKind::Hold => 1000,
            IdKind::Payment => 5000,
            IdKind::Booking => 2000,
        }
    }

    /// Which collection to scan when seeding the counter from existing data.
    fn scan_kind(self) -> RecordKind {
        match self {
            IdKind::Hold | IdKind::Booking => RecordKind::Holds,
            IdKind::Payment => RecordKind::Payments,
        }
    }
}

fn suffix_of(id: &str, prefix: &str) -> Option<u64> {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|n| n.parse().ok())
}

impl StoreHandle {
    /// Allocate the next id of a kind as a single store operation: the
    /// counter record is read, advanced and flushed under the store lock,
    /// so allocations within one process can never collide.
    ///
    /// On the first allocation of a kind the counter is seeded from the
    /// maximum suffix already persisted (or the kind's floor, whichever is
    /// larger), so a restarted process continues where the data left off.
    pub fn allocate_id(&self, kind: IdKind) -> Result<String, StoreError> {
        let _guard = self.guard();

        let mut counters = self.read_raw(COUNTERS_FILE)?;
        let current = counters
            .get(kind.prefix())
            .and_then(Value::as_u64);

        let next = match current {
            Some(n) => n + 1,
            None => self.seed(kind)?.max(kind.floor()) + 1,
        };

        counters.insert(kind.prefix().to_string(), Value::from(next));
        self.write_raw(COUNTERS_FILE, &counters)?;

        Ok(format!("{}_{}", kind.prefix(), next))
    }

    /// Max suffix found in the persisted data for this kind. Hold and
    /// payment ids are the map keys; booking ids live inside hold records.
    fn seed(&self, kind: IdKind) -> Result<u64, StoreError> {
        let raw = self.read_raw(kind.scan_kind().file_name())?;
        let max = match kind {
            IdKind::Hold | IdKind::Payment => raw
                .keys()
                .filter_map(|id| suffix_of(id, kind.prefix()))
                .max(),
            IdKind::Booking => raw
                .values()
                .filter_map(|v| v.pointer("/record/booking_id"))
                .filter_map(Value::as_str)
                .filter_map(|id| suffix_of(id, kind.prefix()))
                .max(),
        };
        Ok(max.unwrap_or(0))
    }
}
