use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hold::is_past_expiry;
use crate::pii::Masked;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A payment attempt tied to a hold. Many sessions may reference one hold
/// over its lifetime, but at most one may be pending and unexpired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    pub session_id: String,
    pub hold_id: String,
    /// Must equal the hold's price at creation time.
    pub amount: i64,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub card_last4: Option<String>,
}

impl PaymentSession {
    pub fn new(
        session_id: String,
        hold_id: String,
        amount: i64,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            session_id,
            hold_id,
            amount,
            status: PaymentStatus::Pending,
            created_at: now,
            expires_at: now + ttl,
            completed_at: None,
            card_last4: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        is_past_expiry(self.expires_at, now)
    }

    /// A session past its TTL or in a terminal status takes no further writes.
    pub fn is_mutable(&self, now: DateTime<Utc>) -> bool {
        self.status == PaymentStatus::Pending && !self.is_expired(now)
    }
}

/// Card details as submitted by a caller. Number and CVV are wrapped so a
/// stray `{:?}` in a log line cannot leak them.
#[derive(Debug, Clone, Deserialize)]
pub struct CardDetails {
    pub card_number: Masked<String>,
    pub cvv: Masked<String>,
    pub expiry: String,
    pub cardholder_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_ttl_and_mutability() {
        let now = Utc::now();
        let session = PaymentSession::new(
            "PAY_5001".to_string(),
            "HOLD_1001".to_string(),
            650,
            now,
            Duration::minutes(30),
        );
        assert_eq!(session.expires_at, now + Duration::minutes(30));
        assert!(session.is_mutable(now));
        assert!(!session.is_mutable(now + Duration::minutes(31)));
    }

    #[test]
    fn test_terminal_session_is_immutable() {
        let now = Utc::now();
        let mut session = PaymentSession::new(
            "PAY_5002".to_string(),
            "HOLD_1001".to_string(),
            650,
            now,
            Duration::minutes(30),
        );
        session.status = PaymentStatus::Completed;
        assert!(!session.is_mutable(now));
        session.status = PaymentStatus::Failed;
        assert!(!session.is_mutable(now));
    }

    #[test]
    fn test_card_details_debug_masks_pii() {
        let card = CardDetails {
            card_number: Masked("4532015112830366".to_string()),
            cvv: Masked("123".to_string()),
            expiry: "12/30".to_string(),
            cardholder_name: "John Doe".to_string(),
        };
        let dump = format!("{:?}", card);
        assert!(!dump.contains("4532015112830366"));
        assert!(!dump.contains("123"));
    }
}
