use serde::{Deserialize, Serialize};

/// Immutable audit entry written once per successful transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Storage-assigned row id; `None` until persisted.
    pub id: Option<i64>,
    /// Row id of the block this transfer is anchored to, if any.
    pub block_id: Option<i64>,
    pub from_address: String,
    pub to_address: String,
    pub amount: u64,
    pub timestamp: i64, // Unix millis (UTC)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    Sent,
    Received,
}

impl TransferRecord {
    pub fn new(from: &str, to: &str, amount: u64, block_id: Option<i64>) -> Self {
        Self {
            id: None,
            block_id,
            from_address: from.to_string(),
            to_address: to.to_string(),
            amount,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Direction of this record as seen from `address`. A self-transfer
    /// counts as received.
    pub fn direction_for(&self, address: &str) -> TransferDirection {
        if self.to_address == address {
            TransferDirection::Received
        } else {
            TransferDirection::Sent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_depends_on_viewer() {
        let rec = TransferRecord::new("alice", "bob", 5, None);
        assert_eq!(rec.direction_for("alice"), TransferDirection::Sent);
        assert_eq!(rec.direction_for("bob"), TransferDirection::Received);
        assert_eq!(rec.id, None);
    }

    #[test]
    fn direction_serializes_lowercase() {
        let json = serde_json::to_string(&TransferDirection::Received).unwrap();
        assert_eq!(json, "\"received\"");
    }
}
