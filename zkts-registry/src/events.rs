//! Registry events and the append-only log they are committed to.

use serde::{Deserialize, Serialize};
use zkts_common::{Address, Amount, StampHash, Timestamp, VerifierRef};

/// Emitted once per created stamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampCreated {
    pub hash: StampHash,
    pub created_at: Timestamp,
    pub signers: Vec<Address>,
}

/// Emitted once per signature, including a creator's self-acknowledgement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampSigned {
    pub hash: StampHash,
    pub signer: Address,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryEvent {
    StampCreated(StampCreated),
    StampSigned(StampSigned),
    Initialized {
        owner: Address,
        fee: Amount,
        verifier: VerifierRef,
    },
    FeeChanged {
        previous: Amount,
        current: Amount,
    },
    VerifierChanged {
        previous: Option<VerifierRef>,
        current: VerifierRef,
    },
    FeeWithdrawn {
        to: Address,
        amount: Amount,
    },
    OwnershipTransferred {
        previous: Option<Address>,
        current: Address,
    },
    Upgraded {
        from: u32,
        to: u32,
    },
}

impl RegistryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RegistryEvent::StampCreated(_) => "StampCreated",
            RegistryEvent::StampSigned(_) => "StampSigned",
            RegistryEvent::Initialized { .. } => "Initialized",
            RegistryEvent::FeeChanged { .. } => "FeeChanged",
            RegistryEvent::VerifierChanged { .. } => "VerifierChanged",
            RegistryEvent::FeeWithdrawn { .. } => "FeeWithdrawn",
            RegistryEvent::OwnershipTransferred { .. } => "OwnershipTransferred",
            RegistryEvent::Upgraded { .. } => "Upgraded",
        }
    }
}

/// A committed event and its position in the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub sequence: u64,
    pub event: RegistryEvent,
}

/// Append-only, totally ordered event log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    entries: Vec<RecordedEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit the events of one call, in emission order.
    pub fn append(&mut self, events: Vec<RegistryEvent>) {
        for event in events {
            let sequence = self.entries.len() as u64;
            self.entries.push(RecordedEvent { sequence, event });
        }
    }

    pub fn entries(&self) -> &[RecordedEvent] {
        &self.entries
    }

    /// Events with `sequence >= from`.
    pub fn since(&self, from: u64) -> &[RecordedEvent] {
        let start = usize::try_from(from)
            .unwrap_or(usize::MAX)
            .min(self.entries.len());
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&RegistryEvent> {
        self.entries.last().map(|recorded| &recorded.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_numbers_continue_across_appends() {
        let mut log = EventLog::new();
        log.append(vec![RegistryEvent::FeeChanged { previous: 0, current: 1 }]);
        log.append(vec![
            RegistryEvent::FeeChanged { previous: 1, current: 2 },
            RegistryEvent::Upgraded { from: 1, to: 2 },
        ]);
        let sequences: Vec<_> = log.entries().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        assert_eq!(log.since(2).len(), 1);
        assert!(log.since(99).is_empty());
        assert_eq!(log.last().map(RegistryEvent::name), Some("Upgraded"));
    }

    #[test]
    fn test_recorded_event_json_shape() {
        let recorded = RecordedEvent {
            sequence: 4,
            event: RegistryEvent::FeeWithdrawn {
                to: Address::new([1; 20]),
                amount: 9,
            },
        };
        let text = serde_json::to_string(&recorded).expect("serialize");
        assert!(text.starts_with("{\"sequence\":4,\"event\":{\"fee_withdrawn\":"));
        let back: RecordedEvent = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(back, recorded);
    }
}
