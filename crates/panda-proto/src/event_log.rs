//! Attestation event-log entries.
//!
//! The event log is a JSON array of measurement-extension records handed
//! to the verifier as an opaque value by the host. Order is significant:
//! replaying the entries for a register index in sequence is the only way
//! to reconstruct that register's final value.

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// One measurement-extension record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLogEntry {
    /// Index of the runtime measurement register this entry extends (0..=3).
    pub imr: u32,

    /// Hex SHA-384 digest folded into the register.
    pub digest: String,

    /// Event name. Well-known names (`app-id`, `key-provider`,
    /// `compose-hash`, `instance-id`, `os-image-hash`) carry payloads the
    /// verifier extracts.
    pub event: String,

    /// Hex payload bytes associated with the event.
    pub event_payload: String,
}

/// Parse a JSON event log.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] if the input is not a JSON array
/// of entries.
pub fn parse_event_log(json: &str) -> Result<Vec<EventLogEntry>, ProtocolError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ordered_entries() {
        let json = r#"[
            {"imr":3,"digest":"aa","event":"app-id","event_payload":"0102"},
            {"imr":3,"digest":"bb","event":"compose-hash","event_payload":"0304"}
        ]"#;

        let log = parse_event_log(json).unwrap();

        assert_eq!(log.len(), 2);
        assert_eq!(log[0].event, "app-id");
        assert_eq!(log[1].digest, "bb");
    }

    #[test]
    fn rejects_non_array_input() {
        assert!(parse_event_log(r#"{"imr":0}"#).is_err());
    }
}
