//! Event-log replay and well-known event extraction.

use panda_crypto::{codec, hash};
use panda_proto::EventLogEntry;

use crate::error::AttestError;

/// Number of runtime measurement registers.
pub const REGISTER_COUNT: usize = 4;

/// Well-known event carrying the application identity.
const EVENT_APP_ID: &str = "app-id";
/// Well-known event naming the key-provisioning authority.
const EVENT_KEY_PROVIDER: &str = "key-provider";
/// Well-known event carrying the workload compose hash.
const EVENT_COMPOSE_HASH: &str = "compose-hash";
/// Well-known event carrying the instance identity.
const EVENT_INSTANCE_ID: &str = "instance-id";
/// Well-known event carrying the OS image hash.
const EVENT_OS_IMAGE_HASH: &str = "os-image-hash";

/// Replay the ordered event log into the four measurement registers.
///
/// Each register starts as 48 zero bytes and is folded forward as
/// `register = SHA-384(register || digest)` for every entry targeting
/// it, in log order. Replay is a pure function of the input sequence;
/// order is significant and the fold is not commutative.
///
/// # Errors
///
/// Returns `Codec` for an out-of-range register index or a digest that
/// is not 48-byte hex.
pub fn replay_event_log(
    entries: &[EventLogEntry],
) -> Result<[[u8; 48]; REGISTER_COUNT], AttestError> {
    let mut registers = [[0u8; 48]; REGISTER_COUNT];

    for entry in entries {
        let index = entry.imr as usize;
        if index >= REGISTER_COUNT {
            return Err(AttestError::Codec(format!("imr {} out of range", entry.imr)));
        }

        let digest: [u8; 48] = codec::hex_decode_array(&entry.digest)
            .map_err(|_| AttestError::Codec(format!("digest for {} is not 48-byte hex", entry.event)))?;

        let mut preimage = [0u8; 96];
        preimage[..48].copy_from_slice(&registers[index]);
        preimage[48..].copy_from_slice(&digest);
        registers[index] = hash::sha384(&preimage);
    }

    Ok(registers)
}

/// Application facts extracted from well-known events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AppInfo {
    /// Application identity, hex as logged.
    pub app_id: String,
    /// Key-provider payload bytes (hashed into `mr_system`).
    pub key_provider: Vec<u8>,
    /// Workload compose hash, hex as logged.
    pub compose_hash: String,
    /// Instance identity, hex as logged.
    pub instance_id: String,
    /// OS image hash, hex as logged.
    pub os_image_hash: String,
}

/// Scan the event log for the required well-known events.
///
/// The first occurrence of each name wins. Every field is required: a
/// missing event is a hard [`AttestError::MissingEventField`], never a
/// default.
pub(crate) fn extract_app_info(entries: &[EventLogEntry]) -> Result<AppInfo, AttestError> {
    let payload = |name: &'static str| -> Result<&str, AttestError> {
        entries
            .iter()
            .find(|entry| entry.event == name)
            .map(|entry| entry.event_payload.as_str())
            .ok_or(AttestError::MissingEventField { field: name })
    };

    let key_provider_hex = payload(EVENT_KEY_PROVIDER)?;
    let key_provider = codec::hex_decode(key_provider_hex)
        .map_err(|_| AttestError::Codec("key-provider payload is not hex".to_string()))?;

    Ok(AppInfo {
        app_id: payload(EVENT_APP_ID)?.to_string(),
        key_provider,
        compose_hash: payload(EVENT_COMPOSE_HASH)?.to_string(),
        instance_id: payload(EVENT_INSTANCE_ID)?.to_string(),
        os_image_hash: payload(EVENT_OS_IMAGE_HASH)?.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(imr: u32, digest_fill: u8, event: &str, payload: &str) -> EventLogEntry {
        EventLogEntry {
            imr,
            digest: codec::hex_encode(&[digest_fill; 48]),
            event: event.to_string(),
            event_payload: payload.to_string(),
        }
    }

    fn full_log() -> Vec<EventLogEntry> {
        vec![
            entry(0, 0x10, "boot", ""),
            entry(3, 0x20, EVENT_APP_ID, "0a0b0c"),
            entry(3, 0x21, EVENT_KEY_PROVIDER, "1122"),
            entry(3, 0x22, EVENT_COMPOSE_HASH, "deadbeef"),
            entry(3, 0x23, EVENT_INSTANCE_ID, "0042"),
            entry(3, 0x24, EVENT_OS_IMAGE_HASH, "cafe"),
        ]
    }

    #[test]
    fn replay_is_deterministic() {
        let log = full_log();

        assert_eq!(replay_event_log(&log).unwrap(), replay_event_log(&log).unwrap());
    }

    #[test]
    fn replay_matches_manual_fold() {
        let log = vec![entry(1, 0x55, "first", ""), entry(1, 0x66, "second", "")];

        let mut expected = [0u8; 48];
        for fill in [0x55u8, 0x66] {
            let mut preimage = [0u8; 96];
            preimage[..48].copy_from_slice(&expected);
            preimage[48..].copy_from_slice(&[fill; 48]);
            expected = hash::sha384(&preimage);
        }

        assert_eq!(replay_event_log(&log).unwrap()[1], expected);
    }

    #[test]
    fn replay_order_is_significant() {
        let forward = vec![entry(2, 0x01, "a", ""), entry(2, 0x02, "b", "")];
        let reversed = vec![entry(2, 0x02, "b", ""), entry(2, 0x01, "a", "")];

        assert_ne!(
            replay_event_log(&forward).unwrap()[2],
            replay_event_log(&reversed).unwrap()[2]
        );
    }

    #[test]
    fn untouched_registers_stay_zero() {
        let log = vec![entry(1, 0x55, "only-one", "")];

        let registers = replay_event_log(&log).unwrap();

        assert_eq!(registers[0], [0u8; 48]);
        assert_ne!(registers[1], [0u8; 48]);
        assert_eq!(registers[2], [0u8; 48]);
        assert_eq!(registers[3], [0u8; 48]);
    }

    #[test]
    fn flipping_one_digest_character_changes_the_register() {
        let mut log = full_log();
        let baseline = replay_event_log(&log).unwrap();

        let mut digest = log[1].digest.clone().into_bytes();
        digest[0] = if digest[0] == b'0' { b'1' } else { b'0' };
        log[1].digest = String::from_utf8(digest).unwrap();

        let changed = replay_event_log(&log).unwrap();

        assert_ne!(baseline[3], changed[3]);
        assert_eq!(baseline[0], changed[0], "other registers are unaffected");
    }

    #[test]
    fn out_of_range_register_is_rejected() {
        let log = vec![entry(4, 0x01, "bad", "")];

        assert!(matches!(replay_event_log(&log).unwrap_err(), AttestError::Codec(_)));
    }

    #[test]
    fn truncated_digest_is_rejected() {
        let mut log = full_log();
        log[0].digest = "abcd".to_string();

        assert!(matches!(replay_event_log(&log).unwrap_err(), AttestError::Codec(_)));
    }

    #[test]
    fn extraction_collects_all_required_events() {
        let info = extract_app_info(&full_log()).unwrap();

        assert_eq!(info.app_id, "0a0b0c");
        assert_eq!(info.key_provider, vec![0x11, 0x22]);
        assert_eq!(info.compose_hash, "deadbeef");
        assert_eq!(info.instance_id, "0042");
        assert_eq!(info.os_image_hash, "cafe");
    }

    #[test]
    fn missing_app_id_is_a_hard_failure() {
        let log: Vec<EventLogEntry> =
            full_log().into_iter().filter(|e| e.event != EVENT_APP_ID).collect();

        assert_eq!(
            extract_app_info(&log).unwrap_err(),
            AttestError::MissingEventField { field: "app-id" }
        );
    }

    #[test]
    fn missing_key_provider_is_a_hard_failure() {
        let log: Vec<EventLogEntry> =
            full_log().into_iter().filter(|e| e.event != EVENT_KEY_PROVIDER).collect();

        assert_eq!(
            extract_app_info(&log).unwrap_err(),
            AttestError::MissingEventField { field: "key-provider" }
        );
    }
}
