//! Property-based tests for the password envelope.
//!
//! 1. **Rotation equivalence**: what the new envelope decrypts to under
//!    the new key equals what the old envelope decrypts to under the
//!    old key, for all passwords and key pairs
//! 2. **Key binding**: an envelope opens under exactly its own key
//! 3. **Format stability**: encode/decode preserves the version tag

use panda_crypto::{IV_SIZE, SecretKey};
use panda_vault::SealedPassword;
use proptest::prelude::*;

fn key_strategy() -> impl Strategy<Value = [u8; 32]> {
    prop::collection::vec(any::<u8>(), 32..=32).prop_map(|v| {
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&v);
        arr
    })
}

fn iv_strategy() -> impl Strategy<Value = [u8; IV_SIZE]> {
    prop::collection::vec(any::<u8>(), IV_SIZE..=IV_SIZE).prop_map(|v| {
        let mut arr = [0u8; IV_SIZE];
        arr.copy_from_slice(&v);
        arr
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_rotation_preserves_password(
        password in prop::collection::vec(any::<u8>(), 1..200),
        old_key in key_strategy(),
        new_key in key_strategy(),
        iv_old in iv_strategy(),
        iv_new in iv_strategy(),
    ) {
        let old_envelope =
            SealedPassword::seal_current(&password, &SecretKey::from_array(old_key), iv_old);

        // What a bootstrap does: open with old, reseal with new.
        let recovered = old_envelope.open_with(&old_key).unwrap();
        let new_envelope =
            SealedPassword::seal_current(&recovered, &SecretKey::from_array(new_key), iv_new);

        prop_assert_eq!(
            new_envelope.open_with(&new_key).unwrap(),
            old_envelope.open_with(&old_key).unwrap()
        );
    }

    #[test]
    fn prop_envelope_binds_to_its_key(
        password in prop::collection::vec(any::<u8>(), 1..200),
        key_a in key_strategy(),
        key_b in key_strategy(),
        iv in iv_strategy(),
    ) {
        prop_assume!(key_a != key_b);

        let sealed = SealedPassword::seal_current(&password, &SecretKey::from_array(key_a), iv);

        prop_assert!(sealed.open_with(&key_b).is_err());
    }

    #[test]
    fn prop_codec_roundtrip_preserves_envelope(
        password in prop::collection::vec(any::<u8>(), 0..200),
        key in key_strategy(),
        iv in iv_strategy(),
    ) {
        let sealed = SealedPassword::seal_current(&password, &SecretKey::from_array(key), iv);

        let json = sealed.encode().unwrap();
        let back = SealedPassword::decode(&json).unwrap();

        prop_assert_eq!(&back, &sealed);
        prop_assert_eq!(back.open_with(&key).unwrap(), password);
    }
}
