//! Protocol-level errors.

use thiserror::Error;

/// Errors produced while encoding or decoding protocol messages.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// A message could not be parsed as the expected JSON shape.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_error_wraps_serde_detail() {
        let err = serde_json::from_str::<crate::VaultRequest>("not json")
            .map_err(ProtocolError::from)
            .err();

        let Some(err) = err else { unreachable!("parsing garbage must fail") };
        assert!(err.to_string().starts_with("malformed message:"));
    }
}
