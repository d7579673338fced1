//! Challenge-response HTTP header names.
//!
//! The client proves server identity per exchange: the request carries a
//! fresh challenge, and the response must carry the server's proof
//! headers. Absence of any response header is a hard verification failure
//! (enforced by the verifier, not here).

/// Request header carrying the client-generated challenge nonce (hex).
pub const CHALLENGE: &str = "Panda-Challenge";

/// Response header carrying the server's compressed P-256 public key (hex).
pub const PUBLIC_KEY: &str = "Panda-Public-key";

/// Response header carrying the ECDSA signature over the proof payload (hex).
pub const SIGNATURE: &str = "Panda-Signature";

/// Response header carrying the server's Unix timestamp in seconds (decimal).
pub const TIMESTAMP: &str = "Panda-Timestamp";

/// Response header carrying the server-generated random value (hex).
pub const SERVER_RANDOM: &str = "Panda-Server-Random";

/// All response headers the verifier requires, in extraction order.
pub const REQUIRED_RESPONSE_HEADERS: [&str; 4] =
    [PUBLIC_KEY, SIGNATURE, TIMESTAMP, SERVER_RANDOM];
