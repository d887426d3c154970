//! Errors surfaced by channel operations and message parsing.

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enum of failures reported by the MAM core.
pub enum Error {
    /// The seed is not exactly 81 trytes long.
    InvalidSeedLength(usize),
    /// A string contains a character outside the tryte alphabet.
    InvalidTrytes,
    /// A trit buffer cannot be rendered as trytes because its length is not
    /// a multiple of 3.
    InvalidTritLength(usize),
    /// The security level is not 1, 2 or 3.
    InvalidSecurityLevel(u8),
    /// The side key is empty or longer than 81 trytes.
    InvalidSideKeyLength(usize),
    /// A side key was supplied for a mode that does not take one.
    UnexpectedSideKey,
    /// Restricted mode requires a side key.
    MissingSideKey,
    /// The mode tag is not one of "public", "private" or "restricted".
    UnknownMode(String),
    /// The root is not exactly 81 trytes long.
    InvalidRootLength(usize),
    /// A Merkle window of zero leaves was requested.
    InvalidLeafCount(usize),
    /// The message index does not fall inside the current Merkle window.
    LeafIndexOutOfRange(usize, usize),
    /// A length-prefixed field runs past the end of the payload.
    UnexpectedEndOfPayload,
    /// A zero was encoded in a non-canonical form.
    NonCanonicalZero,
    /// A self-delimiting integer does not fit the value range.
    ValueOutOfRange,
    /// No prefix of the message hash carries zero weight, so the payload
    /// cannot have been produced by the nonce search.
    InvalidHammingWeight,
    /// The root recomputed from the signature and sibling path does not
    /// match the expected channel root.
    RootMismatch,
    /// The nonce search region is wider than the sponge rate.
    InvalidNonceLength(usize),
}
