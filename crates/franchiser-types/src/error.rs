use thiserror::Error;

/// Why a piece of text is not a valid address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("expected 40 hex digits, found {0} characters")]
    Length(usize),

    #[error("address contains non-hex characters")]
    NotHex,
}
