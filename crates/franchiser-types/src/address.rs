//! Address normalization.
//!
//! Accepted text: optional `0x` prefix followed by exactly 40 hex digits.
//! Matching is case-insensitive, so mixed-case text is never checked
//! against its EIP-55 checksum. Output is always the checksummed form.

use alloy_primitives::Address;

use crate::{AddressError, ETHERSCAN_ADDRESS_URL};

/// Parse address text, reporting why it was rejected.
pub fn parse_address(text: &str) -> Result<Address, AddressError> {
    let trimmed = text.trim();
    let body = match trimmed.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("0x") => &trimmed[2..],
        _ => trimmed,
    };
    if body.len() != 40 {
        return Err(AddressError::Length(body.len()));
    }

    let bytes = hex::decode(body.to_ascii_lowercase()).map_err(|_| AddressError::NotHex)?;
    Ok(Address::from_slice(&bytes))
}

/// Canonicalize address text; `None` for anything that is not an address.
pub fn normalize_address(text: &str) -> Option<Address> {
    parse_address(text).ok()
}

/// Canonical `0x`-prefixed EIP-55 text.
pub fn to_checksum_text(address: &Address) -> String {
    address.to_checksum(None)
}

/// Whether text looks like a human-readable name rather than an address.
pub fn is_name_like(text: &str) -> bool {
    text.trim().contains('.')
}

/// `0x1234…abcd` form for narrow columns.
pub fn short_address(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}

/// Block explorer link for an address.
pub fn explorer_url(address: &Address) -> String {
    format!("{ETHERSCAN_ADDRESS_URL}{}", address.to_checksum(None))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUMMED: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    #[test]
    fn test_checksummed_text_is_accepted() {
        let address = normalize_address(CHECKSUMMED).unwrap();
        assert_eq!(to_checksum_text(&address), CHECKSUMMED);
    }

    #[test]
    fn test_uniform_case_skips_checksum() {
        let lower = CHECKSUMMED.to_lowercase();
        let upper = format!("0x{}", CHECKSUMMED[2..].to_uppercase());
        assert_eq!(normalize_address(&lower), normalize_address(CHECKSUMMED));
        assert_eq!(normalize_address(&upper), normalize_address(CHECKSUMMED));
    }

    #[test]
    fn test_mixed_case_is_not_checksum_checked() {
        // last letter flipped, so the checksum no longer matches
        let broken = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD";
        assert_eq!(parse_address(broken), parse_address(CHECKSUMMED));
        assert!(parse_address(broken).is_ok());
    }

    #[test]
    fn test_upper_case_prefix_is_accepted() {
        let upper_prefix = format!("0X{}", &CHECKSUMMED[2..].to_lowercase());
        assert_eq!(
            normalize_address(&upper_prefix),
            normalize_address(CHECKSUMMED)
        );
    }

    #[test]
    fn test_short_address() {
        let address = normalize_address(CHECKSUMMED).unwrap();
        assert_eq!(short_address(&address), "0x5aAe…eAed");
    }
}
