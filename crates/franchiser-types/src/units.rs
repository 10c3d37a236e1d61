use alloy_primitives::U256;

/// 10^18, the number of base units in one vote.
const UNIT: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Human-readable vote amount.
///
/// Zero renders as `"0"`. Anything else is shown in whole tokens with trailing
/// fractional zeros trimmed, keeping at least one fractional digit
/// (`1.0`, `0.5`, `1234.000000000000000001`).
pub fn format_votes(votes: U256) -> String {
    if votes.is_zero() {
        return "0".to_string();
    }

    let whole = votes / UNIT;
    let fraction = (votes % UNIT).to_string();
    let padded = format!("{fraction:0>width$}", width = crate::VOTE_DECIMALS);
    let trimmed = padded.trim_end_matches('0');
    let fraction = if trimmed.is_empty() { "0" } else { trimmed };

    format!("{whole}.{fraction}")
}

/// Whole tokens to base units; test and demo helper.
pub fn votes_from_tokens(tokens: u64) -> U256 {
    U256::from(tokens) * UNIT
}
