//! Minimal Solidity ABI codec for the handful of calls the viewer makes.
//!
//! Arguments: `address`, `bytes32`, `string`. Returns: `address`, `string`
//! and the lens contract's `(address,address,address,uint256)[][]`.

use alloy_primitives::{keccak256, Address, B256, U256};

use franchiser_types::{DelegationEdge, DelegationTable};

use crate::ChainError;

const WORD: usize = 32;

/// Encoded size of one `(address,address,address,uint256)` tuple.
const EDGE_SIZE: usize = 4 * WORD;

/// A single call argument.
#[derive(Debug, Clone, Copy)]
pub enum Token<'a> {
    Address(Address),
    Bytes32(B256),
    String(&'a str),
}

/// First four bytes of the keccak-256 of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Calldata for `selector(args...)`.
pub fn encode_call(selector: [u8; 4], args: &[Token<'_>]) -> Vec<u8> {
    let head_len = WORD * args.len();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for arg in args {
        match arg {
            Token::Address(address) => {
                head.extend_from_slice(&[0u8; 12]);
                head.extend_from_slice(address.as_slice());
            }
            Token::Bytes32(value) => head.extend_from_slice(value.as_slice()),
            Token::String(text) => {
                head.extend_from_slice(&usize_word(head_len + tail.len()));
                tail.extend_from_slice(&usize_word(text.len()));
                tail.extend_from_slice(text.as_bytes());
                let padding = (WORD - text.len() % WORD) % WORD;
                tail.extend(std::iter::repeat(0u8).take(padding));
            }
        }
    }

    let mut data = Vec::with_capacity(4 + head.len() + tail.len());
    data.extend_from_slice(&selector);
    data.extend_from_slice(&head);
    data.extend_from_slice(&tail);
    data
}

fn usize_word(value: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&(value as u64).to_be_bytes());
    word
}

fn word(data: &[u8], offset: usize) -> Result<&[u8], ChainError> {
    let end = offset
        .checked_add(WORD)
        .ok_or_else(|| ChainError::Abi("offset overflow".into()))?;
    data.get(offset..end).ok_or_else(|| {
        ChainError::Abi(format!("word at {offset} past end of {} bytes", data.len()))
    })
}

/// Read a length or offset word. Anything that cannot index into `data` is rejected.
fn read_usize(data: &[u8], offset: usize) -> Result<usize, ChainError> {
    let w = word(data, offset)?;
    if w[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(ChainError::Abi(format!("oversized length/offset at {offset}")));
    }
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&w[WORD - 8..]);
    let value = u64::from_be_bytes(raw);
    if value > data.len() as u64 {
        return Err(ChainError::Abi(format!("length/offset {value} exceeds payload")));
    }
    Ok(value as usize)
}

/// Decode a single address word; the upper 12 bytes must be zero.
pub fn decode_address(word: &[u8]) -> Result<Address, ChainError> {
    if word.len() != WORD {
        return Err(ChainError::Abi(format!("address word is {} bytes", word.len())));
    }
    if word[..12].iter().any(|b| *b != 0) {
        return Err(ChainError::Abi("dirty high bytes in address word".into()));
    }
    Ok(Address::from_slice(&word[12..]))
}

/// Return data of a function returning `address`.
pub fn decode_address_return(data: &[u8]) -> Result<Address, ChainError> {
    decode_address(word(data, 0)?)
}

/// Return data of a function returning `string`.
pub fn decode_string_return(data: &[u8]) -> Result<String, ChainError> {
    let offset = read_usize(data, 0)?;
    let len = read_usize(data, offset)?;
    let start = offset + WORD;
    let bytes = start
        .checked_add(len)
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| ChainError::Abi("string runs past end of payload".into()))?;
    String::from_utf8(bytes.to_vec())
        .map_err(|e| ChainError::Abi(format!("string is not UTF-8: {e}")))
}

/// Return data of `getAllDelegations(address,address)`.
///
/// Row and column order is preserved exactly; no linkage is inferred here.
pub fn decode_delegation_table(data: &[u8]) -> Result<DelegationTable, ChainError> {
    if data.is_empty() {
        return Err(ChainError::Abi("empty return data".into()));
    }

    let outer = read_usize(data, 0)?;
    let row_count = read_usize(data, outer)?;
    let rows_base = outer + WORD;
    if row_count.saturating_mul(WORD) > data.len() {
        return Err(ChainError::Abi(format!("{row_count} rows cannot fit in payload")));
    }

    let mut rows = Vec::with_capacity(row_count);
    for i in 0..row_count {
        let relative = read_usize(data, rows_base + i * WORD)?;
        let row_start = rows_base
            .checked_add(relative)
            .ok_or_else(|| ChainError::Abi("row offset overflow".into()))?;
        let column_count = read_usize(data, row_start)?;
        if column_count.saturating_mul(EDGE_SIZE) > data.len() {
            return Err(ChainError::Abi(format!(
                "row {i}: {column_count} edges cannot fit in payload"
            )));
        }

        let mut row = Vec::with_capacity(column_count);
        for j in 0..column_count {
            let at = row_start + WORD + j * EDGE_SIZE;
            row.push(DelegationEdge {
                delegator: decode_address(word(data, at)?)?,
                delegatee: decode_address(word(data, at + WORD)?)?,
                franchiser: decode_address(word(data, at + 2 * WORD)?)?,
                votes: U256::from_be_slice(word(data, at + 3 * WORD)?),
            });
        }
        rows.push(row);
    }

    Ok(DelegationTable::new(rows))
}
