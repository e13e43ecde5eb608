//! Minimal Solidity ABI encoding for TRC20 call parameters.

use num_bigint::BigUint;

use super::GatewayError;
use crate::address::Address;

const WORD: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Address(Address),
    Uint(BigUint),
}

/// Left-pad the 20-byte account hash into one word. The `0x41` prefix is dropped.
pub fn address_word(address: &Address) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 20..].copy_from_slice(address.account_hash());
    word
}

pub fn uint_word(value: &BigUint) -> Result<[u8; WORD], GatewayError> {
    let bytes = value.to_bytes_be();
    if bytes.len() > WORD {
        return Err(GatewayError::InvalidRequest(format!(
            "amount {} does not fit in uint256",
            value
        )));
    }
    let mut word = [0u8; WORD];
    word[WORD - bytes.len()..].copy_from_slice(&bytes);
    Ok(word)
}

/// Hex-encoded static parameter block, as `triggersmartcontract` expects.
pub fn encode_params(tokens: &[Token]) -> Result<String, GatewayError> {
    let mut out = Vec::with_capacity(tokens.len() * WORD);
    for token in tokens {
        let word = match token {
            Token::Address(a) => address_word(a),
            Token::Uint(v) => uint_word(v)?,
        };
        out.extend_from_slice(&word);
    }
    Ok(hex::encode(out))
}

/// First return word of a constant call, read as `uint256`.
pub fn decode_uint(result_hex: &str) -> Result<BigUint, GatewayError> {
    let bytes = hex::decode(result_hex.trim_start_matches("0x"))
        .map_err(|e| GatewayError::InvalidResponse(format!("constant_result: {}", e)))?;
    if bytes.len() < WORD {
        return Err(GatewayError::InvalidResponse(format!(
            "constant_result is {} bytes, expected a {}-byte word",
            bytes.len(),
            WORD
        )));
    }
    Ok(BigUint::from_bytes_be(&bytes[..WORD]))
}
