//! Decoding of raw storage words

use std::fmt::{self, Display, Formatter};

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

use crate::constants::{NUM_BYTES_ADDRESS, NUM_BYTES_ADDRESS_PADDING, NUM_BYTES_STORAGE_SLOT};

/// How the high-order padding of an address word is treated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodeMode {
    /// Discard the 12 padding bytes without looking at them
    #[default]
    Lenient,
    /// Reject words whose padding bytes are not all zero
    Strict,
}

/// A storage word that does not hold a zero-padded address
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirtyPaddingError {
    /// The offending word
    pub word: B256,
}

impl Display for DirtyPaddingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "storage word {} has non-zero bytes above the address", self.word)
    }
}

impl std::error::Error for DirtyPaddingError {}

/// Decodes an address from the low-order 20 bytes of a storage word
pub fn word_to_address(word: B256) -> Address {
    Address::from_slice(&word[NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..NUM_BYTES_STORAGE_SLOT])
}

/// Decodes an address from a storage word under the given mode
pub fn decode_address(word: B256, mode: DecodeMode) -> Result<Address, DirtyPaddingError> {
    if mode == DecodeMode::Strict && word[..NUM_BYTES_ADDRESS_PADDING].iter().any(|b| *b != 0) {
        return Err(DirtyPaddingError { word });
    }

    Ok(word_to_address(word))
}

/// Encodes an address into a zero-padded storage word
pub fn address_to_word(address: Address) -> B256 {
    let mut word = B256::ZERO;
    word[NUM_BYTES_ADDRESS_PADDING..].copy_from_slice(address.as_slice());
    word
}
