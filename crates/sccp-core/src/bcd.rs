//! Swapped-nibble BCD packing of address digits
//!
//! Two digits per octet, the first digit in the low nibble and the second
//! in the high nibble. An odd digit count leaves the last high nibble to a
//! filler value; the encoding scheme of the global title tells the peer
//! whether the filler is significant.

use crate::error::Error;
use crate::Result;

/// Filler nibble used for odd digit counts in SCCP global titles
pub const DEFAULT_FILLER: u8 = 0x0;

/// Pack a decimal digit string into swapped-nibble BCD
pub fn digits_to_swapped_bytes(digits: &str, filler: u8) -> Result<Vec<u8>> {
    let mut nibbles = Vec::with_capacity(digits.len() + 1);
    for (position, c) in digits.chars().enumerate() {
        match c.to_digit(10) {
            Some(d) => nibbles.push(d as u8),
            None => return Err(Error::InvalidDigit { digit: c, position }),
        }
    }
    if nibbles.len() % 2 == 1 {
        nibbles.push(filler & 0x0F);
    }

    Ok(nibbles
        .chunks(2)
        .map(|pair| pair[0] | (pair[1] << 4))
        .collect())
}

/// Unpack swapped-nibble BCD into a digit string
///
/// With `odd` set, the high nibble of the last octet is the filler and is
/// dropped without being checked.
pub fn swapped_bytes_to_digits(bytes: &[u8], odd: bool) -> Result<String> {
    let mut digits = String::with_capacity(bytes.len() * 2);
    for (position, byte) in bytes.iter().enumerate() {
        let last = position + 1 == bytes.len();
        let nibbles = [byte & 0x0F, byte >> 4];
        for (i, nibble) in nibbles.iter().enumerate() {
            if last && odd && i == 1 {
                break;
            }
            if *nibble > 9 {
                return Err(Error::InvalidBcd {
                    nibble: *nibble,
                    position,
                });
            }
            digits.push(char::from(b'0' + nibble));
        }
    }
    Ok(digits)
}
