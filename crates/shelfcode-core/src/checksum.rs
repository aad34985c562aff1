//! # Checksum Codec
//!
//! The single check digit appended to every 12-digit payload.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Positional-Weight Check Digit                           │
//! │                                                                         │
//! │  payload:   4  0  0  6  3  8  1  3  3  3  9  3                          │
//! │  position:  0  1  2  3  4  5  6  7  8  9 10 11                          │
//! │  weight:    1  3  1  3  1  3  1  3  1  3  1  3                          │
//! │                                                                         │
//! │  sum = 4+0+0+18+3+24+1+9+3+9+9+9 = 89                                  │
//! │  m   = 89 mod 10 = 9                                                    │
//! │  digit = (m == 0) ? 0 : 10 - m  = 1                                     │
//! │                                                                         │
//! │  full code: 4006381333931                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Payloads shorter than 12 digits are treated as left-zero-padded, so
//! `checksum("123")` equals `checksum("000000000123")`.

use crate::error::{BarcodeError, BarcodeResult};

/// Number of digits covered by the check digit.
pub const PAYLOAD_LEN: usize = 12;

/// Computes the check digit for a payload of at most 12 ASCII digits.
///
/// ## Errors
/// `MalformedCode` if the payload is longer than 12 characters or contains
/// anything but ASCII digits.
///
/// ## Example
/// ```rust
/// use shelfcode_core::checksum::checksum;
///
/// assert_eq!(checksum("400638133393").unwrap(), 1);
/// assert_eq!(checksum("590123412345").unwrap(), 7);
/// ```
pub fn checksum(payload: &str) -> BarcodeResult<u8> {
    if payload.len() > PAYLOAD_LEN || !payload.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BarcodeError::MalformedCode(payload.to_string()));
    }

    // Left padding shifts every digit to its position in the 12-digit frame.
    let offset = PAYLOAD_LEN - payload.len();
    let sum: u32 = payload
        .bytes()
        .enumerate()
        .map(|(i, b)| {
            let digit = u32::from(b - b'0');
            if (i + offset) % 2 == 0 {
                digit
            } else {
                digit * 3
            }
        })
        .sum();

    Ok(check_digit_from_sum(sum))
}

#[inline]
fn check_digit_from_sum(sum: u32) -> u8 {
    let m = (sum % 10) as u8;
    if m == 0 {
        0
    } else {
        10 - m
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;

    #[test]
    fn test_known_check_digits() {
        assert_eq!(checksum("400638133393").unwrap(), 1);
        assert_eq!(checksum("590123412345").unwrap(), 7);
        assert_eq!(checksum("000000000000").unwrap(), 0);
        assert_eq!(checksum("200070000001").unwrap(), 8);
        assert_eq!(checksum("300070000001").unwrap(), 7);
    }

    #[test]
    fn test_short_payload_is_left_padded() {
        assert_eq!(checksum("123").unwrap(), checksum("000000000123").unwrap());
        assert_eq!(checksum("").unwrap(), 0);
    }

    #[test]
    fn test_rejects_bad_payloads() {
        assert!(matches!(
            checksum("4006381333931"),
            Err(BarcodeError::MalformedCode(_))
        ));
        assert!(checksum("40063813339a").is_err());
        assert!(checksum("4006 8133393").is_err());
    }

    #[test]
    fn test_every_payload_verifies_with_its_own_digit() {
        // Walk a spread of payloads rather than all 10^12.
        for n in (0u64..1_000_000_000_000).step_by(7_919_000_003) {
            let payload = format!("{:012}", n);
            let digit = checksum(&payload).unwrap();
            assert!(digit <= 9);
            assert!(validate(&format!("{}{}", payload, digit)));
            assert!(!validate(&format!("{}{}", payload, (digit + 1) % 10)));
        }
    }
}
