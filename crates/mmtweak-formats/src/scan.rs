//! Bounded byte scanning within a record
//!
//! Both helpers work on a slice that ends at the record boundary. A scan
//! that reaches the end of the slice reports `None`; callers turn that into
//! [`UnlockError::OutOfBounds`](crate::UnlockError::OutOfBounds).

/// Distance from the start of `bytes` to the first `target` byte
pub fn count_until(bytes: &[u8], target: u8) -> Option<usize> {
    bytes.iter().position(|&b| b == target)
}

/// Overwrite every byte before the first `terminator` with ASCII `'0'`
///
/// Returns the number of bytes overwritten. The terminator itself is left
/// untouched. When no terminator exists in `bytes` nothing is written.
pub fn zero_fill_line(bytes: &mut [u8], terminator: u8) -> Option<usize> {
    let len = count_until(bytes, terminator)?;
    bytes[..len].fill(b'0');
    Some(len)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_count_until() {
        assert_eq!(count_until(b"BaseName=vpbus\r\n", b'='), Some(8));
        assert_eq!(count_until(b"UnlockScore=0", b'U'), Some(0));
        assert_eq!(count_until(b"Order=-1\r\n", b'U'), None);
        assert_eq!(count_until(b"", b'U'), None);
    }

    #[test]
    fn test_zero_fill_line() {
        let mut line = *b"32\r\nMass=8310";
        assert_eq!(zero_fill_line(&mut line, 0x0D), Some(2));
        assert_eq!(&line, b"00\r\nMass=8310");
    }

    #[test]
    fn test_zero_fill_empty_value() {
        let mut line = *b"\r\n";
        assert_eq!(zero_fill_line(&mut line, 0x0D), Some(0));
        assert_eq!(&line, b"\r\n");
    }

    #[test]
    fn test_zero_fill_without_terminator_is_untouched() {
        let mut line = *b"12345";
        assert_eq!(zero_fill_line(&mut line, 0x0D), None);
        assert_eq!(&line, b"12345");
    }

    proptest! {
        #[test]
        fn zero_fill_replaces_digits_only(
            digits in "[0-9]{0,12}",
            tail in prop::collection::vec(any::<u8>(), 0..32),
        ) {
            let mut line = digits.clone().into_bytes();
            line.push(0x0D);
            line.extend_from_slice(&tail);
            let original = line.clone();

            let written = zero_fill_line(&mut line, 0x0D);
            prop_assert_eq!(written, Some(digits.len()));
            prop_assert!(line[..digits.len()].iter().all(|&b| b == b'0'));
            prop_assert_eq!(&line[digits.len()..], &original[digits.len()..]);

            // Zeroing is stable under re-application
            let again = line.clone();
            zero_fill_line(&mut line, 0x0D);
            prop_assert_eq!(line, again);
        }

        #[test]
        fn count_until_matches_first_occurrence(
            bytes in prop::collection::vec(any::<u8>(), 0..64),
            target in any::<u8>(),
        ) {
            match count_until(&bytes, target) {
                Some(n) => {
                    prop_assert_eq!(bytes[n], target);
                    prop_assert!(!bytes[..n].contains(&target));
                }
                None => prop_assert!(!bytes.contains(&target)),
            }
        }
    }
}
