//! Verification Code Generation

use rand::Rng;

/// Generate a numeric code of `length` decimal digits.
///
/// Leading zeros are kept, so the code is always exactly `length`
/// characters long.
pub fn generate_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_has_requested_length() {
        assert_eq!(generate_code(6).len(), 6);
        assert_eq!(generate_code(8).len(), 8);
        assert!(generate_code(0).is_empty());
    }

    #[test]
    fn test_code_is_digits_only() {
        for _ in 0..100 {
            assert!(generate_code(6).chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_codes_vary() {
        let codes: std::collections::HashSet<String> = (0..50).map(|_| generate_code(6)).collect();
        assert!(codes.len() > 1);
    }
}
