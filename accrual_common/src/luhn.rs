//! Luhn checksum validation for order numbers.

/// Returns true if `number` is a non-empty string of decimal digits (spaces are ignored) with a valid Luhn checksum.
pub fn is_valid_luhn(number: &str) -> bool {
    let mut digits = number.chars().filter(|c| *c != ' ').peekable();
    if digits.peek().is_none() {
        return false;
    }
    let mut sum = 0u32;
    for (i, c) in digits.collect::<Vec<char>>().into_iter().rev().enumerate() {
        let Some(mut digit) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}

#[cfg(test)]
mod test {
    use super::is_valid_luhn;

    #[test]
    fn valid_numbers() {
        assert!(is_valid_luhn("12345678903"));
        assert!(is_valid_luhn("79927398713"));
        assert!(is_valid_luhn("4561 2612 1234 5467"));
        assert!(is_valid_luhn("0"));
    }

    #[test]
    fn invalid_numbers() {
        assert!(!is_valid_luhn("12345678904"));
        assert!(!is_valid_luhn(""));
        assert!(!is_valid_luhn("   "));
        assert!(!is_valid_luhn("1234a678903"));
        assert!(!is_valid_luhn("-12345678903"));
    }
}
