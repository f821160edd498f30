use chrono::Utc;
use rand::Rng;

/// Reset tokens live for exactly one hour.
pub const RESET_TOKEN_TTL_SECS: i64 = 3600;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const FRAGMENT_LEN: usize = 13;

/// Generate an opaque password-reset token: two random base-36 fragments
/// plus the current timestamp in base-36, hex re-encoded.
///
/// Uniqueness is probabilistic; tokens are not checked against existing
/// ones at issuance time.
#[must_use]
pub fn generate_token() -> String {
    let mut rng = rand::rng();

    let mut raw = String::with_capacity(2 * FRAGMENT_LEN + 10);
    for _ in 0..2 * FRAGMENT_LEN {
        raw.push(BASE36[rng.random_range(0..BASE36.len())] as char);
    }
    raw.push_str(&to_base36(Utc::now().timestamp_millis()));

    hex::encode(raw)
}

/// Expiry for a token issued now, as epoch milliseconds.
#[must_use]
pub fn expiry_from_now() -> i64 {
    Utc::now().timestamp_millis() + RESET_TOKEN_TTL_SECS * 1000
}

fn to_base36(mut n: i64) -> String {
    if n <= 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_hex_and_high_entropy() {
        let token = generate_token();

        assert!(token.len() > 50);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

        let decoded = hex::decode(&token).unwrap();
        let decoded = String::from_utf8(decoded).unwrap();
        assert!(decoded.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tokens_differ_between_calls() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_expiry_is_one_hour_out() {
        let before = Utc::now().timestamp_millis() + RESET_TOKEN_TTL_SECS * 1000;
        let expiry = expiry_from_now();
        let after = Utc::now().timestamp_millis() + RESET_TOKEN_TTL_SECS * 1000;

        assert!(expiry >= before && expiry <= after);
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(36 * 36 + 1), "101");
    }
}
