use std::sync::LazyLock;

use regex::Regex;

use super::ApiError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{3,}$").expect("username regex is valid"));

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    if email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(ApiError::validation("Invalid email address"));
    }
    Ok(email)
}

pub fn validate_username(username: &str) -> Result<&str, ApiError> {
    if username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(ApiError::validation(
            "Username must be at least 3 characters and contain only letters, numbers, and underscores",
        ));
    }
    Ok(username)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }
    if password.len() < 6 {
        return Err(ApiError::validation(
            "Password must be at least 6 characters",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ApiError::validation(
            "Password must contain at least one uppercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ApiError::validation(
            "Password must contain at least one lowercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ApiError::validation(
            "Password must contain at least one number",
        ));
    }
    Ok(password)
}

pub fn validate_two_factor_code(code: &str) -> Result<&str, ApiError> {
    if code.is_empty() {
        return Err(ApiError::validation("Verification code is required"));
    }
    if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::validation(
            "Verification code must be 6 digits",
        ));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("first.last@example.co.uk").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("spaces in@address.com").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("abc").is_ok());
        assert!(validate_username("user_42").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("dash-ed").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Abcdef1").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("Ab1").is_err());
        assert!(validate_password("abcdef1").is_err());
        assert!(validate_password("ABCDEF1").is_err());
        assert!(validate_password("Abcdefg").is_err());
    }

    #[test]
    fn test_validate_two_factor_code() {
        assert!(validate_two_factor_code("123456").is_ok());
        assert!(validate_two_factor_code("000000").is_ok());
        assert!(validate_two_factor_code("").is_err());
        assert!(validate_two_factor_code("12345").is_err());
        assert!(validate_two_factor_code("1234567").is_err());
        assert!(validate_two_factor_code("12345a").is_err());
    }
}
