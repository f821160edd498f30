use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use qrcode::QrCode;
use qrcode::render::svg;
use rand::Rng;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Standard TOTP parameters: 30-second step, 6-digit codes.
pub const STEP_SECONDS: u64 = 30;
pub const DIGITS: u32 = 6;

/// Accept codes up to two time steps on either side of now.
pub const DRIFT_WINDOW: i64 = 2;

const SECRET_BYTES: usize = 20;

/// Generate a fresh TOTP secret, base32-encoded for provisioning.
#[must_use]
pub fn generate_secret() -> String {
    let bytes: [u8; SECRET_BYTES] = rand::rng().random();
    base32::encode(base32::Alphabet::Rfc4648 { padding: false }, &bytes)
}

/// Compute the 6-digit code for the time step containing `timestamp`.
///
/// Returns `None` when the secret is not valid base32.
#[must_use]
pub fn code_at(secret: &str, timestamp: i64) -> Option<String> {
    let key = decode_secret(secret)?;
    let step = timestamp.div_euclid(STEP_SECONDS as i64);
    if step < 0 {
        return None;
    }
    Some(format!("{:06}", hotp(&key, step as u64)))
}

/// Verify a submitted code against the secret at `timestamp`, tolerating
/// clock drift of up to [`DRIFT_WINDOW`] steps in either direction.
#[must_use]
pub fn verify_code(secret: &str, code: &str, timestamp: i64) -> bool {
    if code.len() != DIGITS as usize || !code.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let Some(key) = decode_secret(secret) else {
        return false;
    };

    let current = timestamp.div_euclid(STEP_SECONDS as i64);
    for delta in -DRIFT_WINDOW..=DRIFT_WINDOW {
        let step = current + delta;
        if step < 0 {
            continue;
        }
        if format!("{:06}", hotp(&key, step as u64)) == code {
            return true;
        }
    }
    false
}

/// Build the `otpauth://` provisioning URI consumed by authenticator apps.
#[must_use]
pub fn provisioning_uri(secret: &str, account: &str, issuer: &str) -> String {
    format!(
        "otpauth://totp/{label}?secret={secret}&issuer={issuer_q}&algorithm=SHA1&digits={DIGITS}&period={STEP_SECONDS}",
        label = urlencoding::encode(&format!("{issuer}:{account}")),
        issuer_q = urlencoding::encode(issuer),
    )
}

/// Render a provisioning URI as a scannable QR image, delivered as a
/// base64 SVG data URL.
pub fn qr_data_url(uri: &str) -> Result<String> {
    let code = QrCode::new(uri.as_bytes())
        .map_err(|e| anyhow::anyhow!("Failed to build QR code: {e}"))?;

    let image = code
        .render::<svg::Color<'_>>()
        .min_dimensions(200, 200)
        .build();

    Ok(format!(
        "data:image/svg+xml;base64,{}",
        BASE64.encode(image.as_bytes())
    ))
}

fn decode_secret(secret: &str) -> Option<Vec<u8>> {
    let normalized = secret.trim().to_ascii_uppercase();
    base32::decode(base32::Alphabet::Rfc4648 { padding: false }, &normalized)
}

/// RFC 4226 HOTP over HMAC-SHA1, truncated to [`DIGITS`] digits.
fn hotp(key: &[u8], counter: u64) -> u32 {
    let Ok(mut mac) = HmacSha1::new_from_slice(key) else {
        // HMAC accepts keys of any length
        return 0;
    };
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let bin = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    bin % 10u32.pow(DIGITS)
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 6238 appendix B reference secret (SHA-1 rows)
    const RFC_SECRET: &[u8] = b"12345678901234567890";

    fn rfc_secret_b32() -> String {
        base32::encode(base32::Alphabet::Rfc4648 { padding: false }, RFC_SECRET)
    }

    #[test]
    fn test_rfc6238_vectors() {
        // (timestamp, last six digits of the RFC's 8-digit code)
        let vectors = [
            (59, "287082"),
            (1_111_111_109, "081804"),
            (1_111_111_111, "050471"),
            (1_234_567_890, "005924"),
            (2_000_000_000, "279037"),
        ];

        let secret = rfc_secret_b32();
        for (timestamp, expected) in vectors {
            assert_eq!(
                code_at(&secret, timestamp).unwrap(),
                expected,
                "timestamp {timestamp}"
            );
        }
    }

    #[test]
    fn test_drift_window() {
        let secret = generate_secret();
        let now = 1_700_000_000;
        let code = code_at(&secret, now).unwrap();

        for drift in [-2i64, -1, 0, 1, 2] {
            assert!(
                verify_code(&secret, &code, now + drift * STEP_SECONDS as i64),
                "drift {drift}"
            );
        }
        assert!(!verify_code(&secret, &code, now + 3 * STEP_SECONDS as i64));
        assert!(!verify_code(&secret, &code, now - 3 * STEP_SECONDS as i64));
    }

    #[test]
    fn test_rejects_malformed_codes() {
        let secret = generate_secret();
        let now = 1_700_000_000;

        assert!(!verify_code(&secret, "12345", now));
        assert!(!verify_code(&secret, "1234567", now));
        assert!(!verify_code(&secret, "abcdef", now));
        assert!(!verify_code(&secret, "", now));
    }

    #[test]
    fn test_rejects_invalid_secret() {
        assert!(code_at("not base32 !!!", 1_700_000_000).is_none());
        assert!(!verify_code("not base32 !!!", "123456", 1_700_000_000));
    }

    #[test]
    fn test_generated_secret_shape() {
        let secret = generate_secret();
        // 20 bytes -> 32 base32 chars without padding
        assert_eq!(secret.len(), 32);
        assert!(decode_secret(&secret).is_some());
        assert_ne!(secret, generate_secret());
    }

    #[test]
    fn test_provisioning_uri() {
        let uri = provisioning_uri("ABC234", "a@b.com", "AISync");
        assert!(uri.starts_with("otpauth://totp/AISync%3Aa%40b.com?"));
        assert!(uri.contains("secret=ABC234"));
        assert!(uri.contains("issuer=AISync"));
        assert!(uri.contains("digits=6"));
        assert!(uri.contains("period=30"));
    }

    #[test]
    fn test_qr_data_url() {
        let uri = provisioning_uri(&generate_secret(), "a@b.com", "AISync");
        let data_url = qr_data_url(&uri).unwrap();
        assert!(data_url.starts_with("data:image/svg+xml;base64,"));
    }
}
