use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-pipedrive-signature";

/// Hex-encoded HMAC-SHA256 of `body` under `secret`.
pub fn sign(secret: &str, body: &[u8]) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks a hex digest (optionally prefixed with `sha256=`) against the raw
/// request body. Comparison is constant time.
pub fn verify(secret: &str, body: &[u8], provided: &str) -> bool {
    let provided = provided.trim();
    let provided = provided.strip_prefix("sha256=").unwrap_or(provided);
    let Ok(expected) = hex::decode(provided) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };

    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"event":"added.deal","current":{"id":42}}"#;

    #[test]
    fn accepts_matching_digest() {
        let digest = sign("s3cret", BODY).unwrap();

        assert_eq!(digest.len(), 64);
        assert!(verify("s3cret", BODY, &digest));
        assert!(verify("s3cret", BODY, &digest.to_uppercase()));
        assert!(verify("s3cret", BODY, &format!("sha256={digest}")));
    }

    #[test]
    fn rejects_wrong_secret_body_or_encoding() {
        let digest = sign("s3cret", BODY).unwrap();

        assert!(!verify("other", BODY, &digest));
        assert!(!verify("s3cret", b"{}", &digest));
        assert!(!verify("s3cret", BODY, "not-hex"));
        assert!(!verify("s3cret", BODY, ""));
        assert!(!verify("s3cret", BODY, &digest[..32]));
    }
}
