//! GitHub webhook signature verification

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::error;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Verify a `X-Hub-Signature-256` header against the raw request body.
///
/// The header carries `sha256=<hex(HMAC-SHA256(secret, body))>`. The
/// comparison runs in constant time via `Mac::verify_slice`.
pub fn verify_signature(secret: &str, payload: &[u8], signature_header: &str) -> bool {
    let Some(hex_digest) = signature_header.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };

    let signature_bytes = match hex::decode(hex_digest) {
        Ok(bytes) => bytes,
        Err(_) => {
            error!("Signature header is not valid hex");
            return false;
        }
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);
    mac.verify_slice(&signature_bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn accepts_matching_signature() {
        let body = br#"{"ref":"refs/heads/main"}"#;
        let header = sign("s3cret", body);
        assert!(verify_signature("s3cret", body, &header));
    }

    #[test]
    fn rejects_mutated_body() {
        let body = br#"{"ref":"refs/heads/main"}"#;
        let header = sign("s3cret", body);
        let mut tampered = body.to_vec();
        tampered[0] ^= 0x01;
        assert!(!verify_signature("s3cret", &tampered, &header));
    }

    #[test]
    fn rejects_mutated_signature() {
        let body = b"payload";
        let mut header = sign("s3cret", body);
        // Flip the last hex digit.
        let last = header.pop().unwrap();
        header.push(if last == '0' { '1' } else { '0' });
        assert!(!verify_signature("s3cret", body, &header));
    }

    #[test]
    fn rejects_wrong_secret() {
        let body = b"payload";
        let header = sign("s3cret", body);
        assert!(!verify_signature("other", body, &header));
    }

    #[test]
    fn rejects_missing_prefix_and_bad_hex() {
        assert!(!verify_signature("s3cret", b"payload", "deadbeef"));
        assert!(!verify_signature("s3cret", b"payload", "sha256=zzzz"));
        assert!(!verify_signature("s3cret", b"payload", ""));
    }
}
