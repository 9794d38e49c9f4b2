//! Webhook signature verification.
//!
//! The identity provider signs deliveries with the svix scheme: the secret is
//! `whsec_` followed by a base64 key, the signed content is
//! `{svix-id}.{svix-timestamp}.{body}`, and the `svix-signature` header holds
//! one or more space-separated `v1,<base64 hmac>` candidates. Verification
//! either accepts or rejects a delivery; there is no partial trust.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

/// Maximum allowed clock skew between delivery and verification (replay window).
const TOLERANCE_SECS: i64 = 300;

/// Errors that can occur during webhook verification.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The configured secret is not usable.
    #[error("invalid webhook secret: {0}")]
    InvalidSecret(String),

    /// The delivery failed verification.
    #[error("invalid webhook signature: {0}")]
    InvalidSignature(String),
}

/// Verifier for svix-signed webhook deliveries.
pub struct WebhookVerifier {
    key: Vec<u8>,
}

impl WebhookVerifier {
    /// Build a verifier from a `whsec_`-prefixed signing secret.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::InvalidSecret` if the key portion is not valid
    /// base64.
    pub fn new(secret: &str) -> Result<Self, WebhookError> {
        let encoded = secret.strip_prefix("whsec_").unwrap_or(secret);
        let key = BASE64
            .decode(encoded)
            .map_err(|e| WebhookError::InvalidSecret(e.to_string()))?;

        Ok(Self { key })
    }

    /// Verify one delivery against its `svix-*` headers.
    ///
    /// # Arguments
    ///
    /// * `msg_id` - The `svix-id` header value
    /// * `timestamp` - The `svix-timestamp` header value (unix seconds)
    /// * `signature_header` - The `svix-signature` header value
    /// * `payload` - The raw request body
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::InvalidSignature` if the timestamp is outside
    /// the replay window or no signature candidate matches.
    pub fn verify(
        &self,
        msg_id: &str,
        timestamp: &str,
        signature_header: &str,
        payload: &str,
    ) -> Result<(), WebhookError> {
        // Check timestamp to prevent replay attacks
        let ts: i64 = timestamp
            .parse()
            .map_err(|_| WebhookError::InvalidSignature("Invalid timestamp".to_owned()))?;

        let now_secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| WebhookError::InvalidSignature(e.to_string()))?
            .as_secs();

        let now = i64::try_from(now_secs)
            .map_err(|_| WebhookError::InvalidSignature("System time overflow".to_owned()))?;

        if (now - ts).abs() > TOLERANCE_SECS {
            return Err(WebhookError::InvalidSignature(
                "Delivery timestamp too old".to_owned(),
            ));
        }

        // Compute the expected signature over id.timestamp.payload
        let signed_content = format!("{msg_id}.{timestamp}.{payload}");

        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key)
            .map_err(|e| WebhookError::InvalidSignature(e.to_string()))?;
        mac.update(signed_content.as_bytes());

        let expected = BASE64.encode(mac.finalize().into_bytes());

        // The header may carry several versioned candidates; any matching v1
        // signature accepts the delivery.
        for candidate in signature_header.split_whitespace() {
            if let Some(sig) = candidate.strip_prefix("v1,")
                && constant_time_compare(&expected, sig)
            {
                return Ok(());
            }
        }

        Err(WebhookError::InvalidSignature(
            "Signature mismatch".to_owned(),
        ))
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &[u8] = b"webhook-signing-key-0123456789ab";

    fn test_secret() -> String {
        format!("whsec_{}", BASE64.encode(TEST_KEY))
    }

    fn now_string() -> String {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time before epoch")
            .as_secs()
            .to_string()
    }

    fn sign(msg_id: &str, timestamp: &str, payload: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(TEST_KEY).expect("valid key length");
        mac.update(format!("{msg_id}.{timestamp}.{payload}").as_bytes());
        format!("v1,{}", BASE64.encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_verify_valid_signature() {
        let verifier = WebhookVerifier::new(&test_secret()).expect("verifier");
        let timestamp = now_string();
        let payload = r#"{"type":"user.created"}"#;
        let signature = sign("msg_1", &timestamp, payload);

        assert!(
            verifier
                .verify("msg_1", &timestamp, &signature, payload)
                .is_ok()
        );
    }

    #[test]
    fn test_verify_accepts_any_candidate_in_list() {
        let verifier = WebhookVerifier::new(&test_secret()).expect("verifier");
        let timestamp = now_string();
        let payload = "{}";
        let header = format!("v1,bogus {}", sign("msg_2", &timestamp, payload));

        assert!(verifier.verify("msg_2", &timestamp, &header, payload).is_ok());
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let verifier = WebhookVerifier::new(&test_secret()).expect("verifier");
        let timestamp = now_string();
        let signature = sign("msg_3", &timestamp, "original");

        let result = verifier.verify("msg_3", &timestamp, &signature, "tampered");
        assert!(matches!(result, Err(WebhookError::InvalidSignature(_))));
    }

    #[test]
    fn test_verify_rejects_old_timestamp() {
        let verifier = WebhookVerifier::new(&test_secret()).expect("verifier");
        let old = (std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time before epoch")
            .as_secs()
            - 600)
            .to_string();
        let signature = sign("msg_4", &old, "{}");

        let result = verifier.verify("msg_4", &old, &signature, "{}");
        assert!(matches!(result, Err(WebhookError::InvalidSignature(_))));
    }

    #[test]
    fn test_verify_rejects_unknown_scheme() {
        let verifier = WebhookVerifier::new(&test_secret()).expect("verifier");
        let timestamp = now_string();
        // Correct hmac but declared under an unknown version prefix
        let header = sign("msg_5", &timestamp, "{}").replace("v1,", "v2,");

        let result = verifier.verify("msg_5", &timestamp, &header, "{}");
        assert!(matches!(result, Err(WebhookError::InvalidSignature(_))));
    }

    #[test]
    fn test_new_rejects_bad_base64() {
        assert!(matches!(
            WebhookVerifier::new("whsec_not-base64!!"),
            Err(WebhookError::InvalidSecret(_))
        ));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
    }
}
