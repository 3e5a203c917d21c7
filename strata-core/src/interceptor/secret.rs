use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Decodes the payload of a `${name::payload}` expression.
pub trait SecretKeysHandler: Send + Sync {
    fn name(&self) -> &str;

    fn decode(&self, secret: &str) -> Result<String, String>;
}

/// `${base64::...}`: standard-alphabet base64 carrying UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64SecretHandler;

impl SecretKeysHandler for Base64SecretHandler {
    fn name(&self) -> &str {
        "base64"
    }

    fn decode(&self, secret: &str) -> Result<String, String> {
        let bytes = STANDARD
            .decode(secret.trim())
            .map_err(|err| format!("invalid base64: {err}"))?;
        String::from_utf8(bytes).map_err(|err| format!("decoded secret is not UTF-8: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_standard_base64() {
        let handler = Base64SecretHandler;
        assert_eq!(handler.decode("c2VjcmV0").as_deref(), Ok("secret"));
    }

    #[test]
    fn rejects_invalid_payloads() {
        let error = Base64SecretHandler
            .decode("not base64!")
            .expect_err("should fail");
        assert!(error.contains("invalid base64"));
    }
}
