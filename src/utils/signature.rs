use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

const SHA1_PREFIX: &str = "sha1=";
const SHA256_PREFIX: &str = "sha256=";

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("signature has no recognised algorithm prefix")]
    MissingPrefix,
    #[error("signature is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("secret cannot be used as an HMAC key")]
    InvalidKey,
}

/// Checks a GitHub `X-Hub-Signature` (`sha1=<hex>`) or
/// `X-Hub-Signature-256` (`sha256=<hex>`) value against the raw payload.
///
/// Returns `Ok(false)` for a well-formed signature that does not match, and
/// an error when the signature cannot be decoded at all.
pub fn verify_github_signature(
    secret: &str,
    payload: &[u8],
    signature: &str,
) -> Result<bool, SignatureError> {
    if let Some(signature_hex) = signature.strip_prefix(SHA256_PREFIX) {
        let signature_bytes = hex::decode(signature_hex)?;
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidKey)?;
        mac.update(payload);
        let expected = mac.finalize().into_bytes();
        return Ok(expected.ct_eq(&signature_bytes[..]).into());
    }

    let signature_hex = signature
        .strip_prefix(SHA1_PREFIX)
        .ok_or(SignatureError::MissingPrefix)?;
    let signature_bytes = hex::decode(signature_hex)?;

    let mut mac =
        HmacSha1::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(payload);
    let expected = mac.finalize().into_bytes();

    Ok(expected.ct_eq(&signature_bytes[..]).into())
}

/// Produces the `sha1=<hex>` signature GitHub sends for `payload`.
#[cfg(test)]
pub fn sign_payload(secret: &str, payload: &[u8]) -> Result<String, SignatureError> {
    let mut mac =
        HmacSha1::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(payload);
    Ok(format!(
        "{SHA1_PREFIX}{}",
        hex::encode(mac.finalize().into_bytes())
    ))
}
