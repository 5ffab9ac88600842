use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::Result;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password with bcrypt at the given cost
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Check a password against a stored bcrypt hash
///
/// A malformed or empty stored hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::warn!("Stored password hash is not valid bcrypt: {}", e);
            false
        }
    }
}

/// Whether `hash` has the shape of a bcrypt hash (`$2b$<cost>$<salt+hash>`)
pub fn is_password_hash(hash: &str) -> bool {
    hash.parse::<bcrypt::HashParts>().is_ok()
}

// =============================================================================
// Session Tokens
// =============================================================================

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub usuario: String,
    pub perfil: String,
    /// Unix timestamp after which the token is rejected
    pub expires_at: i64,
}

/// Compute the hex HMAC-SHA256 signature of `data`
pub fn sign(data: &str, secret: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(data.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify HMAC-SHA256 signature
///
/// # Arguments
/// * `data` - The data that was signed
/// * `signature` - The hex-encoded HMAC signature
/// * `secret` - The shared secret key (from environment)
pub fn verify_hmac(data: &str, signature: &str, secret: &str) -> bool {
    // Create HMAC instance with secret key
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return false;
        }
    };

    mac.update(data.as_bytes());

    // Decode hex signature
    let sig_bytes = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Invalid hex signature format");
            return false;
        }
    };

    // Constant-time comparison
    mac.verify_slice(&sig_bytes).is_ok()
}

/// Issue a token: `hex(claims json).hex(hmac)`
pub fn issue_session_token(claims: &SessionClaims, secret: &str) -> Result<String> {
    let payload = hex::encode(serde_json::to_vec(claims)?);
    let signature = sign(&payload, secret)?;
    Ok(format!("{}.{}", payload, signature))
}

/// Verify a token's signature and expiry, returning its claims
pub fn verify_session_token(token: &str, secret: &str, now: i64) -> Option<SessionClaims> {
    let (payload, signature) = token.split_once('.')?;

    if !verify_hmac(payload, signature, secret) {
        tracing::warn!("Session token signature mismatch");
        return None;
    }

    let bytes = hex::decode(payload).ok()?;
    let claims: SessionClaims = serde_json::from_slice(&bytes).ok()?;

    if claims.expires_at <= now {
        tracing::debug!(usuario = %claims.usuario, "Session token expired");
        return None;
    }

    Some(claims)
}
