use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use tracing::warn;

/// Random key for signing sessions when none is configured.
pub fn generate_secret() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

/// The configured secret, or a generated one when it is missing or blank.
/// An empty HMAC key would let anyone sign a session.
pub fn resolve_secret(configured: Option<String>) -> String {
    match configured {
        Some(secret) if !secret.trim().is_empty() => secret,
        Some(_) => {
            warn!("SECRET_KEY is blank, generating one; sessions will not survive a restart");
            generate_secret()
        }
        None => {
            warn!("SECRET_KEY not set, generating one; sessions will not survive a restart");
            generate_secret()
        }
    }
}
