//! Tamper-evident signed values, the building block of trusted cookies.
//!
//! # Wire format
//!
//! ```text
//! base64(payload) | unix_seconds | base64url(HMAC-SHA256(secret, name ‖ base64(payload) ‖ unix_seconds))
//! ```
//!
//! `|` never occurs in any segment: base64 and base64url alphabets exclude it,
//! the timestamp is decimal digits.
//!
//! The cookie `name` is folded into the MAC so a value signed for one cookie
//! cannot be replayed under another. The MAC input has no separators, so a
//! digit could in principle be shifted from the payload into the timestamp
//! without changing the MAC input. Timestamps with a leading zero are
//! therefore rejected outright.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SECONDS_PER_DAY: i64 = 86_400;

/// How far in the future a timestamp may lie before it is rejected.
pub const FUTURE_SKEW_SECS: i64 = 300;

/// Length of secrets created by [`Signer::generate`].
pub const GENERATED_SECRET_LEN: usize = 32;

/// Signs and verifies values with a shared secret.
///
/// Cheap to clone; the secret is never printed by `Debug`.
#[derive(Clone)]
pub struct Signer {
    secret: Vec<u8>,
}

impl Signer {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self { secret: secret.into() }
    }

    /// A signer with a fresh random secret drawn from `rng`.
    pub fn generate(rng: &mut impl RngCore) -> Self {
        let mut secret = vec![0u8; GENERATED_SECRET_LEN];
        rng.fill_bytes(&mut secret);
        Self { secret }
    }

    /// Signs `payload` for the cookie `name`, timestamped now.
    pub fn sign(&self, name: &str, payload: &[u8]) -> String {
        self.sign_at(name, payload, now())
    }

    pub fn sign_at(&self, name: &str, payload: &[u8], timestamp: i64) -> String {
        let value = STANDARD.encode(payload);
        let timestamp = timestamp.to_string();
        let signature = self.mac(name, &value, &timestamp).finalize().into_bytes();
        format!("{value}|{timestamp}|{}", URL_SAFE_NO_PAD.encode(signature))
    }

    /// Verifies `token` and returns its payload.
    ///
    /// `None` when the token is malformed, the signature does not match, or
    /// the timestamp is older than `max_age_days` or too far in the future.
    pub fn verify(&self, name: &str, token: &str, max_age_days: u32) -> Option<Vec<u8>> {
        self.verify_at(name, token, max_age_days, now())
    }

    pub fn verify_at(&self, name: &str, token: &str, max_age_days: u32, now: i64) -> Option<Vec<u8>> {
        let mut parts = token.split('|');
        let (Some(value), Some(timestamp), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return None;
        };

        if timestamp.is_empty()
            || timestamp.starts_with('0')
            || !timestamp.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        // verify_slice compares in constant time.
        self.mac(name, value, timestamp).verify_slice(&signature).ok()?;

        let issued: i64 = timestamp.parse().ok()?;
        if issued < now - i64::from(max_age_days) * SECONDS_PER_DAY {
            return None;
        }
        if issued > now + FUTURE_SKEW_SECS {
            return None;
        }

        STANDARD.decode(value).ok()
    }

    fn mac(&self, name: &str, value: &str, timestamp: &str) -> HmacSha256 {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(name.as_bytes());
        mac.update(value.as_bytes());
        mac.update(timestamp.as_bytes());
        mac
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
