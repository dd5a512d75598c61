//! Request signing.
//!
//! Three schemes share the same canonical form: parameter keys are sorted
//! byte-wise ascending and rendered as `key=value&` before a scheme-specific
//! suffix is appended. Map iteration order never leaks into a signature.
//!
//! - [`generic_sign`]: MD5, upper-case hex. Used by the merchant payment API
//!   and the client-side payment payload.
//! - [`login_status_sign`]: HMAC-SHA256 of an opaque body keyed by the user's
//!   session key.
//! - [`midas_sign`]: HMAC-SHA256 of the canonical form plus the request path,
//!   used by the virtual-currency API.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac as _};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng as _};
use serde_json::{Map, Value};
use sha2::Sha256;

use crate::Result;

/// Alphabet used for nonces.
pub const NONCE_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of the `nonce_str` sent with payment orders.
pub const NONCE_LEN: usize = 32;

/// Signs `params` with the merchant key.
///
/// The string `k1=v1&k2=v2&...&key=<key>` is hashed with MD5 and returned as
/// 32 upper-case hex characters. `params` is expected to hold unique keys.
pub fn generic_sign<I, K, V>(key: &str, params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(K, V)> = params.into_iter().collect();
    pairs.sort_unstable_by(|(a, _), (b, _)| a.as_ref().cmp(b.as_ref()));

    let mut canonical = String::new();
    for (k, v) in &pairs {
        canonical.push_str(k.as_ref());
        canonical.push('=');
        canonical.push_str(v.as_ref());
        canonical.push('&');
    }
    canonical.push_str("key=");
    canonical.push_str(key);

    format!("{:x}", md5::compute(canonical.as_bytes())).to_ascii_uppercase()
}

/// Signs a raw request body with the user's session key (`sig_method=hmac_sha256`).
pub fn login_status_sign(session_key: &str, body: &[u8]) -> Result<String> {
    hmac_sha256_hex(session_key.as_bytes(), body)
}

/// Signs a virtual-currency payload.
///
/// Values are rendered the way they read in JSON without quotes: strings
/// verbatim, numbers and booleans in decimal/literal form.
pub fn midas_sign(secret: &str, path: &str, params: &Map<String, Value>) -> Result<String> {
    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort_unstable();

    let mut canonical = String::new();
    for k in keys {
        canonical.push_str(k);
        canonical.push('=');
        push_value(&mut canonical, &params[k.as_str()]);
        canonical.push('&');
    }
    canonical.push_str(&format!("org_loc={path}&method=POST&secret={secret}"));

    hmac_sha256_hex(secret.as_bytes(), canonical.as_bytes())
}

/// Adds `sig`, `access_token` and `mp_sig` to a virtual-currency payload.
///
/// `sig` covers the caller's fields only; `mp_sig` is computed after
/// `access_token` and `sig` are in place and so covers both.
pub fn sign_midas_payload(
    secret: &str,
    path: &str,
    access_token: &str,
    payload: &mut Map<String, Value>,
) -> Result<()> {
    let sig = midas_sign(secret, path, payload)?;
    payload.insert("sig".to_owned(), Value::String(sig));
    payload.insert(
        "access_token".to_owned(),
        Value::String(access_token.to_owned()),
    );
    let mp_sig = midas_sign(secret, path, payload)?;
    payload.insert("mp_sig".to_owned(), Value::String(mp_sig));
    Ok(())
}

fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => out.push_str(s),
        Value::Null => {}
        other => out.push_str(&other.to_string()),
    }
}

// HMAC takes keys of any length, so `new_from_slice` never fails for
// `Hmac<Sha256>`. The `Result` keeps the public signing functions stable if
// the MAC constructor is swapped for one that does reject keys.
fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> Result<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Draws `len` characters from [`NONCE_ALPHABET`].
pub fn random_string<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(NONCE_ALPHABET[rng.random_range(0..NONCE_ALPHABET.len())]))
        .collect()
}

/// Shared anti-replay nonce generator.
///
/// Not a source of secrets: the generator is seeded from the wall clock and
/// only has to avoid duplicate order nonces. Clones share one generator.
#[derive(Clone, Debug)]
pub struct NonceSource {
    rng: Arc<Mutex<StdRng>>,
}

impl NonceSource {
    /// Seeds a generator from the current time.
    #[must_use]
    pub fn from_clock() -> Self {
        Self::from_seed(clock_seed())
    }

    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    #[must_use]
    pub fn generate(&self, len: usize) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        random_string(&mut *rng, len)
    }
}

impl Default for NonceSource {
    fn default() -> Self {
        Self::from_clock()
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "only the low bits of the clock are needed for a seed"
)]
fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64)
}
