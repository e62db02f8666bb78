//! API key generation and hashing
//!
//! Keys look like `rlty_<name-slug>_<32 hex chars>`. Only the SHA-256 hash
//! and a short display prefix are stored; the full key is returned once.

use rand::Rng;
use sha2::{Digest, Sha256};

const API_KEY_PREFIX: &str = "rlty_";
const MAX_SLUG_LEN: usize = 24;

/// Freshly generated key material
#[derive(Debug, Clone)]
pub struct GeneratedApiKey {
    /// Full key, shown to the caller once
    pub key: String,
    /// Non-secret prefix for display, e.g. `rlty_whatsapp-bot_a1b2c3d4...`
    pub prefix: String,
    pub key_hash: String,
}

/// Lowercase, dash-separated, at most 24 chars: "WhatsApp Bot #2" -> "whatsapp-bot-2"
fn slugify_name(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let mut slug = slug.trim_end_matches('-').to_string();
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        slug = slug.trim_end_matches('-').to_string();
    }
    slug
}

/// Generate a new random key for the named integration
pub fn generate_api_key(name: &str) -> GeneratedApiKey {
    let random_bytes: [u8; 16] = rand::thread_rng().gen();
    let random_hex = hex::encode(random_bytes);

    let slug = slugify_name(name);
    let (key, prefix) = if slug.is_empty() {
        (
            format!("{}{}", API_KEY_PREFIX, random_hex),
            format!("{}{}...", API_KEY_PREFIX, &random_hex[..8]),
        )
    } else {
        (
            format!("{}{}_{}", API_KEY_PREFIX, slug, random_hex),
            format!("{}{}_{}...", API_KEY_PREFIX, slug, &random_hex[..8]),
        )
    };

    GeneratedApiKey {
        key_hash: hash_api_key(&key),
        key,
        prefix,
    }
}

/// SHA-256 hex digest of a key
pub fn hash_api_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Whether a header value looks like one of our keys rather than a JWT
pub fn looks_like_api_key(value: &str) -> bool {
    value.starts_with(API_KEY_PREFIX)
}
