use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::RngExt;
use sha1::{Digest, Sha1};

/// Scheme tag prefixing every primary hash.
pub const SSHA_TAG: &str = "{SSHA}";

/// Total length of a primary hash including the tag: 6 + base64(20 + 4 bytes).
pub const SSHA_HASH_LEN: usize = 38;

const SALT_LEN: usize = 4;
const DIGEST_LEN: usize = 20;

/// `{SSHA}` + base64(sha1(plaintext || salt) || salt) with a fresh 4-byte salt.
pub fn encode_primary(plaintext: &str) -> String {
    let salt: [u8; SALT_LEN] = rand::rng().random();
    encode_with_salt(plaintext, &salt)
}

fn encode_with_salt(plaintext: &str, salt: &[u8]) -> String {
    let mut payload = salted_digest(plaintext, salt);
    payload.extend_from_slice(salt);
    format!("{SSHA_TAG}{}", STANDARD.encode(payload))
}

fn salted_digest(plaintext: &str, salt: &[u8]) -> Vec<u8> {
    let mut hasher = Sha1::new();
    hasher.update(plaintext.as_bytes());
    hasher.update(salt);
    hasher.finalize().to_vec()
}

/// Recompute the digest with the stored salt and compare.
///
/// Comparison is not constant-time.
pub fn verify_primary(plaintext: &str, encoded: &str) -> bool {
    let Some(body) = encoded.strip_prefix(SSHA_TAG) else {
        return false;
    };
    let Ok(decoded) = STANDARD.decode(body) else {
        return false;
    };
    if decoded.len() <= DIGEST_LEN {
        return false;
    }
    let (digest, salt) = decoded.split_at(DIGEST_LEN);
    salted_digest(plaintext, salt) == digest
}

/// Structural check: tag, total length, and base64 alphabet after the tag.
///
/// A `false` result marks a placeholder or disabled credential.
pub fn is_usable(encoded: &str) -> bool {
    let Some(body) = encoded.strip_prefix(SSHA_TAG) else {
        return false;
    };
    encoded.len() == SSHA_HASH_LEN
        && body
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'/' || b == b'+')
}
