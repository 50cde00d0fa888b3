//! Password storage encodings for directory user entries.
//!
//! The primary scheme is OpenLDAP's salted SHA-1 (`{SSHA}`). The LAN Manager
//! and NT hashes are only produced for the Samba compatibility subsystem.
//! Nothing here logs or keeps plaintext.

mod codec;
mod legacy;
mod secret;
mod ssha;

pub use codec::{EncodedPassword, LegacyHashes, PasswordCodec};
pub use legacy::{encode_lm, encode_nt};
pub use secret::{DEFAULT_SECRET_LEN, generate_random_secret};
pub use ssha::{SSHA_HASH_LEN, SSHA_TAG, encode_primary, is_usable, verify_primary};
