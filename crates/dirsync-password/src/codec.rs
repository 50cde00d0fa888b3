use crate::legacy::{encode_lm, encode_nt};
use crate::ssha::{encode_primary, is_usable, verify_primary};

/// Legacy hashes stored on Samba accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyHashes {
    pub lm: String,
    pub nt: String,
}

/// Every stored form of one plaintext password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPassword {
    pub primary: String,
    /// `Some` only when the codec was built with compatibility enabled.
    pub legacy: Option<LegacyHashes>,
}

/// Encodes passwords according to the deployment's compatibility setting.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordCodec {
    compatibility: bool,
}

impl PasswordCodec {
    pub fn new(compatibility: bool) -> Self {
        Self { compatibility }
    }

    pub fn encode(&self, plaintext: &str) -> EncodedPassword {
        let legacy = self.compatibility.then(|| LegacyHashes {
            lm: encode_lm(plaintext),
            nt: encode_nt(plaintext),
        });
        EncodedPassword {
            primary: encode_primary(plaintext),
            legacy,
        }
    }

    pub fn verify(&self, plaintext: &str, encoded: &str) -> bool {
        verify_primary(plaintext, encoded)
    }

    pub fn is_usable(&self, encoded: &str) -> bool {
        is_usable(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_skip_legacy_hashes_by_default() {
        let encoded = PasswordCodec::default().encode("password");
        assert!(encoded.legacy.is_none());
        assert!(is_usable(&encoded.primary));
    }

    #[test]
    fn should_add_legacy_hashes_when_compatible() {
        let codec = PasswordCodec::new(true);
        let encoded = codec.encode("password");
        assert!(codec.verify("password", &encoded.primary));
        assert_eq!(
            encoded.legacy,
            Some(LegacyHashes {
                lm: "E52CAC67419A9A224A3B108F3FA6CB6D".into(),
                nt: "8846F7EAEE8FB117AD06BDD830B7586C".into(),
            })
        );
    }
}
