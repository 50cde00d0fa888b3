//! Samba domain entries, used only by the compatibility subsystem.

use serde::Serialize;

/// A `sambaDomain` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainRecord {
    pub domain_name: String,
    /// Domain SID such as `S-1-5-21-1-2-3`, unique across domains.
    pub security_identifier_prefix: String,
}

impl DomainRecord {
    /// Algorithmic RID mapping: `<prefix>-<2 * uid + 1000>`.
    pub fn security_identifier(&self, uid: u32) -> String {
        let rid = 2 * u64::from(uid) + 1000;
        format!("{}-{rid}", self.security_identifier_prefix)
    }
}
