use std::time::Duration;

use serde::Deserialize;

use dirsync_core::config::Config;
use dirsync_core::tracing::LogFormat;
use dirsync_domain::policy::{HomeTemplate, IdentityPolicy};

use crate::infra::ldap::LdapSettings;

/// Identity service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct IdentityConfig {
    /// Must contain `{username}`. Env var: `HOME_TEMPLATE`.
    #[serde(default)]
    pub home_template: HomeTemplate,
    /// Enables Samba fields and legacy hashes. Env var: `ENABLE_COMPATIBILITY_SUBSYSTEM`.
    #[serde(default)]
    pub enable_compatibility_subsystem: bool,
    #[serde(default = "default_ldap_url")]
    pub ldap_url: String,
    #[serde(default)]
    pub ldap_bind_dn: String,
    #[serde(default)]
    pub ldap_bind_password: String,
    #[serde(default = "default_ldap_base_dn")]
    pub ldap_base_dn: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub ldap_connect_timeout_secs: u64,
    /// Local account store. Env var: `DATABASE_URL`.
    pub database_url: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_ldap_url() -> String {
    "ldap://localhost:389".to_owned()
}

fn default_ldap_base_dn() -> String {
    "dc=example,dc=com".to_owned()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Config for IdentityConfig {}

impl IdentityConfig {
    pub fn policy(&self) -> IdentityPolicy {
        IdentityPolicy {
            home_template: self.home_template.clone(),
            compatibility: self.enable_compatibility_subsystem,
        }
    }

    pub fn ldap_settings(&self) -> LdapSettings {
        LdapSettings {
            url: self.ldap_url.clone(),
            bind_dn: self.ldap_bind_dn.clone(),
            bind_password: self.ldap_bind_password.clone(),
            base_dn: self.ldap_base_dn.clone(),
            connect_timeout: Duration::from_secs(self.ldap_connect_timeout_secs),
        }
    }
}
