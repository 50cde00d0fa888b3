//! Derivation rules for user fields left blank at save time.
//!
//! Applied in order: full name, gecos, home directory.

use unicode_normalization::UnicodeNormalization;

use crate::policy::HomeTemplate;
use crate::user::UserRecord;

/// `"<first> <last>"`.
pub fn derive_full_name(first_name: &str, last_name: &str) -> String {
    format!("{first_name} {last_name}")
}

/// Transliterate to the closest ASCII form, dropping what has none.
pub fn ascii_fold(value: &str) -> String {
    value.nfkd().filter(char::is_ascii).collect()
}

/// Fill blank derived fields of `user` in place.
///
/// Gecos is ASCII-folded even when supplied, since the POSIX field is ASCII.
pub fn fill_derived_fields(user: &mut UserRecord, home_template: &HomeTemplate) {
    if user.full_name.is_empty() {
        user.full_name = derive_full_name(&user.first_name, &user.last_name);
    }
    let gecos = if user.gecos.is_empty() {
        &user.full_name
    } else {
        &user.gecos
    };
    user.gecos = ascii_fold(gecos);
    if user.home_directory.is_empty() {
        user.home_directory = home_template.render(&user.username);
    }
}
