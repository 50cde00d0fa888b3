//! Save-time policy passed explicitly into the identity store.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const USERNAME_PLACEHOLDER: &str = "{username}";

/// Template for home directories, e.g. `/home/{username}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HomeTemplate(String);

impl HomeTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, ValidationError> {
        let template = template.into();
        if !template.contains(USERNAME_PLACEHOLDER) {
            return Err(ValidationError::invalid(
                "home_template",
                format!("must contain {USERNAME_PLACEHOLDER}"),
            ));
        }
        Ok(Self(template))
    }

    pub fn render(&self, username: &str) -> String {
        self.0.replace(USERNAME_PLACEHOLDER, username)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for HomeTemplate {
    fn default() -> Self {
        Self("/home/{username}".to_owned())
    }
}

impl TryFrom<String> for HomeTemplate {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<HomeTemplate> for String {
    fn from(value: HomeTemplate) -> Self {
        value.0
    }
}

/// Everything the record store needs to know about deployment settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityPolicy {
    pub home_template: HomeTemplate,
    /// Populate and require the Samba compatibility fields on users.
    pub compatibility: bool,
}
