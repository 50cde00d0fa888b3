use serde::Serialize;

/// A local (non-directory) account kept in step with a directory user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalAccount {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}
