pub mod group;
pub mod mirror;
pub mod password;
pub mod sam_domain;
pub mod user;
