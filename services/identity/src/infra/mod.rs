pub mod db;
pub mod ldap;
pub mod memory;
