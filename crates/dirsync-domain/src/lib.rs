//! Identity types shared by the directory sync services.
//!
//! This crate contains only pure types and validation rules with no I/O.
//! The service layer feeds it values read from the directory and persists
//! whatever it returns.

pub mod derive;
pub mod error;
pub mod group;
pub mod id;
pub mod local_account;
pub mod policy;
pub mod sam_domain;
pub mod unique;
pub mod user;
