pub mod local_accounts;
