mod helpers;

mod domain_test;
mod group_test;
mod mirror_test;
mod password_test;
mod user_test;
