pub mod common;

mod token_expiration;
