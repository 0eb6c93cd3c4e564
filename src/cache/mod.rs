pub mod store;
pub mod token_cache;
