pub mod exchange;
pub mod token_manager;
