pub mod catalog;
pub mod token;
