pub mod authenticated;
pub mod request;
pub mod transport;
