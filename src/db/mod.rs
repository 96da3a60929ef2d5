pub mod cache;
pub mod connection;
