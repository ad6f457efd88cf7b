pub mod error;
pub mod identifier;
pub mod summary;
pub mod time;
