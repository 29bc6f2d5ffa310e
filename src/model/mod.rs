pub mod config;
pub mod enums;
