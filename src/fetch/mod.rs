pub mod fetcher;
pub mod interval;
pub mod service;
