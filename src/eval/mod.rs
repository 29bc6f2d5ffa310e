pub mod compile;
pub mod ops;
