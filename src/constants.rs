/// The version of the crate.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const PRELOAD_ENDPOINT: &str = "/flags/load";
pub const SYNC_ENDPOINT: &str = "/flags/sync";

#[cfg(test)]
pub mod test_constants {
    pub const MOCK_PROJECT: &str = "test-project";
}
