use sha1::{Digest, Sha1};

/// Stable percent bucket of a payload: first four big-endian bytes of the
/// SHA-1 digest, mod 100. The bucketing must be reproducible across restarts
/// and client implementations, so a runtime-seeded hash is not an option here.
pub fn percent_bucket(payload: &str) -> u32 {
    let hash = Sha1::digest(payload);
    u32::from_be_bytes([hash[0], hash[1], hash[2], hash[3]]) % 100
}

#[cfg(test)]
mod utils_tests {
    use super::percent_bucket;

    #[test]
    fn bucket_is_stable() {
        let first = percent_bucket("foo");
        for _ in 0..10 {
            assert_eq!(percent_bucket("foo"), first);
        }
        assert!(first < 100);
    }
}
