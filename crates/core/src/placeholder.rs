//! Deterministic placeholder image URLs.
//!
//! When every generation attempt for an image fails, or an upload
//! cannot complete, the pipeline substitutes a placeholder URL instead
//! of failing the caller or persisting inline base64 data.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Base URL of the placeholder image service.
pub const PLACEHOLDER_BASE_URL: &str = "https://placehold.co/1024x768";

/// Build a deterministic placeholder URL for one slot.
///
/// The query parameter is drawn from a PRNG seeded by the entity key
/// and slot index, so repeated runs produce identical URLs and distinct
/// slots produce distinct ones.
pub fn placeholder_url(entity_key: &str, index: usize) -> String {
    let mut rng = StdRng::seed_from_u64(seed_of(entity_key, index));
    let token: u32 = rng.random();
    format!("{PLACEHOLDER_BASE_URL}?seed={token}")
}

/// FNV-1a over the key plus the slot index.
fn seed_of(entity_key: &str, index: usize) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in entity_key.bytes().chain(index.to_le_bytes()) {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_same_url() {
        assert_eq!(placeholder_url("style-deco", 0), placeholder_url("style-deco", 0));
    }

    #[test]
    fn different_slots_differ() {
        assert_ne!(placeholder_url("style-deco", 0), placeholder_url("style-deco", 1));
    }

    #[test]
    fn different_entities_differ() {
        assert_ne!(placeholder_url("style-deco", 0), placeholder_url("style-wabi", 0));
    }

    #[test]
    fn url_is_https() {
        assert!(placeholder_url("style-deco", 2).starts_with("https://"));
    }
}
