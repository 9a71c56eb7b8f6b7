//! State Hashing
//!
//! SHA-256 over a fixed field order. Transcripts store one hash per
//! accepted intent and replays must land on the same values.

use sha2::{Sha256, Digest};
use super::hex::HexCoord;

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// SHA-256 with a domain tag and little-endian field encoders.
///
/// Callers must feed fields in a fixed order.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for match state.
    pub fn for_match_state() -> Self {
        Self::new(b"WARHEX_STATE_V1")
    }

    /// Create hasher for an intent log.
    pub fn for_intent_log() -> Self {
        Self::new(b"WARHEX_INTENTS_V1")
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an i32 value (little-endian).
    #[inline]
    pub fn update_i32(&mut self, value: i32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with an optional hex coordinate.
    #[inline]
    pub fn update_coord(&mut self, coord: Option<HexCoord>) {
        match coord {
            Some(c) => {
                self.update_u8(1);
                self.update_i32(c.q);
                self.update_i32(c.r);
            }
            None => self.update_u8(0),
        }
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute state hash for match verification.
///
/// Called by `Match::compute_hash()`. The closure adds state-specific data
/// after the round counter and seed.
pub fn compute_state_hash<F>(round: u32, rng_seed: u64, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_match_state();

    hasher.update_u32(round);
    hasher.update_u64(rng_seed);

    add_state(&mut hasher);

    hasher.finalize()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_hasher_determinism() {
        let make_hash = || {
            let mut hasher = StateHasher::for_match_state();
            hasher.update_u32(100);
            hasher.update_u64(12345);
            hasher.update_coord(Some(HexCoord::new(3, -1)));
            hasher.update_bool(true);
            hasher.finalize()
        };

        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let hash1 = {
            let mut h = StateHasher::new(b"test");
            h.update_u32(1);
            h.update_u32(2);
            h.finalize()
        };

        let hash2 = {
            let mut h = StateHasher::new(b"test");
            h.update_u32(2);
            h.update_u32(1);
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_domain_separation() {
        let state = StateHasher::for_match_state().finalize();
        let log = StateHasher::for_intent_log().finalize();
        assert_ne!(state, log);
    }

    #[test]
    fn test_missing_coord_differs_from_origin() {
        let mut some = StateHasher::new(b"t");
        some.update_coord(Some(HexCoord::new(0, 0)));
        let mut none = StateHasher::new(b"t");
        none.update_coord(None);
        assert_ne!(some.finalize(), none.finalize());
    }

    #[test]
    fn test_compute_state_hash() {
        let hash = compute_state_hash(4, 12345, |hasher| hasher.update_bool(true));
        let hash2 = compute_state_hash(4, 12345, |hasher| hasher.update_bool(true));
        assert_eq!(hash, hash2);

        let hash3 = compute_state_hash(5, 12345, |hasher| hasher.update_bool(true));
        assert_ne!(hash, hash3);
    }
}
