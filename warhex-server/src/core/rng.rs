//! Dice
//!
//! Every die the engine rolls comes from one Xorshift128+ generator owned
//! by the match, so a seed plus the ordered intent stream reproduces a game
//! exactly.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Seeded dice generator (Xorshift128+).
///
/// The state travels with the match so a restored snapshot continues the
/// same dice sequence.
///
/// # Example
///
/// ```
/// use warhex::core::rng::DeterministicRng;
///
/// let mut a = DeterministicRng::new(12345);
/// let mut b = DeterministicRng::new(12345);
/// assert_eq!(a.roll_2d6(), b.roll_2d6());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Two six-sided dice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roll {
    /// First die (1-6)
    pub first: u8,
    /// Second die (1-6)
    pub second: u8,
}

impl Roll {
    /// Sum of both dice.
    #[inline]
    pub fn total(&self) -> i32 {
        self.first as i32 + self.second as i32
    }

    /// Natural 2.
    #[inline]
    pub fn is_snake_eyes(&self) -> bool {
        self.first == 1 && self.second == 1
    }
}

impl std::fmt::Display for Roll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}+{})", self.total(), self.first, self.second)
    }
}

impl DeterministicRng {
    /// Generator seeded from a 64-bit value.
    ///
    /// The seed is stretched with SplitMix64 so that small seeds still give
    /// well-mixed dice.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state = [splitmix64(&mut s), splitmix64(&mut s)];
        // An all-zero state would stick at zero forever.
        if state == [0, 0] {
            return Self { state: [1, 1] };
        }
        Self { state }
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        let [s0, mut s1] = self.state;
        let out = s0.wrapping_add(s1);
        s1 ^= s0;
        self.state = [s0.rotate_left(24) ^ s1 ^ (s1 << 16), s1.rotate_left(37)];
        out
    }

    /// Uniform value in `0..bound` (0 when `bound` is 0).
    #[inline]
    pub fn below(&mut self, bound: u32) -> u32 {
        match bound {
            0 => 0,
            b => (self.next_u64() % b as u64) as u32,
        }
    }

    /// One six-sided die.
    #[inline]
    pub fn d6(&mut self) -> u8 {
        self.below(6) as u8 + 1
    }

    /// Two six-sided dice, kept apart for doubles checks.
    #[inline]
    pub fn roll_2d6(&mut self) -> Roll {
        let first = self.d6();
        Roll { first, second: self.d6() }
    }

    /// Pick one entry of `options` (None when empty).
    pub fn choose<'a, T>(&mut self, options: &'a [T]) -> Option<&'a T> {
        let index = self.below(options.len() as u32) as usize;
        options.get(index)
    }

    /// Internal state, hashed into the match state.
    pub fn state(&self) -> [u64; 2] {
        self.state
    }
}

#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Match seed from the match id and the seated players.
///
/// Players are fed in the order given; callers pass them sorted.
pub fn derive_match_seed(match_id: &[u8; 16], player_ids: &[u32]) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(b"WARHEX_SEED_V1");
    hasher.update(match_id);
    player_ids.iter().for_each(|pid| hasher.update(pid.to_le_bytes()));
    let digest = hasher.finalize();
    digest[..8].iter().rev().fold(0u64, |acc, b| (acc << 8) | *b as u64)
}

// =============================================================================
// TESTS
// =============================================================================
