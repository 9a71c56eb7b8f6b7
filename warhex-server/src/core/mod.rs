//! Core deterministic primitives.
//!
//! Everything here is integer-only and platform independent: the seeded
//! dice generator, state hashing and hex geometry.

pub mod rng;
pub mod hash;
pub mod hex;

// Re-export core types
pub use rng::{DeterministicRng, Roll};
pub use hash::{compute_state_hash, StateHash};
pub use hex::{Bearing, Facing, HexCoord};
