//! Core deterministic primitives.
//!
//! Small, dependency-light building blocks shared by the whole simulation:
//! vector math, a seeded PRNG, and state hashing.

pub mod hash;
pub mod rng;
pub mod vec3;

// Re-export core types
pub use hash::{compute_state_hash, StateHash, StateHasher};
pub use rng::DeterministicRng;
pub use vec3::Vec3;
