//! # Arena Four Simulation Core
//!
//! Deterministic simulation for Arena Four: two avatars roam a 3-D arena and
//! feed a shared Connect-Four board by sliding down tubes wired to its columns.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ARENA FOUR CORE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── vec3.rs     - 3D vector math                            │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for determinism checks      │
//! │                                                              │
//! │  game/           - Simulation logic                          │
//! │  ├── board.rs    - Connect-Four grid and win detection       │
//! │  ├── collision.rs- Landing resolution, avatar separation     │
//! │  ├── arena.rs    - Default static geometry and tube curves   │
//! │  ├── input.rs    - Movement intents, recording, replay       │
//! │  ├── state.rs    - Avatar and simulation state               │
//! │  ├── agent.rs    - Avatar movement integration               │
//! │  ├── scheduler.rs- Frame-driven animation tasks              │
//! │  ├── tube.rs     - Tube paths and transit pipeline           │
//! │  ├── tick.rs     - Frame orchestration                       │
//! │  └── events.rs   - Events handed to collaborators            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The simulation is single-threaded and frame-driven. Given identical intent
//! streams and delta times, two runs produce identical state hashes:
//! - Static shapes resolve in registration order
//! - Animation tasks advance and complete in insertion order
//! - Avatars integrate in slot order (Red, then Yellow)
//! - All decorative randomness comes from a seeded Xorshift128+
//!
//! Rendering, UI, and input-device binding are collaborators: they feed
//! [`game::input::IntentFrame`]s in and consume [`game::events::GameEvent`]s
//! and render-state snapshots out.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use crate::core::rng::DeterministicRng;
pub use crate::core::vec3::Vec3;
pub use game::board::{BoardState, Cell, MatchStatus, MoveOutcome, PlayerColor};
pub use game::input::IntentFrame;
pub use game::state::{AvatarState, SimState, TransitState};
pub use game::tick::{frame, FrameResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Nominal simulation tick rate (Hz). The core accepts arbitrary `dt`, but
/// the demo driver and tests step at this rate.
pub const TICK_RATE: u32 = 60;

/// Nominal frame duration in seconds at [`TICK_RATE`].
pub const FRAME_DT: f32 = 1.0 / TICK_RATE as f32;
