//! # Utilities Module
//!
//! Injectable randomness and reachability helpers shared by generation,
//! navigation and battle.

pub mod pathfinding;
pub mod random;

pub use self::pathfinding::*;
pub use random::*;
