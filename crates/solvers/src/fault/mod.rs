//! Data structures, types, and the response solver for the fault dispute game.

mod position;
pub use position::{compute_gindex, Position, MAX_GAME_DEPTH};

mod types;
pub use types::*;

mod tree;
pub use tree::ClaimTree;

mod trace;
pub use trace::TraceAccessor;

mod alphabet;
pub use alphabet::{AlphabetTraceProvider, ALPHABET_PRESTATE};

mod solver;
pub use solver::Solver;
