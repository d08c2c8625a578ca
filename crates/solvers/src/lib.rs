//! Game solvers for the fault dispute game challenger.

pub mod fault;
