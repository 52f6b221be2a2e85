//! Azul board rules core
//!
//! Re-exports the rules crate for convenience and hosts the `azul-board`
//! command-line front end.

pub use azul_rules::*;

pub mod cli;
