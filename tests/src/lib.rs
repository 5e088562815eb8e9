//! # Tally Test Suite
//!
//! Unified test crate for cross-service flows that no single crate can
//! exercise alone: commands entering at the edge publisher, crossing both
//! hops of the bus, and landing as balance mutations.
//!
//! ```text
//! tests/src/
//! └── integration/      # Two-hop choreography scenarios
//!     └── end_to_end.rs
//! ```
//!
//! Run with `cargo test -p tally-tests`.

pub mod integration;
