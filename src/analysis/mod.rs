//! Analysis input preparation.
//!
//! Turns discovered manifests into the single text block handed to the
//! prompt renderer.

pub mod aggregator;

pub use aggregator::*;
