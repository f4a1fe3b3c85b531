//! GameRig End-to-End Test Infrastructure
//!
//! This crate provides integration tests for rig generation:
//!
//! - **Determinism**: identical meta-skeletons give identical rigs
//! - **Topology**: every generated bone has a finite, acyclic ancestor chain
//!   and every reference resolves
//! - **Symmetry**: left and right limbs mirror each other
//! - **IK/FK**: the switch property selects exactly one chain at its extremes
//! - **Policies**: lenient and strict handling of bad rig configurations
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p gamerig-tests
//! ```

pub mod determinism;
pub mod fixtures;
pub mod topology;
