//! Determinism checks for rig generation.
//!
//! A generation function is run several times; each output is rendered to
//! bytes and hashed with BLAKE3. The run is deterministic when every hash
//! matches the first.

use std::fmt;

/// Result of a determinism verification.
#[derive(Debug, Clone)]
pub struct DeterminismResult {
    /// Whether all runs produced identical output.
    pub is_deterministic: bool,
    /// Number of runs performed.
    pub runs: usize,
    /// BLAKE3 hash of the first run's output.
    pub hash: String,
    /// First run (0-indexed) whose output differed from run 0.
    pub first_mismatch: Option<usize>,
}

impl fmt::Display for DeterminismResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first_mismatch {
            None => write!(f, "deterministic over {} runs ({})", self.runs, &self.hash[..16]),
            Some(run) => write!(f, "run {} differs from run 0 ({} runs)", run, self.runs),
        }
    }
}

/// Hex BLAKE3 hash of `bytes`.
pub fn hash_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Runs `generate` `runs` times and compares the hashes of its outputs.
pub fn verify_determinism<F, T>(generate: F, runs: usize) -> DeterminismResult
where
    F: Fn() -> T,
    T: AsRef<[u8]>,
{
    assert!(runs >= 2, "need at least two runs to compare");
    let hashes: Vec<String> = (0..runs).map(|_| hash_bytes(generate().as_ref())).collect();
    let first_mismatch = hashes.iter().position(|h| *h != hashes[0]);
    DeterminismResult {
        is_deterministic: first_mismatch.is_none(),
        runs,
        hash: hashes[0].clone(),
        first_mismatch,
    }
}

/// Asserts that a generation expression is deterministic over three runs.
#[macro_export]
macro_rules! assert_deterministic {
    ($generate:expr) => {{
        let result = $crate::determinism::verify_determinism(|| $generate, 3);
        assert!(result.is_deterministic, "{}", result);
        result
    }};
}
