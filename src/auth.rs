//! Shared-secret validation for the query-parameter api key.
//!
//! Provides constant-time comparison so the check leaks nothing about
//! where (or if) the keys differ.

/// Validates a provided key against the expected key using constant-time
/// comparison.
///
/// Returns `false` if either key is empty.
pub fn validate_key(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();

    // Empty keys are never valid
    if provided.is_empty() || expected.is_empty() {
        return false;
    }

    // Length mismatch - still compare to maintain constant time
    let len_match = provided.len() == expected.len();

    // XOR accumulator: if any byte differs, result will be non-zero
    let mut diff: u8 = 0;
    for (a, b) in provided.iter().zip(expected.iter()) {
        diff |= a ^ b;
    }

    len_match && diff == 0
}
