//! Survey completion codes.
//!
//! A code is proof-of-completion handed back to the participant and logged
//! alongside their identifiers. It mixes the submission instant into the
//! digest, so the same participant gets a fresh code on every submission —
//! one code per submission, not a stable per-participant identifier.

use sha2::{Digest, Sha256};

/// Derive an 8-character uppercase hex code from a participant identifier
/// and a millisecond instant.
pub fn survey_code(worker_id: &str, instant_ms: i64) -> String {
    let digest = Sha256::digest(format!("{}-{}", worker_id, instant_ms).as_bytes());
    hex::encode(digest)[..8].to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_eight_uppercase_hex_chars() {
        let code = survey_code("W123", 1_700_000_000_000);
        assert_eq!(code.len(), 8);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn same_instant_is_deterministic() {
        assert_eq!(
            survey_code("W123", 1_700_000_000_000),
            survey_code("W123", 1_700_000_000_000)
        );
    }

    #[test]
    fn different_instants_give_different_codes() {
        let a = survey_code("W123", 1_700_000_000_000);
        let b = survey_code("W123", 1_700_000_000_001);
        assert_ne!(a, b);
    }

    #[test]
    fn different_participants_give_different_codes() {
        let a = survey_code("W123", 1_700_000_000_000);
        let b = survey_code("W456", 1_700_000_000_000);
        assert_ne!(a, b);
    }
}
