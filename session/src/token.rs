//! Session token generation.
//!
//! Tokens are `TOKEN_BYTES` bytes read from a secure source and hex encoded.
//! The source is a trait so a store can be built over a failing or scripted
//! source in tests; production code always uses [`OsEntropy`].

use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::error::{SessionError, SessionResult};

/// Number of random bytes behind every token.
pub const TOKEN_BYTES: usize = 32;

/// Length of an encoded token.
pub const TOKEN_LEN: usize = TOKEN_BYTES * 2;

/// Source of unpredictable bytes for token material.
pub trait EntropySource: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> SessionResult<()>;
}

/// Operating-system CSPRNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> SessionResult<()> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| SessionError::Generation(e.to_string()))
    }
}

/// Draw a fresh token from `source`.
pub fn generate_token(source: &dyn EntropySource) -> SessionResult<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    source.fill(&mut bytes)?;
    Ok(hex::encode(bytes))
}

/// Short, non-secret prefix of a token for log lines.
pub(crate) fn redact(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct BrokenSource;

    impl EntropySource for BrokenSource {
        fn fill(&self, _: &mut [u8]) -> SessionResult<()> {
            Err(SessionError::Generation("device unavailable".into()))
        }
    }

    #[test]
    fn tokens_are_fixed_length_lowercase_hex() {
        let token = generate_token(&OsEntropy).unwrap();

        assert_eq!(token.len(), TOKEN_LEN);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn tokens_do_not_repeat() {
        let tokens: HashSet<_> = (0..1_000)
            .map(|_| generate_token(&OsEntropy).unwrap())
            .collect();

        assert_eq!(tokens.len(), 1_000);
    }

    #[test]
    fn source_failure_is_surfaced() {
        let err = generate_token(&BrokenSource).unwrap_err();
        assert_eq!(err, SessionError::Generation("device unavailable".into()));
    }

    #[test]
    fn redact_keeps_only_prefix() {
        assert_eq!(redact("0123456789abcdef"), "01234567");
        assert_eq!(redact("abc"), "abc");
    }
}
