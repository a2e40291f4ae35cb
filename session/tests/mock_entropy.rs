use std::sync::atomic::{AtomicUsize, Ordering};

use session::error::{SessionError, SessionResult};
use session::token::EntropySource;

/// Deterministic byte source: fill `n` writes `n` into every byte, and every
/// fill after `fail_after` successes reports an error.
pub struct ScriptedEntropy {
    fills: AtomicUsize,
    fail_after: usize,
}

impl ScriptedEntropy {
    pub fn new() -> Self {
        Self::failing_after(usize::MAX)
    }

    pub fn failing_after(fail_after: usize) -> Self {
        Self {
            fills: AtomicUsize::new(0),
            fail_after,
        }
    }

    pub fn fills(&self) -> usize {
        self.fills.load(Ordering::SeqCst)
    }
}

impl EntropySource for ScriptedEntropy {
    fn fill(&self, buf: &mut [u8]) -> SessionResult<()> {
        let n = self.fills.fetch_add(1, Ordering::SeqCst);
        if n >= self.fail_after {
            return Err(SessionError::Generation("scripted failure".into()));
        }

        buf.fill(n as u8);
        Ok(())
    }
}
