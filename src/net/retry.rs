//! Want-read/want-write retry driver
//!
//! OpenSSL reports `WANT_READ`/`WANT_WRITE` when an operation needs the
//! socket to become readable or writable before it can make progress -
//! flow-control signals, not errors. The driver here re-issues the attempt
//! after waiting for readiness, so callers only ever see bytes-transferred
//! or a terminal error. Cancellation is checked on every turn.

use super::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation handle
///
/// Cheap to clone; all clones observe the same flag. Only the TLS retry
/// loop consults it - plain-socket connects and reads are bounded by the
/// socket timeout instead.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state
    pub fn new() -> Self {
        CancelToken {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signal cancellation to all clones
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was signalled
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Readiness direction a retried operation is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Want {
    Read,
    Write,
}

/// One attempt's outcome: finished, or blocked on socket readiness
pub(crate) enum Attempt<T> {
    Done(T),
    WantRead,
    WantWrite,
}

/// Run `attempt` until it completes, waiting for readiness between turns.
///
/// On a want outcome the cancellation token is checked first; a cancelled
/// operation returns immediately without waiting. An explicit loop rather
/// than recursion, so retry storms cannot grow the stack.
pub(crate) fn drive<T, A, W>(cancel: &CancelToken, mut attempt: A, mut wait: W) -> Result<T>
where
    A: FnMut() -> Result<Attempt<T>>,
    W: FnMut(Want) -> Result<()>,
{
    loop {
        let want = match attempt()? {
            Attempt::Done(value) => return Ok(value),
            Attempt::WantRead => Want::Read,
            Attempt::WantWrite => Want::Write,
        };

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        wait(want)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_done_first_try() {
        let cancel = CancelToken::new();
        let mut waits = 0;

        let result = drive(
            &cancel,
            || Ok(Attempt::Done(42usize)),
            |_| {
                waits += 1;
                Ok(())
            },
        );

        assert_eq!(result.unwrap(), 42);
        assert_eq!(waits, 0);
    }

    #[test]
    fn test_want_read_n_times_then_success() {
        let cancel = CancelToken::new();
        let mut attempts = 0;
        let mut waits = 0;

        let result = drive(
            &cancel,
            || {
                attempts += 1;
                if attempts <= 3 {
                    Ok(Attempt::WantRead)
                } else {
                    Ok(Attempt::Done(5usize))
                }
            },
            |want| {
                assert_eq!(want, Want::Read);
                waits += 1;
                Ok(())
            },
        );

        assert_eq!(result.unwrap(), 5);
        assert_eq!(attempts, 4);
        assert_eq!(waits, 3);
    }

    #[test]
    fn test_cancel_short_circuits_without_wait() {
        let cancel = CancelToken::new();
        cancel.cancel();

        let mut attempts = 0;
        let mut waits = 0;

        let result: Result<usize> = drive(
            &cancel,
            || {
                attempts += 1;
                Ok(Attempt::WantRead)
            },
            |_| {
                waits += 1;
                Ok(())
            },
        );

        assert!(matches!(result, Err(Error::Cancelled)));
        // The attempt itself still ran once; the wait never did
        assert_eq!(attempts, 1);
        assert_eq!(waits, 0);
    }

    #[test]
    fn test_cancel_mid_retry() {
        let cancel = CancelToken::new();
        let mut attempts = 0;

        let inner = cancel.clone();
        let result: Result<usize> = drive(
            &cancel,
            || {
                attempts += 1;
                if attempts == 2 {
                    inner.cancel();
                }
                Ok(Attempt::WantWrite)
            },
            |_| Ok(()),
        );

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(attempts, 2);
    }

    #[test]
    fn test_attempt_error_propagates() {
        let cancel = CancelToken::new();

        let result: Result<usize> = drive(
            &cancel,
            || Err(Error::Tls("bad record mac".to_string())),
            |_| Ok(()),
        );

        assert!(matches!(result, Err(Error::Tls(_))));
    }
}
