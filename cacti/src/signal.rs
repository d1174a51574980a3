//! SIGINT hook shared by every actor system of the process.
//!
//! The handler itself only bumps an atomic counter (async-signal-safe).
//! Workers compare that counter with the value they saw when their system was created
//! and run the drain sequence from normal thread context.
//!
//! The first system that asks for the hook installs it and remembers the previous disposition;
//! the last one to release it restores that disposition and, if it was stopped by the signal,
//! raises SIGINT again so the process still gets the behavior it had before.

use crate::errors::CactiError;
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of SIGINTs received since the process started.
static SIGNALS_RECEIVED: AtomicU64 = AtomicU64::new(0);

/// Counter value to compare against with [interrupted_since](fn.interrupted_since.html).
pub(crate) fn epoch() -> u64 {
    SIGNALS_RECEIVED.load(Ordering::Acquire)
}

/// Returns ```true``` if a SIGINT arrived after `epoch` was taken.
pub(crate) fn interrupted_since(epoch: u64) -> bool {
    SIGNALS_RECEIVED.load(Ordering::Acquire) != epoch
}

/// Registration of one system with the process-wide hook. Give it back with [release](#method.release).
#[derive(Debug)]
pub(crate) struct InterruptHook {
    _registered: (),
}

#[cfg(unix)]
mod platform {
    use super::{InterruptHook, SIGNALS_RECEIVED};
    use crate::errors::{CactiError, LockOrDie};
    use log::{debug, info};
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    struct Installation {
        users: usize,
        previous: libc::sigaction,
    }

    // SAFETY: `libc::sigaction` is plain data (handler address, mask, flags).
    unsafe impl Send for Installation {}

    static INSTALLATION: Mutex<Option<Installation>> = Mutex::new(None);

    extern "C" fn on_interrupt(_signal: libc::c_int) {
        SIGNALS_RECEIVED.fetch_add(1, Ordering::AcqRel);
    }

    pub(super) fn install() -> Result<InterruptHook, CactiError> {
        let mut installation = INSTALLATION.lock().or_die("signal hook lock");
        if let Some(installation) = installation.as_mut() {
            installation.users += 1;
            return Ok(InterruptHook { _registered: () });
        }

        // SAFETY: both structs are fully initialised before the call; the handler only touches an atomic.
        let previous = unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = on_interrupt as extern "C" fn(libc::c_int) as libc::sighandler_t;
            action.sa_flags = libc::SA_RESTART;
            libc::sigemptyset(&mut action.sa_mask);
            let mut previous: libc::sigaction = std::mem::zeroed();
            if libc::sigaction(libc::SIGINT, &action, &mut previous) != 0 {
                return Err(CactiError::Signal(format!(
                    "sigaction failed: {}",
                    std::io::Error::last_os_error()
                )));
            }
            previous
        };
        debug!("SIGINT hook installed");
        *installation = Some(Installation { users: 1, previous });
        Ok(InterruptHook { _registered: () })
    }

    pub(super) fn release(reraise: bool) {
        let mut installation = INSTALLATION.lock().or_die("signal hook lock");
        let last = match installation.as_mut() {
            Some(current) => {
                current.users -= 1;
                current.users == 0
            }
            None => false,
        };
        if !last {
            return;
        }
        if let Some(done) = installation.take() {
            // SAFETY: `previous` is the disposition returned by the kernel at install time.
            unsafe {
                libc::sigaction(libc::SIGINT, &done.previous, std::ptr::null_mut());
            }
            debug!("SIGINT hook removed, previous handler restored");
        }
        drop(installation);
        if reraise {
            info!("raising SIGINT again for the restored handler");
            // SAFETY: raise has no memory-safety preconditions.
            unsafe {
                libc::raise(libc::SIGINT);
            }
        }
    }
}

#[cfg(not(unix))]
mod platform {
    use super::InterruptHook;
    use crate::errors::CactiError;

    pub(super) fn install() -> Result<InterruptHook, CactiError> {
        Ok(InterruptHook { _registered: () })
    }

    pub(super) fn release(_reraise: bool) {}
}

/// Register a system with the SIGINT hook, installing it if needed.
pub(crate) fn install() -> Result<InterruptHook, CactiError> {
    platform::install()
}

impl InterruptHook {
    /// Unregister. If this was the last registration the previous handler comes back,
    /// and with `reraise` the signal is delivered to it once more.
    pub(crate) fn release(self, reraise: bool) {
        platform::release(reraise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_stable_without_signals() {
        let seen = epoch();
        assert!(!interrupted_since(seen));
    }

    #[test]
    fn counter_change_is_noticed() {
        let seen = epoch().wrapping_sub(1);
        assert!(interrupted_since(seen));
    }
}
