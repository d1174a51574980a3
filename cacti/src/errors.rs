use crate::actor::ActorId;
use log::error;
use thiserror::Error;

/// Any Error that can occur when using the *cacti* library.
///
/// Only [UnknownActor](#variant.UnknownActor) and [Refused](#variant.Refused) are ordinary outcomes of
/// [send_message](../api/struct.ActorSystem.html#method.send_message); the rest surface while a system is being built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CactiError {
    #[error("no actor with id {0} exists in this system")]
    UnknownActor(ActorId),
    #[error("actor {0} refuses messages")]
    Refused(ActorId),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to start worker thread: {0}")]
    ThreadSpawn(String),
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
    #[error("configuration file: {0}")]
    Config(String),
    #[error("interrupt hook: {0}")]
    Signal(String),
}

impl CactiError {
    pub(crate) fn from_poison_error<T>(e: &std::sync::PoisonError<T>) -> CactiError {
        CactiError::LockPoisoned(format!("{:?}", e))
    }
}

/// Log the diagnostic and halt the process.
///
/// Used for broken internal invariants: the shared structures involved can't be trusted afterwards,
/// so there is no local recovery.
pub(crate) fn fatal(diagnostic: String) -> ! {
    error!("{}", diagnostic);
    eprintln!("cacti: fatal: {}", diagnostic);
    std::process::abort()
}

/// Extension to acquire `std::sync` locks, treating poison as a fatal invariant violation.
pub(crate) trait LockOrDie<G> {
    fn or_die(self, what: &str) -> G;
}

impl<G> LockOrDie<G> for std::sync::LockResult<G> {
    fn or_die(self, what: &str) -> G {
        match self {
            Ok(guard) => guard,
            Err(e) => fatal(format!("{} ({:?})", what, CactiError::from_poison_error(&e))),
        }
    }
}
