//! This module contains the API for the *cacti* library.
//!
//! This module (re)exports every type, function and macro required for general usage of the *cacti* library.
//!
//! To use the *cacti* library you have to:
//! * First, write the prompts of your actors and collect them into a [Role](../actor/struct.Role.html).
//!     The [role!](../macro.role.html) macro is provided to reduce required boilerplate code.
//! * Second, you create an [ActorSystem](struct.ActorSystem.html) with the role of its first actor.
//! * Third, the first [Message](../message/struct.Message.html) sent gets the ball rolling.
//!     Actors create further actors by sending [MSG_SPAWN](../message/constant.MSG_SPAWN.html) and stop with [MSG_GODIE](../message/constant.MSG_GODIE.html).
//! * Finally, [join](struct.ActorSystem.html#method.join) blocks until every actor is gone.

pub use crate::actor::{prompt, ActorId, Prompt, Role};
pub use crate::config::SystemConfig;
use crate::environment::{ArcSystemCore, SystemCore};
pub use crate::errors::CactiError;
pub use crate::message::*;
pub use crate::role;
use std::any::Any;

/// Handle to a running actor system.
///
/// The system runs a fixed pool of worker threads that execute the prompts of all its actors.
/// It ends by itself once every actor processed [MSG_GODIE](../message/constant.MSG_GODIE.html) and no work is queued,
/// or after an interrupt (SIGINT or [interrupt](#method.interrupt)) once the already queued work is drained.
///
/// Handles are cheap to clone; all clones refer to the same system.
#[derive(Clone)]
pub struct ActorSystem {
    pub(crate) core: ArcSystemCore,
}

impl ActorSystem {
    /// Create a new system with the default [SystemConfig](../config/struct.SystemConfig.html).
    ///
    /// The returned [ActorId](../actor/struct.ActorId.html) is the initial actor, playing `role`. It is always `0`.
    pub fn create(role: Role) -> Result<(ActorSystem, ActorId), CactiError> {
        ActorSystem::with_config(SystemConfig::default(), role)
    }

    /// Like [create](#method.create), but with explicit limits.
    pub fn with_config(config: SystemConfig, role: Role) -> Result<(ActorSystem, ActorId), CactiError> {
        let core = SystemCore::start(config, role)?;
        Ok((ActorSystem { core }, ActorId(0)))
    }

    /// Send `message` to `actor`.
    ///
    /// The message is queued without blocking on the receiver.
    /// The method can fail with [UnknownActor](enum.CactiError.html#variant.UnknownActor) for an id this system never issued
    /// and [Refused](enum.CactiError.html#variant.Refused) for an actor that processed [MSG_GODIE](../message/constant.MSG_GODIE.html),
    /// which includes every actor once the system has shut down.
    /// Once it returned `Ok` the message will be handled, even if the actor dies in the meantime.
    pub fn send_message(&self, actor: ActorId, message: Message) -> Result<(), CactiError> {
        self.core.send_message(actor, message)
    }

    /// Block the current thread until the system containing `actor` has drained and shut down.
    ///
    /// Does nothing if `actor` doesn't belong to this system.
    ///
    /// **Note:** Calling this from inside a prompt never returns.
    pub fn join(&self, actor: ActorId) {
        if !self.core.knows(actor) {
            return;
        }
        self.core.wait_finished();
    }

    /// Drain and stop the system, as if SIGINT had been received.
    ///
    /// Every actor stops accepting messages and no further actor can be spawned;
    /// messages already queued are still handled.
    pub fn interrupt(&self) {
        self.core.interrupt()
    }

    /// Returns ```true``` once the system has shut down.
    pub fn is_finished(&self) -> bool {
        self.core.is_finished()
    }

    /// Number of actors created so far and not yet reclaimed.
    pub fn actor_count(&self) -> usize {
        self.core.actor_count()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.core.config
    }
}

impl std::fmt::Debug for ActorSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ActorSystem {{actors: {}, finished: {}}}",
            self.actor_count(),
            self.is_finished()
        )
    }
}

/// What a prompt gets to know about the actor it runs for.
pub struct Context<'a> {
    system: &'a ActorSystem,
    actor_id: ActorId,
    state: &'a mut Option<Box<dyn Any + Send>>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        system: &'a ActorSystem,
        actor_id: ActorId,
        state: &'a mut Option<Box<dyn Any + Send>>,
    ) -> Context<'a> {
        Context {
            system,
            actor_id,
            state,
        }
    }

    /// Id of the actor whose prompt is running.
    pub fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    /// The system the actor lives in.
    pub fn system(&self) -> &ActorSystem {
        self.system
    }

    /// Shortcut for [ActorSystem::send_message](struct.ActorSystem.html#method.send_message).
    pub fn send_message(&self, actor: ActorId, message: Message) -> Result<(), CactiError> {
        self.system.send_message(actor, message)
    }

    /// Returns ```true``` once a prompt stored a state.
    pub fn has_state(&self) -> bool {
        self.state.is_some()
    }

    /// The actor's state, if it was set and is a `T`.
    pub fn state<T: Any>(&self) -> Option<&T> {
        self.state.as_ref().and_then(|state| state.downcast_ref::<T>())
    }

    pub fn state_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.state.as_mut().and_then(|state| state.downcast_mut::<T>())
    }

    /// Replace the actor's state.
    pub fn set_state<T: Any + Send>(&mut self, state: T) {
        *self.state = Some(Box::new(state));
    }

    /// Take the state out, leaving the slot empty. A state of another type stays in place.
    pub fn take_state<T: Any>(&mut self) -> Option<T> {
        match self.state.take() {
            Some(state) => match state.downcast::<T>() {
                Ok(typed) => Some(*typed),
                Err(state) => {
                    *self.state = Some(state);
                    None
                }
            },
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_state_accessors() {
        let (system, leader) = ActorSystem::with_config(
            SystemConfig {
                handle_interrupt: false,
                ..SystemConfig::default()
            },
            role![],
        )
        .unwrap();
        let mut slot: Option<Box<dyn Any + Send>> = None;
        {
            let mut ctx = Context::new(&system, ActorId(7), &mut slot);
            assert_eq!(ctx.actor_id(), ActorId(7));
            assert!(!ctx.has_state());
            ctx.set_state(vec![1_u8, 2]);
            ctx.state_mut::<Vec<u8>>().unwrap().push(3);
            assert_eq!(ctx.state::<Vec<u8>>(), Some(&vec![1, 2, 3]));
            assert!(ctx.state::<String>().is_none());
            assert!(ctx.take_state::<String>().is_none());
            assert!(ctx.has_state());
            assert_eq!(ctx.take_state::<Vec<u8>>(), Some(vec![1, 2, 3]));
            assert!(!ctx.has_state());
        }
        assert!(slot.is_none());
        system.send_message(leader, Message::godie()).unwrap();
        system.join(leader);
    }
}
