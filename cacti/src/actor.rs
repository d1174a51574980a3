//! This module defines what an actor is made of and how it is addressed.
//!
//! - The [ActorId](struct.ActorId.html) is the unique, never reused address of an actor inside one system.
//! - A [Role](struct.Role.html) is the immutable table of [prompts](type.Prompt.html) an actor answers messages with.
//!     The [role!](../macro.role.html) macro builds one from plain functions or closures.
//! - The actor record itself (`ActorCell`) is private to the runtime: it owns the actor's state slot and mailbox
//!     and guards the "being serviced" flag that keeps two workers from running the same actor at once.

use crate::api::Context;
use crate::errors::{CactiError, LockOrDie};
use crate::message::{Mailbox, Message, Payload};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::{self, Debug, Display};
use std::sync::{Arc, Mutex, MutexGuard};

/// Unique actor identifier; equal to the actor's slot in the registry.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Serialize, Deserialize, Hash)]
pub struct ActorId(pub usize);

impl ActorId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message handler.
///
/// Called with the dispatch [Context](../api/struct.Context.html) (own id, state slot, system handle),
/// the payload length and the owned payload.
///
/// **Note:** It is expected that this function terminates.
pub type Prompt = Arc<dyn Fn(&mut Context<'_>, usize, Payload) + Send + Sync>;

/// Wrap a function or closure into a [Prompt](type.Prompt.html).
pub fn prompt<F>(f: F) -> Prompt
where
    F: Fn(&mut Context<'_>, usize, Payload) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The prompt table of an actor.
///
/// Message type `i` is handled by prompt `i`; [MSG_HELLO](../message/constant.MSG_HELLO.html) therefore goes to prompt `0`.
/// Cloning is cheap and every clone shares the same table.
#[derive(Clone)]
pub struct Role {
    prompts: Arc<[Prompt]>,
}

impl Role {
    pub fn new(prompts: Vec<Prompt>) -> Role {
        Role {
            prompts: prompts.into(),
        }
    }

    /// Build a role from plain functions, in message type order.
    pub fn from_fns(prompts: &[fn(&mut Context<'_>, usize, Payload)]) -> Role {
        Role::new(prompts.iter().map(|&f| prompt(f)).collect())
    }

    /// Number of prompts, i.e. the smallest message type this role can't handle.
    pub fn nprompts(&self) -> usize {
        self.prompts.len()
    }

    pub(crate) fn prompt(&self, index: usize) -> Option<&Prompt> {
        self.prompts.get(index)
    }
}

impl Debug for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Role {{nprompts: {}}}", self.prompts.len())
    }
}

#[macro_export]
/// This macro builds a [Role](actor/struct.Role.html) from a list of prompts.
///
/// Each argument is a function or closure taking `(&mut Context, usize, Payload)`.
/// The position in the list is the message type it handles, so the first one answers [MSG_HELLO](message/constant.MSG_HELLO.html).
///
///```
/// use cacti::api::*;
///
/// fn hello(_ctx: &mut Context, _nbytes: usize, _creator: Payload) {}
///
/// let role = role![hello, |ctx: &mut Context, _nbytes: usize, _data: Payload| {
///     let _ = ctx.send_message(ctx.actor_id(), Message::godie());
/// }];
/// assert_eq!(role.nprompts(), 2);
///```
macro_rules! role {
    ($($prompt:expr),*$(,)?) => {
        $crate::actor::Role::new(vec![$($crate::actor::prompt($prompt)),*])
    };
}

/// The runtime's record of one actor.
pub(crate) struct ActorCell {
    id: ActorId,
    role: Role,
    inner: Mutex<ActorInner>,
}

/// Everything guarded by the actor's own lock.
pub(crate) struct ActorInner {
    /// State slot handed to the prompts; empty until a prompt fills it.
    pub(crate) state: Option<Box<dyn Any + Send>>,
    pub(crate) mailbox: Mailbox,
    /// Set once by `MSG_GODIE` (or an interrupt), never reset.
    pub(crate) gone_die: bool,
    pub(crate) being_serviced: bool,
}

impl ActorCell {
    pub(crate) fn new(id: ActorId, role: Role, mailbox_capacity: usize) -> ActorCell {
        ActorCell {
            id,
            role,
            inner: Mutex::new(ActorInner {
                state: None,
                mailbox: Mailbox::new(mailbox_capacity),
                gone_die: false,
                being_serviced: false,
            }),
        }
    }

    pub(crate) fn id(&self) -> ActorId {
        self.id
    }

    pub(crate) fn role(&self) -> &Role {
        &self.role
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ActorInner> {
        self.inner.lock().or_die("actor lock")
    }

    /// Put `message` into the mailbox.
    ///
    /// Returns whether the actor was idle before, in which case the caller has to put it on the run queue.
    /// A dying actor refuses the message. Overflowing the mailbox is fatal.
    pub(crate) fn deliver(&self, message: Message) -> Result<bool, CactiError> {
        let mut inner = self.lock();
        if inner.gone_die {
            return Err(CactiError::Refused(self.id));
        }
        if inner.mailbox.is_full() {
            crate::errors::fatal(format!(
                "mailbox of actor {} overflowed its {} slots (message type {})",
                self.id,
                inner.mailbox.capacity(),
                message.message_type()
            ));
        }
        let was_idle = !inner.being_serviced && inner.mailbox.is_empty();
        if inner.mailbox.push(message).is_err() {
            crate::errors::fatal(format!("mailbox of actor {} refused a message", self.id));
        }
        Ok(was_idle)
    }

    /// Service up to `batch` messages.
    ///
    /// `dispatch` runs without the actor lock held; the state slot is lent to it for the duration of one message.
    /// Returns ```true``` if messages are left and the actor has to go back on the run queue.
    pub(crate) fn service<F>(&self, batch: usize, mut dispatch: F) -> bool
    where
        F: FnMut(&mut Option<Box<dyn Any + Send>>, Message),
    {
        let mut inner = self.lock();
        inner.being_serviced = true;
        for _ in 0..batch {
            let message = match inner.mailbox.pop() {
                Some(message) => message,
                None => break,
            };
            let mut state = inner.state.take();
            drop(inner);
            dispatch(&mut state, message);
            inner = self.lock();
            inner.state = state;
        }
        let requeue = !inner.mailbox.is_empty();
        inner.being_serviced = false;
        requeue
    }

    /// Alive -> Dying. Returns ```true``` only for the call that made the transition.
    pub(crate) fn mark_dying(&self) -> bool {
        let mut inner = self.lock();
        let was_alive = !inner.gone_die;
        inner.gone_die = true;
        was_alive
    }

    /// Drop the state and any message left (teardown only).
    pub(crate) fn reclaim(&self) {
        let mut inner = self.lock();
        inner.state = None;
        inner.mailbox.clear();
    }
}

impl Debug for ActorCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorCell {{id: {}, role: {:?}}}", self.id, self.role)
    }
}
