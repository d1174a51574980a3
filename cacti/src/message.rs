//! This module defines what is passed between actors: a [Message](struct.Message.html) made of a type tag,
//! a payload length and an owned [Payload](struct.Payload.html).
//!
//! Three tags are reserved by the runtime:
//! * [MSG_SPAWN](constant.MSG_SPAWN.html) carries a [Role](../actor/struct.Role.html) and creates a new actor playing it.
//! * [MSG_GODIE](constant.MSG_GODIE.html) makes the receiver stop accepting messages.
//! * [MSG_HELLO](constant.MSG_HELLO.html) is sent by the runtime to a freshly spawned actor; it is handled by prompt `0`.
//!
//! Every other tag is an index into the receiving actor's prompt table.

use crate::actor::Role;
use crate::queue::BoundedQueue;
use std::any::Any;
use std::fmt::{self, Debug};
use std::mem::size_of;

/// Message type tag.
pub type MessageType = i64;

/// Create a new actor; the payload is its [Role](../actor/struct.Role.html).
pub const MSG_SPAWN: MessageType = 0x0605_7a6e;
/// Stop accepting messages. Messages already queued are still processed.
pub const MSG_GODIE: MessageType = 0x60be_dead;
/// First message of a spawned actor; the payload is the creator's [ActorId](../actor/struct.ActorId.html).
pub const MSG_HELLO: MessageType = 0x0;

/// Owned, type-erased message data.
///
/// Ownership moves with the [Message](struct.Message.html): once sent, the sender can't touch it again,
/// and the receiving prompt gets it by value.
pub struct Payload(Option<Box<dyn Any + Send>>);

impl Payload {
    /// A payload without data.
    pub fn empty() -> Payload {
        Payload(None)
    }

    pub fn new<T: Any + Send>(value: T) -> Payload {
        Payload(Some(Box::new(value)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Returns ```true``` if the payload holds a value of type `T`.
    pub fn is<T: Any>(&self) -> bool {
        match &self.0 {
            Some(value) => value.is::<T>(),
            None => false,
        }
    }

    /// Take the value out, or hand the payload back unchanged if it doesn't hold a `T`.
    pub fn downcast<T: Any>(self) -> Result<T, Payload> {
        match self.0 {
            Some(value) => match value.downcast::<T>() {
                Ok(typed) => Ok(*typed),
                Err(value) => Err(Payload(Some(value))),
            },
            None => Err(Payload(None)),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_ref().and_then(|value| value.downcast_ref::<T>())
    }
}

impl Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(_) => write!(f, "Payload(..)"),
            None => write!(f, "Payload(empty)"),
        }
    }
}

/// A message addressed to an actor.
#[derive(Debug)]
pub struct Message {
    pub(crate) message_type: MessageType,
    pub(crate) nbytes: usize,
    pub(crate) data: Payload,
}

impl Message {
    /// A message of type `message_type` carrying `value`.
    ///
    /// The payload length is the in-memory size of `T`.
    pub fn new<T: Any + Send>(message_type: MessageType, value: T) -> Message {
        Message {
            message_type,
            nbytes: size_of::<T>(),
            data: Payload::new(value),
        }
    }

    /// A message of type `message_type` without payload.
    pub fn empty(message_type: MessageType) -> Message {
        Message {
            message_type,
            nbytes: 0,
            data: Payload::empty(),
        }
    }

    /// Like [new](#method.new), but with an explicit payload length.
    pub fn with_len(message_type: MessageType, nbytes: usize, data: Payload) -> Message {
        Message {
            message_type,
            nbytes,
            data,
        }
    }

    /// Ask the receiver to spawn a new actor playing `role`.
    pub fn spawn(role: Role) -> Message {
        Message::new(MSG_SPAWN, role)
    }

    /// Ask the receiver to die.
    pub fn godie() -> Message {
        Message::empty(MSG_GODIE)
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn nbytes(&self) -> usize {
        self.nbytes
    }

    pub fn payload(&self) -> &Payload {
        &self.data
    }

    pub fn into_payload(self) -> Payload {
        self.data
    }
}

/// The bounded inbox of one actor.
///
/// Every access happens while the owning actor's lock is held.
#[derive(Debug)]
pub(crate) struct Mailbox {
    queue: BoundedQueue<Message>,
}

impl Mailbox {
    /// Create a new Mailbox holding at most `capacity` messages.
    pub(crate) fn new(capacity: usize) -> Mailbox {
        Mailbox {
            queue: BoundedQueue::new(capacity),
        }
    }

    /// Append a message. The message is handed back if the mailbox is full.
    pub(crate) fn push(&mut self, message: Message) -> Result<(), Message> {
        self.queue.push(message)
    }

    /// Remove the oldest message.
    pub(crate) fn pop(&mut self) -> Option<Message> {
        self.queue.pop()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.queue.is_full()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Drop every pending message (teardown only).
    pub(crate) fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_downcasts_to_its_type() {
        let payload = Payload::new(42_u32);
        assert!(payload.is::<u32>());
        assert!(!payload.is::<i32>());
        assert_eq!(payload.downcast_ref::<u32>(), Some(&42));
        assert_eq!(payload.downcast::<u32>().ok(), Some(42));
    }

    #[test]
    fn wrong_downcast_hands_payload_back() {
        let payload = Payload::new(String::from("row"));
        let payload = match payload.downcast::<u64>() {
            Ok(_) => panic!("String downcast to u64"),
            Err(payload) => payload,
        };
        assert_eq!(payload.downcast::<String>().ok().as_deref(), Some("row"));
    }

    #[test]
    fn empty_payload_holds_nothing() {
        let payload = Payload::empty();
        assert!(payload.is_empty());
        assert!(!payload.is::<()>());
        assert!(payload.downcast::<()>().is_err());
    }

    #[test]
    fn message_length_follows_payload_type() {
        let message = Message::new(3, (1_u64, 2_u64));
        assert_eq!(message.message_type(), 3);
        assert_eq!(message.nbytes(), 16);
        assert_eq!(Message::empty(5).nbytes(), 0);
        assert_eq!(Message::godie().message_type(), MSG_GODIE);
    }

    #[test]
    fn reserved_tags_do_not_collide() {
        assert_ne!(MSG_SPAWN, MSG_GODIE);
        assert_ne!(MSG_SPAWN, MSG_HELLO);
        assert_ne!(MSG_GODIE, MSG_HELLO);
    }

    #[test]
    fn mailbox_is_fifo_and_bounded() {
        let mut mailbox = Mailbox::new(2);
        mailbox.push(Message::new(1, 'a')).unwrap();
        assert!(!mailbox.is_full());
        mailbox.push(Message::new(1, 'b')).unwrap();
        assert_eq!(mailbox.capacity(), 2);
        assert!(mailbox.is_full());
        assert!(mailbox.push(Message::new(1, 'c')).is_err());

        let first = mailbox.pop().unwrap();
        assert_eq!(first.payload().downcast_ref::<char>(), Some(&'a'));
        let second = mailbox.pop().unwrap();
        assert_eq!(second.into_payload().downcast::<char>().ok(), Some('b'));
        assert!(mailbox.is_empty());
        assert!(!mailbox.is_full());
        assert!(mailbox.pop().is_none());
    }
}
