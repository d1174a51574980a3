//! The *cacti* library runs many lightweight actors on a small, fixed pool of worker threads.
//!
//! Actors are isolated computing units with a private state and a bounded mailbox.
//! They react to [messages](./message/struct.Message.html) with the prompts of their [Role](./actor/struct.Role.html),
//! send messages to actors they know of and [spawn](./message/constant.MSG_SPAWN.html) new actors on demand.
//! No actor is ever run by two workers at once, and ready actors take turns, so a busy actor can't starve the others.
//!
//! An example program whose initial actor prints a greeting and then dies is shown below.
//! ```rust
//! use cacti::api::*;
//!
//! const MSG_GREET: MessageType = 1;
//!
//! fn hello(_ctx: &mut Context, _nbytes: usize, _creator: Payload) {}
//!
//! fn greet(ctx: &mut Context, _nbytes: usize, data: Payload) {
//!     if let Ok(name) = data.downcast::<String>() {
//!         println!("Hello, {}!", name);
//!     }
//!     let _ = ctx.send_message(ctx.actor_id(), Message::godie());
//! }
//!
//! fn main() {
//!     let (system, leader) = match ActorSystem::create(role![hello, greet]) {
//!         Ok(created) => created,
//!         Err(e) => {
//!             println!("Encountered a problem while creating the actor system: {}", e);
//!             return;
//!         }
//!     };
//!
//!     if let Err(e) = system.send_message(leader, Message::new(MSG_GREET, "World".to_string())) {
//!         println!("Could not greet: {}", e);
//!     }
//!
//!     // The workers stop once every actor is gone; wait for that.
//!     system.join(leader);
//! }
//! ```

pub mod actor;
pub mod api;
pub mod config;
pub(crate) mod environment;
pub(crate) mod errors;
pub mod message;
pub(crate) mod queue;
pub(crate) mod registry;
pub(crate) mod signal;
