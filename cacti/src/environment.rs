//! This module defines the SystemCore type which is the centerpiece of the *cacti* library.
//!
//! The SystemCore owns the [registry](../registry/index.html), the run queue of ready actors and the worker pool.
//! Workers repeatedly
//! * wait until an actor id is on the run queue (or until no actor is alive anymore),
//! * service that actor for one batch of messages without holding any shared lock during the prompt,
//! * put the actor back on the run queue if its mailbox still holds messages.
//!
//! An actor id enters the run queue only on the idle -> ready edge (see [send_message](struct.SystemCore.html#method.send_message))
//! or when a worker hands it back, so no actor is ever serviced by two workers at once.
//!
//! Lock order: global lock -> registry lock -> actor lock. Nothing holding an actor lock takes another lock.

use crate::actor::{ActorCell, ActorId, Role};
use crate::api::{ActorSystem, Context};
use crate::config::SystemConfig;
use crate::errors::{fatal, CactiError, LockOrDie};
use crate::message::{Message, MSG_GODIE, MSG_HELLO, MSG_SPAWN};
use crate::queue::BoundedQueue;
use crate::registry::Registry;
use crate::signal::{self, InterruptHook};
use log::{debug, error, info, trace, warn};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

/// Abbreviation for ```Arc<SystemCore>```.
pub(crate) type ArcSystemCore = Arc<SystemCore>;

/// State guarded by the global lock.
#[derive(Debug)]
struct GlobalState {
    run_queue: BoundedQueue<ActorId>,
    alive_actors: usize,
    alive_threads: usize,
    interrupted: bool,
    /// The interrupt came from SIGINT (as opposed to [ActorSystem::interrupt](../api/struct.ActorSystem.html#method.interrupt)).
    interrupted_by_signal: bool,
    finished: bool,
}

pub(crate) struct SystemCore {
    pub(crate) config: SystemConfig,
    registry: Registry,
    global: Mutex<GlobalState>,
    /// Signalled whenever an id is pushed onto the run queue or the system starts draining.
    run_available: Condvar,
    /// Signalled once teardown completed.
    finished: Condvar,
    workers: Mutex<Vec<JoinHandle<()>>>,
    interrupt_hook: Mutex<Option<InterruptHook>>,
    /// SIGINT counter at creation.
    signal_epoch: u64,
}

impl SystemCore {
    /// Create the system with its initial actor (id 0) and start the worker pool.
    pub(crate) fn start(config: SystemConfig, role: Role) -> Result<ArcSystemCore, CactiError> {
        config.validate()?;
        let signal_epoch = signal::epoch();
        let interrupt_hook = if config.handle_interrupt {
            Some(signal::install()?)
        } else {
            None
        };

        let registry = Registry::new(config.actor_limit, config.mailbox_capacity);
        let leader = match registry.create_actor(role) {
            Some(id) => id,
            None => fatal("registry refused the initial actor".to_string()),
        };

        let core = Arc::new(SystemCore {
            global: Mutex::new(GlobalState {
                run_queue: BoundedQueue::new(config.actor_limit),
                alive_actors: 1,
                alive_threads: config.pool_size,
                interrupted: false,
                interrupted_by_signal: false,
                finished: false,
            }),
            registry,
            run_available: Condvar::new(),
            finished: Condvar::new(),
            workers: Mutex::new(Vec::with_capacity(config.pool_size)),
            interrupt_hook: Mutex::new(interrupt_hook),
            signal_epoch,
            config,
        });

        for worker_no in 0..core.config.pool_size {
            let system = ActorSystem { core: core.clone() };
            let spawned = thread::Builder::new()
                .name(format!("cacti-worker-{}", worker_no))
                .spawn(move || worker_loop(system, worker_no));
            match spawned {
                Ok(handle) => core.workers.lock().or_die("worker list").push(handle),
                Err(e) => {
                    error!("could not start worker {}: {}", worker_no, e);
                    core.abandon_start(worker_no);
                    return Err(CactiError::ThreadSpawn(e.to_string()));
                }
            }
        }

        info!(
            "actor system started: {} workers, initial actor {}",
            core.config.pool_size, leader
        );
        Ok(core)
    }

    /// Stop the `started` workers again after the pool couldn't be filled.
    fn abandon_start(&self, started: usize) {
        let mut global = self.lock_global();
        // the unstarted workers never leave their loop, account for them here
        global.alive_threads = started;
        self.interrupt_locked(&mut global, false);
        let nobody_left = global.alive_threads == 0;
        drop(global);
        if nobody_left {
            self.teardown();
        }
        self.join_workers();
    }

    fn lock_global(&self) -> MutexGuard<'_, GlobalState> {
        self.global.lock().or_die("global lock")
    }

    /// Deliver `message` to actor `id`.
    ///
    /// Fails with [UnknownActor](../api/enum.CactiError.html#variant.UnknownActor) if the id was never issued
    /// and with [Refused](../api/enum.CactiError.html#variant.Refused) if the actor is dying or already reclaimed.
    pub(crate) fn send_message(&self, id: ActorId, message: Message) -> Result<(), CactiError> {
        let cell = match self.registry.lookup(id) {
            Some(cell) => cell,
            // every issued actor is dead once teardown cleared the registry
            None if self.registry.knows(id) => return Err(CactiError::Refused(id)),
            None => return Err(CactiError::UnknownActor(id)),
        };
        trace!(
            "message of type {:#x} for actor {}",
            message.message_type(),
            id
        );
        if cell.deliver(message)? {
            self.schedule(id);
        }
        Ok(())
    }

    /// Put a ready actor on the run queue and wake one worker.
    fn schedule(&self, id: ActorId) {
        let mut global = self.lock_global();
        if let Err(id) = global.run_queue.push(id) {
            fatal(format!("run queue overflow while scheduling actor {}", id));
        }
        drop(global);
        self.run_available.notify_one();
    }

    /// Pop the next ready actor, blocking while there is nothing to do but actors are still alive.
    ///
    /// Returns ```None``` once the run queue is empty and no actor is alive: the worker should exit.
    fn next_ready(&self) -> Option<ActorId> {
        let mut global = self.lock_global();
        loop {
            if self.config.handle_interrupt && signal::interrupted_since(self.signal_epoch) {
                self.interrupt_locked(&mut global, true);
            }
            if let Some(id) = global.run_queue.pop() {
                return Some(id);
            }
            if global.alive_actors == 0 {
                // cascade the wake-up to the sibling workers
                self.run_available.notify_one();
                return None;
            }
            global = self
                .run_available
                .wait_timeout(global, self.config.poll_interval())
                .or_die("global lock")
                .0;
        }
    }

    /// Service one batch of actor `id`, then hand it back to the run queue if work is left.
    fn service(&self, system: &ActorSystem, id: ActorId) {
        let cell = match self.registry.lookup(id) {
            Some(cell) => cell,
            None => fatal(format!("actor {} was scheduled but is not registered", id)),
        };
        let requeue = cell.service(self.config.batch_size, |state, message| {
            self.process_message(system, &cell, state, message)
        });
        if requeue {
            self.schedule(id);
        }
    }

    /// Run the built-in handling of `message`, or the matching prompt of the actor's role.
    fn process_message(
        &self,
        system: &ActorSystem,
        cell: &ActorCell,
        state: &mut Option<Box<dyn Any + Send>>,
        message: Message,
    ) {
        let Message {
            message_type,
            nbytes,
            data,
        } = message;
        match message_type {
            MSG_SPAWN => match data.downcast::<Role>() {
                Ok(role) => self.spawn_actor(cell.id(), role),
                Err(_) => fatal(format!(
                    "MSG_SPAWN for actor {} does not carry a Role",
                    cell.id()
                )),
            },
            MSG_GODIE => {
                if cell.mark_dying() {
                    debug!("actor {} is dying", cell.id());
                    self.actor_died();
                }
            }
            _ => {
                let prompt = if message_type < 0 {
                    None
                } else {
                    cell.role().prompt(message_type as usize)
                };
                let prompt = match prompt {
                    Some(prompt) => prompt,
                    None => fatal(format!(
                        "actor {} has {} prompts, got message type {:#x}",
                        cell.id(),
                        cell.role().nprompts(),
                        message_type
                    )),
                };
                let mut ctx = Context::new(system, cell.id(), state);
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| prompt(&mut ctx, nbytes, data)));
                if outcome.is_err() {
                    fatal(format!(
                        "prompt {:#x} of actor {} panicked",
                        message_type,
                        cell.id()
                    ));
                }
            }
        }
    }

    /// Create a new actor for `MSG_SPAWN` and greet it with the creator's id.
    ///
    /// Silently skipped while draining or once the actor limit is reached.
    fn spawn_actor(&self, creator: ActorId, role: Role) {
        let spawned = {
            let mut global = self.lock_global();
            if global.interrupted {
                None
            } else {
                let spawned = self.registry.create_actor(role);
                if spawned.is_some() {
                    global.alive_actors += 1;
                }
                spawned
            }
        };
        let id = match spawned {
            Some(id) => id,
            None => {
                warn!(
                    "spawn requested by actor {} refused (draining or {} actors reached)",
                    creator, self.config.actor_limit
                );
                return;
            }
        };
        debug!("actor {} spawned actor {}", creator, id);
        if let Err(e) = self.send_message(id, Message::new(MSG_HELLO, creator)) {
            // only possible if an interrupt marked the newborn dying in between
            warn!("could not greet actor {}: {}", id, e);
        }
    }

    fn actor_died(&self) {
        let mut global = self.lock_global();
        global.alive_actors = global.alive_actors.saturating_sub(1);
        if global.alive_actors == 0 {
            drop(global);
            self.run_available.notify_all();
        }
    }

    /// Stop accepting work: every actor becomes dying, no more spawns, workers drain what is queued and exit.
    pub(crate) fn interrupt(&self) {
        let mut global = self.lock_global();
        self.interrupt_locked(&mut global, false);
    }

    fn interrupt_locked(&self, global: &mut GlobalState, by_signal: bool) {
        if global.interrupted {
            return;
        }
        info!(
            "actor system interrupted{}, draining",
            if by_signal { " by SIGINT" } else { "" }
        );
        global.interrupted = true;
        global.interrupted_by_signal = by_signal;
        self.registry.for_each(|cell| {
            cell.mark_dying();
        });
        global.alive_actors = 0;
        self.run_available.notify_all();
    }

    /// Called by every worker leaving its loop; the last one tears the system down.
    fn worker_exit(&self, worker_no: usize) {
        let mut global = self.lock_global();
        global.alive_threads -= 1;
        let last = global.alive_threads == 0;
        drop(global);
        debug!("worker {} stopped", worker_no);
        if last {
            self.teardown();
        }
    }

    /// Reclaim every actor, give the interrupt hook back and wake the joiners.
    fn teardown(&self) {
        self.registry.clear();
        let by_signal = {
            let mut global = self.lock_global();
            global.run_queue.clear();
            stopped_by_signal(global.interrupted_by_signal, self.signal_epoch)
        };
        let hook = self.interrupt_hook.lock().or_die("interrupt hook").take();
        if let Some(hook) = hook {
            hook.release(by_signal);
        }
        self.lock_global().finished = true;
        self.finished.notify_all();
        info!("actor system finished");
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.lock_global().finished
    }

    /// Returns ```true``` if `id` belongs to this system.
    pub(crate) fn knows(&self, id: ActorId) -> bool {
        self.registry.knows(id)
    }

    pub(crate) fn actor_count(&self) -> usize {
        self.registry.len()
    }

    /// Block until teardown completed, then join the worker threads.
    pub(crate) fn wait_finished(&self) {
        let mut global = self.lock_global();
        while !global.finished {
            global = self.finished.wait(global).or_die("global lock");
        }
        drop(global);
        self.join_workers();
    }

    fn join_workers(&self) {
        let workers: Vec<JoinHandle<()>> = self.workers.lock().or_die("worker list").drain(..).collect();
        let current = thread::current().id();
        for worker in workers {
            if worker.thread().id() == current {
                continue;
            }
            if let Err(e) = worker.join() {
                error!("worker thread ended abnormally: {:?}", e);
            }
        }
    }
}

/// Whether the released hook has to raise SIGINT again, also for a signal that came in after the last poll.
fn stopped_by_signal(interrupted_by_signal: bool, signal_epoch: u64) -> bool {
    interrupted_by_signal || signal::interrupted_since(signal_epoch)
}

/// Body of every worker thread.
fn worker_loop(system: ActorSystem, worker_no: usize) {
    debug!("worker {} started", worker_no);
    let core = system.core.clone();
    while let Some(id) = core.next_ready() {
        core.service(&system, id);
    }
    core.worker_exit(worker_no);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Payload;
    use crate::role;

    fn quiet_config() -> SystemConfig {
        SystemConfig {
            handle_interrupt: false,
            ..SystemConfig::default()
        }
    }

    fn noop(_ctx: &mut Context<'_>, _nbytes: usize, _data: Payload) {}

    #[test]
    fn godie_on_leader_finishes_the_system() {
        let core = SystemCore::start(quiet_config(), role![noop]).unwrap();
        core.send_message(ActorId(0), Message::godie()).unwrap();
        core.wait_finished();
        assert!(core.is_finished());
        assert_eq!(core.actor_count(), 0);
        assert!(core.workers.lock().unwrap().is_empty());
    }

    #[test]
    fn reclaimed_actor_refuses_messages() {
        let core = SystemCore::start(quiet_config(), role![noop]).unwrap();
        core.send_message(ActorId(0), Message::godie()).unwrap();
        core.wait_finished();
        assert_eq!(
            core.send_message(ActorId(0), Message::empty(0)).err(),
            Some(CactiError::Refused(ActorId(0)))
        );
        assert_eq!(
            core.send_message(ActorId(1), Message::empty(0)).err(),
            Some(CactiError::UnknownActor(ActorId(1)))
        );
    }

    #[test]
    fn signal_after_last_poll_is_still_raised_again() {
        assert!(stopped_by_signal(true, signal::epoch()));
        assert!(stopped_by_signal(false, signal::epoch().wrapping_sub(1)));
        assert!(!stopped_by_signal(false, signal::epoch()));
    }

    #[test]
    fn unknown_actor_is_reported() {
        let core = SystemCore::start(quiet_config(), role![noop]).unwrap();
        assert_eq!(
            core.send_message(ActorId(1), Message::empty(0)).err(),
            Some(CactiError::UnknownActor(ActorId(1)))
        );
        core.send_message(ActorId(0), Message::godie()).unwrap();
        core.wait_finished();
    }

    #[test]
    fn second_godie_does_not_count_twice() {
        let core = SystemCore::start(quiet_config(), role![noop]).unwrap();
        let system = ActorSystem { core: core.clone() };
        let leader = core.registry.lookup(ActorId(0)).unwrap();
        // a second actor keeps the system alive while the leader dies twice
        core.spawn_actor(ActorId(0), role![noop]);
        assert_eq!(core.lock_global().alive_actors, 2);

        core.process_message(&system, &leader, &mut None, Message::godie());
        core.process_message(&system, &leader, &mut None, Message::godie());
        assert_eq!(core.lock_global().alive_actors, 1);
        assert_eq!(
            core.send_message(ActorId(0), Message::empty(0)).err(),
            Some(CactiError::Refused(ActorId(0)))
        );

        core.send_message(ActorId(1), Message::godie()).unwrap();
        core.wait_finished();
        assert_eq!(core.lock_global().alive_actors, 0);
    }

    #[test]
    fn spawn_is_refused_after_interrupt() {
        let core = SystemCore::start(quiet_config(), role![noop]).unwrap();
        core.interrupt();
        core.spawn_actor(ActorId(0), role![noop]);
        assert!(!core.knows(ActorId(1)));
        core.wait_finished();
    }

    #[test]
    fn spawn_is_refused_at_the_actor_limit() {
        let config = SystemConfig {
            actor_limit: 2,
            ..quiet_config()
        };
        let core = SystemCore::start(config, role![noop]).unwrap();
        core.spawn_actor(ActorId(0), role![noop]);
        core.spawn_actor(ActorId(0), role![noop]);
        assert_eq!(core.actor_count(), 2);
        assert_eq!(core.lock_global().alive_actors, 2);
        core.interrupt();
        core.wait_finished();
    }

    #[test]
    fn interrupt_drains_and_refuses() {
        let core = SystemCore::start(quiet_config(), role![noop]).unwrap();
        core.interrupt();
        assert_eq!(
            core.send_message(ActorId(0), Message::empty(0)).err(),
            Some(CactiError::Refused(ActorId(0)))
        );
        core.wait_finished();
        assert!(core.is_finished());
    }

    #[test]
    fn invalid_config_is_rejected_before_start() {
        let config = SystemConfig {
            pool_size: 0,
            ..quiet_config()
        };
        assert!(matches!(
            SystemCore::start(config, role![noop]),
            Err(CactiError::InvalidConfig(_))
        ));
    }
}
