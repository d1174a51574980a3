//! Computes `n!` with a chain of actors.
//!
//! Each actor receives `k!`, multiplies it into `(k+1)!` and, unless it's done,
//! spawns a successor to which it passes the partial product before dying.

use cacti::api::*;
use log::{debug, error};
use std::sync::{Arc, Mutex};
use thiserror::Error;

const MSG_COMPUTE: MessageType = 1;
const MSG_PASS: MessageType = 2;

/// `34!` is the largest factorial a `u128` holds.
pub const MAX_ARGUMENT: u64 = 34;

#[derive(Debug, Error, PartialEq)]
pub enum FactorialError {
    #[error("Negative numbers are not allowed as factorial arguments!")]
    Negative,
    #[error("{0}! does not fit into 128 bits")]
    Overflow(u64),
    #[error("{0}! needs more than {1} actors")]
    TooManyActors(u64, usize),
    #[error("interrupted before the result was known")]
    Interrupted,
    #[error("actor system failed: {0}")]
    Actor(#[from] CactiError),
}

#[derive(Debug, Clone, Copy)]
struct Partial {
    n: u64,
    k: u64,
    k_factorial: u128,
}

type Outcome = Arc<Mutex<Option<Result<u128, FactorialError>>>>;

/// `n!`, or an error for negative `n` or a result beyond `u128`.
///
/// `0!` is answered directly; otherwise one actor is spawned per factor.
pub fn factorial(n: i64, config: SystemConfig) -> Result<u128, FactorialError> {
    if n < 0 {
        return Err(FactorialError::Negative);
    }
    let n = n as u64;
    if n == 0 {
        return Ok(1);
    }
    if n > MAX_ARGUMENT {
        return Err(FactorialError::Overflow(n));
    }
    if n as usize > config.actor_limit {
        return Err(FactorialError::TooManyActors(n, config.actor_limit));
    }

    let outcome: Outcome = Arc::new(Mutex::new(None));
    let (system, leader) = ActorSystem::with_config(config, factorial_role(outcome.clone()))?;
    let initial = Partial {
        n,
        k: 0,
        k_factorial: 1,
    };
    system.send_message(leader, Message::new(MSG_COMPUTE, initial))?;
    system.join(leader);

    let outcome = match outcome.lock() {
        Ok(mut outcome) => outcome.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    };
    outcome.unwrap_or(Err(FactorialError::Interrupted))
}

fn factorial_role(outcome: Outcome) -> Role {
    let compute = prompt(move |ctx: &mut Context, _nbytes: usize, data: Payload| {
        let partial = match data.downcast::<Partial>() {
            Ok(partial) => partial,
            Err(_) => {
                error!("actor {}: compute without a partial product", ctx.actor_id());
                return;
            }
        };
        let k = partial.k + 1;
        let product = partial.k_factorial.checked_mul(u128::from(k));
        debug!("actor {} computed {}! = {:?}", ctx.actor_id(), k, product);

        let next = match product {
            Some(k_factorial) if k < partial.n => {
                ctx.set_state(Partial {
                    n: partial.n,
                    k,
                    k_factorial,
                });
                Message::spawn(factorial_role(outcome.clone()))
            }
            Some(k_factorial) => {
                record(&outcome, Ok(k_factorial));
                Message::godie()
            }
            None => {
                record(&outcome, Err(FactorialError::Overflow(partial.n)));
                Message::godie()
            }
        };
        if let Err(e) = ctx.send_message(ctx.actor_id(), next) {
            error!("actor {}: {}", ctx.actor_id(), e);
        }
    });

    Role::new(vec![prompt(hello), compute, prompt(pass)])
}

fn record(outcome: &Outcome, result: Result<u128, FactorialError>) {
    match outcome.lock() {
        Ok(mut slot) => *slot = Some(result),
        Err(poisoned) => *poisoned.into_inner() = Some(result),
    }
}

/// A new link asks its creator for the partial product.
fn hello(ctx: &mut Context, _nbytes: usize, data: Payload) {
    match data.downcast::<ActorId>() {
        Ok(creator) => {
            let request = Message::new(MSG_PASS, ctx.actor_id());
            if let Err(e) = ctx.send_message(creator, request) {
                error!("actor {} could not reach its creator: {}", ctx.actor_id(), e);
            }
        }
        Err(_) => error!("actor {} greeted without its creator", ctx.actor_id()),
    }
}

fn pass(ctx: &mut Context, _nbytes: usize, data: Payload) {
    let successor = match data.downcast::<ActorId>() {
        Ok(successor) => successor,
        Err(_) => {
            error!("actor {}: pass without a successor", ctx.actor_id());
            return;
        }
    };
    match ctx.take_state::<Partial>() {
        Some(partial) => {
            if let Err(e) = ctx.send_message(successor, Message::new(MSG_COMPUTE, partial)) {
                error!("actor {} could not pass {}!: {}", ctx.actor_id(), partial.k, e);
            }
        }
        None => error!("actor {} has nothing to pass", ctx.actor_id()),
    }
    if let Err(e) = ctx.send_message(ctx.actor_id(), Message::godie()) {
        error!("actor {}: {}", ctx.actor_id(), e);
    }
}
