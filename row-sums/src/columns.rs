//! A chain of column actors computing the sums of a [Matrix](../matrix/struct.Matrix.html) row by row.
//!
//! The system's first actor owns column `0`. Every column spawns the next one, the new actor
//! introduces itself to its creator and is told which column it owns. Once the last column exists,
//! the first one is started and pushes rows down the chain, every column adding its own field.
//! The last column reports each finished row back to the first one, which only then releases
//! another row, so no mailbox ever holds more than [ROWS_IN_FLIGHT](constant.ROWS_IN_FLIGHT.html) rows.

use crate::matrix::Matrix;
use cacti::api::*;
use log::{debug, error};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use thiserror::Error;

const MSG_INTRODUCE: MessageType = 1;
const MSG_SETUP: MessageType = 2;
const MSG_START: MessageType = 3;
const MSG_COMPUTE: MessageType = 4;
const MSG_ROW_DONE: MessageType = 5;

/// Rows travelling down the chain at the same time. Well below the smallest allowed mailbox.
pub const ROWS_IN_FLIGHT: usize = 64;

#[derive(Debug, Error)]
pub enum RowSumsError {
    #[error("{columns} columns exceed the limit of {limit} actors")]
    TooManyColumns { columns: usize, limit: usize },
    #[error("actor system failed: {0}")]
    Actor(#[from] CactiError),
}

#[derive(Debug, Clone, Copy)]
struct Setup {
    column: usize,
    leader: ActorId,
}

#[derive(Debug, Clone, Copy)]
struct PartialSum {
    row: usize,
    sum: i64,
}

#[derive(Debug)]
struct Column {
    column: usize,
    leader: ActorId,
    next: Option<ActorId>,
    /// Rows handed to the chain so far (first column only).
    released: usize,
    /// Rows reported back by the last column (first column only).
    finished: usize,
}

type Sums = Arc<Mutex<Vec<i64>>>;

/// Sum every row of `matrix` with one actor per column.
pub fn row_sums(matrix: Matrix, config: SystemConfig) -> Result<Vec<i64>, RowSumsError> {
    if matrix.rows() == 0 || matrix.columns() == 0 {
        return Ok(vec![0; matrix.rows()]);
    }
    if matrix.columns() > config.actor_limit {
        return Err(RowSumsError::TooManyColumns {
            columns: matrix.columns(),
            limit: config.actor_limit,
        });
    }

    let sums: Sums = Arc::new(Mutex::new(vec![0; matrix.rows()]));
    let role = column_role(Arc::new(matrix), sums.clone());
    let (system, leader) = ActorSystem::with_config(config, role)?;
    system.send_message(leader, Message::new(MSG_SETUP, Setup { column: 0, leader }))?;
    system.join(leader);

    let sums = match sums.lock() {
        Ok(sums) => sums.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    Ok(sums)
}

fn column_role(matrix: Arc<Matrix>, sums: Sums) -> Role {
    let configure = {
        let matrix = matrix.clone();
        let sums = sums.clone();
        prompt(move |ctx: &mut Context, _nbytes: usize, data: Payload| {
            let setup = match data.downcast::<Setup>() {
                Ok(setup) => setup,
                Err(_) => {
                    error!("actor {}: setup without a column", ctx.actor_id());
                    return;
                }
            };
            ctx.set_state(Column {
                column: setup.column,
                leader: setup.leader,
                next: None,
                released: 0,
                finished: 0,
            });
            let sent = if setup.column + 1 < matrix.columns() {
                ctx.send_message(
                    ctx.actor_id(),
                    Message::spawn(column_role(matrix.clone(), sums.clone())),
                )
            } else {
                ctx.send_message(setup.leader, Message::empty(MSG_START))
            };
            if let Err(e) = sent {
                error!("column {}: {}", setup.column, e);
            }
        })
    };
    let start = {
        let rows = matrix.rows();
        prompt(move |ctx: &mut Context, _nbytes: usize, _data: Payload| {
            for _ in 0..rows.min(ROWS_IN_FLIGHT) {
                release_row(ctx);
            }
        })
    };
    let row_done = {
        let rows = matrix.rows();
        prompt(move |ctx: &mut Context, _nbytes: usize, _data: Payload| {
            let (finished, released) = match ctx.state_mut::<Column>() {
                Some(state) => {
                    state.finished += 1;
                    (state.finished, state.released)
                }
                None => {
                    error!("actor {}: row reported before setup", ctx.actor_id());
                    return;
                }
            };
            if finished == rows {
                if let Err(e) = ctx.send_message(ctx.actor_id(), Message::godie()) {
                    error!("first column: {}", e);
                }
            } else if released < rows {
                release_row(ctx);
            }
        })
    };
    let compute = prompt(move |ctx: &mut Context, _nbytes: usize, data: Payload| {
        let partial = match data.downcast::<PartialSum>() {
            Ok(partial) => partial,
            Err(_) => {
                error!("actor {}: compute without a partial sum", ctx.actor_id());
                return;
            }
        };
        let me = ctx.actor_id();
        let (column, leader, next) = match ctx.state::<Column>() {
            Some(state) => (state.column, state.leader, state.next),
            None => {
                error!("actor {}: compute before setup", me);
                return;
            }
        };
        let field = matrix.field(partial.row, column);
        thread::sleep(Duration::from_millis(field.delay_ms));
        let sum = partial.sum + field.value;
        debug!("row {} column {}: {}", partial.row, column, sum);

        let forwarded = match next {
            Some(next) => {
                let partial = PartialSum {
                    row: partial.row,
                    sum,
                };
                ctx.send_message(next, Message::new(MSG_COMPUTE, partial))
            }
            None => {
                if let Ok(mut sums) = sums.lock() {
                    sums[partial.row] = sum;
                }
                ctx.send_message(leader, Message::new(MSG_ROW_DONE, partial.row))
            }
        };
        if let Err(e) = forwarded {
            error!("column {}: row {} lost: {}", column, partial.row, e);
        }

        // the first column waits for the last report instead
        if partial.row + 1 == matrix.rows() && me != leader {
            if let Err(e) = ctx.send_message(me, Message::godie()) {
                error!("column {}: {}", column, e);
            }
        }
    });

    Role::new(vec![
        prompt(hello),
        prompt(introduce),
        configure,
        start,
        compute,
        row_done,
    ])
}

/// Hand the next row to the first column (the running actor).
fn release_row(ctx: &mut Context) {
    let row = match ctx.state_mut::<Column>() {
        Some(state) => {
            state.released += 1;
            state.released - 1
        }
        None => {
            error!("actor {}: row released before setup", ctx.actor_id());
            return;
        }
    };
    let first = Message::new(MSG_COMPUTE, PartialSum { row, sum: 0 });
    if let Err(e) = ctx.send_message(ctx.actor_id(), first) {
        error!("could not release row {}: {}", row, e);
    }
}

fn hello(ctx: &mut Context, _nbytes: usize, data: Payload) {
    match data.downcast::<ActorId>() {
        Ok(creator) => {
            let introduction = Message::new(MSG_INTRODUCE, ctx.actor_id());
            if let Err(e) = ctx.send_message(creator, introduction) {
                error!("actor {} could not introduce itself: {}", ctx.actor_id(), e);
            }
        }
        Err(_) => error!("actor {} greeted without its creator", ctx.actor_id()),
    }
}

fn introduce(ctx: &mut Context, _nbytes: usize, data: Payload) {
    let child = match data.downcast::<ActorId>() {
        Ok(child) => child,
        Err(_) => {
            error!("actor {}: introduction without an id", ctx.actor_id());
            return;
        }
    };
    let setup = match ctx.state_mut::<Column>() {
        Some(state) => {
            state.next = Some(child);
            Setup {
                column: state.column + 1,
                leader: state.leader,
            }
        }
        None => {
            error!("actor {} introduced before setup", ctx.actor_id());
            return;
        }
    };
    if let Err(e) = ctx.send_message(child, Message::new(MSG_SETUP, setup)) {
        error!("could not set up column {}: {}", setup.column, e);
    }
}
