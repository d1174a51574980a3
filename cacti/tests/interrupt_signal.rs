//! SIGINT handling. Kept in its own test binary, signal dispositions are process wide.
#![cfg(unix)]

use cacti::api::*;
use std::sync::atomic::{AtomicBool, Ordering};

static FORWARDED: AtomicBool = AtomicBool::new(false);

extern "C" fn previous_handler(_signal: libc::c_int) {
    FORWARDED.store(true, Ordering::SeqCst);
}

fn hello(_ctx: &mut Context, _nbytes: usize, _creator: Payload) {}

#[test]
fn sigint_drains_the_system_and_reaches_the_previous_handler() {
    unsafe {
        let handler: extern "C" fn(libc::c_int) = previous_handler;
        assert_ne!(
            libc::signal(libc::SIGINT, handler as libc::sighandler_t),
            libc::SIG_ERR
        );
    }

    let (system, leader) = ActorSystem::create(role![hello]).unwrap();
    assert!(system.config().handle_interrupt);
    unsafe {
        libc::raise(libc::SIGINT);
    }
    system.join(leader);

    assert!(system.is_finished());
    assert!(FORWARDED.load(Ordering::SeqCst));
    assert_eq!(
        system.send_message(leader, Message::empty(MSG_HELLO)),
        Err(CactiError::Refused(leader))
    );
}
