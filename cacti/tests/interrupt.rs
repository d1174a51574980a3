//! Draining a system through [ActorSystem::interrupt].

use cacti::api::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const MSG_TICK: MessageType = 1;
const MSG_BLOCK: MessageType = 1;

fn quiet() -> SystemConfig {
    SystemConfig {
        handle_interrupt: false,
        ..SystemConfig::default()
    }
}

fn hello(_ctx: &mut Context, _nbytes: usize, _creator: Payload) {}

#[test]
fn interrupt_stops_a_self_feeding_actor() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = ticks.clone();
    let ticker = role![hello, move |ctx: &mut Context, _nbytes: usize, _data: Payload| {
        counter.fetch_add(1, Ordering::SeqCst);
        // refused once the system drains
        let _ = ctx.send_message(ctx.actor_id(), Message::empty(MSG_TICK));
    }];
    let (system, leader) = ActorSystem::with_config(quiet(), ticker).unwrap();
    system.send_message(leader, Message::empty(MSG_TICK)).unwrap();
    while ticks.load(Ordering::SeqCst) < 100 {
        thread::sleep(Duration::from_millis(1));
    }
    system.interrupt();
    system.join(leader);

    assert!(system.is_finished());
    let seen = ticks.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(20));
    assert_eq!(ticks.load(Ordering::SeqCst), seen);
    assert_eq!(
        system.send_message(leader, Message::empty(MSG_TICK)),
        Err(CactiError::Refused(leader))
    );
}

#[test]
fn spawn_queued_before_interrupt_is_refused() {
    let inside = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));
    let greeted = Arc::new(AtomicBool::new(false));

    let child = {
        let greeted = greeted.clone();
        role![move |_ctx: &mut Context, _nbytes: usize, _creator: Payload| {
            greeted.store(true, Ordering::SeqCst);
        }]
    };
    let leader_role = {
        let inside = inside.clone();
        let release = release.clone();
        role![hello, move |_ctx: &mut Context, _nbytes: usize, _data: Payload| {
            inside.wait();
            release.wait();
        }]
    };

    let (system, leader) = ActorSystem::with_config(quiet(), leader_role).unwrap();
    system.send_message(leader, Message::empty(MSG_BLOCK)).unwrap();
    system.send_message(leader, Message::spawn(child)).unwrap();
    inside.wait();
    system.interrupt();
    assert_eq!(
        system.send_message(leader, Message::empty(MSG_BLOCK)),
        Err(CactiError::Refused(leader))
    );
    release.wait();
    system.join(leader);

    assert!(system.is_finished());
    assert!(!greeted.load(Ordering::SeqCst));
}

#[test]
fn interrupt_twice_is_harmless() {
    let (system, leader) = ActorSystem::with_config(quiet(), role![hello]).unwrap();
    system.interrupt();
    system.interrupt();
    system.join(leader);
    system.interrupt();
    assert!(system.is_finished());
}
