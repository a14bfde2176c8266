mod common;

use std::cell::Cell;
use std::rc::Rc;

use badge_core::event::{EventQueue, FsmEvent, PendingGestures};
use badge_core::globals::Globals;
use badge_core::state::{BadgeState, State, StateId};
use badge_core::store::{KeyValueStore, MemoryStore};
use badge_core::touch::{Gesture, TouchClassifier, TouchSensor, TouchValue, TouchZone};
use badge_core::Fsm;

use common::RecordingBoard;

#[test]
fn exit_runs_before_entry() {
    let queue: EventQueue = EventQueue::new();
    let mut fsm = Fsm::new(MemoryStore::new(), &queue);
    let mut board = RecordingBoard::new();

    fsm.transition(BadgeState::next(StateId::MenuMain), &mut board, 0);
    board.log.borrow_mut().clear();

    fsm.transition(BadgeState::next(StateId::OtaUpdate), &mut board, 10);
    assert_eq!(fsm.state().id(), StateId::OtaUpdate);
    assert_eq!(
        board.calls(),
        ["leds.clear", "radio.connect", "radio.enable_update_receiver"]
    );

    fsm.transition(BadgeState::next(StateId::MenuMain), &mut board, 20);
    let disable = board.position("radio.disable").unwrap();
    assert!(board.calls()[disable + 1..].contains(&"leds.clear".to_string()));
}

#[test]
fn run_comes_before_queued_events() {
    let queue: EventQueue = EventQueue::new();
    let mut fsm = Fsm::new(MemoryStore::new(), &queue);
    let mut board = RecordingBoard::new();
    fsm.transition(BadgeState::next(StateId::OtaUpdate), &mut board, 0);
    board.log.borrow_mut().clear();

    // back to the menu within the same handle call
    queue.enqueue(FsmEvent::FingerprintShortpress);
    fsm.handle_all(&mut board, 10);
    assert_eq!(fsm.state().id(), StateId::MenuMain);

    let pump = board.position("radio.pump").unwrap();
    let disable = board.position("radio.disable").unwrap();
    assert!(pump < disable, "{:?}", board.calls());
    assert_eq!(board.calls().iter().filter(|c| *c == "radio.pump").count(), 1);
}

#[test]
fn globals_survive_a_reboot() {
    let queue: EventQueue = EventQueue::new();
    let mut board = RecordingBoard::new();

    let mut fsm = Fsm::new(MemoryStore::new(), &queue);
    fsm.resume(&mut board, 0);
    fsm.transition(BadgeState::next(StateId::MenuMain), &mut board, 0);

    // cursor to the snake, brightness from 40 up to 70
    for _ in 0..3 {
        fsm.queue_event(FsmEvent::FingerprintRelease);
    }
    for _ in 0..3 {
        fsm.queue_event(FsmEvent::NoseShortpress);
    }
    fsm.handle_all(&mut board, 10);
    fsm.handle_all(&mut board, 20);
    assert_eq!(fsm.globals().menu_main_pointer_idx, 3);
    assert_eq!(fsm.globals().led_brightness_percent, 70);

    fsm.queue_event(FsmEvent::FingerprintShortpress);
    fsm.handle_all(&mut board, 30);
    assert_eq!(fsm.state().id(), StateId::AnimateSnake);
    let expected = *fsm.globals();

    // fresh controller on the same storage
    let store = fsm.into_store();
    let mut board = RecordingBoard::new();
    let mut fsm = Fsm::new(store, &queue);
    fsm.resume(&mut board, 0);

    assert_eq!(fsm.globals(), &expected);
    assert_eq!(fsm.globals().menu_main_pointer_idx, 3);
    assert_eq!(fsm.globals().led_brightness_percent, 70);
    assert_eq!(fsm.state().id(), StateId::AnimateSnake);
    assert_eq!(board.leds.brightness, 70);
}

#[test]
fn unknown_resume_id_falls_back_to_pride_flag() {
    let queue: EventQueue = EventQueue::new();
    let mut store = MemoryStore::new();
    store.begin("fsm", false).unwrap();
    store.put_u8("resumeStateIdx", 42).unwrap();
    store.end().unwrap();

    let mut fsm = Fsm::new(store, &queue);
    let mut board = RecordingBoard::new();
    fsm.resume(&mut board, 0);
    assert_eq!(fsm.state().id(), StateId::DisplayPrideFlag);
    assert_eq!(fsm.globals().resume_state_idx, StateId::DisplayPrideFlag as u8);
}

#[test]
fn menu_and_update_are_never_resumed() {
    for id in [StateId::MenuMain, StateId::OtaUpdate] {
        let queue: EventQueue = EventQueue::new();
        let mut store = MemoryStore::new();
        store.begin("fsm", false).unwrap();
        store.put_u8("resumeStateIdx", id as u8).unwrap();
        store.end().unwrap();

        let mut fsm = Fsm::new(store, &queue);
        fsm.resume(&mut RecordingBoard::new(), 0);
        assert_eq!(fsm.state().id(), StateId::DisplayPrideFlag);
    }
}

#[test]
fn events_are_handled_in_arrival_order() {
    let queue: EventQueue = EventQueue::new();
    let mut fsm = Fsm::new(MemoryStore::new(), &queue);
    let mut board = RecordingBoard::new();
    fsm.transition(BadgeState::next(StateId::MenuMain), &mut board, 0);

    // select the first item, then a release that the pride flag mode handles
    queue.enqueue(FsmEvent::FingerprintShortpress);
    queue.enqueue(FsmEvent::FingerprintRelease);
    fsm.handle_all(&mut board, 10);

    assert_eq!(fsm.state().id(), StateId::DisplayPrideFlag);
    assert_eq!(fsm.globals().pride_flag_mode_idx, 2);
    assert_eq!(fsm.globals().menu_main_pointer_idx, 0);
    assert!(queue.is_empty());
}

#[test]
fn lock_survives_a_reboot() {
    let queue: EventQueue = EventQueue::new();
    let mut board = RecordingBoard::new();
    let mut fsm = Fsm::new(MemoryStore::new(), &queue);
    fsm.resume(&mut board, 0);

    queue.enqueue(FsmEvent::AllLongpress);
    fsm.handle_all(&mut board, 10);
    fsm.handle_all(&mut board, 20);
    assert!(fsm.globals().locked);

    let mut fsm = Fsm::new(fsm.into_store(), &queue);
    fsm.resume(&mut board, 0);
    assert!(fsm.globals().locked);

    queue.enqueue(FsmEvent::FingerprintShortpress);
    fsm.handle_all(&mut board, 10);
    assert_eq!(fsm.state().id(), StateId::DisplayPrideFlag);
}

/// Sensor whose readings the test changes between polls
#[derive(Clone, Default)]
struct SharedSensor(Rc<Cell<[TouchValue; 2]>>);

impl SharedSensor {
    fn set(&self, fingerprint: TouchValue, nose: TouchValue) {
        self.0.set([fingerprint, nose]);
    }
}

impl TouchSensor for SharedSensor {
    fn read_raw(&mut self, zone: TouchZone) -> TouchValue {
        match zone {
            TouchZone::Nose => self.0.get()[1],
            _ => self.0.get()[0],
        }
    }
}

static PENDING: PendingGestures = PendingGestures::new();
static QUEUE: EventQueue = EventQueue::new();

fn fingerprint_touch() {
    PENDING.mark(TouchZone::Fingerprint, Gesture::Touch);
}

fn fingerprint_release() {
    PENDING.mark(TouchZone::Fingerprint, Gesture::Release);
}

fn fingerprint_shortpress() {
    PENDING.mark(TouchZone::Fingerprint, Gesture::Shortpress);
}

fn fingerprint_longpress() {
    PENDING.mark(TouchZone::Fingerprint, Gesture::Longpress);
}

#[test]
fn touch_to_transition() {
    let sensor = SharedSensor::default();
    sensor.set(1_000, 1_000);
    let mut touch = TouchClassifier::new(sensor.clone());
    touch.init();
    touch.attach(TouchZone::Fingerprint, Gesture::Touch, Some(fingerprint_touch));
    touch.attach(TouchZone::Fingerprint, Gesture::Release, Some(fingerprint_release));
    touch.attach(TouchZone::Fingerprint, Gesture::Shortpress, Some(fingerprint_shortpress));
    touch.attach(TouchZone::Fingerprint, Gesture::Longpress, Some(fingerprint_longpress));

    let mut board = RecordingBoard::new();
    let mut fsm = Fsm::new(MemoryStore::new(), &QUEUE);
    fsm.resume(&mut board, 0);

    // a tap only changes the flag
    sensor.set(20_000, 1_000);
    touch.poll(100);
    sensor.set(1_000, 1_000);
    touch.poll(200);
    assert_eq!(PENDING.drain_into(&QUEUE), 2);
    fsm.handle_all(&mut board, 200);
    assert_eq!(fsm.state().id(), StateId::DisplayPrideFlag);
    assert_eq!(fsm.globals().pride_flag_mode_idx, 2);

    // a short press opens the menu, its release is swallowed
    sensor.set(20_000, 1_000);
    touch.poll(1_000);
    sensor.set(1_000, 1_000);
    touch.poll(1_500);
    assert_eq!(PENDING.drain_into(&QUEUE), 2);
    fsm.handle_all(&mut board, 1_500);
    assert_eq!(fsm.state().id(), StateId::MenuMain);
    assert_eq!(fsm.globals().menu_main_pointer_idx, 0);
}

#[test]
fn defaults_are_restored_from_an_empty_store() {
    let queue: EventQueue = EventQueue::new();
    let mut fsm = Fsm::new(MemoryStore::new(), &queue);
    fsm.resume(&mut RecordingBoard::new(), 0);
    assert_eq!(
        fsm.globals(),
        &Globals {
            resume_state_idx: StateId::DisplayPrideFlag as u8,
            ..Globals::default()
        }
    );
}
