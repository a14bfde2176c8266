//! Touch Events
//!
//! The event queue the state machine drains and the pending gesture flags the touch
//! callbacks set. Callbacks run on the high priority executor while the badge loop
//! may be blocked in a delay, so they only mark the gesture. The badge loop moves
//! pending gestures into the queue once per tick.

use badge_core::event::{EventQueue, PendingGestures};
use badge_core::touch::{Gesture, TouchClassifier, TouchSensor, TouchZone};

/// Events waiting for the state machine
pub static EVENT_QUEUE: EventQueue = EventQueue::new();

/// Gestures fired since the last drain
static PENDING_GESTURES: PendingGestures = PendingGestures::new();

/// Moves pending gestures into [`EVENT_QUEUE`], returns the number queued
pub fn drain_pending_gestures() -> usize {
    PENDING_GESTURES.drain_into(&EVENT_QUEUE)
}

/// Attaches a callback to every gesture the state machine handles
pub fn attach_callbacks<S: TouchSensor>(touch: &mut TouchClassifier<S>) {
    touch.attach(TouchZone::Fingerprint, Gesture::Touch, Some(fingerprint_touch));
    touch.attach(TouchZone::Fingerprint, Gesture::Release, Some(fingerprint_release));
    touch.attach(TouchZone::Fingerprint, Gesture::Shortpress, Some(fingerprint_shortpress));
    touch.attach(TouchZone::Fingerprint, Gesture::Longpress, Some(fingerprint_longpress));
    touch.attach(TouchZone::Nose, Gesture::Touch, Some(nose_touch));
    touch.attach(TouchZone::Nose, Gesture::Release, Some(nose_release));
    touch.attach(TouchZone::Nose, Gesture::Shortpress, Some(nose_shortpress));
    touch.attach(TouchZone::Nose, Gesture::Longpress, Some(nose_longpress));
    touch.attach(TouchZone::All, Gesture::Shortpress, Some(all_shortpress));
    touch.attach(TouchZone::All, Gesture::Longpress, Some(all_longpress));
}

fn fingerprint_touch() {
    PENDING_GESTURES.mark(TouchZone::Fingerprint, Gesture::Touch);
}

fn fingerprint_release() {
    PENDING_GESTURES.mark(TouchZone::Fingerprint, Gesture::Release);
}

fn fingerprint_shortpress() {
    PENDING_GESTURES.mark(TouchZone::Fingerprint, Gesture::Shortpress);
}

fn fingerprint_longpress() {
    PENDING_GESTURES.mark(TouchZone::Fingerprint, Gesture::Longpress);
}

fn nose_touch() {
    PENDING_GESTURES.mark(TouchZone::Nose, Gesture::Touch);
}

fn nose_release() {
    PENDING_GESTURES.mark(TouchZone::Nose, Gesture::Release);
}

fn nose_shortpress() {
    PENDING_GESTURES.mark(TouchZone::Nose, Gesture::Shortpress);
}

fn nose_longpress() {
    PENDING_GESTURES.mark(TouchZone::Nose, Gesture::Longpress);
}

fn all_shortpress() {
    PENDING_GESTURES.mark(TouchZone::All, Gesture::Shortpress);
}

fn all_longpress() {
    PENDING_GESTURES.mark(TouchZone::All, Gesture::Longpress);
}
