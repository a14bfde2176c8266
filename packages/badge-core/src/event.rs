//! Touch Events
//!
//! Events produced by the touch classifier and consumed by the state machine.
//!
//! Touch callbacks run in interrupt context and must stay cheap, so they only mark a
//! gesture as pending. The main loop converts pending gestures into queued
//! [`FsmEvent`]s, dropping gestures that are implied by a stronger one, and the
//! state machine drains the queue in arrival order.
//!
//! Both the pending flags and the queue are guarded by critical sections.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::{Channel, TrySendError};

use crate::touch::{Gesture, TouchZone};

/// Default number of events the queue holds before new events are dropped
pub const EVENT_QUEUE_CAPACITY: usize = 32;

/// Events the state machine reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FsmEvent {
    /// Nothing happened, returned by an empty queue
    NoOp,
    FingerprintTouch,
    FingerprintRelease,
    FingerprintShortpress,
    FingerprintLongpress,
    NoseTouch,
    NoseRelease,
    NoseShortpress,
    NoseLongpress,
    /// Both zones short pressed together
    AllShortpress,
    /// Both zones long pressed together
    AllLongpress,
}

impl FsmEvent {
    /// Maps a classified gesture to its event.
    ///
    /// Touch and release are not tracked for the combined zone, so these
    /// combinations have no event.
    pub const fn from_gesture(zone: TouchZone, gesture: Gesture) -> Option<Self> {
        match (zone, gesture) {
            (TouchZone::Fingerprint, Gesture::Touch) => Some(Self::FingerprintTouch),
            (TouchZone::Fingerprint, Gesture::Release) => Some(Self::FingerprintRelease),
            (TouchZone::Fingerprint, Gesture::Shortpress) => Some(Self::FingerprintShortpress),
            (TouchZone::Fingerprint, Gesture::Longpress) => Some(Self::FingerprintLongpress),
            (TouchZone::Nose, Gesture::Touch) => Some(Self::NoseTouch),
            (TouchZone::Nose, Gesture::Release) => Some(Self::NoseRelease),
            (TouchZone::Nose, Gesture::Shortpress) => Some(Self::NoseShortpress),
            (TouchZone::Nose, Gesture::Longpress) => Some(Self::NoseLongpress),
            (TouchZone::All, Gesture::Shortpress) => Some(Self::AllShortpress),
            (TouchZone::All, Gesture::Longpress) => Some(Self::AllLongpress),
            (TouchZone::All, Gesture::Touch | Gesture::Release) => None,
        }
    }
}

/// Bounded FIFO of [`FsmEvent`]s that can be written from interrupt context.
///
/// Neither side ever blocks. A full queue drops the new event with a warning, an
/// empty queue hands out [`FsmEvent::NoOp`].
pub struct EventQueue<const N: usize = EVENT_QUEUE_CAPACITY> {
    channel: Channel<CriticalSectionRawMutex, FsmEvent, N>,
}

impl<const N: usize> EventQueue<N> {
    pub const fn new() -> Self {
        Self { channel: Channel::new() }
    }

    /// Appends an event. Returns `false` if it was dropped.
    pub fn enqueue(&self, event: FsmEvent) -> bool {
        if event == FsmEvent::NoOp {
            debug!("queue: ignoring NoOp");
            return false;
        }

        match self.channel.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                warn!("queue: full, dropped {:?}", dropped);
                false
            }
        }
    }

    /// Removes the oldest event, or returns [`FsmEvent::NoOp`] if there is none.
    pub fn dequeue(&self) -> FsmEvent {
        self.channel.try_receive().unwrap_or(FsmEvent::NoOp)
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Drops all queued events
    pub fn clear(&self) {
        self.channel.clear();
    }
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ZoneFlags {
    touch: bool,
    release: bool,
    shortpress: bool,
    longpress: bool,
}

impl ZoneFlags {
    const NONE: Self = Self {
        touch: false,
        release: false,
        shortpress: false,
        longpress: false,
    };

    /// Queues the flagged events of one zone.
    ///
    /// A long press implies a short press and a release, a short press implies a
    /// release, so only the strongest of them is forwarded.
    fn drain_into<const N: usize>(self, zone: TouchZone, queue: &EventQueue<N>) -> usize {
        let mut gestures: heapless::Vec<Gesture, 2> = heapless::Vec::new();
        if self.touch {
            let _ = gestures.push(Gesture::Touch);
        }
        if self.longpress {
            let _ = gestures.push(Gesture::Longpress);
        } else if self.shortpress {
            let _ = gestures.push(Gesture::Shortpress);
        } else if self.release {
            let _ = gestures.push(Gesture::Release);
        }

        gestures
            .into_iter()
            .filter_map(|gesture| FsmEvent::from_gesture(zone, gesture))
            .filter(|event| queue.enqueue(*event))
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Flags {
    fingerprint: ZoneFlags,
    nose: ZoneFlags,
    all_shortpress: bool,
    all_longpress: bool,
}

impl Flags {
    const NONE: Self = Self {
        fingerprint: ZoneFlags::NONE,
        nose: ZoneFlags::NONE,
        all_shortpress: false,
        all_longpress: false,
    };
}

/// Gestures raised by touch callbacks that have not been queued yet
pub struct PendingGestures {
    flags: Mutex<CriticalSectionRawMutex, Cell<Flags>>,
}

impl PendingGestures {
    pub const fn new() -> Self {
        Self {
            flags: Mutex::new(Cell::new(Flags::NONE)),
        }
    }

    /// Marks a gesture as pending. Safe to call from interrupt context.
    pub fn mark(&self, zone: TouchZone, gesture: Gesture) {
        self.flags.lock(|cell| {
            let mut flags = cell.get();
            match zone {
                TouchZone::Fingerprint => Self::set(&mut flags.fingerprint, gesture),
                TouchZone::Nose => Self::set(&mut flags.nose, gesture),
                TouchZone::All => match gesture {
                    Gesture::Shortpress => flags.all_shortpress = true,
                    Gesture::Longpress => flags.all_longpress = true,
                    Gesture::Touch | Gesture::Release => {}
                },
            }
            cell.set(flags);
        });
    }

    fn set(zone: &mut ZoneFlags, gesture: Gesture) {
        match gesture {
            Gesture::Touch => zone.touch = true,
            Gesture::Release => zone.release = true,
            Gesture::Shortpress => zone.shortpress = true,
            Gesture::Longpress => zone.longpress = true,
        }
    }

    /// Moves all pending gestures into `queue` and clears them.
    ///
    /// Fingerprint events come first, then nose, then the combined gestures.
    /// Returns the number of events queued.
    pub fn drain_into<const N: usize>(&self, queue: &EventQueue<N>) -> usize {
        let flags = self.flags.lock(|cell| cell.replace(Flags::NONE));
        if flags == Flags::NONE {
            return 0;
        }

        let mut queued = flags.fingerprint.drain_into(TouchZone::Fingerprint, queue);
        queued += flags.nose.drain_into(TouchZone::Nose, queue);
        if flags.all_longpress && queue.enqueue(FsmEvent::AllLongpress) {
            queued += 1;
        }
        if flags.all_shortpress && queue.enqueue(FsmEvent::AllShortpress) {
            queued += 1;
        }
        queued
    }
}

impl Default for PendingGestures {
    fn default() -> Self {
        Self::new()
    }
}
