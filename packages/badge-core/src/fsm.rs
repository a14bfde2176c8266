//! State Machine
//!
//! Owns the current badge mode and the persisted globals, runs the mode at its tick
//! rate and feeds it the queued touch events in arrival order.
//!
//! # Persistence points
//! The globals are written to the store
//! - at the start of every `handle()` call if the current mode dirtied them
//! - on a transition if the outgoing mode dirtied them or the incoming mode should
//!   be remembered across reboots

use crate::board::{Board, Millis};
use crate::event::{EventQueue, FsmEvent, EVENT_QUEUE_CAPACITY};
use crate::fmt::Debug2Format;
use crate::globals::Globals;
use crate::led::LedStrip;
use crate::state::{BadgeState, Context, State, StateId};
use crate::store::KeyValueStore;

/// Interval the firmware calls [`Fsm::handle`] at
pub const FSM_TICK_RATE_MS: u32 = 10;
/// Events handled per call of [`Fsm::handle_all`]
pub const MAX_EVENTS_PER_HANDLE: usize = 999;

pub struct Fsm<'q, S: KeyValueStore, const N: usize = EVENT_QUEUE_CAPACITY> {
    store: S,
    queue: &'q EventQueue<N>,
    state: BadgeState,
    globals: Globals,
    globals_dirty: bool,
    tick_rate_ms: u32,
    state_last_run: Option<Millis>,
}

impl<'q, S: KeyValueStore, const N: usize> Fsm<'q, S, N> {
    /// Creates the state machine in the pride flag mode, without entering it.
    ///
    /// Call [`Self::resume`] to restore the persisted mode.
    pub fn new(store: S, queue: &'q EventQueue<N>) -> Self {
        Self {
            store,
            queue,
            state: BadgeState::from_id(StateId::DisplayPrideFlag),
            globals: Globals::default(),
            globals_dirty: false,
            tick_rate_ms: FSM_TICK_RATE_MS,
            state_last_run: None,
        }
    }

    pub fn tick_rate_ms(&self) -> u32 {
        self.tick_rate_ms
    }

    pub fn state(&self) -> &BadgeState {
        &self.state
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    pub fn is_globals_dirty(&self) -> bool {
        self.globals_dirty
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Gives the store back, e.g. to hand it to a fresh state machine
    pub fn into_store(self) -> S {
        self.store
    }

    pub fn queue_event(&self, event: FsmEvent) -> bool {
        self.queue.enqueue(event)
    }

    pub fn queue_size(&self) -> usize {
        self.queue.len()
    }

    /// Restores the globals and enters the remembered mode
    pub fn resume<B: Board>(&mut self, board: &mut B, now: Millis) {
        self.restore_globals();
        board.leds().set_brightness_percent(self.globals.led_brightness_percent);

        let id = match StateId::resumable(self.globals.resume_state_idx) {
            Some(id) => id,
            None => {
                warn!("fsm: failed to resume to unknown state {}", self.globals.resume_state_idx);
                StateId::DisplayPrideFlag
            }
        };
        self.transition(BadgeState::next(id), board, now);
    }

    /// Replaces the current mode. `None` is rejected with a warning.
    pub fn transition<B: Board>(&mut self, next: Option<BadgeState>, board: &mut B, now: Millis) {
        let Some(mut next) = next else {
            warn!("fsm: failed to transition to null state, aborting");
            return;
        };

        info!("fsm: transition {} -> {}", self.state.name(), next.name());
        self.with_context(board, now, |state, ctx| state.exit(ctx));

        let remembered = next.should_be_remembered();
        if remembered {
            self.globals.resume_state_idx = next.id() as u8;
        }
        if self.globals_dirty || remembered {
            self.persist_globals();
            self.globals_dirty = false;
        }

        core::mem::swap(&mut self.state, &mut next);
        self.state_last_run = None;
        self.with_context(board, now, |state, ctx| state.entry(ctx));
    }

    /// Persists dirty globals, runs the current mode if it is due and handles up to
    /// `max_events` queued events
    pub fn handle<B: Board>(&mut self, board: &mut B, now: Millis, max_events: usize) {
        if self.globals_dirty {
            self.persist_globals();
            self.globals_dirty = false;
        }

        let tick_rate = Millis::from(self.state.tick_rate_ms(&self.globals));
        let due = match self.state_last_run {
            None => true,
            Some(_) if tick_rate == 0 => true,
            Some(last) => now >= last + tick_rate,
        };
        if due {
            self.state_last_run = Some(now);
            self.with_context(board, now, |state, ctx| state.run(ctx));
        }

        for _ in 0..max_events {
            let event = self.queue.dequeue();
            if event == FsmEvent::NoOp {
                return;
            }
            debug!("fsm: processing event {:?}@{}", event, self.state.name());

            let next = self.with_context(board, now, |state, ctx| state.handle_event(event, ctx));
            if next.is_some() {
                self.transition(next, board, now);
            }
        }
    }

    /// [`Self::handle`] with the default event budget
    pub fn handle_all<B: Board>(&mut self, board: &mut B, now: Millis) {
        self.handle(board, now, MAX_EVENTS_PER_HANDLE);
    }

    /// Writes the globals to the store. Failures are logged, not propagated.
    pub fn persist_globals(&mut self) {
        if let Err(e) = self.globals.persist(&mut self.store) {
            error!("fsm: failed to persist globals: {:?}", Debug2Format(&e));
        }
    }

    /// Reads the globals from the store, keeping the current values on failure
    pub fn restore_globals(&mut self) {
        match Globals::restore(&mut self.store) {
            Ok(globals) => self.globals = globals,
            Err(e) => error!("fsm: failed to restore globals: {:?}", Debug2Format(&e)),
        }
    }

    /// Lends the globals and the board to the current mode
    fn with_context<B: Board, R>(
        &mut self,
        board: &mut B,
        now: Millis,
        f: impl FnOnce(&mut BadgeState, &mut Context<'_, B>) -> R,
    ) -> R {
        let mut ctx = Context::new(&mut self.globals, &mut self.globals_dirty, board, now);
        f(&mut self.state, &mut ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_board::TestBoard;

    #[test]
    fn null_transition_keeps_state() {
        let queue: EventQueue = EventQueue::new();
        let mut fsm = Fsm::new(MemoryStore::new(), &queue);
        let mut board = TestBoard::new();

        fsm.transition(None, &mut board, 0);
        assert_eq!(fsm.state().id(), StateId::DisplayPrideFlag);
        assert_eq!(fsm.store().commits, 0);
    }

    #[test]
    fn remembered_state_is_persisted_on_entry() {
        let queue: EventQueue = EventQueue::new();
        let mut fsm = Fsm::new(MemoryStore::new(), &queue);
        let mut board = TestBoard::new();

        fsm.transition(BadgeState::next(StateId::AnimateSnake), &mut board, 0);
        assert_eq!(fsm.globals().resume_state_idx, StateId::AnimateSnake as u8);
        assert_eq!(fsm.store().peek("fsm", "resumeStateIdx"), Some(3));

        fsm.transition(BadgeState::next(StateId::MenuMain), &mut board, 0);
        assert_eq!(fsm.store().commits, 1);
        assert_eq!(fsm.globals().resume_state_idx, StateId::AnimateSnake as u8);
    }

    #[test]
    fn run_respects_tick_rate() {
        let queue: EventQueue = EventQueue::new();
        let mut fsm = Fsm::new(MemoryStore::new(), &queue);
        let mut board = TestBoard::new();
        fsm.transition(BadgeState::next(StateId::AnimateMatrix), &mut board, 0);

        let shows = |board: &TestBoard| board.leds.shows;
        fsm.handle_all(&mut board, 0);
        let after_first = shows(&board);
        fsm.handle_all(&mut board, 50);
        assert_eq!(shows(&board), after_first);
        fsm.handle_all(&mut board, 100);
        assert_eq!(shows(&board), after_first + 1);
    }

    #[test]
    fn dirty_globals_are_flushed_by_handle() {
        let queue: EventQueue = EventQueue::new();
        let mut fsm = Fsm::new(MemoryStore::new(), &queue);
        let mut board = TestBoard::new();
        fsm.transition(BadgeState::next(StateId::AnimateRainbow), &mut board, 0);
        let commits = fsm.store().commits;

        fsm.queue_event(FsmEvent::FingerprintRelease);
        fsm.handle_all(&mut board, 0);
        assert!(fsm.is_globals_dirty());
        assert_eq!(fsm.store().commits, commits);

        fsm.handle_all(&mut board, 10);
        assert!(!fsm.is_globals_dirty());
        assert_eq!(fsm.store().commits, commits + 1);
        assert_eq!(fsm.store().peek("fsm", "animRainbow"), Some(1));
    }

    #[test]
    fn event_budget_is_honored() {
        let queue: EventQueue = EventQueue::new();
        let mut fsm = Fsm::new(MemoryStore::new(), &queue);
        let mut board = TestBoard::new();
        fsm.transition(BadgeState::next(StateId::MenuMain), &mut board, 0);

        for _ in 0..3 {
            fsm.queue_event(FsmEvent::FingerprintRelease);
        }
        fsm.handle(&mut board, 0, 2);
        assert_eq!(fsm.globals().menu_main_pointer_idx, 2);
        assert_eq!(fsm.queue_size(), 1);
    }
}
