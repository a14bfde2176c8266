//! Badge Modes
//!
//! Every mode of the badge implements [`State`]. The state machine owns exactly one
//! [`BadgeState`] at a time and replaces it wholesale on a transition.
//!
//! # Lifecycle
//! 1. `entry()` once after the mode became current
//! 2. `run()` repeatedly at the mode's tick rate
//! 3. event handlers whenever a queued event is dispatched
//! 4. `exit()` once before the next mode's `entry()`
//!
//! Handlers return the mode to switch to, or `None` to stay. All defaults are no-ops.

use crate::board::{Board, Millis};
use crate::event::FsmEvent;
use crate::globals::Globals;
use crate::led::{Frame, LedStrip, BAR_LED_COUNT, BLACK, DRAGON_LED_COUNT, LED_COUNT, RED, RGB8};

mod heartbeat;
mod huemesh;
mod matrix;
mod menu;
mod ota;
mod perlin;
mod pride_flag;
mod rainbow;
mod snake;
mod vu_meter;

pub use heartbeat::AnimateHeartbeat;
pub use huemesh::GameHuemesh;
pub use matrix::AnimateMatrix;
pub use menu::{MenuMain, MENU_ITEMS};
pub use ota::OtaUpdate;
pub use perlin::AnimatePerlin;
pub use pride_flag::DisplayPrideFlag;
pub use rainbow::AnimateRainbow;
pub use snake::AnimateSnake;
pub use vu_meter::VuMeter;

/// Result of an event handler: the next mode, or `None` to stay
pub type Transition = Option<BadgeState>;

/// Stable identifiers of the badge modes, used to persist the mode to resume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StateId {
    DisplayPrideFlag = 0,
    AnimateRainbow = 1,
    AnimateMatrix = 2,
    AnimateSnake = 3,
    AnimateHeartbeat = 4,
    AnimatePerlin = 5,
    VuMeter = 6,
    GameHuemesh = 7,
    MenuMain = 8,
    OtaUpdate = 9,
}

impl StateId {
    /// Modes the badge may resume after a reboot
    pub const RESUMABLE: [StateId; 8] = [
        StateId::DisplayPrideFlag,
        StateId::AnimateRainbow,
        StateId::AnimateMatrix,
        StateId::AnimateSnake,
        StateId::AnimateHeartbeat,
        StateId::AnimatePerlin,
        StateId::VuMeter,
        StateId::GameHuemesh,
    ];

    /// Looks up a resumable mode by its persisted id
    pub fn resumable(id: u8) -> Option<StateId> {
        Self::RESUMABLE.into_iter().find(|state| *state as u8 == id)
    }
}

/// What a mode gets to work with during a call
pub struct Context<'a, B: Board> {
    pub globals: &'a mut Globals,
    pub board: &'a mut B,
    /// Time of the current `handle()` call
    pub now: Millis,
    dirty: &'a mut bool,
}

impl<'a, B: Board> Context<'a, B> {
    pub fn new(globals: &'a mut Globals, dirty: &'a mut bool, board: &'a mut B, now: Millis) -> Self {
        Self {
            globals,
            board,
            now,
            dirty,
        }
    }

    /// Flags the globals for persisting
    pub fn mark_globals_dirty(&mut self) {
        *self.dirty = true;
    }

    pub fn is_globals_dirty(&self) -> bool {
        *self.dirty
    }

    pub fn leds(&mut self) -> &mut B::Leds {
        self.board.leds()
    }

    pub fn is_locked(&self) -> bool {
        self.globals.locked
    }

    /// Toggles the touch lock of the display modes
    pub fn toggle_lock(&mut self) {
        self.globals.locked = !self.globals.locked;
        self.mark_globals_dirty();
        info!("state: touch lock {}", if self.globals.locked { "on" } else { "off" });
    }
}

/// Behavior of a badge mode
pub trait State {
    fn name(&self) -> &'static str;

    fn id(&self) -> StateId;

    /// Whether the badge should come back to this mode after a reboot
    fn should_be_remembered(&self) -> bool {
        false
    }

    /// Interval between two `run()` calls, 0 to run at the state machine's tick rate
    fn tick_rate_ms(&self, _globals: &Globals) -> u32 {
        0
    }

    fn entry<B: Board>(&mut self, _ctx: &mut Context<'_, B>) {}

    fn run<B: Board>(&mut self, _ctx: &mut Context<'_, B>) {}

    fn exit<B: Board>(&mut self, _ctx: &mut Context<'_, B>) {}

    fn on_fingerprint_touch<B: Board>(&mut self, _ctx: &mut Context<'_, B>) -> Transition {
        None
    }

    fn on_fingerprint_release<B: Board>(&mut self, _ctx: &mut Context<'_, B>) -> Transition {
        None
    }

    fn on_fingerprint_shortpress<B: Board>(&mut self, _ctx: &mut Context<'_, B>) -> Transition {
        None
    }

    fn on_fingerprint_longpress<B: Board>(&mut self, _ctx: &mut Context<'_, B>) -> Transition {
        None
    }

    fn on_nose_touch<B: Board>(&mut self, _ctx: &mut Context<'_, B>) -> Transition {
        None
    }

    fn on_nose_release<B: Board>(&mut self, _ctx: &mut Context<'_, B>) -> Transition {
        None
    }

    fn on_nose_shortpress<B: Board>(&mut self, _ctx: &mut Context<'_, B>) -> Transition {
        None
    }

    fn on_nose_longpress<B: Board>(&mut self, _ctx: &mut Context<'_, B>) -> Transition {
        None
    }

    fn on_all_shortpress<B: Board>(&mut self, _ctx: &mut Context<'_, B>) -> Transition {
        None
    }

    fn on_all_longpress<B: Board>(&mut self, _ctx: &mut Context<'_, B>) -> Transition {
        None
    }

    /// Routes an event to its handler
    fn handle_event<B: Board>(&mut self, event: FsmEvent, ctx: &mut Context<'_, B>) -> Transition {
        match event {
            FsmEvent::NoOp => None,
            FsmEvent::FingerprintTouch => self.on_fingerprint_touch(ctx),
            FsmEvent::FingerprintRelease => self.on_fingerprint_release(ctx),
            FsmEvent::FingerprintShortpress => self.on_fingerprint_shortpress(ctx),
            FsmEvent::FingerprintLongpress => self.on_fingerprint_longpress(ctx),
            FsmEvent::NoseTouch => self.on_nose_touch(ctx),
            FsmEvent::NoseRelease => self.on_nose_release(ctx),
            FsmEvent::NoseShortpress => self.on_nose_shortpress(ctx),
            FsmEvent::NoseLongpress => self.on_nose_longpress(ctx),
            FsmEvent::AllShortpress => self.on_all_shortpress(ctx),
            FsmEvent::AllLongpress => self.on_all_longpress(ctx),
        }
    }
}

/// The closed set of badge modes
#[derive(Debug, Clone, PartialEq)]
pub enum BadgeState {
    DisplayPrideFlag(DisplayPrideFlag),
    AnimateRainbow(AnimateRainbow),
    AnimateMatrix(AnimateMatrix),
    AnimateSnake(AnimateSnake),
    AnimateHeartbeat(AnimateHeartbeat),
    AnimatePerlin(AnimatePerlin),
    VuMeter(VuMeter),
    GameHuemesh(GameHuemesh),
    MenuMain(MenuMain),
    OtaUpdate(OtaUpdate),
}

impl BadgeState {
    /// Creates a fresh mode
    pub fn from_id(id: StateId) -> Self {
        match id {
            StateId::DisplayPrideFlag => Self::DisplayPrideFlag(DisplayPrideFlag::default()),
            StateId::AnimateRainbow => Self::AnimateRainbow(AnimateRainbow::default()),
            StateId::AnimateMatrix => Self::AnimateMatrix(AnimateMatrix::default()),
            StateId::AnimateSnake => Self::AnimateSnake(AnimateSnake::default()),
            StateId::AnimateHeartbeat => Self::AnimateHeartbeat(AnimateHeartbeat::default()),
            StateId::AnimatePerlin => Self::AnimatePerlin(AnimatePerlin::default()),
            StateId::VuMeter => Self::VuMeter(VuMeter::default()),
            StateId::GameHuemesh => Self::GameHuemesh(GameHuemesh::default()),
            StateId::MenuMain => Self::MenuMain(MenuMain),
            StateId::OtaUpdate => Self::OtaUpdate(OtaUpdate::default()),
        }
    }

    /// Shorthand for the transition into a fresh mode
    pub fn next(id: StateId) -> Transition {
        Some(Self::from_id(id))
    }
}

/// Forwards a trait method to the wrapped mode
macro_rules! delegate {
    ($self:ident, $state:ident => $call:expr) => {
        match $self {
            BadgeState::DisplayPrideFlag($state) => $call,
            BadgeState::AnimateRainbow($state) => $call,
            BadgeState::AnimateMatrix($state) => $call,
            BadgeState::AnimateSnake($state) => $call,
            BadgeState::AnimateHeartbeat($state) => $call,
            BadgeState::AnimatePerlin($state) => $call,
            BadgeState::VuMeter($state) => $call,
            BadgeState::GameHuemesh($state) => $call,
            BadgeState::MenuMain($state) => $call,
            BadgeState::OtaUpdate($state) => $call,
        }
    };
}

impl State for BadgeState {
    fn name(&self) -> &'static str {
        delegate!(self, s => s.name())
    }

    fn id(&self) -> StateId {
        delegate!(self, s => s.id())
    }

    fn should_be_remembered(&self) -> bool {
        delegate!(self, s => s.should_be_remembered())
    }

    fn tick_rate_ms(&self, globals: &Globals) -> u32 {
        delegate!(self, s => s.tick_rate_ms(globals))
    }

    fn entry<B: Board>(&mut self, ctx: &mut Context<'_, B>) {
        delegate!(self, s => s.entry(ctx))
    }

    fn run<B: Board>(&mut self, ctx: &mut Context<'_, B>) {
        delegate!(self, s => s.run(ctx))
    }

    fn exit<B: Board>(&mut self, ctx: &mut Context<'_, B>) {
        delegate!(self, s => s.exit(ctx))
    }

    fn handle_event<B: Board>(&mut self, event: FsmEvent, ctx: &mut Context<'_, B>) -> Transition {
        delegate!(self, s => s.handle_event(event, ctx))
    }
}

/// Back to the main menu, unless the touch lock is on
pub(crate) fn menu_unless_locked<B: Board>(ctx: &Context<'_, B>) -> Transition {
    if ctx.is_locked() {
        return None;
    }
    BadgeState::next(StateId::MenuMain)
}

/// Joins dragon and bar pixels into one frame
pub(crate) fn compose(dragon: &[RGB8; DRAGON_LED_COUNT], bar: &[RGB8; BAR_LED_COUNT]) -> Frame {
    let mut frame = [BLACK; LED_COUNT];
    frame[..DRAGON_LED_COUNT].copy_from_slice(dragon);
    frame[DRAGON_LED_COUNT..].copy_from_slice(bar);
    frame
}

/// Blinks the first `count` bar pixels to show a speed setting.
///
/// Blocks for a second in total.
pub(crate) fn show_speed_on_bar<B: Board>(ctx: &mut Context<'_, B>, count: u8) {
    let mut bar = [BLACK; BAR_LED_COUNT];
    ctx.leds().set_bar(&bar);
    ctx.board.delay_ms(100);

    let lit = usize::from(count).min(BAR_LED_COUNT);
    for (on, pause) in [(true, 300), (false, 200), (true, 400)] {
        bar[..lit].fill(if on { RED } else { BLACK });
        ctx.leds().set_bar(&bar);
        ctx.board.delay_ms(pause);
    }
}
