use super::{compose, BadgeState, Context, State, StateId, Transition};
use crate::board::{Board, Millis, Radio};
use crate::led::{hsv, LedStrip, BAR_LED_COUNT, BLACK, DRAGON_LED_COUNT, RGB8};

/// Hues the players can pick from
const HUES: [u8; 11] = [1, 24, 47, 72, 96, 116, 140, 164, 186, 210, 232];
const HUE_COUNT: usize = HUES.len();
/// Interval between two broadcasts of the local consensus
const BROADCAST_INTERVAL_MS: Millis = 1_500;
/// Highest vote count a single hue can reach
const MAX_VOTES: u8 = 32;
/// Runs the dragon head keeps spinning after a vote
const SPIN_RUNS: u8 = 12;

/// Votes per hue, shared with the other badges in range
pub type Consensus = [u8; HUE_COUNT];

/// Averages a received consensus into the local one
fn merge(local: &mut Consensus, remote: &[u8]) {
    for (own, other) in local.iter_mut().zip(remote) {
        *own = ((u16::from(*own) + u16::from(*other)) / 2) as u8;
    }
}

/// Splits the bar between the hues in proportion to their votes
fn render_bar(consensus: &Consensus) -> [RGB8; BAR_LED_COUNT] {
    let last = hsv(HUES[HUE_COUNT - 1], 255, 255);
    let mut bar = [last; BAR_LED_COUNT];
    let total: u32 = consensus.iter().map(|votes| u32::from(*votes)).sum();
    if total == 0 {
        return bar;
    }

    let mut pixels = bar.iter_mut();
    for (hue, votes) in HUES.iter().zip(consensus) {
        let share = u32::from(*votes) * BAR_LED_COUNT as u32 / total;
        for pixel in pixels.by_ref().take(share as usize) {
            *pixel = hsv(*hue, 255, 255);
        }
    }
    bar
}

/// Mesh mini game: badges in range vote on a common hue.
///
/// A nose release votes for the own hue, a fingerprint release picks another own hue.
/// The bar shows the current consensus of all badges in range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameHuemesh {
    tick: u32,
    consensus: Consensus,
    last_broadcast: Option<Millis>,
    spin_runs: u8,
}

impl Default for GameHuemesh {
    fn default() -> Self {
        Self {
            tick: 0,
            consensus: [1; HUE_COUNT],
            last_broadcast: None,
            spin_runs: 0,
        }
    }
}

impl GameHuemesh {
    pub fn consensus(&self) -> &Consensus {
        &self.consensus
    }

    fn own_hue_idx(ctx: &Context<'_, impl Board>) -> usize {
        usize::from(ctx.globals.huemesh_own_hue) % HUE_COUNT
    }

    fn exchange<B: Board>(&mut self, ctx: &mut Context<'_, B>) {
        let mut buffer = [0u8; HUE_COUNT];
        while let Some(len) = ctx.board.radio().mesh_receive(&mut buffer) {
            if len != HUE_COUNT {
                warn!("huemesh: dropping payload of {} bytes", len);
                continue;
            }
            merge(&mut self.consensus, &buffer);
        }

        let due = match self.last_broadcast {
            Some(last) => ctx.now.saturating_sub(last) >= BROADCAST_INTERVAL_MS,
            None => true,
        };
        if due {
            ctx.board.radio().mesh_broadcast(&self.consensus);
            self.last_broadcast = Some(ctx.now);
        }
    }
}

impl State for GameHuemesh {
    fn name(&self) -> &'static str {
        "GameHuemesh"
    }

    fn id(&self) -> StateId {
        StateId::GameHuemesh
    }

    fn should_be_remembered(&self) -> bool {
        true
    }

    fn entry<B: Board>(&mut self, ctx: &mut Context<'_, B>) {
        *self = Self::default();
        ctx.leds().clear();
    }

    fn run<B: Board>(&mut self, ctx: &mut Context<'_, B>) {
        self.exchange(ctx);

        let hue = HUES[Self::own_hue_idx(ctx)];
        let shade = |val: u8| hsv(hue, 255, val);
        let dragon = if self.spin_runs < SPIN_RUNS {
            self.spin_runs += 1;
            let mut dragon = [shade(255), shade(169), shade(124), shade(100), BLACK, BLACK];
            dragon.rotate_left(self.tick as usize % DRAGON_LED_COUNT);
            dragon
        } else {
            [shade(255), shade(100), shade(255), BLACK, BLACK, BLACK]
        };

        ctx.leds().set_all(&compose(&dragon, &render_bar(&self.consensus)));
        self.tick = self.tick.wrapping_add(1);
    }

    fn exit<B: Board>(&mut self, ctx: &mut Context<'_, B>) {
        ctx.leds().clear();
    }

    fn on_fingerprint_longpress<B: Board>(&mut self, _ctx: &mut Context<'_, B>) -> Transition {
        BadgeState::next(StateId::MenuMain)
    }

    fn on_fingerprint_release<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        if ctx.is_locked() {
            return None;
        }
        ctx.globals.huemesh_own_hue = ((Self::own_hue_idx(ctx) + 1) % HUE_COUNT) as u8;
        ctx.mark_globals_dirty();
        self.tick = 0;
        info!("huemesh: own hue is now {}", ctx.globals.huemesh_own_hue);
        None
    }

    fn on_nose_release<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        let own = Self::own_hue_idx(ctx);
        for (idx, votes) in self.consensus.iter_mut().enumerate() {
            if idx == own {
                *votes = votes.saturating_add(1).min(MAX_VOTES);
            } else {
                *votes = votes.saturating_sub(1);
            }
        }
        self.spin_runs = 0;
        None
    }

    fn on_all_longpress<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        ctx.toggle_lock();
        None
    }
}
