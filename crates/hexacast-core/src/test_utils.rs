//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use std::collections::VecDeque;
use std::f32::consts::PI;
use std::time::Duration;

use glam::{Quat, Vec3};
use slotmap::SlotMap;

use crate::config::SettleConfig;
use crate::line::{COINS_PER_THROW, LINES_PER_FIGURE, Line, LineValue};
use crate::physics::{BodyId, PhysicsWorld, SteppedWorld};
use crate::session::{DivinationSession, LineReport};

// ===========================================================================
// Orientations
// ===========================================================================

/// Marked face up.
pub fn heads() -> Quat {
    Quat::IDENTITY
}

/// Marked face down.
pub fn tails() -> Quat {
    Quat::from_rotation_x(PI)
}

/// Orientations that resolve to `value` (6..=9): the first `value - 6`
/// bodies land heads.
pub fn orientations_for(value: u8) -> [Quat; COINS_PER_THROW] {
    let marked = usize::from(value.saturating_sub(6));
    std::array::from_fn(|i| if i < marked { heads() } else { tails() })
}

// ===========================================================================
// Lines
// ===========================================================================

pub fn line(value: u8) -> Line {
    Line::new(LineValue::try_from(value).expect("line value must be 6..=9"))
}

pub fn lines(values: [u8; LINES_PER_FIGURE]) -> [Line; LINES_PER_FIGURE] {
    values.map(line)
}

// ===========================================================================
// Config
// ===========================================================================

/// Short timings and a fixed seed: grace 100ms, max wait 1000ms.
pub fn fast_config() -> SettleConfig {
    SettleConfig {
        grace_ms: 100,
        max_wait_ms: 1_000,
        seed: Some(0xC0FFEE),
        ..SettleConfig::default()
    }
}

// ===========================================================================
// ScriptedWorld
// ===========================================================================

/// Step count meaning "never comes to rest".
pub const NEVER: u32 = u32::MAX;

#[derive(Debug, Clone)]
struct ScriptedCoin {
    orientation: Quat,
    /// Steps until rest. Zero is at rest; [`NEVER`] never counts down.
    steps_to_rest: u32,
    impulses: u32,
    last_impulse: Vec3,
}

#[derive(Debug, Clone, Copy)]
struct ThrowScript {
    orientations: [Quat; COINS_PER_THROW],
    rest_after: [u32; COINS_PER_THROW],
}

/// A physics world with no physics. Each throw lands on orientations queued
/// with [`ScriptedWorld::script_throw`], and each body rests after a
/// scripted number of [`ScriptedWorld::advance`] steps. Every
/// [`SteppedWorld::step`] is one advance, whatever its length.
///
/// A script is taken from the queue when the first body is pushed. With no
/// script queued, bodies keep their orientation and rest at once.
#[derive(Debug, Clone)]
pub struct ScriptedWorld {
    coins: SlotMap<BodyId, ScriptedCoin>,
    order: [BodyId; COINS_PER_THROW],
    scripts: VecDeque<ThrowScript>,
    active: Option<ThrowScript>,
}

impl Default for ScriptedWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedWorld {
    /// Three bodies, heads up, at rest.
    pub fn new() -> Self {
        let mut coins = SlotMap::with_key();
        let order = std::array::from_fn(|_| {
            coins.insert(ScriptedCoin {
                orientation: heads(),
                steps_to_rest: 0,
                impulses: 0,
                last_impulse: Vec3::ZERO,
            })
        });
        Self {
            coins,
            order,
            scripts: VecDeque::new(),
            active: None,
        }
    }

    pub fn bodies(&self) -> [BodyId; COINS_PER_THROW] {
        self.order
    }

    /// Queue the outcome of the next unscripted throw.
    pub fn script_throw(
        &mut self,
        orientations: [Quat; COINS_PER_THROW],
        rest_after: [u32; COINS_PER_THROW],
    ) {
        self.scripts.push_back(ThrowScript {
            orientations,
            rest_after,
        });
    }

    /// Queue a throw that lands on `value`, every body resting after `steps`.
    pub fn script_line(&mut self, value: u8, steps: u32) {
        self.script_throw(orientations_for(value), [steps; COINS_PER_THROW]);
    }

    /// One physics step.
    pub fn advance(&mut self) {
        for coin in self.coins.values_mut() {
            if coin.steps_to_rest != NEVER {
                coin.steps_to_rest = coin.steps_to_rest.saturating_sub(1);
            }
        }
    }

    /// Knock a body back into motion until [`ScriptedWorld::rest`].
    pub fn wake(&mut self, body: BodyId) {
        if let Some(coin) = self.coins.get_mut(body) {
            coin.steps_to_rest = NEVER;
        }
    }

    pub fn rest(&mut self, body: BodyId) {
        if let Some(coin) = self.coins.get_mut(body) {
            coin.steps_to_rest = 0;
        }
    }

    pub fn set_orientation(&mut self, body: BodyId, orientation: Quat) {
        if let Some(coin) = self.coins.get_mut(body) {
            coin.orientation = orientation;
        }
    }

    pub fn impulse_count(&self, body: BodyId) -> u32 {
        self.coins.get(body).map_or(0, |c| c.impulses)
    }

    pub fn last_impulse(&self, body: BodyId) -> Vec3 {
        self.coins.get(body).map_or(Vec3::ZERO, |c| c.last_impulse)
    }
}

impl PhysicsWorld for ScriptedWorld {
    fn apply_impulse_and_torque(&mut self, body: BodyId, impulse: Vec3, _torque: Vec3) {
        let Some(index) = self.order.iter().position(|&b| b == body) else {
            return;
        };
        if index == 0 {
            self.active = self.scripts.pop_front();
        }
        let script = self.active;
        let Some(coin) = self.coins.get_mut(body) else {
            return;
        };
        coin.impulses += 1;
        coin.last_impulse = impulse;
        match script {
            Some(s) => {
                coin.orientation = s.orientations[index];
                coin.steps_to_rest = s.rest_after[index];
            }
            None => coin.steps_to_rest = 0,
        }
    }

    fn is_at_rest(&self, body: BodyId) -> bool {
        self.coins.get(body).is_some_and(|c| c.steps_to_rest == 0)
    }

    fn orientation(&self, body: BodyId) -> Quat {
        self.coins.get(body).map_or(Quat::IDENTITY, |c| c.orientation)
    }
}

impl SteppedWorld for ScriptedWorld {
    fn step(&mut self, _dt: Duration) {
        self.advance();
    }
}

// ===========================================================================
// Session drivers
// ===========================================================================

/// Step and poll until the pending throw yields a line.
pub fn run_until_line(
    session: &mut DivinationSession<ScriptedWorld>,
    dt: Duration,
) -> LineReport {
    for _ in 0..10_000 {
        session.step_world(dt);
        if let Some(report) = session.update(dt).expect("settle failed") {
            return report;
        }
    }
    panic!("throw never produced a line");
}

/// Throw the rest of a figure, landing each line on the given value.
pub fn throw_figure(
    session: &mut DivinationSession<ScriptedWorld>,
    values: [u8; LINES_PER_FIGURE],
    dt: Duration,
) -> Vec<LineReport> {
    values
        .into_iter()
        .map(|value| {
            session
                .world_mut()
                .expect("world reserved between throws")
                .script_line(value, 1);
            session.throw_next().expect("throw rejected");
            run_until_line(session, dt)
        })
        .collect()
}
