//! Drives one throw of three bodies from impulse to a classifiable rest.
//!
//! The coordinator never blocks. The caller steps its physics world and then
//! calls [`SettleCoordinator::poll`] with the elapsed time, on whatever
//! cadence its update loop runs. A throw is read once every body has
//! reported rest, uninterrupted, for the grace duration, or once the maximum
//! wait has passed (a forced settle).
//!
//! Each throw gets a fresh [`ThrowTicket`]. Starting a new throw or
//! cancelling drops the pending wait; a reading is only ever produced for
//! the ticket that is current when it settles.

use std::fmt;
use std::time::Duration;

use crate::config::{ConfigError, SettleConfig};
use crate::line::{COINS_PER_THROW, FaceOutcome};
use crate::orientation::{FaceClassifier, OrientationError};
use crate::physics::{BodyId, PhysicsWorld};
use crate::rng::SimRng;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Identifies one throw. Monotonically increasing per coordinator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ThrowTicket(pub u64);

impl fmt::Display for ThrowTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The classified result of one settled throw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrowReading {
    pub ticket: ThrowTicket,
    /// One outcome per body, in body order.
    pub outcomes: [FaceOutcome; COINS_PER_THROW],
    /// Set when the maximum wait expired before every body came to rest.
    pub forced: bool,
    /// Time from the impulse to the reading.
    pub elapsed: Duration,
}

/// Result of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlePoll {
    /// No throw in flight.
    Idle,
    /// Still waiting.
    Pending {
        ticket: ThrowTicket,
        elapsed: Duration,
        resting: usize,
    },
    /// The throw is over and has been classified.
    Settled(ThrowReading),
}

/// A settle that could not be classified.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SettleError {
    #[error("body {index} of throw {ticket} has an unusable orientation: {source}")]
    Orientation {
        ticket: ThrowTicket,
        index: usize,
        body: BodyId,
        #[source]
        source: OrientationError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    AwaitingSettle {
        ticket: ThrowTicket,
        elapsed: Duration,
        /// How long every body has continuously been at rest.
        rest_streak: Duration,
    },
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Owns the bodies of a throw for as long as the throw is in flight.
#[derive(Debug, Clone)]
pub struct SettleCoordinator {
    bodies: [BodyId; COINS_PER_THROW],
    config: SettleConfig,
    classifier: FaceClassifier,
    phase: Phase,
    next_ticket: u64,
}

impl SettleCoordinator {
    /// Create a coordinator for the given bodies. Fails if the config does
    /// not validate.
    pub fn new(
        bodies: [BodyId; COINS_PER_THROW],
        config: SettleConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let classifier = config.classifier()?;
        Ok(Self {
            bodies,
            config,
            classifier,
            phase: Phase::Idle,
            next_ticket: 0,
        })
    }

    pub fn bodies(&self) -> &[BodyId; COINS_PER_THROW] {
        &self.bodies
    }

    pub fn config(&self) -> &SettleConfig {
        &self.config
    }

    /// Whether a throw is waiting to settle.
    pub fn is_awaiting(&self) -> bool {
        matches!(self.phase, Phase::AwaitingSettle { .. })
    }

    /// The in-flight ticket, if any.
    pub fn pending_ticket(&self) -> Option<ThrowTicket> {
        match self.phase {
            Phase::AwaitingSettle { ticket, .. } => Some(ticket),
            Phase::Idle => None,
        }
    }

    /// Push every body and start waiting. Any throw still in flight is
    /// superseded and its result will never be produced.
    pub fn begin_throw<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        rng: &mut SimRng,
    ) -> ThrowTicket {
        if let Some(old) = self.cancel() {
            tracing::debug!(superseded = %old, "new throw supersedes pending settle");
        }

        self.next_ticket += 1;
        let ticket = ThrowTicket(self.next_ticket);

        for &body in &self.bodies {
            let (impulse, torque) = self.config.impulse.sample(rng, self.config.world_up);
            world.apply_impulse_and_torque(body, impulse, torque);
        }

        self.phase = Phase::AwaitingSettle {
            ticket,
            elapsed: Duration::ZERO,
            rest_streak: Duration::ZERO,
        };
        tracing::debug!(%ticket, "throw started");
        ticket
    }

    /// Drop the in-flight throw, if any. Returns its ticket.
    pub fn cancel(&mut self) -> Option<ThrowTicket> {
        let pending = self.pending_ticket();
        self.phase = Phase::Idle;
        pending
    }

    /// Advance the wait by `dt` and check the bodies.
    ///
    /// On settle (or timeout) every orientation is classified and the
    /// coordinator returns to idle. An orientation the classifier rejects
    /// also ends the throw, with an error.
    pub fn poll<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &W,
        dt: Duration,
    ) -> Result<SettlePoll, SettleError> {
        let Phase::AwaitingSettle {
            ticket,
            elapsed,
            rest_streak,
        } = self.phase
        else {
            return Ok(SettlePoll::Idle);
        };

        let elapsed = elapsed.saturating_add(dt);
        let resting = self
            .bodies
            .iter()
            .filter(|&&body| world.is_at_rest(body))
            .count();
        let rest_streak = if resting == COINS_PER_THROW {
            rest_streak.saturating_add(dt)
        } else {
            Duration::ZERO
        };

        let settled = resting == COINS_PER_THROW && rest_streak >= self.config.grace();
        let timed_out = elapsed >= self.config.max_wait();

        if !settled && !timed_out {
            self.phase = Phase::AwaitingSettle {
                ticket,
                elapsed,
                rest_streak,
            };
            return Ok(SettlePoll::Pending {
                ticket,
                elapsed,
                resting,
            });
        }

        self.phase = Phase::Idle;
        let forced = !settled;
        if forced {
            tracing::warn!(
                %ticket,
                elapsed_ms = elapsed.as_millis() as u64,
                resting,
                "settle timed out, reading orientations as they are"
            );
        }

        let outcomes = self.read_outcomes(world, ticket)?;
        Ok(SettlePoll::Settled(ThrowReading {
            ticket,
            outcomes,
            forced,
            elapsed,
        }))
    }

    fn read_outcomes<W: PhysicsWorld + ?Sized>(
        &self,
        world: &W,
        ticket: ThrowTicket,
    ) -> Result<[FaceOutcome; COINS_PER_THROW], SettleError> {
        let mut outcomes = [FaceOutcome::OtherFaceUp; COINS_PER_THROW];
        for (index, (&body, slot)) in self.bodies.iter().zip(outcomes.iter_mut()).enumerate() {
            *slot = self
                .classifier
                .classify(world.orientation(body))
                .map_err(|source| SettleError::Orientation {
                    ticket,
                    index,
                    body,
                    source,
                })?;
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use glam::Quat;

    const FRAME: Duration = Duration::from_millis(50);

    fn coordinator(world: &ScriptedWorld) -> SettleCoordinator {
        SettleCoordinator::new(world.bodies(), fast_config()).unwrap()
    }

    #[test]
    fn idle_poll_is_idle() {
        let world = ScriptedWorld::new();
        let mut c = coordinator(&world);
        assert_eq!(c.poll(&world, FRAME), Ok(SettlePoll::Idle));
    }

    #[test]
    fn begin_throw_pushes_every_body() {
        let mut world = ScriptedWorld::new();
        let mut c = coordinator(&world);
        let mut rng = SimRng::new(1);
        c.begin_throw(&mut world, &mut rng);
        for body in world.bodies() {
            assert_eq!(world.impulse_count(body), 1);
        }
        assert!(c.is_awaiting());
    }

    #[test]
    fn waits_for_all_bodies() {
        let mut world = ScriptedWorld::new();
        world.script_throw([heads(), heads(), tails()], [1, 1, 10]);
        let mut c = coordinator(&world);
        let mut rng = SimRng::new(1);
        let ticket = c.begin_throw(&mut world, &mut rng);

        // Two of three at rest is not enough.
        world.advance();
        let poll = c.poll(&world, FRAME).unwrap();
        assert!(matches!(poll, SettlePoll::Pending { resting: 2, .. }));
        assert_eq!(c.pending_ticket(), Some(ticket));
    }

    #[test]
    fn settles_after_grace() {
        let mut world = ScriptedWorld::new();
        world.script_throw([heads(), heads(), tails()], [0, 0, 0]);
        let mut c = coordinator(&world);
        let mut rng = SimRng::new(1);
        let ticket = c.begin_throw(&mut world, &mut rng);

        // fast_config grace is 100ms: two frames of 50ms.
        assert!(matches!(
            c.poll(&world, FRAME).unwrap(),
            SettlePoll::Pending { .. }
        ));
        let reading = match c.poll(&world, FRAME).unwrap() {
            SettlePoll::Settled(r) => r,
            other => panic!("expected settle, got {other:?}"),
        };
        assert_eq!(reading.ticket, ticket);
        assert!(!reading.forced);
        assert_eq!(
            reading.outcomes,
            [
                FaceOutcome::MarkedFaceUp,
                FaceOutcome::MarkedFaceUp,
                FaceOutcome::OtherFaceUp
            ]
        );
        assert!(!c.is_awaiting());
    }

    #[test]
    fn movement_resets_grace() {
        let mut world = ScriptedWorld::new();
        world.script_throw([heads(), heads(), heads()], [0, 0, 0]);
        let mut c = coordinator(&world);
        let mut rng = SimRng::new(1);
        c.begin_throw(&mut world, &mut rng);

        c.poll(&world, FRAME).unwrap();
        world.wake(world.bodies()[1]);
        assert!(matches!(
            c.poll(&world, FRAME).unwrap(),
            SettlePoll::Pending { resting: 2, .. }
        ));
        world.rest(world.bodies()[1]);
        assert!(matches!(
            c.poll(&world, FRAME).unwrap(),
            SettlePoll::Pending { .. }
        ));
        assert!(matches!(
            c.poll(&world, FRAME).unwrap(),
            SettlePoll::Settled(_)
        ));
    }

    #[test]
    fn timeout_forces_a_reading() {
        let mut world = ScriptedWorld::new();
        // Third body never rests.
        world.script_throw([heads(), tails(), tails()], [0, 0, NEVER]);
        let mut c = coordinator(&world);
        let mut rng = SimRng::new(1);
        c.begin_throw(&mut world, &mut rng);

        let mut polls = 0;
        let reading = loop {
            world.advance();
            polls += 1;
            match c.poll(&world, FRAME).unwrap() {
                SettlePoll::Settled(r) => break r,
                SettlePoll::Pending { .. } => assert!(polls < 1000, "never timed out"),
                SettlePoll::Idle => panic!("lost the throw"),
            }
        };
        assert!(reading.forced);
        assert!(reading.elapsed >= fast_config().max_wait());
        assert_eq!(
            reading.outcomes,
            [
                FaceOutcome::MarkedFaceUp,
                FaceOutcome::OtherFaceUp,
                FaceOutcome::OtherFaceUp
            ]
        );
    }

    #[test]
    fn new_throw_supersedes_pending() {
        let mut world = ScriptedWorld::new();
        let mut c = coordinator(&world);
        let mut rng = SimRng::new(1);
        let first = c.begin_throw(&mut world, &mut rng);
        let second = c.begin_throw(&mut world, &mut rng);
        assert_ne!(first, second);
        assert_eq!(c.pending_ticket(), Some(second));
    }

    #[test]
    fn cancel_discards_pending() {
        let mut world = ScriptedWorld::new();
        world.script_throw([heads(), heads(), heads()], [0, 0, 0]);
        let mut c = coordinator(&world);
        let mut rng = SimRng::new(1);
        let ticket = c.begin_throw(&mut world, &mut rng);
        assert_eq!(c.cancel(), Some(ticket));
        assert_eq!(c.poll(&world, FRAME * 10), Ok(SettlePoll::Idle));
        assert_eq!(c.cancel(), None);
    }

    #[test]
    fn malformed_orientation_is_an_error() {
        let mut world = ScriptedWorld::new();
        world.script_throw(
            [heads(), Quat::from_xyzw(0.0, 0.0, 0.0, 3.0), heads()],
            [0, 0, 0],
        );
        let mut config = fast_config();
        config.grace_ms = 0;
        let mut c = SettleCoordinator::new(world.bodies(), config).unwrap();
        let mut rng = SimRng::new(1);
        c.begin_throw(&mut world, &mut rng);
        let err = c.poll(&world, FRAME).unwrap_err();
        assert!(matches!(err, SettleError::Orientation { index: 1, .. }));
        assert!(!c.is_awaiting());
    }

    #[test]
    fn rejects_unvalidated_config() {
        let world = ScriptedWorld::new();
        let flat = SettleConfig {
            marked_axis: glam::Vec3::ZERO,
            ..fast_config()
        };
        assert_eq!(
            SettleCoordinator::new(world.bodies(), flat).unwrap_err(),
            ConfigError::DegenerateAxis {
                name: "marked_axis"
            }
        );

        let no_wait = SettleConfig {
            max_wait_ms: 0,
            ..fast_config()
        };
        assert_eq!(
            SettleCoordinator::new(world.bodies(), no_wait).unwrap_err(),
            ConfigError::ZeroMaxWait
        );
    }

    #[test]
    fn huge_step_times_out_without_overflow() {
        let mut world = ScriptedWorld::new();
        world.script_throw([heads(), heads(), tails()], [0, 0, NEVER]);
        let mut c = coordinator(&world);
        let mut rng = SimRng::new(1);
        c.begin_throw(&mut world, &mut rng);

        assert!(matches!(
            c.poll(&world, FRAME).unwrap(),
            SettlePoll::Pending { .. }
        ));
        let reading = match c.poll(&world, Duration::MAX).unwrap() {
            SettlePoll::Settled(r) => r,
            other => panic!("expected forced settle, got {other:?}"),
        };
        assert!(reading.forced);
        assert_eq!(reading.elapsed, Duration::MAX);
    }
}
