//! A divination session: six throws, one figure.
//!
//! # State machine
//!
//! ```text
//! Idle --throw_next--> Throwing --update--> AwaitingSettle --update--> LineResolved
//!                                                                |           |
//!                                                     (6th line) v     throw_next
//!                                                            Complete
//! ```
//!
//! `start_new_figure` returns to `Idle` from any state, cancelling a throw
//! in flight. `throw_next` while a throw is in flight supersedes it.
//! `throw_next` on a complete figure is rejected and changes nothing.
//!
//! The session owns its physics world. While bodies are in flight it
//! refuses mutable access to the world, so nothing else can disturb a throw
//! it is waiting on. A world that implements [`SteppedWorld`] can still be
//! advanced through [`DivinationSession::step_world`].

use std::time::Duration;

use crate::config::{ConfigError, SettleConfig};
use crate::event::{DivinationEvent, EventLog};
use crate::figure::{FigureError, HexagramFigure};
use crate::line::{self, COINS_PER_THROW, FaceOutcome, Line, LinePosition};
use crate::physics::{BodyId, PhysicsWorld, SteppedWorld};
use crate::record::ReadingRecord;
use crate::rng::SimRng;
use crate::settle::{SettleCoordinator, SettleError, SettlePoll, ThrowReading, ThrowTicket};
use crate::transform::ResolvedResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SessionPhase {
    /// Empty figure, nothing thrown yet.
    Idle,
    /// Impulses applied, not yet polled.
    Throwing,
    /// Waiting for the bodies to come to rest.
    AwaitingSettle,
    /// The last throw produced a line; ready for the next throw.
    LineResolved,
    /// Six lines recorded; the result is available.
    Complete,
}

/// Snapshot of a session for callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub lines: Vec<Line>,
    pub is_complete: bool,
    pub is_throwing: bool,
    pub phase: SessionPhase,
}

/// One completed throw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineReport {
    pub ticket: ThrowTicket,
    pub position: LinePosition,
    pub line: Line,
    pub outcomes: [FaceOutcome; COINS_PER_THROW],
    /// The settle timed out and the orientations were read anyway.
    pub forced: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("the figure already has six lines; start a new figure first")]
    FigureComplete,

    #[error("bodies are in flight; the physics world is reserved until the throw settles")]
    BodiesInFlight,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Settle(#[from] SettleError),

    #[error(transparent)]
    Figure(#[from] FigureError),
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct DivinationSession<W> {
    world: W,
    coordinator: SettleCoordinator,
    figure: HexagramFigure,
    /// Forced-settle flag per recorded line.
    forced: Vec<bool>,
    rng: SimRng,
    phase: SessionPhase,
    pending: Option<ThrowTicket>,
    result: Option<ResolvedResult>,
    events: EventLog,
}

impl<W: PhysicsWorld> DivinationSession<W> {
    /// Create a session over `world`, tossing `bodies`. The config is
    /// validated here.
    pub fn new(
        world: W,
        bodies: [BodyId; COINS_PER_THROW],
        config: SettleConfig,
    ) -> Result<Self, SessionError> {
        let rng = config.rng();
        Ok(Self {
            world,
            coordinator: SettleCoordinator::new(bodies, config)?,
            figure: HexagramFigure::new(),
            forced: Vec::new(),
            rng,
            phase: SessionPhase::Idle,
            pending: None,
            result: None,
            events: EventLog::default(),
        })
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Discard the current figure and any throw in flight.
    pub fn start_new_figure(&mut self) {
        if let Some(ticket) = self.coordinator.cancel() {
            self.events.record(DivinationEvent::ThrowCancelled { ticket });
        }
        self.pending = None;
        self.figure.reset();
        self.forced.clear();
        self.result = None;
        self.phase = SessionPhase::Idle;
        self.events.record(DivinationEvent::FigureStarted);
        tracing::debug!("new figure started");
    }

    /// Throw the coins for the next line.
    pub fn throw_next(&mut self) -> Result<ThrowTicket, SessionError> {
        let position =
            LinePosition::from_index(self.figure.len()).ok_or(SessionError::FigureComplete)?;

        if let Some(ticket) = self.pending.take() {
            self.events.record(DivinationEvent::ThrowCancelled { ticket });
        }
        let ticket = self.coordinator.begin_throw(&mut self.world, &mut self.rng);
        self.pending = Some(ticket);
        self.phase = SessionPhase::Throwing;
        self.events
            .record(DivinationEvent::ThrowStarted { ticket, position });
        Ok(ticket)
    }

    /// Advance the settle wait by `dt`. Call once per frame after stepping
    /// the physics world. Returns the line when a throw completes.
    pub fn update(&mut self, dt: Duration) -> Result<Option<LineReport>, SessionError> {
        let poll = match self.coordinator.poll(&self.world, dt) {
            Ok(poll) => poll,
            Err(e) => {
                self.pending = None;
                self.phase = self.resting_phase();
                return Err(e.into());
            }
        };

        match poll {
            SettlePoll::Idle => Ok(None),
            SettlePoll::Pending { .. } => {
                if self.phase == SessionPhase::Throwing {
                    self.phase = SessionPhase::AwaitingSettle;
                }
                Ok(None)
            }
            SettlePoll::Settled(reading) => self.accept(reading),
        }
    }

    fn accept(&mut self, reading: ThrowReading) -> Result<Option<LineReport>, SessionError> {
        if self.pending != Some(reading.ticket) {
            tracing::debug!(ticket = %reading.ticket, "discarding reading for a stale throw");
            return Ok(None);
        }
        self.pending = None;

        if reading.forced {
            self.events.record(DivinationEvent::SettleForced {
                ticket: reading.ticket,
                elapsed: reading.elapsed,
            });
        }

        let line = line::resolve(reading.outcomes);
        let position = self.figure.add_line(line)?;
        self.forced.push(reading.forced);
        self.events.record(DivinationEvent::LineResolved {
            ticket: reading.ticket,
            position,
            line,
            forced: reading.forced,
        });
        tracing::debug!(
            ticket = %reading.ticket,
            %position,
            value = line.value().number(),
            forced = reading.forced,
            "line resolved"
        );

        if self.figure.is_complete() {
            let result = self.figure.resolve()?;
            let primary = result.primary();
            let transformed = result.transformed().hexagram();
            self.events.record(DivinationEvent::FigureCompleted {
                primary: primary.number,
                transformed: transformed.map(|d| d.number),
            });
            tracing::info!(
                primary = primary.number,
                transformed = transformed.map(|d| d.number),
                moving = result.moving_lines().len(),
                "figure complete: {}",
                primary.name
            );
            self.result = Some(result);
            self.phase = SessionPhase::Complete;
        } else {
            self.phase = SessionPhase::LineResolved;
        }

        Ok(Some(LineReport {
            ticket: reading.ticket,
            position,
            line,
            outcomes: reading.outcomes,
            forced: reading.forced,
        }))
    }

    fn resting_phase(&self) -> SessionPhase {
        if self.figure.is_complete() {
            SessionPhase::Complete
        } else if self.figure.is_empty() {
            SessionPhase::Idle
        } else {
            SessionPhase::LineResolved
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        SessionState {
            lines: self.figure.lines().to_vec(),
            is_complete: self.figure.is_complete(),
            is_throwing: self.is_throwing(),
            phase: self.phase,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_throwing(&self) -> bool {
        self.pending.is_some()
    }

    pub fn figure(&self) -> &HexagramFigure {
        &self.figure
    }

    /// Forced-settle flag for each recorded line, bottom first.
    pub fn forced_settles(&self) -> &[bool] {
        &self.forced
    }

    /// The resolved result, once the figure is complete.
    pub fn result(&self) -> Option<&ResolvedResult> {
        self.result.as_ref()
    }

    /// A serializable record of the completed reading.
    pub fn record(&self) -> Option<ReadingRecord> {
        let result = self.result.as_ref()?;
        let forced = self.forced.as_slice().try_into().ok()?;
        Some(ReadingRecord::new(result, forced))
    }

    pub fn coordinator(&self) -> &SettleCoordinator {
        &self.coordinator
    }

    // -----------------------------------------------------------------------
    // World access
    // -----------------------------------------------------------------------

    pub fn world(&self) -> &W {
        &self.world
    }

    /// Mutable world access, refused while a throw is in flight.
    pub fn world_mut(&mut self) -> Result<&mut W, SessionError> {
        if self.coordinator.is_awaiting() {
            return Err(SessionError::BodiesInFlight);
        }
        Ok(&mut self.world)
    }

    pub fn into_world(self) -> W {
        self.world
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventLog {
        &mut self.events
    }

    pub fn drain_events(&mut self) -> Vec<DivinationEvent> {
        self.events.drain()
    }
}

impl<W: SteppedWorld> DivinationSession<W> {
    /// Advance the world by `dt`. Allowed in every phase, including while a
    /// throw is in flight.
    pub fn step_world(&mut self, dt: Duration) {
        self.world.step(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::test_utils::*;

    const FRAME: Duration = Duration::from_millis(50);

    fn session() -> DivinationSession<ScriptedWorld> {
        let world = ScriptedWorld::new();
        let bodies = world.bodies();
        DivinationSession::new(world, bodies, fast_config()).unwrap()
    }

    #[test]
    fn starts_idle() {
        let s = session();
        let state = s.state();
        assert_eq!(state.phase, SessionPhase::Idle);
        assert!(state.lines.is_empty());
        assert!(!state.is_complete);
        assert!(!state.is_throwing);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let world = ScriptedWorld::new();
        let bodies = world.bodies();
        let config = SettleConfig {
            max_wait_ms: 0,
            ..fast_config()
        };
        assert!(matches!(
            DivinationSession::new(world, bodies, config),
            Err(SessionError::Config(ConfigError::ZeroMaxWait))
        ));
    }

    #[test]
    fn throw_moves_through_phases() {
        let mut s = session();
        s.world_mut().unwrap().script_throw([heads(), heads(), tails()], [2, 2, 2]);
        s.throw_next().unwrap();
        assert_eq!(s.phase(), SessionPhase::Throwing);
        assert!(s.state().is_throwing);

        s.step_world(FRAME);
        assert_eq!(s.update(FRAME).unwrap(), None);
        assert_eq!(s.phase(), SessionPhase::AwaitingSettle);

        let report = run_until_line(&mut s, FRAME);
        assert_eq!(report.position.get(), 1);
        assert_eq!(report.line.value().number(), 8);
        assert!(!report.forced);
        assert_eq!(s.phase(), SessionPhase::LineResolved);
        assert!(!s.is_throwing());
    }

    #[test]
    fn world_is_reserved_during_throw() {
        let mut s = session();
        s.world_mut().unwrap().script_throw([heads(), heads(), heads()], [0, 0, 0]);
        assert!(s.world_mut().is_ok());
        s.throw_next().unwrap();
        assert!(matches!(s.world_mut(), Err(SessionError::BodiesInFlight)));
        run_until_line(&mut s, FRAME);
        assert!(s.world_mut().is_ok());
    }

    #[test]
    fn stepping_is_the_only_access_while_in_flight() {
        let mut s = session();
        s.world_mut()
            .unwrap()
            .script_throw([heads(), heads(), heads()], [3, 3, 3]);
        s.throw_next().unwrap();
        for _ in 0..3 {
            assert!(s.world_mut().is_err());
            s.step_world(FRAME);
            assert_eq!(s.update(FRAME).unwrap(), None);
        }
        let report = run_until_line(&mut s, FRAME);
        assert_eq!(report.line.value().number(), 9);
        assert!(!report.forced);
    }

    #[test]
    fn six_throws_complete_the_figure() {
        let mut s = session();
        let reports = throw_figure(&mut s, [7, 8, 9, 6, 7, 8], FRAME);
        assert_eq!(reports.len(), 6);
        assert_eq!(s.phase(), SessionPhase::Complete);
        let result = s.result().unwrap();
        let positions: Vec<u8> = result.moving_lines().iter().map(|p| p.get()).collect();
        assert_eq!(positions, vec![3, 4]);
    }

    #[test]
    fn throw_after_complete_is_rejected_without_mutation() {
        let mut s = session();
        throw_figure(&mut s, [7, 7, 7, 7, 7, 7], FRAME);
        let before = s.state();
        let impulses = s.world().impulse_count(s.world().bodies()[0]);
        let events = s.events().buffer().total_written();

        assert!(matches!(s.throw_next(), Err(SessionError::FigureComplete)));
        assert_eq!(s.state(), before);
        assert_eq!(s.world().impulse_count(s.world().bodies()[0]), impulses);
        assert_eq!(s.events().buffer().total_written(), events);
    }

    #[test]
    fn start_new_figure_cancels_in_flight_throw() {
        let mut s = session();
        s.world_mut().unwrap().script_throw([heads(), heads(), heads()], [0, 0, 0]);
        let ticket = s.throw_next().unwrap();
        s.start_new_figure();
        assert_eq!(s.update(FRAME * 10).unwrap(), None);
        assert!(s.figure().is_empty());
        assert_eq!(s.phase(), SessionPhase::Idle);
        let events = s.drain_events();
        assert!(events.contains(&DivinationEvent::ThrowCancelled { ticket }));
    }

    #[test]
    fn rethrow_supersedes_pending_throw() {
        let mut s = session();
        let w = s.world_mut().unwrap();
        w.script_throw([heads(), heads(), heads()], [NEVER, NEVER, NEVER]);
        w.script_throw([tails(), tails(), tails()], [0, 0, 0]);
        let first = s.throw_next().unwrap();
        let second = s.throw_next().unwrap();
        let report = run_until_line(&mut s, FRAME);
        assert_eq!(report.ticket, second);
        assert_eq!(report.line.value().number(), 6);
        assert_eq!(s.figure().len(), 1);
        let cancelled: Vec<_> = s
            .events()
            .iter()
            .filter(|e| e.kind() == EventKind::ThrowCancelled)
            .cloned()
            .collect();
        assert_eq!(
            cancelled,
            vec![DivinationEvent::ThrowCancelled { ticket: first }]
        );
    }

    #[test]
    fn forced_settle_is_flagged_and_recorded() {
        let mut s = session();
        s.world_mut().unwrap().script_throw([heads(), tails(), heads()], [0, 0, NEVER]);
        s.throw_next().unwrap();
        let report = run_until_line(&mut s, FRAME);
        assert!(report.forced);
        assert_eq!(report.line.value().number(), 8);
        assert_eq!(s.forced_settles(), &[true]);
        assert!(
            s.events()
                .iter()
                .any(|e| e.kind() == EventKind::SettleForced)
        );
    }

    #[test]
    fn settle_error_returns_to_resting_phase() {
        let mut s = session();
        s.world_mut().unwrap().script_throw(
            [heads(), glam::Quat::from_xyzw(0.0, 0.0, 0.0, 0.5), heads()],
            [0, 0, 0],
        );
        s.throw_next().unwrap();
        let err = loop {
            match s.update(FRAME) {
                Ok(None) => continue,
                Ok(Some(r)) => panic!("unexpected line {r:?}"),
                Err(e) => break e,
            }
        };
        assert!(matches!(err, SessionError::Settle(_)));
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert!(!s.is_throwing());
    }

    #[test]
    fn completed_session_produces_record() {
        let mut s = session();
        assert!(s.record().is_none());
        throw_figure(&mut s, [9, 8, 7, 7, 8, 6], FRAME);
        let record = s.record().unwrap();
        assert_eq!(record.lines, [9, 8, 7, 7, 8, 6]);
        assert_eq!(record.primary, s.result().unwrap().primary().number);
    }
}
