use std::path::Path;
use std::time::Duration;

use hexacast_core::config::SettleConfig;
use hexacast_core::line::LINES_PER_FIGURE;
use hexacast_core::record::ReadingRecord;
use hexacast_core::session::{DivinationSession, LineReport};
use hexacast_core::transform::ResolvedResult;

use crate::error::DemoError;
use crate::tumble::{TumbleParams, TumbleWorld};

/// Default physics step: 120 Hz.
pub const DEFAULT_TIMESTEP: Duration = Duration::from_micros(8_333);

/// Everything one figure produced.
#[derive(Debug, Clone)]
pub struct Reading {
    pub reports: Vec<LineReport>,
    pub result: ResolvedResult,
    pub record: ReadingRecord,
    /// Text rendering of the figure, top line first.
    pub rendered: String,
}

/// Drives a [`DivinationSession`] over a [`TumbleWorld`] at a fixed time
/// step, with no renderer.
#[derive(Debug)]
pub struct HeadlessRunner {
    session: DivinationSession<TumbleWorld>,
    timestep: Duration,
    /// Step budget per throw.
    max_steps: u32,
}

impl HeadlessRunner {
    pub fn new(config: SettleConfig, params: TumbleParams) -> Result<Self, DemoError> {
        let mut world = TumbleWorld::new(params);
        let bodies = world.spawn_set();
        let max_wait = config.max_wait();
        let session = DivinationSession::new(world, bodies, config)?;
        Ok(Self {
            session,
            timestep: DEFAULT_TIMESTEP,
            max_steps: step_budget(max_wait, DEFAULT_TIMESTEP),
        })
    }

    /// Load `settle.{ron,toml,json}` from `dir`, or defaults when absent.
    pub fn from_data_dir(dir: &Path, params: TumbleParams) -> Result<Self, DemoError> {
        let config =
            hexacast_data::load_settle_config(dir).map_err(|source| DemoError::DataLoad {
                dir: dir.to_path_buf(),
                source,
            })?;
        Self::new(config, params)
    }

    pub fn with_timestep(mut self, timestep: Duration) -> Result<Self, DemoError> {
        if timestep.is_zero() {
            return Err(DemoError::ZeroTimestep);
        }
        self.timestep = timestep;
        self.max_steps = step_budget(self.session.coordinator().config().max_wait(), timestep);
        Ok(self)
    }

    pub fn timestep(&self) -> Duration {
        self.timestep
    }

    pub fn session(&self) -> &DivinationSession<TumbleWorld> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut DivinationSession<TumbleWorld> {
        &mut self.session
    }

    /// Throw once and step until the line comes in.
    pub fn throw_line(&mut self) -> Result<LineReport, DemoError> {
        self.session.throw_next()?;
        for _ in 0..self.max_steps {
            self.session.step_world(self.timestep);
            if let Some(report) = self.session.update(self.timestep)? {
                return Ok(report);
            }
        }
        Err(DemoError::Stalled {
            steps: self.max_steps,
        })
    }

    /// Start a fresh figure and throw all six lines.
    pub fn run_figure(&mut self) -> Result<Reading, DemoError> {
        self.session.start_new_figure();
        let mut reports = Vec::with_capacity(LINES_PER_FIGURE);
        for _ in 0..LINES_PER_FIGURE {
            let report = self.throw_line()?;
            tracing::debug!(
                position = %report.position,
                value = report.line.value().number(),
                forced = report.forced,
                "demo line"
            );
            reports.push(report);
        }

        let result = self.session.result().cloned().ok_or(DemoError::MissingResult)?;
        let record = self.session.record().ok_or(DemoError::MissingResult)?;
        Ok(Reading {
            reports,
            result,
            record,
            rendered: self.session.figure().render(),
        })
    }
}

/// Steps needed to cover the maximum wait, with headroom.
fn step_budget(max_wait: Duration, timestep: Duration) -> u32 {
    let steps = max_wait.as_nanos() / timestep.as_nanos().max(1);
    u32::try_from(steps.saturating_mul(2).saturating_add(16)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(seed: u64) -> SettleConfig {
        SettleConfig {
            seed: Some(seed),
            ..SettleConfig::default()
        }
    }

    #[test]
    fn runs_a_full_figure() {
        let mut runner = HeadlessRunner::new(config(11), TumbleParams::default()).unwrap();
        let reading = runner.run_figure().unwrap();
        assert_eq!(reading.reports.len(), 6);
        assert_eq!(reading.rendered.lines().count(), 6);
        assert_eq!(reading.record.primary, reading.result.primary().number);
        assert!(reading.record.resolve().is_ok());
    }

    #[test]
    fn zero_timestep_rejected() {
        let runner = HeadlessRunner::new(config(1), TumbleParams::default()).unwrap();
        assert!(matches!(
            runner.with_timestep(Duration::ZERO),
            Err(DemoError::ZeroTimestep)
        ));
    }

    #[test]
    fn budget_covers_max_wait() {
        let steps = step_budget(Duration::from_secs(8), DEFAULT_TIMESTEP);
        assert!(u64::from(steps) * DEFAULT_TIMESTEP.as_nanos() as u64 >= 8_000_000_000);
    }

    #[test]
    fn consecutive_figures_start_fresh() {
        let mut runner = HeadlessRunner::new(config(5), TumbleParams::default()).unwrap();
        runner.run_figure().unwrap();
        let second = runner.run_figure().unwrap();
        assert_eq!(second.reports[0].position.get(), 1);
        assert_eq!(runner.session().figure().len(), 6);
    }
}
