//! Headless demo for the Hexacast engine.
//!
//! Provides a toy tumbling-coin world that implements the core physics
//! trait, and a runner that throws complete figures over it at a fixed time
//! step, with no renderer attached.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hexacast_demo_core::{HeadlessRunner, TumbleParams};
//!
//! let mut runner = HeadlessRunner::from_data_dir(dir, TumbleParams::default())?;
//! let reading = runner.run_figure()?;
//! println!("{}", reading.rendered);
//! ```

pub mod error;
pub mod runner;
pub mod tumble;

pub use error::DemoError;
pub use runner::{DEFAULT_TIMESTEP, HeadlessRunner, Reading};
pub use tumble::{TumbleParams, TumbleWorld};
