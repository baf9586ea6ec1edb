//! Hexacast Core -- coin-toss hexagram resolution.
//!
//! Three simulated coins are thrown six times. Each throw is read once the
//! coins come to rest, the faces are turned into a line, and six lines
//! select one of the sixty-four hexagrams in King Wen order, plus a second,
//! transformed hexagram when any line is moving.
//!
//! # Throw Pipeline
//!
//! 1. **Impulse** -- [`settle::SettleCoordinator::begin_throw`] pushes each
//!    body with a randomized lift and spin from [`rng::SimRng`].
//! 2. **Settle** -- the caller steps its physics world and polls; a throw is
//!    read after every body has rested for the grace period, or is forced
//!    once the maximum wait runs out.
//! 3. **Classify** -- [`orientation::FaceClassifier`] decides which face of
//!    each body points up.
//! 4. **Resolve** -- [`line::resolve`] maps the three faces to a line value
//!    (6, 7, 8 or 9).
//! 5. **Accumulate** -- [`figure::HexagramFigure`] collects six lines, bottom
//!    first.
//! 6. **Look up** -- [`transform::ResolvedResult`] finds the primary and
//!    transformed hexagrams in [`table::HexagramTable`].
//!
//! # Key Types
//!
//! - [`session::DivinationSession`] -- Drives a figure from first throw to
//!   result over any [`physics::PhysicsWorld`].
//! - [`table::HexagramKey`] -- Six polarity bits; bit 0 is the bottom line.
//! - [`line::Line`] -- A line value with its polarity and moving flag.
//! - [`config::SettleConfig`] -- Settle timings, impulse bounds and axes.
//! - [`event::EventLog`] -- Ring-buffered session events with listeners.
//! - [`record::ReadingRecord`] -- Serializable, validated record of a reading.

pub mod config;
pub mod event;
pub mod figure;
pub mod line;
pub mod orientation;
pub mod physics;
pub mod record;
pub mod rng;
pub mod session;
pub mod settle;
pub mod table;
pub mod transform;
pub mod trigram;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
