//! The physics collaborator seam.
//!
//! The engine never integrates motion itself. Everything it needs from a
//! rigid-body simulation goes through [`PhysicsWorld`]: push a body, ask
//! whether it has come to rest, read its rotation.
//!
//! [`SteppedWorld`] adds the one operation a caller may perform while bodies
//! are in flight: advancing the simulation.

use std::time::Duration;

use glam::{Quat, Vec3};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a tossed body in the physics world.
    pub struct BodyId;
}

/// Operations consumed from the rigid-body simulation.
pub trait PhysicsWorld {
    /// Apply a linear impulse and an angular torque impulse to a body.
    fn apply_impulse_and_torque(&mut self, body: BodyId, impulse: Vec3, torque: Vec3);

    /// Whether the body currently satisfies the engine's rest predicate
    /// (sleeping, or below its motion thresholds).
    fn is_at_rest(&self, body: BodyId) -> bool;

    /// The body's current world rotation.
    fn orientation(&self, body: BodyId) -> Quat;
}

/// A world that can be advanced by a time step.
pub trait SteppedWorld: PhysicsWorld {
    fn step(&mut self, dt: Duration);
}

impl<W: PhysicsWorld + ?Sized> PhysicsWorld for Box<W> {
    fn apply_impulse_and_torque(&mut self, body: BodyId, impulse: Vec3, torque: Vec3) {
        (**self).apply_impulse_and_torque(body, impulse, torque);
    }

    fn is_at_rest(&self, body: BodyId) -> bool {
        (**self).is_at_rest(body)
    }

    fn orientation(&self, body: BodyId) -> Quat {
        (**self).orientation(body)
    }
}

impl<W: SteppedWorld + ?Sized> SteppedWorld for Box<W> {
    fn step(&mut self, dt: Duration) {
        (**self).step(dt);
    }
}
