//! A toy coin world: gravity, a floor, bounces, friction and sleep.
//!
//! Not a rigid-body solver. Coins are points with an orientation; on the
//! floor they are pulled flat onto one face and fall asleep once slow. That
//! is enough to exercise the settle wait with real, noisy motion.

use std::time::Duration;

use glam::{Quat, Vec3};
use slotmap::SlotMap;

use hexacast_core::line::COINS_PER_THROW;
use hexacast_core::physics::{BodyId, PhysicsWorld, SteppedWorld};

/// Tuning for [`TumbleWorld`]. Units are meters, seconds and unit mass.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TumbleParams {
    pub gravity: f32,
    pub restitution: f32,
    /// Normal speed below which a floor contact stops bouncing.
    pub bounce_threshold: f32,
    /// Per-second tangential velocity loss while on the floor.
    pub floor_friction: f32,
    /// Per-second angular velocity loss while on the floor.
    pub spin_friction: f32,
    /// Per-second fraction of the tilt removed while on the floor.
    pub flatten_rate: f32,
    pub half_thickness: f32,
    pub sleep_linear: f32,
    pub sleep_angular: f32,
    /// Seconds a coin must stay slow before it sleeps.
    pub sleep_time: f32,
    /// Body-local axis out of the marked face.
    pub marked_axis: Vec3,
    pub up: Vec3,
}

impl Default for TumbleParams {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            restitution: 0.35,
            bounce_threshold: 0.4,
            floor_friction: 3.0,
            spin_friction: 4.0,
            flatten_rate: 6.0,
            half_thickness: 0.01,
            sleep_linear: 0.05,
            sleep_angular: 0.15,
            sleep_time: 0.2,
            marked_axis: Vec3::Y,
            up: Vec3::Y,
        }
    }
}

#[derive(Debug, Clone)]
struct Coin {
    position: Vec3,
    velocity: Vec3,
    angular_velocity: Vec3,
    orientation: Quat,
    calm: f32,
    asleep: bool,
}

#[derive(Debug, Clone)]
pub struct TumbleWorld {
    coins: SlotMap<BodyId, Coin>,
    params: TumbleParams,
}

impl TumbleWorld {
    pub fn new(params: TumbleParams) -> Self {
        Self {
            coins: SlotMap::with_key(),
            params,
        }
    }

    pub fn params(&self) -> &TumbleParams {
        &self.params
    }

    /// Add a sleeping coin on the floor at `position`, marked face up.
    pub fn spawn(&mut self, position: Vec3) -> BodyId {
        let up = self.params.up;
        let rest = position - up * position.dot(up) + up * self.params.half_thickness;
        self.coins.insert(Coin {
            position: rest,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            calm: 0.0,
            asleep: true,
        })
    }

    /// Three coins in a row, a few centimeters apart.
    pub fn spawn_set(&mut self) -> [BodyId; COINS_PER_THROW] {
        std::array::from_fn(|i| self.spawn(Vec3::new(i as f32 * 0.05, 0.0, 0.0)))
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    pub fn position(&self, body: BodyId) -> Option<Vec3> {
        self.coins.get(body).map(|c| c.position)
    }

    /// Advance every awake coin by `dt` seconds.
    pub fn step_seconds(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let p = &self.params;
        for coin in self.coins.values_mut().filter(|c| !c.asleep) {
            step_coin(coin, p, dt);
        }
    }
}

fn step_coin(coin: &mut Coin, p: &TumbleParams, dt: f32) {
    coin.velocity -= p.up * p.gravity * dt;
    coin.position += coin.velocity * dt;
    coin.orientation = (Quat::from_scaled_axis(coin.angular_velocity * dt) * coin.orientation)
        .normalize();

    let height = coin.position.dot(p.up);
    let on_floor = height <= p.half_thickness;
    if on_floor {
        coin.position += p.up * (p.half_thickness - height);

        let normal_speed = coin.velocity.dot(p.up);
        if normal_speed < 0.0 {
            let bounce = if -normal_speed > p.bounce_threshold {
                -normal_speed * p.restitution
            } else {
                0.0
            };
            coin.velocity += p.up * (bounce - normal_speed);
        }

        let normal = p.up * coin.velocity.dot(p.up);
        let tangent = coin.velocity - normal;
        coin.velocity = normal + tangent * (1.0 - p.floor_friction * dt).max(0.0);
        coin.angular_velocity *= (1.0 - p.spin_friction * dt).max(0.0);

        let flat = flatten(coin.orientation, p);
        let pull = (p.flatten_rate * dt).min(1.0);
        coin.orientation = coin.orientation.slerp(flat, pull).normalize();
    }

    let slow = coin.velocity.length() < p.sleep_linear
        && coin.angular_velocity.length() < p.sleep_angular;
    if on_floor && slow {
        coin.calm += dt;
        if coin.calm >= p.sleep_time {
            coin.asleep = true;
            coin.velocity = Vec3::ZERO;
            coin.angular_velocity = Vec3::ZERO;
            coin.orientation = flatten(coin.orientation, p);
        }
    } else {
        coin.calm = 0.0;
    }
}

/// The nearest orientation with the marked axis straight up or down.
fn flatten(orientation: Quat, p: &TumbleParams) -> Quat {
    let axis = orientation * p.marked_axis;
    let target = if axis.dot(p.up) >= 0.0 { p.up } else { -p.up };
    (Quat::from_rotation_arc(axis.normalize(), target) * orientation).normalize()
}

impl SteppedWorld for TumbleWorld {
    fn step(&mut self, dt: Duration) {
        self.step_seconds(dt.as_secs_f32());
    }
}

impl PhysicsWorld for TumbleWorld {
    fn apply_impulse_and_torque(&mut self, body: BodyId, impulse: Vec3, torque: Vec3) {
        if let Some(coin) = self.coins.get_mut(body) {
            coin.asleep = false;
            coin.calm = 0.0;
            coin.velocity += impulse;
            coin.angular_velocity += torque;
        }
    }

    fn is_at_rest(&self, body: BodyId) -> bool {
        self.coins.get(body).is_none_or(|c| c.asleep)
    }

    fn orientation(&self, body: BodyId) -> Quat {
        self.coins.get(body).map_or(Quat::IDENTITY, |c| c.orientation)
    }
}
