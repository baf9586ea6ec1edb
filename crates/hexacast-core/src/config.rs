//! Settle and throw tuning.
//!
//! Every field has a default, so a config file only needs to name what it
//! overrides. Call [`SettleConfig::validate`] after loading.

use std::time::Duration;

use glam::Vec3;

use crate::orientation::FaceClassifier;
use crate::rng::SimRng;

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_wait_ms must be greater than zero")]
    ZeroMaxWait,

    #[error("grace_ms ({grace_ms}) must be below max_wait_ms ({max_wait_ms})")]
    GraceNotBelowMaxWait { grace_ms: u64, max_wait_ms: u64 },

    #[error("invalid impulse bounds: {detail}")]
    InvalidImpulse { detail: String },

    #[error("{name} must be a finite, non-zero vector")]
    DegenerateAxis { name: &'static str },
}

/// Bounds for the randomized impulse and torque applied to each body.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ImpulseBounds {
    /// Minimum upward impulse.
    pub min_lift: f32,
    /// Maximum upward impulse.
    pub max_lift: f32,
    /// Maximum magnitude of each horizontal impulse component.
    pub max_lateral: f32,
    /// Maximum magnitude of each torque component.
    pub max_torque: f32,
}

impl Default for ImpulseBounds {
    fn default() -> Self {
        Self {
            min_lift: 4.0,
            max_lift: 6.5,
            max_lateral: 1.2,
            max_torque: 3.0,
        }
    }
}

impl ImpulseBounds {
    /// Draw one (impulse, torque) pair. `up` is the world up axis.
    pub fn sample(&self, rng: &mut SimRng, up: Vec3) -> (Vec3, Vec3) {
        let up = up.try_normalize().unwrap_or(Vec3::Y);
        let side = up.any_orthonormal_vector();
        let forward = up.cross(side);

        let lift = rng.range_f32(self.min_lift, self.max_lift);
        let impulse = up * lift
            + side * rng.signed_f32(self.max_lateral)
            + forward * rng.signed_f32(self.max_lateral);
        let torque = Vec3::new(
            rng.signed_f32(self.max_torque),
            rng.signed_f32(self.max_torque),
            rng.signed_f32(self.max_torque),
        );
        (impulse, torque)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let values = [self.min_lift, self.max_lift, self.max_lateral, self.max_torque];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ConfigError::InvalidImpulse {
                detail: "bounds must be finite and non-negative".to_string(),
            });
        }
        if self.min_lift > self.max_lift {
            return Err(ConfigError::InvalidImpulse {
                detail: format!(
                    "min_lift ({}) exceeds max_lift ({})",
                    self.min_lift, self.max_lift
                ),
            });
        }
        Ok(())
    }
}

/// Settle coordinator configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SettleConfig {
    /// How long all bodies must report rest, uninterrupted, before the
    /// throw is read.
    pub grace_ms: u64,
    /// Wall-clock ceiling on a throw. Past this the orientations are read
    /// regardless and the throw is flagged as a forced settle.
    pub max_wait_ms: u64,
    pub impulse: ImpulseBounds,
    /// Body-local axis pointing out of the marked face.
    pub marked_axis: Vec3,
    /// World vertical.
    pub world_up: Vec3,
    /// Seed for impulse randomization. `None` derives one from the clock.
    pub seed: Option<u64>,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            grace_ms: 250,
            max_wait_ms: 8_000,
            impulse: ImpulseBounds::default(),
            marked_axis: Vec3::Y,
            world_up: Vec3::Y,
            seed: None,
        }
    }
}

impl SettleConfig {
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    /// Check every field. Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_wait_ms == 0 {
            return Err(ConfigError::ZeroMaxWait);
        }
        if self.grace_ms >= self.max_wait_ms {
            return Err(ConfigError::GraceNotBelowMaxWait {
                grace_ms: self.grace_ms,
                max_wait_ms: self.max_wait_ms,
            });
        }
        self.impulse.validate()?;
        self.classifier().map(|_| ())
    }

    /// The face classifier described by the configured axes.
    pub fn classifier(&self) -> Result<FaceClassifier, ConfigError> {
        if self.marked_axis.try_normalize().is_none() {
            return Err(ConfigError::DegenerateAxis {
                name: "marked_axis",
            });
        }
        FaceClassifier::new(self.marked_axis, self.world_up)
            .ok_or(ConfigError::DegenerateAxis { name: "world_up" })
    }

    /// The RNG for this config: seeded if a seed is set, otherwise from the
    /// system clock.
    pub fn rng(&self) -> SimRng {
        let seed = self.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
        });
        SimRng::new(seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SettleConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_max_wait_rejected() {
        let cfg = SettleConfig {
            grace_ms: 0,
            max_wait_ms: 0,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroMaxWait));
    }

    #[test]
    fn grace_must_be_below_max_wait() {
        let cfg = SettleConfig {
            grace_ms: 500,
            max_wait_ms: 500,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::GraceNotBelowMaxWait { .. })
        ));
    }

    #[test]
    fn inverted_lift_rejected() {
        let cfg = SettleConfig {
            impulse: ImpulseBounds {
                min_lift: 5.0,
                max_lift: 1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidImpulse { .. })
        ));
    }

    #[test]
    fn negative_torque_rejected() {
        let cfg = SettleConfig {
            impulse: ImpulseBounds {
                max_torque: -1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_axis_rejected() {
        let cfg = SettleConfig {
            marked_axis: Vec3::ZERO,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DegenerateAxis {
                name: "marked_axis"
            })
        );
        let cfg = SettleConfig {
            world_up: Vec3::ZERO,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DegenerateAxis { name: "world_up" })
        );
    }

    #[test]
    fn sampled_impulse_lifts_within_bounds() {
        let bounds = ImpulseBounds::default();
        let mut rng = SimRng::new(3);
        for _ in 0..200 {
            let (impulse, torque) = bounds.sample(&mut rng, Vec3::Y);
            assert!(impulse.y >= bounds.min_lift - 1e-4);
            assert!(impulse.y <= bounds.max_lift + 1e-4);
            assert!(torque.abs().max_element() <= bounds.max_torque + 1e-4);
        }
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let cfg = SettleConfig {
            seed: Some(11),
            ..Default::default()
        };
        assert_eq!(cfg.rng(), cfg.rng());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: SettleConfig = serde_json::from_str(r#"{"grace_ms": 100}"#).unwrap();
        assert_eq!(cfg.grace_ms, 100);
        assert_eq!(cfg.max_wait_ms, SettleConfig::default().max_wait_ms);
        assert_eq!(cfg.marked_axis, Vec3::Y);
    }
}
