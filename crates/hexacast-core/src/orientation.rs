//! Classify a settled coin's rotation into the face that points up.
//!
//! Only one direction matters: the body-local axis that points out of the
//! marked face. Rotated into world space, its component along world "up"
//! decides the outcome. Nothing else about the pose is consulted.

use glam::{Mat3, Quat, Vec3};

use crate::line::FaceOutcome;

/// Tolerance used when checking that a rotation is proper.
const ROTATION_TOLERANCE: f32 = 1e-3;

/// A rotation that cannot be classified.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum OrientationError {
    #[error("orientation has non-finite components")]
    NonFinite,

    #[error("orientation quaternion is not unit length (length {length})")]
    NotUnit { length: f32 },

    #[error("matrix is not a proper rotation (determinant {determinant})")]
    NotRotation { determinant: f32 },
}

/// Decides which face is up for a given body orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceClassifier {
    marked_axis: Vec3,
    world_up: Vec3,
}

impl Default for FaceClassifier {
    /// Marked face along local +Y, world up along +Y.
    fn default() -> Self {
        Self {
            marked_axis: Vec3::Y,
            world_up: Vec3::Y,
        }
    }
}

impl FaceClassifier {
    /// Build a classifier. Both axes are normalized; a zero or non-finite
    /// axis yields `None`.
    pub fn new(marked_axis: Vec3, world_up: Vec3) -> Option<Self> {
        Some(Self {
            marked_axis: marked_axis.try_normalize()?,
            world_up: world_up.try_normalize()?,
        })
    }

    pub fn marked_axis(&self) -> Vec3 {
        self.marked_axis
    }

    pub fn world_up(&self) -> Vec3 {
        self.world_up
    }

    /// Classify a unit quaternion. Non-unit input is rejected rather than
    /// renormalized.
    pub fn classify(&self, orientation: Quat) -> Result<FaceOutcome, OrientationError> {
        if !orientation.is_finite() {
            return Err(OrientationError::NonFinite);
        }
        if !orientation.is_normalized() {
            return Err(OrientationError::NotUnit {
                length: orientation.length(),
            });
        }
        Ok(self.outcome_for(orientation * self.marked_axis))
    }

    /// Classify a rotation matrix. It must be orthonormal with determinant +1.
    pub fn classify_matrix(&self, rotation: Mat3) -> Result<FaceOutcome, OrientationError> {
        if !rotation.is_finite() {
            return Err(OrientationError::NonFinite);
        }
        let determinant = rotation.determinant();
        let orthonormal = (rotation.transpose() * rotation)
            .abs_diff_eq(Mat3::IDENTITY, ROTATION_TOLERANCE);
        if !orthonormal || (determinant - 1.0).abs() > ROTATION_TOLERANCE {
            return Err(OrientationError::NotRotation { determinant });
        }
        Ok(self.outcome_for(rotation * self.marked_axis))
    }

    fn outcome_for(&self, world_axis: Vec3) -> FaceOutcome {
        if world_axis.dot(self.world_up) > 0.0 {
            FaceOutcome::MarkedFaceUp
        } else {
            FaceOutcome::OtherFaceUp
        }
    }
}
