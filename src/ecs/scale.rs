use super::SandboxWorld;
use crate::schema::ScaleAxis;
use bevy_ecs::prelude::Entity;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScaleError {
    #[error("{axis} target {value} must be a positive, finite number")]
    InvalidTarget { axis: &'static str, value: f32 },
    #[error("entity {0:?} has no scalable body")]
    NotScalable(Entity),
    #[error("entity {entity:?} has no {axis} to resize")]
    AxisMismatch { entity: Entity, axis: &'static str },
}

/// Relative and absolute resizing that keeps the tracked baseline in step with the body.
pub trait Scalable {
    /// Multiplies the measurement along `axis` by `factor`. Returns the new absolute value.
    fn scale_by(&mut self, axis: ScaleAxis, factor: f32) -> Result<f32, ScaleError>;

    /// Resizes along `axis` to `value`, deriving the relative factor from the tracked baseline.
    fn set_absolute(&mut self, axis: ScaleAxis, value: f32) -> Result<f32, ScaleError> {
        if !(value.is_finite() && value > 0.0) {
            return Err(ScaleError::InvalidTarget { axis: axis.label(), value });
        }
        let baseline = self.baseline(axis);
        self.scale_by(axis, value / baseline)
    }

    /// Tracked measurement, or the nominal one when nothing was recorded yet.
    fn baseline(&self, axis: ScaleAxis) -> f32;
}

/// Mutable handle on one part of a [`SandboxWorld`].
pub struct PartMut<'w> {
    world: &'w mut SandboxWorld,
    entity: Entity,
}

impl SandboxWorld {
    pub fn part_mut(&mut self, entity: Entity) -> Option<PartMut<'_>> {
        if !self.entity_exists(entity) {
            return None;
        }
        Some(PartMut { world: self, entity })
    }
}

impl PartMut<'_> {
    pub fn entity(&self) -> Entity {
        self.entity
    }
}

impl Scalable for PartMut<'_> {
    fn scale_by(&mut self, axis: ScaleAxis, factor: f32) -> Result<f32, ScaleError> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(ScaleError::InvalidTarget { axis: axis.label(), value: factor });
        }
        match self.world.shape(self.entity) {
            Some(shape) if shape.has_axis(axis) => {}
            Some(_) => return Err(ScaleError::AxisMismatch { entity: self.entity, axis: axis.label() }),
            None => return Err(ScaleError::NotScalable(self.entity)),
        }
        let target = self.baseline(axis) * factor;
        let (sx, sy) = axis.relative_factors(factor);
        if !self.world.scale_body(self.entity, sx, sy) {
            return Err(ScaleError::NotScalable(self.entity));
        }
        self.world.write_baseline(self.entity, axis, target);
        Ok(target)
    }

    fn baseline(&self, axis: ScaleAxis) -> f32 {
        self.world.baselines(self.entity).unwrap_or_default().get_or_nominal(axis)
    }
}
