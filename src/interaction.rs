use crate::ecs::{ConnectionEnd, Highlight, SandboxWorld};
use crate::parts::{PartKind, PartRegistry};
use anyhow::{anyhow, Result};
use bevy_ecs::prelude::Entity;
use glam::Vec2;
use std::time::Duration;

/// A one-shot deadline checked on the event-loop thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledTask {
    due_at: Duration,
    cancelled: bool,
}

impl ScheduledTask {
    pub fn new(now: Duration, delay: Duration) -> Self {
        Self { due_at: now + delay, cancelled: false }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_due(&self, now: Duration) -> bool {
        !self.cancelled && now >= self.due_at
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingPick {
    pub entity: Entity,
    /// Position of the entity when it was picked.
    pub origin: Vec2,
    pub timer: ScheduledTask,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Selected(Entity),
    ConnectPending { tool: String, first: Option<PendingPick> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome {
    Ignored,
    Selected(Entity),
    Deselected,
    ToolActivated(String),
    FirstPicked(Entity),
    Connected { connection: Entity, first: Entity, second: Entity },
    AutoHung { connection: Entity, entity: Entity, anchor: Vec2 },
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionSettings {
    pub auto_hang_delay: Duration,
    /// Distance above the picked entity where the fallback anchor goes.
    pub auto_hang_height: f32,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self { auto_hang_delay: Duration::from_millis(2000), auto_hang_height: 100.0 }
    }
}

/// Selection and two-click connection handling.
#[derive(Debug, Default)]
pub struct Interaction {
    state: InteractionState,
    settings: InteractionSettings,
}

impl Interaction {
    pub fn new(settings: InteractionSettings) -> Self {
        Self { state: InteractionState::Idle, settings }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn settings(&self) -> InteractionSettings {
        self.settings
    }

    pub fn selected(&self) -> Option<Entity> {
        match self.state {
            InteractionState::Selected(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn select(&mut self, world: &mut SandboxWorld, entity: Option<Entity>) {
        self.leave_pending(world);
        self.state = match entity {
            Some(entity) => InteractionState::Selected(entity),
            None => InteractionState::Idle,
        };
    }

    /// Arms a connection tool from any state.
    pub fn activate_tool(&mut self, world: &mut SandboxWorld, tool: &str) -> InteractionOutcome {
        self.leave_pending(world);
        self.state = InteractionState::ConnectPending { tool: tool.to_string(), first: None };
        InteractionOutcome::ToolActivated(tool.to_string())
    }

    /// Clears the pending highlight and cancels the fallback timer, if any.
    fn leave_pending(&mut self, world: &mut SandboxWorld) {
        if let InteractionState::ConnectPending { first: Some(pick), .. } = &mut self.state {
            pick.timer.cancel();
            world.set_highlight(pick.entity, None);
        }
    }

    pub fn cancel(&mut self, world: &mut SandboxWorld) -> InteractionOutcome {
        let was_pending = matches!(self.state, InteractionState::ConnectPending { .. });
        self.leave_pending(world);
        self.state = InteractionState::Idle;
        if was_pending {
            InteractionOutcome::Cancelled
        } else {
            InteractionOutcome::Deselected
        }
    }

    pub fn pointer_down(
        &mut self,
        world: &mut SandboxWorld,
        registry: &PartRegistry,
        point: Vec2,
        now: Duration,
    ) -> Result<InteractionOutcome> {
        let hit = world.pick_entity(point);
        let (tool, first) = match &self.state {
            InteractionState::ConnectPending { tool, first } => (tool.clone(), first.clone()),
            _ => {
                return Ok(match hit {
                    Some(entity) => {
                        self.state = InteractionState::Selected(entity);
                        InteractionOutcome::Selected(entity)
                    }
                    None => {
                        self.state = InteractionState::Idle;
                        InteractionOutcome::Deselected
                    }
                });
            }
        };

        let Some(entity) = hit else {
            return Ok(self.cancel(world));
        };
        if let Some(pick) = &first {
            if !world.entity_exists(pick.entity) {
                log::debug!("[interaction] pending entity {:?} vanished", pick.entity);
                self.state = InteractionState::Idle;
                return Ok(InteractionOutcome::Cancelled);
            }
        }
        if entity == world.boundary_entity() || world.is_static(entity) {
            return Ok(InteractionOutcome::Ignored);
        }

        match first {
            None => {
                let Some(origin) = world.position(entity) else {
                    return Ok(InteractionOutcome::Ignored);
                };
                world.set_highlight(entity, Some(Highlight::ConnectSource));
                let timer = ScheduledTask::new(now, self.settings.auto_hang_delay);
                self.state = InteractionState::ConnectPending {
                    tool,
                    first: Some(PendingPick { entity, origin, timer }),
                };
                Ok(InteractionOutcome::FirstPicked(entity))
            }
            Some(pick) if pick.entity == entity => Ok(InteractionOutcome::Ignored),
            Some(pick) => {
                self.leave_pending(world);
                self.state = InteractionState::Idle;
                let connection = connect(world, registry, &tool, pick.entity, ConnectionEnd::Entity(entity))?;
                Ok(InteractionOutcome::Connected { connection, first: pick.entity, second: entity })
            }
        }
    }

    /// Fires the auto-hang fallback once its deadline passes.
    pub fn tick(
        &mut self,
        world: &mut SandboxWorld,
        registry: &PartRegistry,
        now: Duration,
    ) -> Result<Option<InteractionOutcome>> {
        match &self.state {
            InteractionState::Selected(entity) if !world.entity_exists(*entity) => {
                self.state = InteractionState::Idle;
                Ok(Some(InteractionOutcome::Deselected))
            }
            InteractionState::ConnectPending { tool, first: Some(pick) } => {
                if !world.entity_exists(pick.entity) {
                    log::debug!("[interaction] pending entity {:?} vanished", pick.entity);
                    self.state = InteractionState::Idle;
                    return Ok(Some(InteractionOutcome::Cancelled));
                }
                if !pick.timer.is_due(now) {
                    return Ok(None);
                }
                let tool = tool.clone();
                let entity = pick.entity;
                let anchor = pick.origin - Vec2::new(0.0, self.settings.auto_hang_height);
                self.leave_pending(world);
                self.state = InteractionState::Idle;
                let connection = connect(world, registry, &tool, entity, ConnectionEnd::Anchor(anchor))?;
                log::info!("[interaction] auto-hung {entity:?} at ({:.1}, {:.1})", anchor.x, anchor.y);
                Ok(Some(InteractionOutcome::AutoHung { connection, entity, anchor }))
            }
            _ => Ok(None),
        }
    }
}

fn connect(
    world: &mut SandboxWorld,
    registry: &PartRegistry,
    tool: &str,
    first: Entity,
    second: ConnectionEnd,
) -> Result<Entity> {
    match registry.resolve(tool)? {
        PartKind::Connection(factory) => factory.connect(world, first, second),
        PartKind::Body(_) => Err(anyhow!("'{tool}' is not a connection tool")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_task_never_fires() {
        let mut task = ScheduledTask::new(Duration::from_millis(100), Duration::from_millis(50));
        assert!(!task.is_due(Duration::from_millis(120)));
        assert!(task.is_due(Duration::from_millis(150)));
        task.cancel();
        assert!(!task.is_due(Duration::from_secs(10)));
    }

    #[test]
    fn empty_space_cancels_armed_tool() {
        let mut world = SandboxWorld::default();
        let registry = PartRegistry::with_builtins();
        let mut interaction = Interaction::default();
        interaction.activate_tool(&mut world, "Rope");
        let outcome = interaction
            .pointer_down(&mut world, &registry, Vec2::new(600.0, 400.0), Duration::ZERO)
            .expect("pointer down");
        assert_eq!(outcome, InteractionOutcome::Cancelled);
        assert_eq!(interaction.state(), &InteractionState::Idle);
    }
}
