use crate::ecs::{AttributeValue, Connection, SandboxWorld, Scalable, SpringParams};
use crate::forces::PendingForces;
use crate::schema::{
    PropertyDescriptor, DAMPING_KEY, FRICTION_KEY, LENGTH_KEY, MASS_KEY, NAME_KEY, RESTITUTION_KEY, STATIC_KEY,
    STIFFNESS_KEY,
};
use bevy_ecs::prelude::Entity;
use glam::Vec2;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlValue {
    Number(f32),
    Text(String),
    Flag(bool),
    Trigger,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InspectorRow {
    pub key: String,
    pub label: String,
    pub descriptor: PropertyDescriptor,
    pub value: ControlValue,
}

/// One control per schema entry, read from the entity's current state.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectorPanel {
    pub entity: Entity,
    pub title: String,
    pub rows: Vec<InspectorRow>,
}

impl InspectorPanel {
    /// `None` when the entity is gone. An entity without a schema gets an empty panel.
    pub fn build(world: &SandboxWorld, entity: Entity) -> Option<Self> {
        if !world.entity_exists(entity) {
            return None;
        }
        let title = world
            .display_name(entity)
            .map(str::to_string)
            .or_else(|| world.connection(entity).map(|connection| connection.tool.clone()))
            .unwrap_or_else(|| format!("Entity {}", entity.index()));
        let rows = world
            .schema(entity)
            .map(|schema| {
                schema
                    .entries()
                    .iter()
                    .map(|entry| InspectorRow {
                        key: entry.key.clone(),
                        label: entry.label.clone(),
                        descriptor: entry.descriptor.clone(),
                        value: current_value(world, entity, &entry.key, &entry.descriptor),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Some(Self { entity, title, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, key: &str) -> Option<&InspectorRow> {
        self.rows.iter().find(|row| row.key == key)
    }
}

fn current_value(world: &SandboxWorld, entity: Entity, key: &str, descriptor: &PropertyDescriptor) -> ControlValue {
    match descriptor {
        PropertyDescriptor::Range { min, .. } => {
            ControlValue::Number(world.number_attribute(entity, key).unwrap_or(*min))
        }
        PropertyDescriptor::Text => ControlValue::Text(world.text_attribute(entity, key).unwrap_or_default()),
        PropertyDescriptor::Toggle => ControlValue::Flag(world.flag_attribute(entity, key).unwrap_or(false)),
        PropertyDescriptor::Action => ControlValue::Trigger,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyEdit {
    Number(f32),
    Text(String),
    Flag(bool),
    /// Payload of an action control.
    Vector(Vec2),
}

impl PropertyEdit {
    fn kind_label(&self) -> &'static str {
        match self {
            PropertyEdit::Number(_) => "number",
            PropertyEdit::Text(_) => "text",
            PropertyEdit::Flag(_) => "flag",
            PropertyEdit::Vector(_) => "vector",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EditError {
    #[error("nothing is selected")]
    NothingSelected,
    #[error("entity {0:?} no longer exists")]
    StaleEntity(Entity),
    #[error("'{key}' is not an editable property of this entity")]
    UnknownProperty { key: String },
    #[error("'{key}' is a {expected} control but received a {received} value")]
    KindMismatch { key: String, expected: &'static str, received: &'static str },
    #[error("'{key}' rejected the value: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Routes one edit to the effect its descriptor calls for.
pub fn apply_edit(
    world: &mut SandboxWorld,
    forces: &mut PendingForces,
    entity: Entity,
    key: &str,
    edit: PropertyEdit,
) -> Result<(), EditError> {
    if !world.entity_exists(entity) {
        return Err(EditError::StaleEntity(entity));
    }
    let descriptor = world
        .schema(entity)
        .and_then(|schema| schema.get(key))
        .map(|entry| entry.descriptor.clone())
        .ok_or_else(|| EditError::UnknownProperty { key: key.to_string() })?;
    let mismatch = |edit: &PropertyEdit| EditError::KindMismatch {
        key: key.to_string(),
        expected: descriptor.kind_label(),
        received: edit.kind_label(),
    };

    match (&descriptor, edit) {
        (PropertyDescriptor::Range { scale: Some(axis), .. }, PropertyEdit::Number(value)) => {
            let mut part = world.part_mut(entity).ok_or(EditError::StaleEntity(entity))?;
            part.set_absolute(*axis, value)
                .map(|_| ())
                .map_err(|err| EditError::InvalidValue { key: key.to_string(), reason: err.to_string() })
        }
        (PropertyDescriptor::Range { .. }, PropertyEdit::Number(value)) => set_number(world, entity, key, value),
        (PropertyDescriptor::Text, PropertyEdit::Text(text)) => {
            if key == NAME_KEY {
                world.set_display_name(entity, &text);
            } else {
                world.set_bag_value(entity, key, AttributeValue::Text(text));
            }
            Ok(())
        }
        (PropertyDescriptor::Toggle, PropertyEdit::Flag(flag)) => {
            if key == STATIC_KEY {
                if !world.set_static(entity, flag) {
                    return Err(invalid(key, "entity has no body"));
                }
            } else {
                world.set_bag_value(entity, key, AttributeValue::Flag(flag));
            }
            Ok(())
        }
        (PropertyDescriptor::Action, PropertyEdit::Vector(vector)) => {
            if !vector.is_finite() {
                return Err(invalid(key, "vector must be finite"));
            }
            forces.set(entity, vector);
            Ok(())
        }
        (_, edit) => Err(mismatch(&edit)),
    }
}

fn invalid(key: &str, reason: &str) -> EditError {
    EditError::InvalidValue { key: key.to_string(), reason: reason.to_string() }
}

fn set_number(world: &mut SandboxWorld, entity: Entity, key: &str, value: f32) -> Result<(), EditError> {
    if !value.is_finite() {
        return Err(invalid(key, "value must be finite"));
    }
    if let Some(params) = world.connection(entity).map(|connection: &Connection| connection.params) {
        let updated = match key {
            STIFFNESS_KEY => Some(SpringParams { stiffness: value, ..params }),
            LENGTH_KEY => Some(SpringParams { length: value, ..params }),
            DAMPING_KEY => Some(SpringParams { damping: value, ..params }),
            _ => None,
        };
        if let Some(updated) = updated {
            if !world.set_connection_params(entity, updated) {
                return Err(invalid(key, "connection endpoints are gone"));
            }
            return Ok(());
        }
    }
    let applied = match key {
        MASS_KEY => world.set_mass(entity, value),
        FRICTION_KEY => world.set_friction(entity, value),
        RESTITUTION_KEY => world.set_restitution(entity, value),
        _ => world.set_bag_value(entity, key, AttributeValue::Number(value)),
    };
    if applied {
        Ok(())
    } else {
        Err(invalid(key, "the engine refused the value"))
    }
}

#[cfg(feature = "editor")]
pub mod egui_panel {
    use super::{ControlValue, InspectorPanel, PropertyEdit};
    use crate::schema::PropertyDescriptor;
    use glam::Vec2;

    /// Draws the panel and returns the edits made this frame. `force_draft` holds the action vector being typed.
    pub fn show(ui: &mut egui::Ui, panel: &InspectorPanel, force_draft: &mut Vec2) -> Vec<(String, PropertyEdit)> {
        let mut edits = Vec::new();
        ui.heading(panel.title.as_str());
        if panel.is_empty() {
            ui.label("No editable properties");
            return edits;
        }
        for row in &panel.rows {
            match (&row.descriptor, &row.value) {
                (PropertyDescriptor::Range { min, max, step, .. }, ControlValue::Number(value)) => {
                    let mut value = *value;
                    let slider = egui::Slider::new(&mut value, *min..=*max).step_by(*step as f64).text(&row.label);
                    if ui.add(slider).changed() {
                        edits.push((row.key.clone(), PropertyEdit::Number(value)));
                    }
                }
                (PropertyDescriptor::Text, ControlValue::Text(text)) => {
                    let mut text = text.clone();
                    ui.horizontal(|ui| {
                        ui.label(&row.label);
                        if ui.text_edit_singleline(&mut text).changed() {
                            edits.push((row.key.clone(), PropertyEdit::Text(text.clone())));
                        }
                    });
                }
                (PropertyDescriptor::Toggle, ControlValue::Flag(flag)) => {
                    let mut flag = *flag;
                    if ui.checkbox(&mut flag, &row.label).changed() {
                        edits.push((row.key.clone(), PropertyEdit::Flag(flag)));
                    }
                }
                (PropertyDescriptor::Action, _) => {
                    ui.horizontal(|ui| {
                        ui.add(egui::DragValue::new(&mut force_draft.x).speed(0.01).prefix("x "));
                        ui.add(egui::DragValue::new(&mut force_draft.y).speed(0.01).prefix("y "));
                        if ui.button(&row.label).clicked() {
                            edits.push((row.key.clone(), PropertyEdit::Vector(*force_draft)));
                        }
                    });
                }
                _ => {
                    ui.label(format!("{}: unavailable", row.label));
                }
            }
        }
        edits
    }
}
