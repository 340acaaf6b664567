use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

/// Key of the text attribute bound to an entity's display name.
pub const NAME_KEY: &str = "customName";
/// Key of the toggle bound to the engine's static flag.
pub const STATIC_KEY: &str = "isStatic";
pub const MASS_KEY: &str = "mass";
pub const FRICTION_KEY: &str = "friction";
pub const RESTITUTION_KEY: &str = "restitution";
pub const STIFFNESS_KEY: &str = "stiffness";
pub const LENGTH_KEY: &str = "length";
pub const DAMPING_KEY: &str = "damping";
pub const FORCE_KEY: &str = "force";

/// Which absolute measurement a scale-flagged range drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleAxis {
    Width,
    Height,
    Radius,
}

impl ScaleAxis {
    pub const ALL: [ScaleAxis; 3] = [ScaleAxis::Width, ScaleAxis::Height, ScaleAxis::Radius];

    /// Baseline assumed when an entity never recorded one.
    pub const fn nominal_baseline(self) -> f32 {
        match self {
            ScaleAxis::Width | ScaleAxis::Height => 80.0,
            ScaleAxis::Radius => 40.0,
        }
    }

    /// Relative factors handed to the engine for a change along this axis.
    pub fn relative_factors(self, factor: f32) -> (f32, f32) {
        match self {
            ScaleAxis::Width => (factor, 1.0),
            ScaleAxis::Height => (1.0, factor),
            ScaleAxis::Radius => (factor, factor),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScaleAxis::Width => "width",
            ScaleAxis::Height => "height",
            ScaleAxis::Radius => "radius",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyDescriptor {
    Range {
        min: f32,
        max: f32,
        step: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scale: Option<ScaleAxis>,
    },
    Text,
    Toggle,
    Action,
}

impl PropertyDescriptor {
    pub fn range(min: f32, max: f32, step: f32) -> Self {
        PropertyDescriptor::Range { min, max, step, scale: None }
    }

    pub fn scale_range(min: f32, max: f32, step: f32, axis: ScaleAxis) -> Self {
        PropertyDescriptor::Range { min, max, step, scale: Some(axis) }
    }

    pub fn scale_axis(&self) -> Option<ScaleAxis> {
        match self {
            PropertyDescriptor::Range { scale, .. } => *scale,
            _ => None,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            PropertyDescriptor::Range { .. } => "range",
            PropertyDescriptor::Text => "text",
            PropertyDescriptor::Toggle => "toggle",
            PropertyDescriptor::Action => "action",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyEntry {
    pub key: String,
    pub label: String,
    #[serde(flatten)]
    pub descriptor: PropertyDescriptor,
}

/// Ordered map of editable attributes attached to an entity at creation.
#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertySchema {
    entries: Vec<PropertyEntry>,
}

impl PropertySchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; a repeated key replaces the earlier entry in place.
    pub fn with(mut self, key: impl Into<String>, label: impl Into<String>, descriptor: PropertyDescriptor) -> Self {
        self.insert(key, label, descriptor);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, label: impl Into<String>, descriptor: PropertyDescriptor) {
        let entry = PropertyEntry { key: key.into(), label: label.into(), descriptor };
        if let Some(existing) = self.entries.iter_mut().find(|e| e.key == entry.key) {
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropertyEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    pub fn entries(&self) -> &[PropertyEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drops duplicate keys (first wins) and ranges whose bounds are unusable.
    pub fn sanitized(mut self) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.entries.retain(|entry| {
            if !seen.insert(entry.key.clone()) {
                log::warn!("[schema] duplicate property '{}' dropped", entry.key);
                return false;
            }
            match entry.descriptor {
                PropertyDescriptor::Range { min, max, step, .. } => {
                    let valid = min.is_finite() && max.is_finite() && min < max && step > 0.0;
                    if !valid {
                        log::warn!("[schema] range '{}' has invalid bounds and was dropped", entry.key);
                    }
                    valid
                }
                _ => true,
            }
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_existing_key_in_place() {
        let schema = PropertySchema::new()
            .with("width", "Width", PropertyDescriptor::range(1.0, 2.0, 0.5))
            .with("height", "Height", PropertyDescriptor::Text)
            .with("width", "Width (px)", PropertyDescriptor::scale_range(20.0, 500.0, 10.0, ScaleAxis::Width));
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.entries()[0].key, "width");
        assert_eq!(schema.entries()[0].descriptor.scale_axis(), Some(ScaleAxis::Width));
    }

    #[test]
    fn descriptors_parse_from_tagged_json() {
        let json = r#"[
            {"key": "radius", "label": "Radius", "type": "range", "min": 10, "max": 300, "step": 5, "scale": "radius"},
            {"key": "customName", "label": "Name", "type": "text"},
            {"key": "isStatic", "label": "Pinned", "type": "toggle"},
            {"key": "force", "label": "Push", "type": "action"}
        ]"#;
        let schema: PropertySchema = serde_json::from_str(json).expect("schema parses");
        assert_eq!(schema.len(), 4);
        assert_eq!(schema.get("radius").and_then(|e| e.descriptor.scale_axis()), Some(ScaleAxis::Radius));
        assert_eq!(schema.get("force").map(|e| e.descriptor.kind_label()), Some("action"));
    }

    #[test]
    fn sanitized_drops_bad_ranges_and_duplicates() {
        let json = r#"[
            {"key": "a", "label": "A", "type": "range", "min": 5, "max": 1, "step": 1},
            {"key": "b", "label": "B", "type": "text"},
            {"key": "b", "label": "B again", "type": "toggle"}
        ]"#;
        let schema: PropertySchema = serde_json::from_str(json).expect("schema parses");
        let schema = schema.sanitized();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.get("b").map(|e| e.label.as_str()), Some("B"));
    }
}
