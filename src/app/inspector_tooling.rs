use super::Sandbox;
use crate::inspector::{self, EditError, InspectorPanel, PropertyEdit};
use crate::notice::Notice;
use bevy_ecs::prelude::Entity;

impl Sandbox {
    /// Panel for the current selection, rebuilt from scratch on every call.
    pub fn inspector(&self) -> Option<InspectorPanel> {
        self.selected().and_then(|entity| InspectorPanel::build(&self.world, entity))
    }

    pub fn edit_selected(&mut self, key: &str, edit: PropertyEdit) -> Result<(), EditError> {
        let Some(entity) = self.selected() else {
            return Err(EditError::NothingSelected);
        };
        self.edit(entity, key, edit)
    }

    pub fn edit(&mut self, entity: Entity, key: &str, edit: PropertyEdit) -> Result<(), EditError> {
        let result = inspector::apply_edit(&mut self.world, &mut self.forces, entity, key, edit);
        if let Err(err) = &result {
            self.notify(Notice::warning(err.to_string()));
        }
        result
    }

    pub fn remove_selected(&mut self) -> bool {
        let Some(entity) = self.selected() else {
            return false;
        };
        self.forces.clear_entity(entity);
        let removed = self.world.despawn_part(entity);
        self.select(None);
        removed
    }

    #[cfg(feature = "editor")]
    pub fn show_inspector(&mut self, ui: &mut egui::Ui) {
        let Some(panel) = self.inspector() else {
            return;
        };
        let mut draft = self.force_draft;
        let edits = inspector::egui_panel::show(ui, &panel, &mut draft);
        self.force_draft = draft;
        for (key, edit) in edits {
            let _ = self.edit(panel.entity, &key, edit);
        }
    }
}
