use super::Sandbox;
use crate::notice::Notice;
use crate::scene::{self, LoadReport, SceneRecord};

impl Sandbox {
    pub fn save_scene(&mut self) -> Option<usize> {
        match scene::save(&mut self.world, self.store.as_mut()) {
            Ok(count) => {
                self.notify(Notice::success(format!("Saved {count} part(s)")));
                Some(count)
            }
            Err(err) => {
                self.notify(Notice::error(format!("Save failed: {err:#}")));
                None
            }
        }
    }

    /// Replaces the current parts with the saved scene. Queued forces and armed tools are dropped.
    ///
    /// Parts that still need importing are requested from the loader and restored by [`Sandbox::tick`]
    /// once their module arrives.
    pub fn load_scene(&mut self) -> Option<LoadReport> {
        let report = match scene::load(&mut self.world, &self.registry, self.store.as_ref()) {
            Ok(report) => report,
            Err(err) => {
                self.notify(Notice::error(format!("Load failed: {err:#}")));
                return None;
            }
        };
        self.interaction.cancel(&mut self.world);
        self.forces.clear();
        self.deferred_restores.clear();
        match &report {
            LoadReport::NothingToLoad => self.notify(Notice::info("No saved scene")),
            LoadReport::Loaded { restored, skipped, deferred } => {
                self.defer_restores(deferred);
                let mut message = format!("Loaded {} part(s)", restored.len());
                if !deferred.is_empty() {
                    message.push_str(&format!("; importing {} more", deferred.len()));
                }
                if skipped.is_empty() {
                    self.notify(Notice::success(message));
                } else {
                    let tags: Vec<&str> = skipped.iter().map(|record| record.provenance_tag.as_str()).collect();
                    self.notify(Notice::warning(format!(
                        "{message}; skipped {}: {}",
                        skipped.len(),
                        tags.join(", ")
                    )));
                }
            }
        }
        Some(report)
    }

    /// Saved parts still waiting on an import.
    pub fn deferred_restores(&self) -> usize {
        self.deferred_restores.values().map(Vec::len).sum()
    }

    fn defer_restores(&mut self, records: &[SceneRecord]) {
        for record in records {
            self.deferred_restores.entry(record.provenance_tag.clone()).or_default().push(record.clone());
        }
        let tags: Vec<String> = self.deferred_restores.keys().cloned().collect();
        for tag in tags {
            if let Err(err) = self.loader.request(&tag) {
                let dropped = self.deferred_restores.remove(&tag).map_or(0, |records| records.len());
                self.notify(Notice::warning(format!("Skipped {dropped} saved '{tag}' part(s): {err}")));
            }
        }
    }

    /// Restores the saved records that were waiting on `tag`, in their original order.
    pub(super) fn finish_deferred_restores(&mut self, tag: &str) {
        let Some(records) = self.deferred_restores.remove(tag) else {
            return;
        };
        let mut restored = 0;
        for record in &records {
            match scene::restore_record(&mut self.world, &self.registry, record) {
                Ok(_) => restored += 1,
                Err(err) => log::warn!("[scene] skipping deferred '{tag}' record: {err:#}"),
            }
        }
        if restored == records.len() {
            self.notify(Notice::success(format!("Restored {restored} saved '{tag}' part(s)")));
        } else {
            self.notify(Notice::warning(format!(
                "Restored {restored} of {} saved '{tag}' part(s)",
                records.len()
            )));
        }
    }

    pub(super) fn drop_deferred_restores(&mut self, tag: &str) {
        if let Some(records) = self.deferred_restores.remove(tag) {
            self.notify(Notice::warning(format!("Skipped {} saved '{tag}' part(s)", records.len())));
        }
    }
}
