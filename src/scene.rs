use crate::ecs::{SandboxWorld, ScaleBaselines, Scalable};
use crate::parts::{PartKind, PartRegistry};
use anyhow::{Context, Result};
use bevy_ecs::prelude::Entity;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Key the whole scene is stored under.
pub const SCENE_BLOB_KEY: &str = "sandbox_scene";

/// Snapshot of one persisted part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneRecord {
    pub provenance_tag: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub vx: f32,
    #[serde(default)]
    pub vy: f32,
    pub mass: f32,
    #[serde(default)]
    pub angle: f32,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub scale_baselines: ScaleBaselines,
}

/// Minimal key-value persistence: whole values, overwrite on put.
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&mut self, key: &str, value: &str) -> Result<()>;
}

/// One file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let mut file_name = key
            .trim()
            .chars()
            .map(|ch| if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' { ch } else { '_' })
            .collect::<String>();
        if file_name.is_empty() {
            file_name.push_str("blob");
        }
        self.root.join(format!("{file_name}.json"))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).with_context(|| format!("Reading blob {}", path.display()))?;
        Ok(Some(text))
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Creating blob directory {}", self.root.display()))?;
        let path = self.path_for(key);
        fs::write(&path, value.as_bytes()).with_context(|| format!("Writing blob {}", path.display()))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    entries: HashMap<String, String>,
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    pub index: usize,
    pub provenance_tag: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadReport {
    NothingToLoad,
    /// `deferred` holds records whose part is not registered yet; they wait for an import.
    Loaded { restored: Vec<Entity>, skipped: Vec<SkippedRecord>, deferred: Vec<SceneRecord> },
}

impl LoadReport {
    pub fn restored_count(&self) -> usize {
        match self {
            LoadReport::NothingToLoad => 0,
            LoadReport::Loaded { restored, .. } => restored.len(),
        }
    }

    pub fn deferred_count(&self) -> usize {
        match self {
            LoadReport::NothingToLoad => 0,
            LoadReport::Loaded { deferred, .. } => deferred.len(),
        }
    }
}

/// One record per entity that carries provenance, in spawn order.
pub fn serialize_world(world: &mut SandboxWorld) -> Vec<SceneRecord> {
    world
        .part_entities()
        .into_iter()
        .filter_map(|entity| {
            let info = world.entity_info(entity)?;
            Some(SceneRecord {
                provenance_tag: info.provenance?,
                x: info.position.x,
                y: info.position.y,
                vx: info.velocity.x,
                vy: info.velocity.y,
                mass: info.mass,
                angle: info.angle,
                is_static: info.is_static,
                display_name: info.display_name.unwrap_or_default(),
                scale_baselines: info.baselines,
            })
        })
        .collect()
}

pub fn save(world: &mut SandboxWorld, store: &mut dyn BlobStore) -> Result<usize> {
    let records = serialize_world(world);
    let json = serde_json::to_string_pretty(&records).context("Encoding scene records")?;
    store.put(SCENE_BLOB_KEY, &json)?;
    log::info!("[scene] saved {} record(s)", records.len());
    Ok(records.len())
}

/// Replaces the world's parts with the stored scene.
///
/// The blob is parsed before anything is removed, so a corrupt blob leaves the world untouched.
/// Records for parts the registry does not know are handed back as `deferred` without touching
/// the filesystem; the caller imports them and finishes with [`restore_record`].
pub fn load(world: &mut SandboxWorld, registry: &PartRegistry, store: &dyn BlobStore) -> Result<LoadReport> {
    let Some(blob) = store.get(SCENE_BLOB_KEY)? else {
        return Ok(LoadReport::NothingToLoad);
    };
    let records: Vec<SceneRecord> = serde_json::from_str(&blob).context("Parsing scene blob")?;
    world.clear_parts();

    let mut restored = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();
    let mut deferred = Vec::new();
    for (index, record) in records.into_iter().enumerate() {
        if !registry.contains(&record.provenance_tag) {
            deferred.push(record);
            continue;
        }
        match restore_record(world, registry, &record) {
            Ok(entity) => restored.push(entity),
            Err(err) => {
                log::warn!("[scene] skipping record {index} ('{}'): {err:#}", record.provenance_tag);
                skipped.push(SkippedRecord {
                    index,
                    provenance_tag: record.provenance_tag,
                    reason: format!("{err:#}"),
                });
            }
        }
    }
    log::info!(
        "[scene] restored {} record(s), skipped {}, waiting on {}",
        restored.len(),
        skipped.len(),
        deferred.len()
    );
    Ok(LoadReport::Loaded { restored, skipped, deferred })
}

fn resolve_factory(registry: &PartRegistry, tag: &str) -> Result<Arc<dyn crate::parts::PartFactory>> {
    match registry.resolve(tag)? {
        PartKind::Body(factory) => Ok(Arc::clone(factory)),
        PartKind::Connection(_) => anyhow::bail!("'{tag}' is a connection tool and cannot be restored as a part"),
    }
}

/// Rebuilds one part through its registered factory and replays the record onto it.
pub fn restore_record(world: &mut SandboxWorld, registry: &PartRegistry, record: &SceneRecord) -> Result<Entity> {
    let factory = resolve_factory(registry, &record.provenance_tag)?;
    let entity = factory.create(world, Vec2::new(record.x, record.y))?;

    // Scaling resets mass to the density-derived value, so it has to come first.
    let carried = world.baselines(entity).unwrap_or_default();
    if let Some(mut part) = world.part_mut(entity) {
        for (axis, value) in record.scale_baselines.present() {
            if carried.get(axis).is_none() {
                log::warn!(
                    "[scene] '{}' no longer has a {} to restore; ignoring {value}",
                    record.provenance_tag,
                    axis.label()
                );
                continue;
            }
            if let Err(err) = part.set_absolute(axis, value) {
                log::warn!("[scene] '{}' {}: {err}", record.provenance_tag, axis.label());
            }
        }
    }
    world.set_angle(entity, record.angle);
    if !world.set_mass(entity, record.mass) {
        log::debug!("[scene] kept derived mass for '{}' (stored {})", record.provenance_tag, record.mass);
    }
    world.set_static(entity, record.is_static);
    world.set_velocity(entity, Vec2::new(record.vx, record.vy));
    if !record.display_name.is_empty() {
        world.set_display_name(entity, &record.display_name);
    }
    world.tag_provenance(entity, &record.provenance_tag);
    Ok(entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_use_camel_case_layout() {
        let record = SceneRecord {
            provenance_tag: "Box".into(),
            x: 1.0,
            y: 2.0,
            vx: 0.0,
            vy: 0.0,
            mass: 5.0,
            angle: 0.0,
            is_static: true,
            display_name: "Box 7".into(),
            scale_baselines: ScaleBaselines { width: Some(120.0), height: Some(80.0), radius: None },
        };
        let value = serde_json::to_value(&record).expect("encode");
        assert_eq!(value["provenanceTag"], "Box");
        assert_eq!(value["isStatic"], true);
        assert_eq!(value["scaleBaselines"]["width"], 120.0);
        assert!(value["scaleBaselines"].get("radius").is_none());
    }

    #[test]
    fn file_store_sanitizes_keys() {
        let store = FileBlobStore::new("scenes");
        assert_eq!(store.path_for("../sandbox scene"), PathBuf::from("scenes").join("___sandbox_scene.json"));
    }
}
