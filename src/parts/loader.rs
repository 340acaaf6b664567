use super::PartModule;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use thiserror::Error;

const MAX_ID_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum ModuleResolutionError {
    #[error("'{id}' is not a valid part identifier: {reason}")]
    InvalidIdentifier { id: String, reason: &'static str },
    #[error("no part module at {}", path.display())]
    Missing { path: PathBuf },
    #[error("reading part module {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("part module {} is malformed", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("part loader worker is unavailable")]
    WorkerUnavailable,
}

/// A validated part identifier, safe to turn into a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId(String);

impl PartId {
    pub fn parse(raw: &str) -> Result<Self, ModuleResolutionError> {
        let invalid = |reason| ModuleResolutionError::InvalidIdentifier { id: raw.to_string(), reason };
        let Some(first) = raw.chars().next() else {
            return Err(invalid("empty"));
        };
        if raw.len() > MAX_ID_LEN {
            return Err(invalid("longer than 64 characters"));
        }
        if !first.is_ascii_alphabetic() {
            return Err(invalid("must start with a letter"));
        }
        if !raw.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-') {
            return Err(invalid("only letters, digits, '_' and '-' are allowed"));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn module_path(&self, parts_dir: &Path) -> PathBuf {
        parts_dir.join(format!("{}.json", self.0))
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn read_part_module(parts_dir: &Path, id: &PartId) -> Result<PartModule, ModuleResolutionError> {
    let path = id.module_path(parts_dir);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(ModuleResolutionError::Missing { path }),
        Err(source) => return Err(ModuleResolutionError::Io { path, source }),
    };
    serde_json::from_slice(&bytes).map_err(|source| ModuleResolutionError::Malformed { path, source })
}

struct LoadJob {
    id: PartId,
}

#[derive(Debug)]
pub struct LoadedPart {
    pub id: String,
    pub result: Result<PartModule, ModuleResolutionError>,
}

/// Reads part modules off the calling thread. Results are collected with [`PartLoader::drain`].
pub struct PartLoader {
    parts_dir: PathBuf,
    worker: Option<(mpsc::Sender<LoadJob>, mpsc::Receiver<LoadedPart>)>,
    in_flight: usize,
}

impl PartLoader {
    pub fn new(parts_dir: impl Into<PathBuf>) -> Self {
        let parts_dir = parts_dir.into();
        let (tx, rx) = mpsc::channel::<LoadJob>();
        let (result_tx, result_rx) = mpsc::channel();
        let worker_dir = parts_dir.clone();
        let builder = thread::Builder::new().name("part-loader".to_string());
        let worker = match builder.spawn(move || {
            while let Ok(job) = rx.recv() {
                let result = read_part_module(&worker_dir, &job.id);
                if result_tx.send(LoadedPart { id: job.id.0, result }).is_err() {
                    break;
                }
            }
        }) {
            Ok(_) => Some((tx, result_rx)),
            Err(err) => {
                log::error!("[parts] failed to spawn loader worker: {err:?}");
                None
            }
        };
        Self { parts_dir, worker, in_flight: 0 }
    }

    pub fn parts_dir(&self) -> &Path {
        &self.parts_dir
    }

    /// Queues a load. Identifier problems are reported here, before any file access.
    pub fn request(&mut self, raw_id: &str) -> Result<PartId, ModuleResolutionError> {
        let id = PartId::parse(raw_id)?;
        let Some((tx, _)) = &self.worker else {
            return Err(ModuleResolutionError::WorkerUnavailable);
        };
        tx.send(LoadJob { id: id.clone() }).map_err(|_| ModuleResolutionError::WorkerUnavailable)?;
        self.in_flight += 1;
        log::debug!("[parts] queued load of '{id}'");
        Ok(id)
    }

    pub fn drain(&mut self) -> Vec<LoadedPart> {
        let mut results = Vec::new();
        if let Some((_, rx)) = &self.worker {
            while let Ok(result) = rx.try_recv() {
                results.push(result);
            }
        }
        self.in_flight = self.in_flight.saturating_sub(results.len());
        results
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Reads a module on the calling thread. For tooling only; the event loop uses [`PartLoader::request`].
    pub fn load_blocking(&self, raw_id: &str) -> Result<PartModule, ModuleResolutionError> {
        let id = PartId::parse(raw_id)?;
        read_part_module(&self.parts_dir, &id)
    }

    /// Ids of the module files present in the parts directory.
    pub fn available(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.parts_dir) else {
            return Vec::new();
        };
        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
            .filter_map(|path| path.file_stem().and_then(|stem| stem.to_str()).map(str::to_string))
            .filter(|stem| PartId::parse(stem).is_ok())
            .collect();
        ids.sort();
        ids
    }
}
