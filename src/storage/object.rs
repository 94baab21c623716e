//! Object store backends
//!
//! `FsObjectStore` maps a bucket onto a directory tree; `MemoryObjectStore`
//! keeps everything in a map and backs tests and dry runs.

use crate::storage::traits::{ObjectStore, StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Prefix of in-progress writes; such files are never listed
const PARTIAL_PREFIX: &str = ".partial-";

/// Prefix of files holding an object whose name is too long for the filesystem
const LONG_PREFIX: &str = ".long-";

/// Longest key accepted, matching common bucket stores
const MAX_KEY_BYTES: usize = 1024;

/// Longest file or directory name most filesystems accept
const MAX_NAME_BYTES: usize = 255;

/// Validates an object key and splits it into path segments
///
/// Keys are limited to [`MAX_KEY_BYTES`]. The last segment may be of any
/// length within that; directory segments must fit a file name.
fn key_segments(key: &str) -> StorageResult<Vec<&str>> {
    if key.is_empty() || key.len() > MAX_KEY_BYTES || key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    let segments: Vec<&str> = key.split('/').collect();
    let valid = segments.iter().all(|segment| {
        !segment.is_empty()
            && *segment != "."
            && *segment != ".."
            && !segment.starts_with(PARTIAL_PREFIX)
            && !segment.starts_with(LONG_PREFIX)
    });
    let dirs_fit = segments[..segments.len() - 1]
        .iter()
        .all(|segment| segment.len() <= MAX_NAME_BYTES);

    if valid && dirs_fit {
        Ok(segments)
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// File body for an object stored under a hashed name
///
/// The key is kept beside the value so listings can report it.
#[derive(Debug, Serialize, Deserialize)]
struct LongKeyObject {
    key: String,
    value: Value,
}

/// File name for a last key segment longer than a file name may be
fn long_name(segment: &str) -> String {
    format!("{}{}", LONG_PREFIX, hex::encode(Sha256::digest(segment.as_bytes())))
}

/// Object store rooted at a local directory
///
/// The root plays the role of the bucket. A key `pages/Acme/x.json` lives at
/// `<root>/pages/Acme/x.json`. When the last segment does not fit a file
/// name, the object is written to `.long-<sha256 of the segment>` in the same
/// directory, with the key stored inside the file.
#[derive(Debug)]
pub struct FsObjectStore {
    root: PathBuf,
    write_seq: AtomicU64,
}

impl FsObjectStore {
    /// Opens (creating if needed) a bucket directory
    ///
    /// An empty root path is a configuration error.
    pub fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref();
        if root.as_os_str().is_empty() {
            return Err(StorageError::Config(
                "object store root path is empty".to_string(),
            ));
        }

        fs::create_dir_all(root)?;
        tracing::debug!("Opened object store at {}", root.display());

        Ok(Self {
            root: root.to_path_buf(),
            write_seq: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding `key`, and whether it uses a hashed name
    fn path_for(&self, key: &str) -> StorageResult<(PathBuf, bool)> {
        let segments = key_segments(key)?;
        let (name, dirs) = segments
            .split_last()
            .ok_or_else(|| StorageError::InvalidKey(key.to_string()))?;

        let dir = dirs
            .iter()
            .fold(self.root.clone(), |path, segment| path.join(segment));
        if name.len() > MAX_NAME_BYTES {
            Ok((dir.join(long_name(name)), true))
        } else {
            Ok((dir.join(name), false))
        }
    }

    /// Directory holding keys under `dir_key`
    fn dir_path(&self, dir_key: &str) -> StorageResult<PathBuf> {
        let segments = key_segments(dir_key)?;
        if segments.iter().any(|segment| segment.len() > MAX_NAME_BYTES) {
            return Err(StorageError::InvalidKey(dir_key.to_string()));
        }
        Ok(segments
            .iter()
            .fold(self.root.clone(), |path, segment| path.join(segment)))
    }

    /// Key recorded inside a hashed-name file
    fn read_long_key(path: &Path) -> StorageResult<String> {
        let object: LongKeyObject = serde_json::from_slice(&fs::read(path)?)?;
        Ok(object.key)
    }

    /// Recursively collects keys below `dir`, whose key form is `dir_key`
    fn collect_keys(dir: &Path, dir_key: &str, keys: &mut Vec<String>) -> StorageResult<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                tracing::warn!("Skipping non UTF-8 object name in {}", dir.display());
                continue;
            };
            if name.starts_with(PARTIAL_PREFIX) {
                continue;
            }

            let file_type = entry.file_type()?;
            if name.starts_with(LONG_PREFIX) {
                if file_type.is_file() {
                    match Self::read_long_key(&entry.path()) {
                        Ok(key) => keys.push(key),
                        Err(e) => tracing::warn!(
                            "Skipping unreadable object {}: {}",
                            entry.path().display(),
                            e
                        ),
                    }
                }
                continue;
            }

            let key = if dir_key.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", dir_key, name)
            };

            if file_type.is_dir() {
                Self::collect_keys(&entry.path(), &key, keys)?;
            } else if file_type.is_file() {
                keys.push(key);
            }
        }
        Ok(())
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, key: &str, value: &Value) -> StorageResult<()> {
        let (path, long) = self.path_for(key)?;
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::InvalidKey(key.to_string()))?;
        fs::create_dir_all(parent)?;

        let body = if long {
            serde_json::to_vec(&LongKeyObject {
                key: key.to_string(),
                value: value.clone(),
            })?
        } else {
            serde_json::to_vec(value)?
        };

        // Write beside the target, then rename over it
        let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
        let partial = parent.join(format!("{}{}-{}", PARTIAL_PREFIX, std::process::id(), seq));
        let write_result = (|| -> std::io::Result<()> {
            let mut file = fs::File::create(&partial)?;
            file.write_all(&body)?;
            file.sync_all()?;
            fs::rename(&partial, &path)
        })();

        if let Err(e) = write_result {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }

        tracing::trace!("Stored {} ({} bytes)", key, body.len());
        Ok(())
    }

    fn list(&self, prefix: &str) -> StorageResult<Option<Vec<String>>> {
        // Start from the deepest directory the prefix names
        let dir_key = match prefix.rfind('/') {
            Some(idx) => &prefix[..idx],
            None => "",
        };

        let start = if dir_key.is_empty() {
            self.root.clone()
        } else {
            match self.dir_path(dir_key) {
                Ok(path) => path,
                Err(StorageError::InvalidKey(_)) => return Ok(None),
                Err(e) => return Err(e),
            }
        };

        if !start.is_dir() {
            return Ok(None);
        }

        let mut keys = Vec::new();
        Self::collect_keys(&start, dir_key, &mut keys)?;
        keys.retain(|key| key.starts_with(prefix));
        keys.sort();

        if keys.is_empty() {
            Ok(None)
        } else {
            Ok(Some(keys))
        }
    }

    fn get(&self, key: &str) -> StorageResult<Value> {
        let (path, long) = self.path_for(key)?;
        let body = match fs::read(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        if !long {
            return Ok(serde_json::from_slice(&body)?);
        }
        let object: LongKeyObject = serde_json::from_slice(&body)?;
        if object.key != key {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(object.value)
    }
}

/// In-memory object store
///
/// Values are kept serialized so reads go through the same JSON decoding as
/// the filesystem backend.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.read().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::Backend("object map lock poisoned".to_string())
}

impl ObjectStore for MemoryObjectStore {
    fn put(&self, key: &str, value: &Value) -> StorageResult<()> {
        key_segments(key)?;
        let body = serde_json::to_vec(value)?;
        self.objects
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), body);
        Ok(())
    }

    fn list(&self, prefix: &str) -> StorageResult<Option<Vec<String>>> {
        let objects = self.objects.read().map_err(poisoned)?;
        let keys: Vec<String> = objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();

        if keys.is_empty() {
            Ok(None)
        } else {
            Ok(Some(keys))
        }
    }

    fn get(&self, key: &str) -> StorageResult<Value> {
        let objects = self.objects.read().map_err(poisoned)?;
        let body = objects
            .get(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(serde_json::from_slice(body)?)
    }
}
