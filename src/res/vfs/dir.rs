use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::errors::Result;

use super::{Item, ItemKind, Mount};

/// A mount rooted on a directory of the local host filesystem.
#[derive(Debug, Clone)]
pub struct Directory {
    root: PathBuf,
}

impl Directory {
    pub fn new<T: Into<PathBuf>>(root: T) -> Result<Self> {
        let root = root.into();
        info!("Creates directory based mount at {:?}.", root);

        let metadata = fs::metadata(&root)?;
        if metadata.is_dir() {
            Ok(Directory { root })
        } else {
            bail!("Directory mount must be associated with a readable directory.");
        }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `path` under the root. Paths that could step out of the root, like
    /// `../secret` or drive prefixes, are rejected.
    fn locate(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        for v in relative.components() {
            match v {
                Component::Normal(_) | Component::CurDir => {}
                _ => bail!("Path {} is outside of directory mount.", path),
            }
        }

        Ok(self.root.join(relative))
    }
}

impl Mount for Directory {
    fn enumerate(&self, path: &str) -> Vec<Item> {
        let entries = match self.locate(path).and_then(|v| Ok(fs::read_dir(v)?)) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut items: Vec<_> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let metadata = entry.metadata().ok()?;
                let mtime = metadata
                    .modified()
                    .ok()
                    .and_then(|v| v.duration_since(UNIX_EPOCH).ok())
                    .map(|v| v.as_secs())
                    .unwrap_or(0);

                let (kind, size) = if metadata.is_dir() {
                    (ItemKind::Directory, 0)
                } else {
                    (ItemKind::File, metadata.len())
                };

                Some(Item {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    kind,
                    size,
                    mtime,
                })
            })
            .collect();

        items.sort_by(|lhs, rhs| lhs.name.cmp(&rhs.name));
        items
    }

    fn read(&self, path: &str) -> Vec<u8> {
        match self.locate(path) {
            Ok(location) => fs::read(location).unwrap_or_default(),
            Err(err) => {
                warn!("{}", err);
                Vec::new()
            }
        }
    }

    fn write(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let location = self.locate(path)?;
        if let Some(parent) = location.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(location, bytes)?;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        let location = self.locate(path)?;
        if location == self.root {
            bail!("Could not delete the root of directory mount.");
        }

        if location.is_dir() {
            fs::remove_dir_all(location)?;
        } else {
            fs::remove_file(location)?;
        }

        Ok(())
    }
}
