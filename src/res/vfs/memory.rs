use std::sync::RwLock;

use crate::errors::Result;
use crate::utils::prelude::FastHashMap;

use super::{Item, ItemKind, Mount};

/// A mount that keeps every file in memory. Folders are implied by the `/` separated
/// file paths and never stored on their own.
#[derive(Debug, Default)]
pub struct MemoryMount {
    files: RwLock<FastHashMap<String, Vec<u8>>>,
}

impl MemoryMount {
    pub fn new() -> Self {
        MemoryMount::default()
    }

    /// Adds or replaces a file, returning `self` for chaining during setup.
    pub fn with<T1, T2>(self, path: T1, bytes: T2) -> Self
    where
        T1: Into<String>,
        T2: Into<Vec<u8>>,
    {
        self.insert(path, bytes);
        self
    }

    /// Adds or replaces a file.
    pub fn insert<T1, T2>(&self, path: T1, bytes: T2)
    where
        T1: Into<String>,
        T2: Into<Vec<u8>>,
    {
        self.files
            .write()
            .unwrap()
            .insert(path.into(), bytes.into());
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.files.read().unwrap().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Mount for MemoryMount {
    fn enumerate(&self, path: &str) -> Vec<Item> {
        let prefix = path.trim_end_matches('/');
        let files = self.files.read().unwrap();
        let mut items: Vec<Item> = Vec::new();

        for (k, v) in files.iter() {
            let rest = if prefix.is_empty() {
                k.as_str()
            } else if k.starts_with(prefix) && k[prefix.len()..].starts_with('/') {
                &k[(prefix.len() + 1)..]
            } else {
                continue;
            };

            let item = match rest.find('/') {
                Some(index) => Item {
                    name: rest[..index].to_owned(),
                    kind: ItemKind::Directory,
                    size: 0,
                    mtime: 0,
                },
                None => Item {
                    name: rest.to_owned(),
                    kind: ItemKind::File,
                    size: v.len() as u64,
                    mtime: 0,
                },
            };

            if !items.iter().any(|v| v.name == item.name) {
                items.push(item);
            }
        }

        items.sort_by(|lhs, rhs| lhs.name.cmp(&rhs.name));
        items
    }

    fn read(&self, path: &str) -> Vec<u8> {
        self.files
            .read()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    fn write(&self, path: &str, bytes: &[u8]) -> Result<()> {
        self.insert(path, bytes);
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        let mut files = self.files.write().unwrap();
        if files.remove(path).is_some() {
            return Ok(());
        }

        let prefix = format!("{}/", path.trim_end_matches('/'));
        let len = files.len();
        files.retain(|k, _| !k.starts_with(&prefix));

        if files.len() == len {
            bail!("Path {} does not exist.", path);
        }

        Ok(())
    }
}
