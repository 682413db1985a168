//! Directories
//! -----------
//!
//! A directory keeps its own table of attached children. That table drives link
//! accounting and is what `add_item`/`remove_item` check names against; it is never
//! written to disk and lives only as long as the `Directory` value.
//!
//! Link counting follows hard-link semantics:
//!
//! - attaching a file adds one link to the file,
//! - attaching a directory adds two links to the child (its own `.` and the parent's
//!   entry for it) and one to the parent (the child's `..`).
//!
//! Detaching reverses exactly what attaching did.
//!
//! `get_item` answers from the table first and only consults the backing store for names
//! the table does not know, building a fresh, unattached entry of the right kind.
use std::borrow::Cow;
use std::collections::hash_map::{self, HashMap};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, trace};

use crate::bridge::Bridge;
use crate::entry::{Attributes, Entry, Item};
use crate::error::{Error, Result};
use crate::file::File;

#[derive(Debug, Clone)]
pub struct Directory {
    item: Item,
    children: HashMap<OsString, Entry>,
}

/// Link-count contribution of attaching `entry`: (to the child, to the parent).
fn link_counts(entry: &Entry) -> (u64, u64) {
    if entry.is_dir() {
        (2, 1)
    } else {
        (1, 0)
    }
}

fn validate_name(name: &OsStr) -> Result<()> {
    let bytes = name.as_bytes();
    let reserved = bytes.is_empty() || bytes == b"." || bytes == b"..";
    if reserved || bytes.iter().any(|b| *b == b'/' || *b == 0) {
        return Err(Error::InvalidArgument(format!("invalid entry name: {:?}", name)));
    }
    Ok(())
}

impl Directory {
    pub fn new<P: Into<PathBuf>>(path: P, bridge: Arc<Bridge>) -> Directory {
        Directory {
            item: Item::new(path.into(), bridge),
            children: HashMap::new(),
        }
    }

    /// Attach `entry` under `name` and return the stored entry.
    pub fn add_item<N: Into<OsString>>(&mut self, name: N, entry: Entry) -> Result<&mut Entry> {
        let name = name.into();
        validate_name(&name)?;
        match self.children.entry(name) {
            hash_map::Entry::Occupied(slot) => Err(Error::AlreadyExists(
                slot.key().to_string_lossy().into_owned(),
            )),
            hash_map::Entry::Vacant(slot) => {
                let mut entry = entry;
                let (child, parent) = link_counts(&entry);
                entry.item_mut().attach(child);
                self.item.link(parent);
                self.item.touch();
                debug!(
                    "attached {} {:?} to {} (links {}, parent links {})",
                    entry,
                    slot.key(),
                    self.item.path().display(),
                    entry.links(),
                    self.item.links()
                );
                Ok(slot.insert(entry))
            }
        }
    }

    /// Detach the entry under `name` and hand it back.
    ///
    /// Fails with `LinkCountMismatch`, leaving everything as it was, when the stored entry
    /// no longer holds the links attaching it gave it.
    pub fn remove_item<N: AsRef<OsStr>>(&mut self, name: N) -> Result<Entry> {
        let name = name.as_ref();
        let lossy = || name.to_string_lossy().into_owned();
        let mut entry = self.children.remove(name).ok_or_else(|| Error::NotFound(lossy()))?;
        let (child, parent) = link_counts(&entry);
        if self.item.links() < parent || entry.item_mut().detach(child).is_none() {
            self.children.insert(name.to_os_string(), entry);
            return Err(Error::LinkCountMismatch(lossy()));
        }
        self.item.unlink(parent).ok_or_else(|| Error::LinkCountMismatch(lossy()))?;
        self.item.touch();
        debug!(
            "detached {} {:?} from {} (links {}, parent links {})",
            entry,
            name,
            self.item.path().display(),
            entry.links(),
            self.item.links()
        );
        Ok(entry)
    }

    /// Look `name` up, attached children first, then the backing store.
    ///
    /// Returns `Ok(None)` when nothing exists under that name. Any other backing-store
    /// failure is returned as an error.
    pub fn get_item<N: AsRef<OsStr>>(&self, name: N) -> Result<Option<Cow<'_, Entry>>> {
        let name = name.as_ref();
        validate_name(name)?;
        if let Some(entry) = self.children.get(name) {
            return Ok(Some(Cow::Borrowed(entry)));
        }
        let path = self.item.path().join(name);
        Ok(self.item.bridge().resolve(path)?.map(Cow::Owned))
    }

    /// Names present in the backing directory, in the order the host yields them.
    pub fn list(&self) -> Result<Vec<OsString>> {
        let path = self.item.path();
        trace!("readdir {}", path.display());
        let names = self.item.bridge().elevated(|| {
            fs::read_dir(path)?
                .map(|entry| entry.map(|e| e.file_name()))
                .collect::<std::io::Result<Vec<_>>>()
        })?;
        Ok(names)
    }

    /// An attached child.
    pub fn child<N: AsRef<OsStr>>(&self, name: N) -> Option<&Entry> {
        self.children.get(name.as_ref())
    }

    /// An attached file, for attribute changes. The entry itself cannot be swapped out.
    pub fn file_mut<N: AsRef<OsStr>>(&mut self, name: N) -> Option<&mut File> {
        self.children.get_mut(name.as_ref()).and_then(Entry::as_file_mut)
    }

    /// An attached directory, for attribute changes and nested mutation.
    pub fn directory_mut<N: AsRef<OsStr>>(&mut self, name: N) -> Option<&mut Directory> {
        self.children.get_mut(name.as_ref()).and_then(Entry::as_directory_mut)
    }

    /// Attached children, in no particular order.
    pub fn children(&self) -> impl Iterator<Item = (&OsStr, &Entry)> {
        self.children.iter().map(|(name, entry)| (name.as_os_str(), entry))
    }
}

impl Attributes for Directory {
    fn item(&self) -> &Item {
        &self.item
    }

    fn item_mut(&mut self) -> &mut Item {
        &mut self.item
    }
}
