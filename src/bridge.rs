//! Shared runtime settings every entry carries.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::trace;

use crate::config::BridgeConfig;
use crate::directory::Directory;
use crate::elevation::Elevation;
use crate::entry::Entry;
use crate::error::{is_absent_io, Result};
use crate::file::File;
use crate::identity::Identity;
use crate::permissions;

/// Identity, elevation mode and platform fix-up shared by all entries of one bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bridge {
    identity: Identity,
    elevation: Elevation,
    fix_platform_permissions: bool,
}

impl Bridge {
    pub fn new(config: &BridgeConfig) -> Arc<Bridge> {
        Arc::new(Bridge {
            identity: config.identity.unwrap_or_else(Identity::current),
            elevation: config.elevation,
            fix_platform_permissions: config.fix_platform_permissions,
        })
    }

    /// A bridge acting as `identity` with ambient elevation.
    pub fn with_identity(identity: Identity) -> Arc<Bridge> {
        Bridge::new(&BridgeConfig {
            identity: Some(identity),
            ..BridgeConfig::default()
        })
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn elevation(&self) -> Elevation {
        self.elevation
    }

    /// Run a backing-store operation inside this bridge's elevation scope.
    pub fn elevated<T, F>(&self, op: F) -> io::Result<T>
    where
        F: FnOnce() -> io::Result<T>,
    {
        self.elevation.run(op)
    }

    /// Apply the platform execute-bit fix-up if this bridge has it enabled.
    ///
    /// Called by the layer that builds directory entries; nothing inside the core applies
    /// it on its own.
    pub fn fix_platform_permissions(&self, mode: u32) -> u32 {
        permissions::fix_platform_permissions(mode, self.fix_platform_permissions)
    }

    pub fn open_file<P: Into<PathBuf>>(self: &Arc<Self>, path: P) -> File {
        File::new(path, Arc::clone(self))
    }

    pub fn open_directory<P: Into<PathBuf>>(self: &Arc<Self>, path: P) -> Directory {
        Directory::new(path, Arc::clone(self))
    }

    /// Classify a backing path into a fresh entry, `None` when nothing exists there.
    pub fn resolve<P: AsRef<Path>>(self: &Arc<Self>, path: P) -> Result<Option<Entry>> {
        let path = path.as_ref();
        trace!("stat {}", path.display());
        match self.elevated(|| fs::metadata(path)) {
            Ok(metadata) if metadata.is_dir() => Ok(Some(Entry::Directory(self.open_directory(path)))),
            Ok(_) => Ok(Some(Entry::File(self.open_file(path)))),
            Err(err) if is_absent_io(&err) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
