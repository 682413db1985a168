//! Entries
//! -------
//!
//! An entry mirrors one backing path. Ownership, mode and timestamps live in the backing
//! store and are re-read on every call; the hard-link count and timestamp overrides live
//! only in the bridge.
//!
//! `Entry` is the tagged variant over the two kinds. The [`Attributes`] trait carries the
//! operations every kind shares, so they can be called on a `File`, a `Directory` or an
//! `Entry` alike.
use std::fs;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use filetime::FileTime;
use log::trace;

use crate::bridge::Bridge;
use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::file::File;
use crate::permissions::{self, Access, PERMISSION_MASK};
use crate::record::{MetadataRecord, Stat, Timespec};

/// Timestamps recorded in memory by the `set_*time` mutators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    pub atime: Option<DateTime<Utc>>,
    pub mtime: Option<DateTime<Utc>>,
    pub ctime: Option<DateTime<Utc>>,
    pub birthtime: Option<DateTime<Utc>>,
}

/// State shared by every kind of entry.
#[derive(Debug, Clone)]
pub struct Item {
    path: PathBuf,
    links: u64,
    attached: u64,
    times: Overrides,
    bridge: Arc<Bridge>,
}

impl Item {
    pub(crate) fn new(path: PathBuf, bridge: Arc<Bridge>) -> Item {
        Item {
            path,
            links: 0,
            attached: 0,
            times: Overrides::default(),
            bridge,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn links(&self) -> u64 {
        self.links
    }

    pub fn overrides(&self) -> &Overrides {
        &self.times
    }

    pub fn bridge(&self) -> &Arc<Bridge> {
        &self.bridge
    }

    /// Number of directories this entry is currently attached to.
    pub fn attached(&self) -> u64 {
        self.attached
    }

    pub(crate) fn link(&mut self, count: u64) {
        self.links += count;
    }

    /// `None`, with nothing changed, when fewer than `count` links are held.
    pub(crate) fn unlink(&mut self, count: u64) -> Option<()> {
        self.links = self.links.checked_sub(count)?;
        Some(())
    }

    pub(crate) fn attach(&mut self, count: u64) {
        self.links += count;
        self.attached += 1;
    }

    /// Reverse one `attach(count)`; `None`, with nothing changed, if it was never applied.
    pub(crate) fn detach(&mut self, count: u64) -> Option<()> {
        let links = self.links.checked_sub(count)?;
        let attached = self.attached.checked_sub(1)?;
        self.links = links;
        self.attached = attached;
        Some(())
    }

    /// Record a structural change to this entry without touching the backing store.
    pub(crate) fn touch(&mut self) {
        self.times.mtime = Some(Utc::now());
    }

    pub(crate) fn stat(&self) -> Result<fs::Metadata> {
        trace!("stat {}", self.path.display());
        Ok(self.bridge.elevated(|| fs::metadata(&self.path))?)
    }
}

fn to_datetime(sec: i64, nsec: i64) -> Result<DateTime<Utc>> {
    u32::try_from(nsec)
        .ok()
        .and_then(|n| DateTime::from_timestamp(sec, n))
        .ok_or(Error::InvalidTimestamp(sec, nsec))
}

fn to_filetime(time: DateTime<Utc>) -> FileTime {
    FileTime::from_unix_time(time.timestamp(), time.timestamp_subsec_nanos())
}

/// Operations shared by files and directories.
pub trait Attributes {
    fn item(&self) -> &Item;
    fn item_mut(&mut self) -> &mut Item;

    fn path(&self) -> &Path {
        self.item().path()
    }

    /// Bridge-maintained hard-link count.
    fn links(&self) -> u64 {
        self.item().links()
    }

    fn can_read(&self) -> Result<bool> {
        self.can(Access::Read)
    }

    fn can_write(&self) -> Result<bool> {
        self.can(Access::Write)
    }

    fn can_execute(&self) -> Result<bool> {
        self.can(Access::Execute)
    }

    /// Evaluate `access` for the bridge's simulated caller.
    fn can(&self, access: Access) -> Result<bool> {
        let caller = self.item().bridge().identity();
        if caller.is_superuser() {
            return Ok(true);
        }
        let metadata = self.item().stat()?;
        Ok(permissions::allows(
            &caller,
            metadata.uid(),
            metadata.gid(),
            metadata.mode(),
            access,
        ))
    }

    /// Permission bits only, e.g. `0o644`.
    fn mode(&self) -> Result<u32> {
        Ok(self.item().stat()?.mode() & PERMISSION_MASK)
    }

    fn set_mode(&mut self, mode: u32) -> Result<()> {
        let item = self.item();
        trace!("chmod {:o} {}", mode, item.path.display());
        item.bridge.elevated(|| {
            fs::set_permissions(&item.path, fs::Permissions::from_mode(mode & PERMISSION_MASK))
        })?;
        Ok(())
    }

    fn uid(&self) -> Result<u32> {
        Ok(self.item().stat()?.uid())
    }

    /// Change the owner, keeping the current group.
    fn set_uid(&mut self, uid: u32) -> Result<()> {
        let item = self.item();
        trace!("chown uid {} {}", uid, item.path.display());
        item.bridge.elevated(|| {
            let current = fs::metadata(&item.path)?;
            std::os::unix::fs::chown(&item.path, Some(uid), Some(current.gid()))
        })?;
        Ok(())
    }

    fn gid(&self) -> Result<u32> {
        Ok(self.item().stat()?.gid())
    }

    /// Change the group, keeping the current owner.
    fn set_gid(&mut self, gid: u32) -> Result<()> {
        let item = self.item();
        trace!("chown gid {} {}", gid, item.path.display());
        item.bridge.elevated(|| {
            let current = fs::metadata(&item.path)?;
            std::os::unix::fs::chown(&item.path, Some(current.uid()), Some(gid))
        })?;
        Ok(())
    }

    fn atime(&self) -> Result<DateTime<Utc>> {
        match self.item().times.atime {
            Some(atime) => Ok(atime),
            None => {
                let metadata = self.item().stat()?;
                to_datetime(metadata.atime(), metadata.atime_nsec())
            }
        }
    }

    /// Write the access time through to the backing store and remember it.
    fn set_atime(&mut self, atime: DateTime<Utc>) -> Result<()> {
        let item = self.item_mut();
        item.bridge
            .elevated(|| filetime::set_file_atime(&item.path, to_filetime(atime)))?;
        item.times.atime = Some(atime);
        Ok(())
    }

    fn mtime(&self) -> Result<DateTime<Utc>> {
        match self.item().times.mtime {
            Some(mtime) => Ok(mtime),
            None => {
                let metadata = self.item().stat()?;
                to_datetime(metadata.mtime(), metadata.mtime_nsec())
            }
        }
    }

    /// Write the modification time through to the backing store and remember it.
    fn set_mtime(&mut self, mtime: DateTime<Utc>) -> Result<()> {
        let item = self.item_mut();
        item.bridge
            .elevated(|| filetime::set_file_mtime(&item.path, to_filetime(mtime)))?;
        item.times.mtime = Some(mtime);
        Ok(())
    }

    fn ctime(&self) -> Result<DateTime<Utc>> {
        match self.item().times.ctime {
            Some(ctime) => Ok(ctime),
            None => {
                let metadata = self.item().stat()?;
                to_datetime(metadata.ctime(), metadata.ctime_nsec())
            }
        }
    }

    /// The host offers no way to set a change time; the value is held in memory only.
    fn set_ctime(&mut self, ctime: DateTime<Utc>) {
        self.item_mut().times.ctime = Some(ctime);
    }

    /// Creation time, or the change time on hosts that do not record one.
    fn birthtime(&self) -> Result<DateTime<Utc>> {
        match self.item().times.birthtime {
            Some(birthtime) => Ok(birthtime),
            None => {
                let stat = Stat::from_metadata(&self.item().stat()?);
                to_datetime(stat.birthtime.sec, stat.birthtime.nsec)
            }
        }
    }

    /// Held in memory only, like `set_ctime`.
    fn set_birthtime(&mut self, birthtime: DateTime<Utc>) {
        self.item_mut().times.birthtime = Some(birthtime);
    }

    /// Assemble the transport's stat record from one query of the backing store.
    ///
    /// Fields are copied verbatim except the link count, which reports the bridge's own
    /// count once the entry is attached to a directory, and timestamps that carry an
    /// override.
    fn metadata_record(&self, wide: bool) -> Result<MetadataRecord> {
        let item = self.item();
        let mut stat = Stat::from_metadata(&item.stat()?);
        if item.attached > 0 {
            stat.nlink = item.links;
        }
        if let Some(atime) = item.times.atime {
            stat.atime = Timespec::from(atime);
        }
        if let Some(mtime) = item.times.mtime {
            stat.mtime = Timespec::from(mtime);
        }
        if let Some(ctime) = item.times.ctime {
            stat.ctime = Timespec::from(ctime);
        }
        if let Some(birthtime) = item.times.birthtime {
            stat.birthtime = Timespec::from(birthtime);
        }
        Ok(MetadataRecord::encode(&stat, wide))
    }
}

/// A file or a directory.
#[derive(Debug, Clone)]
pub enum Entry {
    File(File),
    Directory(Directory),
}

impl Entry {
    pub fn is_file(&self) -> bool {
        matches!(self, Entry::File(_))
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Entry::Directory(_))
    }

    pub fn as_file(&self) -> Option<&File> {
        match self {
            Entry::File(file) => Some(file),
            Entry::Directory(_) => None,
        }
    }

    pub fn as_file_mut(&mut self) -> Option<&mut File> {
        match self {
            Entry::File(file) => Some(file),
            Entry::Directory(_) => None,
        }
    }

    pub fn as_directory(&self) -> Option<&Directory> {
        match self {
            Entry::Directory(dir) => Some(dir),
            Entry::File(_) => None,
        }
    }

    pub fn as_directory_mut(&mut self) -> Option<&mut Directory> {
        match self {
            Entry::Directory(dir) => Some(dir),
            Entry::File(_) => None,
        }
    }

    /// The file, or `InvalidArgument` when this is a directory.
    pub fn into_file(self) -> Result<File> {
        match self {
            Entry::File(file) => Ok(file),
            Entry::Directory(dir) => Err(Error::InvalidArgument(format!(
                "{} is a directory",
                dir.path().display()
            ))),
        }
    }

    /// The directory, or `InvalidArgument` when this is a file.
    pub fn into_directory(self) -> Result<Directory> {
        match self {
            Entry::Directory(dir) => Ok(dir),
            Entry::File(file) => Err(Error::InvalidArgument(format!(
                "{} is not a directory",
                file.path().display()
            ))),
        }
    }
}

impl Attributes for Entry {
    fn item(&self) -> &Item {
        match self {
            Entry::File(file) => file.item(),
            Entry::Directory(dir) => dir.item(),
        }
    }

    fn item_mut(&mut self) -> &mut Item {
        match self {
            Entry::File(file) => file.item_mut(),
            Entry::Directory(dir) => dir.item_mut(),
        }
    }
}

impl From<File> for Entry {
    fn from(file: File) -> Self {
        Entry::File(file)
    }
}

impl From<Directory> for Entry {
    fn from(dir: Directory) -> Self {
        Entry::Directory(dir)
    }
}

impl std::fmt::Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Entry::File(_) => write!(f, "[File]"),
            Entry::Directory(_) => write!(f, "[Directory]"),
        }
    }
}
