//! Disk-backed filesystem entries for a filesystem bridge.
//!
//! Files and directories here mirror real paths, but the bridge, not the host, decides
//! who may access them, counts their hard links and shapes the metadata exported to the
//! transport. Backing-store calls run inside an [`Elevation`] scope so the host's own
//! permission checks never get in the way.
//!
//! ```rust,no_run
//! use realfs::{Attributes, Bridge, BridgeConfig};
//!
//! fn main() -> realfs::Result<()> {
//!     let bridge = Bridge::new(&BridgeConfig::from_file("bridge.json")?);
//!     let mut root = bridge.open_directory("/srv/export");
//!     let found = root.get_item("notes.txt")?.map(|entry| entry.into_owned());
//!     if let Some(entry) = found {
//!         if entry.can_read()? {
//!             let record = entry.metadata_record(true)?;
//!             println!("{} bytes", record.get(realfs::Field::Size));
//!         }
//!         root.add_item("notes.txt", entry)?;
//!     }
//!     Ok(())
//! }
//! ```

#[cfg(not(unix))]
compile_error!("realfs only supports Unix targets.");

#[macro_use]
extern crate serde_derive;

pub mod bridge;
pub mod config;
pub mod directory;
pub mod elevation;
pub mod entry;
pub mod error;
pub mod file;
pub mod identity;
pub mod permissions;
pub mod record;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use directory::Directory;
pub use elevation::Elevation;
pub use entry::{Attributes, Entry, Item, Overrides};
pub use error::{Error, Result};
pub use file::{Content, File};
pub use identity::Identity;
pub use permissions::Access;
pub use record::{Field, MetadataRecord, Stat, Timespec, SLOTS};
