//! Metadata records
//! ----------------
//!
//! The transport reads entry metadata as a flat array of 36 eight-byte numbers laid out
//! like a native `stat` result:
//!
//! ```ascii
//!     [0]  dev            [9]  blocks
//!     [1]  mode           [10] atime sec      [11] atime nsec
//!     [2]  nlink          [12] mtime sec      [13] mtime nsec
//!     [3]  uid            [14] ctime sec      [15] ctime nsec
//!     [4]  gid            [16] birthtime sec  [17] birthtime nsec
//!     [5]  rdev           [18..36] reserved, always zero
//!     [6]  blksize
//!     [7]  ino
//!     [8]  size
//! ```
//!
//! Each slot is either an IEEE-754 double (`Float`) or a signed 64-bit integer (`Wide`),
//! in native byte order. Both encodings are built from the same integer values, so any
//! slot converted to `f64` is identical across the two.
use std::fs::Metadata;
use std::io::Write;
use std::os::unix::fs::MetadataExt;

use byteorder::{NativeEndian, WriteBytesExt};
use chrono::{DateTime, Utc};

pub const SLOTS: usize = 36;

/// Named slots of a [`MetadataRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Dev = 0,
    Mode = 1,
    Nlink = 2,
    Uid = 3,
    Gid = 4,
    Rdev = 5,
    Blksize = 6,
    Ino = 7,
    Size = 8,
    Blocks = 9,
    AtimeSec = 10,
    AtimeNsec = 11,
    MtimeSec = 12,
    MtimeNsec = 13,
    CtimeSec = 14,
    CtimeNsec = 15,
    BirthtimeSec = 16,
    BirthtimeNsec = 17,
}

impl Field {
    pub const ALL: [Field; 18] = [
        Field::Dev,
        Field::Mode,
        Field::Nlink,
        Field::Uid,
        Field::Gid,
        Field::Rdev,
        Field::Blksize,
        Field::Ino,
        Field::Size,
        Field::Blocks,
        Field::AtimeSec,
        Field::AtimeNsec,
        Field::MtimeSec,
        Field::MtimeNsec,
        Field::CtimeSec,
        Field::CtimeNsec,
        Field::BirthtimeSec,
        Field::BirthtimeNsec,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Seconds and nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timespec {
    pub sec: i64,
    pub nsec: i64,
}

impl From<DateTime<Utc>> for Timespec {
    fn from(time: DateTime<Utc>) -> Self {
        Timespec {
            sec: time.timestamp(),
            nsec: i64::from(time.timestamp_subsec_nanos()),
        }
    }
}

/// The backing store's view of an entry, before encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stat {
    pub dev: u64,
    pub mode: u32,
    pub nlink: u64,
    pub uid: u32,
    pub gid: u32,
    pub rdev: u64,
    pub blksize: u64,
    pub ino: u64,
    pub size: u64,
    pub blocks: u64,
    pub atime: Timespec,
    pub mtime: Timespec,
    pub ctime: Timespec,
    pub birthtime: Timespec,
}

impl Stat {
    pub fn from_metadata(metadata: &Metadata) -> Stat {
        let ctime = Timespec {
            sec: metadata.ctime(),
            nsec: metadata.ctime_nsec(),
        };
        // Hosts that do not record a birth time report the change time instead.
        let birthtime = metadata
            .created()
            .map(|created| Timespec::from(DateTime::<Utc>::from(created)))
            .unwrap_or(ctime);

        Stat {
            dev: metadata.dev(),
            mode: metadata.mode(),
            nlink: metadata.nlink(),
            uid: metadata.uid(),
            gid: metadata.gid(),
            rdev: metadata.rdev(),
            blksize: metadata.blksize(),
            ino: metadata.ino(),
            size: metadata.size(),
            blocks: metadata.blocks(),
            atime: Timespec {
                sec: metadata.atime(),
                nsec: metadata.atime_nsec(),
            },
            mtime: Timespec {
                sec: metadata.mtime(),
                nsec: metadata.mtime_nsec(),
            },
            ctime,
            birthtime,
        }
    }

    fn slots(&self) -> [i64; SLOTS] {
        let mut slots = [0i64; SLOTS];
        slots[Field::Dev.index()] = self.dev as i64;
        slots[Field::Mode.index()] = i64::from(self.mode);
        slots[Field::Nlink.index()] = self.nlink as i64;
        slots[Field::Uid.index()] = i64::from(self.uid);
        slots[Field::Gid.index()] = i64::from(self.gid);
        slots[Field::Rdev.index()] = self.rdev as i64;
        slots[Field::Blksize.index()] = self.blksize as i64;
        slots[Field::Ino.index()] = self.ino as i64;
        slots[Field::Size.index()] = self.size as i64;
        slots[Field::Blocks.index()] = self.blocks as i64;
        slots[Field::AtimeSec.index()] = self.atime.sec;
        slots[Field::AtimeNsec.index()] = self.atime.nsec;
        slots[Field::MtimeSec.index()] = self.mtime.sec;
        slots[Field::MtimeNsec.index()] = self.mtime.nsec;
        slots[Field::CtimeSec.index()] = self.ctime.sec;
        slots[Field::CtimeNsec.index()] = self.ctime.nsec;
        slots[Field::BirthtimeSec.index()] = self.birthtime.sec;
        slots[Field::BirthtimeNsec.index()] = self.birthtime.nsec;
        slots
    }
}

/// A stat-shaped record in one of the two transport encodings.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataRecord {
    Float([f64; SLOTS]),
    Wide([i64; SLOTS]),
}

impl MetadataRecord {
    pub fn encode(stat: &Stat, wide: bool) -> MetadataRecord {
        let slots = stat.slots();
        if wide {
            MetadataRecord::Wide(slots)
        } else {
            MetadataRecord::Float(slots.map(|v| v as f64))
        }
    }

    pub fn is_wide(&self) -> bool {
        matches!(self, MetadataRecord::Wide(_))
    }

    /// Slot `index` as a double, whichever the encoding.
    pub fn value(&self, index: usize) -> f64 {
        match self {
            MetadataRecord::Float(slots) => slots[index],
            MetadataRecord::Wide(slots) => slots[index] as f64,
        }
    }

    pub fn get(&self, field: Field) -> f64 {
        self.value(field.index())
    }

    /// Slot `field` as an integer, whichever the encoding.
    pub fn get_i64(&self, field: Field) -> i64 {
        match self {
            MetadataRecord::Float(slots) => slots[field.index()] as i64,
            MetadataRecord::Wide(slots) => slots[field.index()],
        }
    }

    /// Every slot as a double.
    pub fn values(&self) -> [f64; SLOTS] {
        std::array::from_fn(|i| self.value(i))
    }

    /// The packed native-endian array the transport reads.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(SLOTS * 8);
        match self {
            MetadataRecord::Float(slots) => {
                for v in slots {
                    buf.extend_from_slice(&v.to_ne_bytes());
                }
            }
            MetadataRecord::Wide(slots) => {
                for v in slots {
                    buf.extend_from_slice(&v.to_ne_bytes());
                }
            }
        }
        buf
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            MetadataRecord::Float(slots) => {
                for v in slots {
                    writer.write_f64::<NativeEndian>(*v)?;
                }
            }
            MetadataRecord::Wide(slots) => {
                for v in slots {
                    writer.write_i64::<NativeEndian>(*v)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Stat {
        Stat {
            dev: 2049,
            mode: 0o100644,
            nlink: 1,
            uid: 1000,
            gid: 1000,
            rdev: 0,
            blksize: 4096,
            ino: 108_425_494,
            size: 5,
            blocks: 8,
            atime: Timespec { sec: 1_700_000_000, nsec: 123_456_789 },
            mtime: Timespec { sec: 1_700_000_001, nsec: 0 },
            ctime: Timespec { sec: 1_700_000_002, nsec: 999_999_999 },
            birthtime: Timespec { sec: 1_600_000_000, nsec: 1 },
        }
    }

    #[test]
    fn slot_layout() {
        let record = MetadataRecord::encode(&sample(), true);
        assert_eq!(record.get_i64(Field::Dev), 2049);
        assert_eq!(record.get_i64(Field::Mode), 0o100644);
        assert_eq!(record.get_i64(Field::Ino), 108_425_494);
        assert_eq!(record.get_i64(Field::AtimeNsec), 123_456_789);
        assert_eq!(record.get_i64(Field::BirthtimeSec), 1_600_000_000);
        for i in Field::ALL.len()..SLOTS {
            assert_eq!(record.value(i), 0.0);
        }
    }

    #[test]
    fn encodings_agree() {
        let float = MetadataRecord::encode(&sample(), false);
        let wide = MetadataRecord::encode(&sample(), true);
        assert!(!float.is_wide());
        assert!(wide.is_wide());
        assert_eq!(float.values(), wide.values());
        for field in Field::ALL {
            assert_eq!(float.get_i64(field), wide.get_i64(field), "{:?}", field);
        }
    }

    #[test]
    fn packed_bytes() {
        let wide = MetadataRecord::encode(&sample(), true).to_bytes();
        let float = MetadataRecord::encode(&sample(), false).to_bytes();
        assert_eq!(wide.len(), SLOTS * 8);
        assert_eq!(float.len(), SLOTS * 8);
        assert_eq!(&wide[8..16], &0o100644i64.to_ne_bytes());
        assert_eq!(&float[8..16], &(0o100644 as f64).to_ne_bytes());
    }
}
