//! Simulated POSIX permission evaluation.
//!
//! The host never enforces access for the bridge; these functions decide it from the
//! entry's owner, group and mode bits. Exactly one tier (owner, group or other) applies
//! to a caller and bits are never combined across tiers.
use crate::identity::Identity;

pub const USER_READ: u32 = 0o400;
pub const USER_WRITE: u32 = 0o200;
pub const USER_EXEC: u32 = 0o100;
pub const GROUP_READ: u32 = 0o040;
pub const GROUP_WRITE: u32 = 0o020;
pub const GROUP_EXEC: u32 = 0o010;
pub const OTHER_READ: u32 = 0o004;
pub const OTHER_WRITE: u32 = 0o002;
pub const OTHER_EXEC: u32 = 0o001;

/// Permission bits including set-uid, set-gid and sticky.
pub const PERMISSION_MASK: u32 = 0o7777;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    Execute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    User,
    Group,
    Other,
}

impl Tier {
    /// The tier a non-superuser caller falls into for an entry owned by `uid:gid`.
    pub fn of(caller: &Identity, uid: u32, gid: u32) -> Tier {
        if caller.uid == uid {
            Tier::User
        } else if caller.gid == gid {
            Tier::Group
        } else {
            Tier::Other
        }
    }

    pub fn bit(self, access: Access) -> u32 {
        match (self, access) {
            (Tier::User, Access::Read) => USER_READ,
            (Tier::User, Access::Write) => USER_WRITE,
            (Tier::User, Access::Execute) => USER_EXEC,
            (Tier::Group, Access::Read) => GROUP_READ,
            (Tier::Group, Access::Write) => GROUP_WRITE,
            (Tier::Group, Access::Execute) => GROUP_EXEC,
            (Tier::Other, Access::Read) => OTHER_READ,
            (Tier::Other, Access::Write) => OTHER_WRITE,
            (Tier::Other, Access::Execute) => OTHER_EXEC,
        }
    }
}

/// Decide whether `caller` may perform `access` on an entry owned by `uid:gid` with `mode`.
pub fn allows(caller: &Identity, uid: u32, gid: u32, mode: u32, access: Access) -> bool {
    if caller.is_superuser() {
        return true;
    }
    let bit = Tier::of(caller, uid, gid).bit(access);
    mode & bit == bit
}

/// Grant execute to every tier that can read.
pub fn widen_execute(mode: u32) -> u32 {
    let mut fixed = mode;
    if mode & USER_READ != 0 {
        fixed |= USER_EXEC;
    }
    if mode & GROUP_READ != 0 {
        fixed |= GROUP_EXEC;
    }
    if mode & OTHER_READ != 0 {
        fixed |= OTHER_EXEC;
    }
    fixed
}

/// Compatibility fix-up for hosts without a real execute bit.
///
/// Directory entries on such hosts report no execute permission, which would make every
/// directory untraversable, so layers building entries there pass `enabled = true`.
pub fn fix_platform_permissions(mode: u32, enabled: bool) -> u32 {
    if enabled {
        widen_execute(mode)
    } else {
        mode
    }
}
