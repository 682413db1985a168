/// The simulated caller the permission evaluator checks against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Identity {
    pub uid: u32,
    pub gid: u32,
}

impl Identity {
    pub const ROOT: Identity = Identity { uid: 0, gid: 0 };

    pub fn new(uid: u32, gid: u32) -> Identity {
        Identity { uid, gid }
    }

    /// Real uid and gid of the running process.
    pub fn current() -> Identity {
        unsafe {
            Identity {
                uid: libc::getuid(),
                gid: libc::getgid(),
            }
        }
    }

    pub fn is_superuser(&self) -> bool {
        self.uid == 0
    }
}

impl Default for Identity {
    fn default() -> Self {
        Identity::current()
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.uid, self.gid)
    }
}
