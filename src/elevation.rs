//! Privilege elevation
//! -------------------
//!
//! Every backing-store call the core makes runs inside [`Elevation::run`], so the host's
//! own permission checks never reject it and the bridge's evaluator stays the only
//! gatekeeper. The scope restores the ambient privilege on every exit path, including
//! early returns through `?` and panics unwinding through the operation.
use std::io;
use std::sync::Mutex;

use log::{debug, warn};

/// How the core gets past host-level permission checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Elevation {
    /// The host process already runs with enough privilege; operations run as-is.
    #[default]
    Ambient,
    /// The process holds a saved set-user-ID of 0 and switches its effective uid to root
    /// for the duration of each scope.
    SavedSetUid,
}

impl Elevation {
    /// Run `op` elevated. The result and any error of `op` are returned untouched.
    pub fn run<T, F>(&self, op: F) -> io::Result<T>
    where
        F: FnOnce() -> io::Result<T>,
    {
        match *self {
            Elevation::Ambient => op(),
            Elevation::SavedSetUid => {
                let _scope = EuidScope::enter()?;
                op()
            }
        }
    }
}

/// Open scopes and the effective uid to restore once the last one closes.
///
/// The effective uid is process-wide, so scopes opened from several threads share one
/// switch to root.
static SCOPES: Mutex<(usize, libc::uid_t)> = Mutex::new((0, 0));

struct EuidScope;

impl EuidScope {
    fn enter() -> io::Result<EuidScope> {
        let mut scopes = SCOPES.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if scopes.0 == 0 {
            let ambient = unsafe { libc::geteuid() };
            if ambient != 0 && unsafe { libc::seteuid(0) } != 0 {
                return Err(io::Error::last_os_error());
            }
            debug!("elevated effective uid {ambient} -> 0");
            scopes.1 = ambient;
        }
        scopes.0 += 1;
        Ok(EuidScope)
    }
}

impl Drop for EuidScope {
    fn drop(&mut self) {
        let mut scopes = SCOPES.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        scopes.0 -= 1;
        if scopes.0 == 0 {
            let ambient = scopes.1;
            if ambient != 0 && unsafe { libc::seteuid(ambient) } != 0 {
                warn!(
                    "failed to restore effective uid {ambient}: {}",
                    io::Error::last_os_error()
                );
                return;
            }
            debug!("restored effective uid 0 -> {ambient}");
        }
    }
}
