use crate::elevation::Elevation;
use crate::error::Result;
use crate::identity::Identity;

/// BridgeConfig is the JSON settings record an embedding transport hands to the core.
///
/// ```json
/// { "identity": { "uid": 1000, "gid": 1000 }, "elevation": "ambient", "fixPlatformPermissions": false }
/// ```
///
/// Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BridgeConfig {
    /// Caller identity for permission checks; the process's real uid/gid when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    #[serde(default)]
    pub elevation: Elevation,
    /// Whether `Bridge::fix_platform_permissions` grants execute wherever read is granted.
    /// The layer that builds directory listings for such hosts applies it to the modes it
    /// reports; the core's own checks and records use the backing mode unchanged.
    #[serde(rename = "fixPlatformPermissions", default)]
    pub fix_platform_permissions: bool,
}

impl BridgeConfig {
    /// Load a BridgeConfig from a JSON reader
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Load a BridgeConfig from a file path
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }
}

impl std::str::FromStr for BridgeConfig {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
