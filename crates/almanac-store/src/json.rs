use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use almanac_core::PortableSnapshot;
use tracing::{debug, info};

use crate::{error::Result, EventStore};

/// `calendar_events.json`: one object keyed by date, each value an array of
/// portable events.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventStore for JsonFileStore {
    fn load(&self) -> Result<PortableSnapshot> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no saved events yet, starting empty");
                return Ok(PortableSnapshot::new());
            }
            Err(e) => return Err(e.into()),
        };
        let snapshot: PortableSnapshot = serde_json::from_str(&raw)?;
        debug!(path = %self.path.display(), days = snapshot.len(), "events loaded");
        Ok(snapshot)
    }

    fn save(&self, snapshot: &PortableSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        // Write beside the target and rename so a crash never leaves half a file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(snapshot)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), days = snapshot.len(), "events saved");
        Ok(())
    }
}
