use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::item::{ContextItem, ItemSource};
use crate::types::identifiers::ItemId;

/// Source of modification times for workspace-backed items.
pub trait DiskProbe {
    fn modified_at(&self, display_path: &str) -> io::Result<DateTime<Utc>>;
}

/// Probe resolving display paths against a workspace root on the real filesystem.
#[derive(Debug, Clone)]
pub struct FsProbe {
    root: PathBuf,
}

impl FsProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DiskProbe for FsProbe {
    fn modified_at(&self, display_path: &str) -> io::Result<DateTime<Utc>> {
        let modified = std::fs::metadata(self.root.join(display_path))?.modified()?;
        Ok(DateTime::<Utc>::from(modified))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StalenessReport {
    pub changed: Vec<ItemId>,
    pub missing: Vec<ItemId>,
}

impl StalenessReport {
    pub fn is_clean(&self) -> bool {
        self.changed.is_empty() && self.missing.is_empty()
    }
}

pub(crate) fn is_disk_backed(item: &ContextItem) -> bool {
    item.source == ItemSource::Workspace && !item.is_virtual && item.text_payload().is_some()
}

/// Recompute the staleness flags of one item. Items without a remembered
/// modification time are left untouched.
pub(crate) fn refresh_item<P: DiskProbe + ?Sized>(item: &mut ContextItem, probe: &P) {
    if !is_disk_backed(item) {
        return;
    }
    let Some(remembered) = item.modified_at else {
        return;
    };

    match probe.modified_at(&item.display_path) {
        Ok(current) => {
            item.missing_on_disk = false;
            item.changed_on_disk = current != remembered;
        }
        Err(_) => {
            item.missing_on_disk = true;
        }
    }
}
