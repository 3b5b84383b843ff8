//! Machine-readable summary of one inspected file (`--json`).

use serde::Serialize;

use crate::header::Header;
use crate::trailer::BlockFault;
use crate::verify::BlockCheck;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockReport {
    pub index:  u64,
    pub offset: u64,
    pub valid:  bool,
    /// `false` when size discovery failed for this block.
    pub sized:  bool,
    pub faults: Vec<BlockFault>,
}

impl BlockReport {
    pub fn new(index: u64, offset: u64, check: &BlockCheck) -> Self {
        Self {
            index,
            offset,
            valid:  check.is_valid(),
            sized:  !matches!(check, BlockCheck::NoValidSize),
            faults: check.faults().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path:         String,
    pub version:      u16,
    pub flags:        u16,
    pub used_blocks:  u64,
    pub total_blocks: u64,
    pub block_size:   Option<u64>,
    pub blocks:       Vec<BlockReport>,
    pub found:        u64,
}

impl FileReport {
    pub fn new(path: String, header: &Header) -> Self {
        Self {
            path,
            version:      header.version,
            flags:        header.flags,
            used_blocks:  header.used_blocks,
            total_blocks: header.total_blocks,
            block_size:   None,
            blocks:       Vec::new(),
            found:        0,
        }
    }

    /// Present blocks that failed verification, for any reason.
    pub fn invalid_blocks(&self) -> usize {
        self.blocks.iter().filter(|b| !b.valid).count()
    }

    pub fn count_mismatch(&self) -> bool {
        self.found != self.used_blocks
    }

    /// `WARNING: <found> found, <used> used blocks` when the map and the
    /// header disagree.
    pub fn count_warning(&self) -> Option<String> {
        self.count_mismatch()
            .then(|| format!("WARNING: {} found, {} used blocks", self.found, self.used_blocks))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut value = serde_json::to_value(self)?;
        value["count_mismatch"] = serde_json::Value::Bool(self.count_mismatch());
        serde_json::to_string(&value)
    }
}
