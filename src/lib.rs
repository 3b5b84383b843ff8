pub mod checksum;
pub mod header;
pub mod trailer;
pub mod blockmap;
pub mod storage;
pub mod verify;
pub mod hexdump;
pub mod report;
pub mod inspect;

pub use checksum::{checksum, block_checksum};
pub use header::{Header, HeaderError};
pub use trailer::{BlockTrailer, BlockFault};
pub use blockmap::{BlockMap, BlockMapError};
pub use storage::{Storage, FsStorage, MemStorage};
pub use verify::{verify_block, BlockCheck, BlockScanner, ProbePolicy, Verdict};
pub use report::{FileReport, BlockReport};
pub use inspect::{Inspector, InspectOptions, InspectError, RunStatus};
