// FAT16 module - read-only boot sector, FAT chain and directory tree interpretation

pub mod boot_sector;
pub mod cluster_chain;
pub mod constants;
pub mod directory;
pub mod report;
pub mod walker;

pub use boot_sector::{parse_boot_sector, Geometry};
pub use cluster_chain::{next_cluster, ChainEnd, ChainResolver, ClusterChain};
pub use directory::{classify, Classification, ShortEntry};
pub use report::{DirectoryNode, Excerpt, FileNode, ReportEntry, SkippedEntry, TraversalReport};
pub use walker::{interpret, Fat16Walker};
