use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Malformed boot sector: {0}")]
    MalformedBootSector(String),

    #[error("Bad cluster {cluster:#06x} in chain")]
    BadCluster { cluster: u16 },

    #[error("Cluster {cluster:#06x} links to invalid value {value:#06x}")]
    InvalidCluster { cluster: u16, value: u16 },

    #[error("Cluster chain loops back to {cluster:#06x}")]
    ChainLoop { cluster: u16 },

    #[error("Directory entry name is not valid text: {raw}")]
    InvalidEntryEncoding { raw: String },

    #[error("No newline in first cluster {cluster:#06x}")]
    NoNewlineFound { cluster: u16 },

    /// `limit` is the end of the region being read: the image, or the first
    /// FAT copy for FAT entry reads.
    #[error("Read of {len} bytes at offset {offset:#x} runs past limit {limit:#x}")]
    OutOfBounds { offset: usize, len: usize, limit: usize },

    #[error("Directory at cluster {cluster:#06x} is already being walked")]
    DirectoryLoop { cluster: u16 },

    #[error("Directory nesting exceeds depth limit {depth}")]
    DepthLimit { depth: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Tag for a [`ScanError`] that can be stored in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    MalformedBootSector,
    BadCluster,
    InvalidCluster,
    ChainLoop,
    InvalidEntryEncoding,
    NoNewlineFound,
    OutOfBounds,
    DirectoryLoop,
    DepthLimit,
    Io,
    Serialization,
    Configuration,
}

impl ScanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::MalformedBootSector(_) => ErrorKind::MalformedBootSector,
            ScanError::BadCluster { .. } => ErrorKind::BadCluster,
            ScanError::InvalidCluster { .. } => ErrorKind::InvalidCluster,
            ScanError::ChainLoop { .. } => ErrorKind::ChainLoop,
            ScanError::InvalidEntryEncoding { .. } => ErrorKind::InvalidEntryEncoding,
            ScanError::NoNewlineFound { .. } => ErrorKind::NoNewlineFound,
            ScanError::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            ScanError::DirectoryLoop { .. } => ErrorKind::DirectoryLoop,
            ScanError::DepthLimit { .. } => ErrorKind::DepthLimit,
            ScanError::Io(_) => ErrorKind::Io,
            ScanError::Serialization(_) => ErrorKind::Serialization,
            ScanError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Fatal errors abort the whole pass; everything else is local to one
    /// entry or branch of the directory tree.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScanError::MalformedBootSector(_)
                | ScanError::Io(_)
                | ScanError::Serialization(_)
                | ScanError::Configuration(_)
        )
    }
}
