use crate::ScanError;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// A disk image held fully in memory.
///
/// The backing file is read to the end and closed inside [`DiskImage::open`],
/// so no handle is held while the image is being interpreted.
#[derive(Debug, Clone)]
pub struct DiskImage {
    name: String,
    bytes: Vec<u8>,
}

impl DiskImage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let path = path.as_ref();
        info!("Opening disk image: {}", path.display());

        let mut file = File::open(path)?;
        let expected = file.metadata()?.len();
        let mut bytes = Vec::with_capacity(expected as usize);
        file.read_to_end(&mut bytes)?;
        drop(file);

        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(Self {
            name: path.display().to_string(),
            bytes,
        })
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
