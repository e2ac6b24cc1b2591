// FAT16 directory entry classification

use super::constants::*;
use byteorder::{ByteOrder, LittleEndian};
use fatscan_core::ScanError;
use serde::Serialize;

/// Name, extension and first cluster of a file or subdirectory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortEntry {
    /// Base name with trailing pad spaces removed.
    pub name: String,
    /// Extension exactly as stored, padding included.
    pub extension: String,
    pub start_cluster: u16,
}

impl ShortEntry {
    /// `NAME.EXT` for files, as stored.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.extension)
    }

    /// Directory names drop the dot when the extension is blank.
    pub fn directory_name(&self) -> String {
        let extension = self.extension.trim_end();
        if extension.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.name, extension)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Nothing to report. `end_of_directory` is set for a 0x00 marker or a
    /// never-used slot, after which the directory holds no further entries.
    Unused { end_of_directory: bool },
    /// Volume label, all 11 name bytes decoded.
    VolumeLabel(String),
    Directory(ShortEntry),
    File(ShortEntry),
}

impl Classification {
    pub fn is_end_of_directory(&self) -> bool {
        matches!(self, Classification::Unused { end_of_directory: true })
    }
}

/// Classify a raw directory entry by its attribute byte.
///
/// Markers other than volume label, directory and archive (hidden, system,
/// long-name entries and the like) are reported as unused.
pub fn classify(entry: &[u8; DIR_ENTRY_SIZE], skip_deleted: bool) -> Result<Classification, ScanError> {
    // A 0x00 marker or a never-used slot ends the directory; the name is not parsed.
    if entry[DIR_ATTR_OFFSET] == ATTR_UNUSED || entry[0] == NAME_END_OF_DIR {
        return Ok(Classification::Unused { end_of_directory: true });
    }

    if skip_deleted && entry[0] == NAME_DELETED {
        return Ok(Classification::Unused { end_of_directory: false });
    }

    match entry[DIR_ATTR_OFFSET] {
        ATTR_VOLUME_ID => {
            let label = decode(&entry[..DIR_NAME_FIELD_LEN], entry)?;
            Ok(Classification::VolumeLabel(label.to_string()))
        }
        ATTR_DIRECTORY => Ok(Classification::Directory(short_entry(entry)?)),
        ATTR_ARCHIVE => Ok(Classification::File(short_entry(entry)?)),
        _ => Ok(Classification::Unused { end_of_directory: false }),
    }
}

fn short_entry(entry: &[u8; DIR_ENTRY_SIZE]) -> Result<ShortEntry, ScanError> {
    // Validate the whole 8.3 field before splitting it.
    decode(&entry[..DIR_NAME_FIELD_LEN], entry)?;

    let name = decode(&entry[..DIR_NAME_LEN], entry)?.trim_end_matches(' ');
    let extension = decode(&entry[DIR_NAME_LEN..DIR_NAME_FIELD_LEN], entry)?;
    let start_cluster = LittleEndian::read_u16(&entry[DIR_FIRST_CLUSTER_OFFSET..DIR_FIRST_CLUSTER_OFFSET + 2]);

    Ok(ShortEntry {
        name: name.to_string(),
        extension: extension.to_string(),
        start_cluster,
    })
}

fn decode<'a>(bytes: &'a [u8], entry: &[u8; DIR_ENTRY_SIZE]) -> Result<&'a str, ScanError> {
    std::str::from_utf8(bytes).map_err(|_| ScanError::InvalidEntryEncoding {
        raw: hex::encode(&entry[..DIR_NAME_FIELD_LEN]),
    })
}
