// FAT16 boot sector parsing

use super::constants::*;
use byteorder::{ByteOrder, LittleEndian};
use fatscan_core::ScanError;
use log::{info, warn};
use serde::Serialize;

/// Volume layout derived once from the boot sector.
///
/// All offsets are byte offsets into the full disk buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Geometry {
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub fat_copies: u8,
    pub sectors_per_fat: u16,
    pub root_entry_count: u16,
    pub fat_start: usize,
    pub root_dir_start: usize,
    pub cluster_region_start: usize,
}

impl Geometry {
    /// Size of one cluster in bytes. Clusters are addressed as one sector.
    pub fn cluster_size(&self) -> usize {
        self.bytes_per_sector as usize
    }

    /// Size of a single FAT copy in bytes.
    pub fn fat_len(&self) -> usize {
        self.sectors_per_fat as usize * self.bytes_per_sector as usize
    }

    pub fn root_dir_len(&self) -> usize {
        self.root_entry_count as usize * DIR_ENTRY_SIZE
    }

    /// Byte offset of a data cluster. Callers must pass an index >= 2.
    pub fn cluster_offset(&self, cluster: u16) -> usize {
        let index = cluster.saturating_sub(FAT16_FIRST_DATA_CLUSTER) as usize;
        self.cluster_region_start + index * self.cluster_size()
    }

    /// Byte offset of the FAT entry describing `cluster` in the first FAT copy.
    pub fn fat_entry_offset(&self, cluster: u16) -> usize {
        self.fat_start + cluster as usize * FAT16_ENTRY_SIZE
    }
}

pub fn parse_boot_sector(disk: &[u8]) -> Result<Geometry, ScanError> {
    if disk.len() < MIN_BOOT_SECTOR_LEN {
        return Err(ScanError::MalformedBootSector(format!(
            "image is {} bytes, boot sector needs at least {}",
            disk.len(),
            MIN_BOOT_SECTOR_LEN
        )));
    }

    let bytes_per_sector = LittleEndian::read_u16(&disk[BPB_BYTES_PER_SEC..]);
    let sectors_per_cluster = disk[BPB_SEC_PER_CLUS];
    let reserved_sectors = LittleEndian::read_u16(&disk[BPB_RSVD_SEC_CNT..]);
    let fat_copies = disk[BPB_NUM_FATS];
    let root_entry_count = LittleEndian::read_u16(&disk[BPB_ROOT_ENT_CNT..]);
    let sectors_per_fat = LittleEndian::read_u16(&disk[BPB_FAT_SZ16..]);

    if bytes_per_sector == 0 {
        return Err(ScanError::MalformedBootSector(
            "bytes per sector is zero".to_string(),
        ));
    }

    if !(1..=2).contains(&fat_copies) {
        return Err(ScanError::MalformedBootSector(format!(
            "implausible FAT copy count {}",
            fat_copies
        )));
    }

    if sectors_per_cluster != 1 {
        warn!(
            "Sectors per cluster is {}, clusters are read as single sectors",
            sectors_per_cluster
        );
    }

    let sector = bytes_per_sector as usize;
    let fat_start = reserved_sectors as usize * sector;
    let root_dir_start = fat_start + fat_copies as usize * sectors_per_fat as usize * sector;
    let cluster_region_start = root_dir_start + root_entry_count as usize * DIR_ENTRY_SIZE;

    if cluster_region_start > disk.len() {
        return Err(ScanError::MalformedBootSector(format!(
            "root directory ends at {:#x} past image end {:#x}",
            cluster_region_start,
            disk.len()
        )));
    }

    let geometry = Geometry {
        bytes_per_sector,
        sectors_per_cluster,
        reserved_sectors,
        fat_copies,
        sectors_per_fat,
        root_entry_count,
        fat_start,
        root_dir_start,
        cluster_region_start,
    };

    info!("FAT16 geometry:");
    info!("  Bytes per sector: {}", bytes_per_sector);
    info!("  Reserved sectors: {}", reserved_sectors);
    info!("  FAT copies: {} x {} sectors", fat_copies, sectors_per_fat);
    info!("  Root entries: {}", root_entry_count);
    info!("  Root directory at {:#x}, clusters at {:#x}", root_dir_start, cluster_region_start);

    Ok(geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ImageBuilder;

    #[test]
    fn test_offsets_from_standard_layout() {
        let disk = ImageBuilder::new().build();
        let geometry = parse_boot_sector(&disk).unwrap();

        assert_eq!(geometry.bytes_per_sector, 512);
        assert_eq!(geometry.fat_start, 512);
        assert_eq!(geometry.root_dir_start, 512 + 2 * 512);
        assert_eq!(geometry.cluster_region_start, 1536 + 16 * 32);
        assert_eq!(geometry.cluster_offset(2), 2048);
        assert_eq!(geometry.cluster_offset(3), 2560);
        assert_eq!(geometry.fat_entry_offset(3), 518);
    }

    #[test]
    fn test_region_ordering_holds_across_layouts() {
        for (sector, reserved, copies, spf, roots) in [
            (512u16, 1u16, 1u8, 1u16, 16u16),
            (1024, 4, 2, 3, 64),
            (2048, 2, 2, 1, 512),
            (512, 8, 1, 4, 0),
        ] {
            let disk = ImageBuilder::with_layout(sector, reserved, copies, spf, roots, 4).build();
            let g = parse_boot_sector(&disk).unwrap();
            assert!(g.root_dir_start >= g.fat_start);
            assert_eq!(g.cluster_region_start, g.root_dir_start + roots as usize * 32);
        }
    }

    #[test]
    fn test_short_buffer_rejected() {
        let err = parse_boot_sector(&[0u8; 61]).unwrap_err();
        assert!(matches!(err, ScanError::MalformedBootSector(_)));
    }

    #[test]
    fn test_zero_sector_size_rejected() {
        let mut disk = ImageBuilder::new().build();
        disk[BPB_BYTES_PER_SEC] = 0;
        disk[BPB_BYTES_PER_SEC + 1] = 0;
        let err = parse_boot_sector(&disk).unwrap_err();
        assert!(matches!(err, ScanError::MalformedBootSector(_)));
    }

    #[test]
    fn test_fat_copy_count_must_be_one_or_two() {
        for copies in [0u8, 3, 0x80, 0xFF] {
            let mut disk = ImageBuilder::new().build();
            disk[BPB_NUM_FATS] = copies;
            let err = parse_boot_sector(&disk).unwrap_err();
            assert!(matches!(err, ScanError::MalformedBootSector(_)), "copies {}", copies);
        }
    }

    #[test]
    fn test_truncated_root_directory_rejected() {
        let disk = ImageBuilder::new().build();
        let err = parse_boot_sector(&disk[..1600]).unwrap_err();
        assert!(matches!(err, ScanError::MalformedBootSector(_)));
    }
}
