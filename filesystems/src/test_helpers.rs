// Synthetic FAT16 images for tests

use crate::fat16::constants::*;
use byteorder::{ByteOrder, LittleEndian};

/// Build a raw 32-byte directory entry.
pub fn dir_entry(name: &[u8; DIR_NAME_FIELD_LEN], attributes: u8, first_cluster: u16) -> [u8; DIR_ENTRY_SIZE] {
    let mut entry = [0u8; DIR_ENTRY_SIZE];
    entry[..DIR_NAME_FIELD_LEN].copy_from_slice(name);
    entry[DIR_ATTR_OFFSET] = attributes;
    LittleEndian::write_u16(&mut entry[DIR_FIRST_CLUSTER_OFFSET..], first_cluster);
    entry
}

/// In-memory FAT16 image with one sector per cluster.
pub struct ImageBuilder {
    image: Vec<u8>,
    bytes_per_sector: usize,
    fat_start: usize,
    fat_len: usize,
    fat_copies: usize,
    root_dir_start: usize,
    cluster_region_start: usize,
}

impl ImageBuilder {
    /// 512-byte sectors, 1 reserved sector, 2 FATs of 1 sector, 16 root
    /// entries and 16 data clusters.
    pub fn new() -> Self {
        Self::with_layout(512, 1, 2, 1, 16, 16)
    }

    pub fn with_layout(
        bytes_per_sector: u16,
        reserved_sectors: u16,
        fat_copies: u8,
        sectors_per_fat: u16,
        root_entries: u16,
        data_clusters: u16,
    ) -> Self {
        let sector = bytes_per_sector as usize;
        let fat_start = reserved_sectors as usize * sector;
        let fat_len = sectors_per_fat as usize * sector;
        let root_dir_start = fat_start + fat_copies as usize * fat_len;
        let cluster_region_start = root_dir_start + root_entries as usize * DIR_ENTRY_SIZE;
        let size = cluster_region_start + data_clusters as usize * sector;

        let mut image = vec![0u8; size.max(MIN_BOOT_SECTOR_LEN)];
        image[..3].copy_from_slice(&[0xEB, 0x3C, 0x90]);
        image[3..11].copy_from_slice(b"FATSCAN ");
        LittleEndian::write_u16(&mut image[BPB_BYTES_PER_SEC..], bytes_per_sector);
        image[BPB_SEC_PER_CLUS] = 1;
        LittleEndian::write_u16(&mut image[BPB_RSVD_SEC_CNT..], reserved_sectors);
        image[BPB_NUM_FATS] = fat_copies;
        LittleEndian::write_u16(&mut image[BPB_ROOT_ENT_CNT..], root_entries);
        image[0x15] = 0xF8;
        LittleEndian::write_u16(&mut image[BPB_FAT_SZ16..], sectors_per_fat);
        image[0x36..0x3E].copy_from_slice(b"FAT16   ");

        let mut builder = Self {
            image,
            bytes_per_sector: sector,
            fat_start,
            fat_len,
            fat_copies: fat_copies as usize,
            root_dir_start,
            cluster_region_start,
        };
        if fat_len >= 4 {
            builder.fat(0, 0xFFF8).fat(1, 0xFFFF);
        }
        builder
    }

    /// Set the FAT entry for `cluster` in every FAT copy.
    pub fn fat(&mut self, cluster: u16, value: u16) -> &mut Self {
        for copy in 0..self.fat_copies {
            let offset = self.fat_start + copy * self.fat_len + cluster as usize * FAT16_ENTRY_SIZE;
            LittleEndian::write_u16(&mut self.image[offset..], value);
        }
        self
    }

    /// Link `clusters` in order and terminate the last one with 0xFFFF.
    pub fn chain(&mut self, clusters: &[u16]) -> &mut Self {
        for pair in clusters.windows(2) {
            self.fat(pair[0], pair[1]);
        }
        if let Some(&last) = clusters.last() {
            self.fat(last, 0xFFFF);
        }
        self
    }

    pub fn root_entry(&mut self, index: usize, entry: [u8; DIR_ENTRY_SIZE]) -> &mut Self {
        let offset = self.root_dir_start + index * DIR_ENTRY_SIZE;
        self.image[offset..offset + DIR_ENTRY_SIZE].copy_from_slice(&entry);
        self
    }

    /// Write a directory entry into slot `slot` of a data cluster.
    pub fn directory_entry(&mut self, cluster: u16, slot: usize, entry: [u8; DIR_ENTRY_SIZE]) -> &mut Self {
        let offset = self.cluster_offset(cluster) + slot * DIR_ENTRY_SIZE;
        self.image[offset..offset + DIR_ENTRY_SIZE].copy_from_slice(&entry);
        self
    }

    /// Write `.` and `..` into the first two slots of a directory cluster.
    pub fn dot_entries(&mut self, cluster: u16, parent: u16) -> &mut Self {
        self.directory_entry(cluster, 0, dir_entry(b".          ", ATTR_DIRECTORY, cluster))
            .directory_entry(cluster, 1, dir_entry(b"..         ", ATTR_DIRECTORY, parent))
    }

    pub fn cluster_data(&mut self, cluster: u16, data: &[u8]) -> &mut Self {
        let offset = self.cluster_offset(cluster);
        self.image[offset..offset + data.len()].copy_from_slice(data);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        self.image.clone()
    }

    fn cluster_offset(&self, cluster: u16) -> usize {
        self.cluster_region_start + (cluster as usize - 2) * self.bytes_per_sector
    }
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}
