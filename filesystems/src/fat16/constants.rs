// FAT16 on-disk constants

use static_assertions::const_assert_eq;

// Boot sector offsets
pub const BPB_BYTES_PER_SEC: usize = 0x0B;
pub const BPB_SEC_PER_CLUS: usize = 0x0D;
pub const BPB_RSVD_SEC_CNT: usize = 0x0E;
pub const BPB_NUM_FATS: usize = 0x10;
pub const BPB_ROOT_ENT_CNT: usize = 0x11;
pub const BPB_FAT_SZ16: usize = 0x16;

/// Smallest buffer that holds every FAT16 BPB field.
pub const MIN_BOOT_SECTOR_LEN: usize = 62;

// Directory entry layout
pub const DIR_ENTRY_SIZE: usize = 32;
pub const DIR_NAME_LEN: usize = 8;
pub const DIR_EXT_LEN: usize = 3;
pub const DIR_NAME_FIELD_LEN: usize = DIR_NAME_LEN + DIR_EXT_LEN;
pub const DIR_ATTR_OFFSET: usize = 11;
pub const DIR_FIRST_CLUSTER_OFFSET: usize = 26;

/// `.` and `..` occupy the first two slots of every subdirectory.
pub const DOT_ENTRIES_LEN: usize = 2 * DIR_ENTRY_SIZE;

// Attribute markers
pub const ATTR_UNUSED: u8 = 0x00;
pub const ATTR_VOLUME_ID: u8 = 0x08;
pub const ATTR_DIRECTORY: u8 = 0x10;
pub const ATTR_ARCHIVE: u8 = 0x20;

// First name byte markers
pub const NAME_END_OF_DIR: u8 = 0x00;
pub const NAME_DELETED: u8 = 0xE5;

// FAT entry values
pub const FAT16_FIRST_DATA_CLUSTER: u16 = 2;
pub const FAT16_BAD: u16 = 0xFFF7;
pub const FAT16_EOC_MIN: u16 = 0xFFF8;
pub const FAT16_ENTRY_SIZE: usize = 2;

/// Newline terminating a file excerpt.
pub const EXCERPT_TERMINATOR: u8 = 0x0A;

const_assert_eq!(DIR_NAME_FIELD_LEN, DIR_ATTR_OFFSET);
const_assert_eq!(DOT_ENTRIES_LEN, 64);
