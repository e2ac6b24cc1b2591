// FAT16 cluster chain resolution
// Follows FAT links from a starting cluster and memoizes the result per pass

use super::boot_sector::Geometry;
use super::constants::*;
use byteorder::{ByteOrder, LittleEndian};
use fatscan_core::ScanError;
use log::{debug, trace};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// How a chain walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChainEnd {
    /// The last cluster's FAT entry held an end-of-chain marker.
    EndOfChain { marker: u16 },
    /// The FAT marks `cluster` as bad.
    BadCluster { cluster: u16 },
    /// `cluster` links to a free or reserved value, or the chain starts below 2.
    InvalidLink { cluster: u16, value: u16 },
    /// The chain revisits `cluster`.
    Loop { cluster: u16 },
    /// The FAT entry for `cluster` at `offset` lies past `limit`, the end of
    /// the first FAT copy or of the image.
    OutOfBounds { cluster: u16, offset: usize, limit: usize },
}

/// The clusters of one file or directory, in order.
///
/// `clusters` holds every cluster reached before `end`; a bad cluster is not
/// itself part of the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterChain {
    pub start: u16,
    pub clusters: Vec<u16>,
    pub end: ChainEnd,
}

impl ClusterChain {
    pub fn is_complete(&self) -> bool {
        matches!(self.end, ChainEnd::EndOfChain { .. })
    }

    /// The cluster list when the chain ended normally, otherwise the error
    /// describing the break.
    pub fn complete(&self) -> Result<&[u16], ScanError> {
        match self.end {
            ChainEnd::EndOfChain { .. } => Ok(&self.clusters),
            ChainEnd::BadCluster { cluster } => Err(ScanError::BadCluster { cluster }),
            ChainEnd::InvalidLink { cluster, value } => {
                Err(ScanError::InvalidCluster { cluster, value })
            }
            ChainEnd::Loop { cluster } => Err(ScanError::ChainLoop { cluster }),
            ChainEnd::OutOfBounds { offset, limit, .. } => Err(ScanError::OutOfBounds {
                offset,
                len: FAT16_ENTRY_SIZE,
                limit,
            }),
        }
    }
}

fn fat_limit(geometry: &Geometry, disk: &[u8]) -> usize {
    disk.len().min(geometry.fat_start + geometry.fat_len())
}

/// Read the FAT entry for `cluster` from the first FAT copy.
pub fn next_cluster(geometry: &Geometry, disk: &[u8], cluster: u16) -> Result<u16, ScanError> {
    let offset = geometry.fat_entry_offset(cluster);
    let limit = fat_limit(geometry, disk);

    if offset + FAT16_ENTRY_SIZE > limit {
        return Err(ScanError::OutOfBounds {
            offset,
            len: FAT16_ENTRY_SIZE,
            limit,
        });
    }

    Ok(LittleEndian::read_u16(&disk[offset..offset + FAT16_ENTRY_SIZE]))
}

/// Memoizing chain resolver. Construct one per interpretation pass.
#[derive(Debug, Default)]
pub struct ChainResolver {
    chains: HashMap<u16, ClusterChain>,
    fat_reads: usize,
}

impl ChainResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the chain starting at `start`, walking the FAT only the first
    /// time a given start is requested.
    pub fn resolve_chain(&mut self, geometry: &Geometry, disk: &[u8], start: u16) -> &ClusterChain {
        if !self.chains.contains_key(&start) {
            let chain = self.walk(geometry, disk, start);
            debug!(
                "Resolved chain at {:#06x}: {} clusters, {:?}",
                start,
                chain.clusters.len(),
                chain.end
            );
            self.chains.insert(start, chain);
        }
        &self.chains[&start]
    }

    fn walk(&mut self, geometry: &Geometry, disk: &[u8], start: u16) -> ClusterChain {
        let mut clusters = Vec::new();
        let mut visited = HashSet::new();

        if start < FAT16_FIRST_DATA_CLUSTER {
            return ClusterChain {
                start,
                clusters,
                end: ChainEnd::InvalidLink { cluster: start, value: start },
            };
        }

        let mut current = start;
        let end = loop {
            if !visited.insert(current) {
                break ChainEnd::Loop { cluster: current };
            }

            self.fat_reads += 1;
            let next = match next_cluster(geometry, disk, current) {
                Ok(next) => next,
                Err(_) => {
                    break ChainEnd::OutOfBounds {
                        cluster: current,
                        offset: geometry.fat_entry_offset(current),
                        limit: fat_limit(geometry, disk),
                    }
                }
            };
            trace!("FAT[{:#06x}] = {:#06x}", current, next);

            match next {
                FAT16_BAD => break ChainEnd::BadCluster { cluster: current },
                FAT16_EOC_MIN..=u16::MAX => {
                    clusters.push(current);
                    break ChainEnd::EndOfChain { marker: next };
                }
                0 | 1 => break ChainEnd::InvalidLink { cluster: current, value: next },
                _ => {
                    clusters.push(current);
                    current = next;
                }
            }
        };

        ClusterChain { start, clusters, end }
    }

    /// Number of FAT entries read so far in this pass.
    pub fn fat_reads(&self) -> usize {
        self.fat_reads
    }

    /// Every memoized chain, ordered by starting cluster.
    pub fn chains(&self) -> Vec<&ClusterChain> {
        let mut chains: Vec<&ClusterChain> = self.chains.values().collect();
        chains.sort_by_key(|chain| chain.start);
        chains
    }

    /// Successor map over every cluster visited so far. Terminal clusters map
    /// to the end-of-chain marker that was read for them.
    pub fn links(&self) -> BTreeMap<u16, u16> {
        let mut links = BTreeMap::new();
        for chain in self.chains.values() {
            for pair in chain.clusters.windows(2) {
                links.insert(pair[0], pair[1]);
            }
            if let (Some(&last), ChainEnd::EndOfChain { marker }) = (chain.clusters.last(), chain.end) {
                links.insert(last, marker);
            }
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fat16::boot_sector::parse_boot_sector;
    use crate::test_helpers::ImageBuilder;

    fn resolve(disk: &[u8], start: u16) -> ClusterChain {
        let geometry = parse_boot_sector(disk).unwrap();
        ChainResolver::new().resolve_chain(&geometry, disk, start).clone()
    }

    #[test]
    fn test_next_cluster_reads_little_endian() {
        let mut builder = ImageBuilder::new();
        builder.fat(5, 0x1234);
        let disk = builder.build();
        let geometry = parse_boot_sector(&disk).unwrap();

        assert_eq!(next_cluster(&geometry, &disk, 5).unwrap(), 0x1234);
    }

    #[test]
    fn test_next_cluster_past_fat_is_out_of_bounds() {
        let disk = ImageBuilder::new().build();
        let geometry = parse_boot_sector(&disk).unwrap();

        // One 512-byte FAT holds 256 entries.
        assert!(next_cluster(&geometry, &disk, 255).is_ok());
        let err = next_cluster(&geometry, &disk, 256).unwrap_err();
        assert!(matches!(err, ScanError::OutOfBounds { .. }));
    }

    #[test]
    fn test_terminal_cluster_is_included() {
        let mut builder = ImageBuilder::new();
        builder.chain(&[2, 3, 4]);
        let chain = resolve(&builder.build(), 2);

        assert_eq!(chain.clusters, vec![2, 3, 4]);
        assert_eq!(chain.end, ChainEnd::EndOfChain { marker: 0xFFFF });
        assert!(chain.is_complete());
    }

    #[test]
    fn test_every_end_marker_terminates() {
        for marker in [0xFFF8u16, 0xFFFA, 0xFFFF] {
            let mut builder = ImageBuilder::new();
            builder.fat(6, 7).fat(7, marker);
            let chain = resolve(&builder.build(), 6);
            assert_eq!(chain.clusters, vec![6, 7]);
            assert_eq!(chain.end, ChainEnd::EndOfChain { marker });
        }
    }

    #[test]
    fn test_bad_cluster_keeps_prefix() {
        let mut builder = ImageBuilder::new();
        builder.fat(2, 3).fat(3, 4).fat(4, FAT16_BAD);
        let chain = resolve(&builder.build(), 2);

        assert_eq!(chain.clusters, vec![2, 3]);
        assert_eq!(chain.end, ChainEnd::BadCluster { cluster: 4 });
        assert!(matches!(chain.complete(), Err(ScanError::BadCluster { cluster: 4 })));
    }

    #[test]
    fn test_bad_first_hop_yields_empty_chain() {
        let mut builder = ImageBuilder::new();
        builder.fat(9, FAT16_BAD);
        let chain = resolve(&builder.build(), 9);

        assert!(chain.clusters.is_empty());
        assert_eq!(chain.end, ChainEnd::BadCluster { cluster: 9 });
    }

    #[test]
    fn test_link_past_fat_copy_is_out_of_bounds() {
        let mut builder = ImageBuilder::new();
        builder.fat(2, 300);
        let disk = builder.build();
        let chain = resolve(&disk, 2);

        assert_eq!(chain.clusters, vec![2]);
        assert!(matches!(
            chain.end,
            ChainEnd::OutOfBounds { cluster: 300, offset: 1112, limit: 1024 }
        ));
        assert!(matches!(
            chain.complete(),
            Err(ScanError::OutOfBounds { offset: 1112, len: 2, limit: 1024 })
        ));
    }

    #[test]
    fn test_cycle_is_detected() {
        let mut builder = ImageBuilder::new();
        builder.fat(2, 3).fat(3, 4).fat(4, 2);
        let chain = resolve(&builder.build(), 2);

        assert_eq!(chain.clusters, vec![2, 3, 4]);
        assert_eq!(chain.end, ChainEnd::Loop { cluster: 2 });
    }

    #[test]
    fn test_free_link_is_invalid() {
        let mut builder = ImageBuilder::new();
        builder.fat(2, 3);
        let chain = resolve(&builder.build(), 2);

        assert_eq!(chain.clusters, vec![2]);
        assert_eq!(chain.end, ChainEnd::InvalidLink { cluster: 3, value: 0 });
    }

    #[test]
    fn test_reserved_start_is_invalid() {
        let chain = resolve(&ImageBuilder::new().build(), 0);
        assert!(chain.clusters.is_empty());
        assert!(matches!(chain.complete(), Err(ScanError::InvalidCluster { cluster: 0, .. })));
    }

    #[test]
    fn test_memoized_chain_skips_fat() {
        let mut builder = ImageBuilder::new();
        builder.chain(&[2, 5, 8]);
        let disk = builder.build();
        let geometry = parse_boot_sector(&disk).unwrap();
        let mut resolver = ChainResolver::new();

        let first = resolver.resolve_chain(&geometry, &disk, 2).clone();
        let reads = resolver.fat_reads();
        assert_eq!(reads, 3);

        let second = resolver.resolve_chain(&geometry, &disk, 2).clone();
        assert_eq!(first, second);
        assert_eq!(resolver.fat_reads(), reads);
    }

    #[test]
    fn test_links_map_successors() {
        let mut builder = ImageBuilder::new();
        builder.chain(&[2, 5]).chain(&[3]);
        let disk = builder.build();
        let geometry = parse_boot_sector(&disk).unwrap();
        let mut resolver = ChainResolver::new();
        resolver.resolve_chain(&geometry, &disk, 2);
        resolver.resolve_chain(&geometry, &disk, 3);

        let links = resolver.links();
        assert_eq!(links.get(&2), Some(&5));
        assert_eq!(links.get(&5), Some(&0xFFFF));
        assert_eq!(links.get(&3), Some(&0xFFFF));
        assert_eq!(resolver.chains().len(), 2);
        assert_eq!(resolver.chains()[0].start, 2);
    }
}
