// FAT16 directory tree walker
// Visits the root directory and every reachable subdirectory, reading the
// first line of each file. Entry and branch errors are recorded in the report
// and never abort sibling traversal.

use super::boot_sector::{parse_boot_sector, Geometry};
use super::cluster_chain::ChainResolver;
use super::constants::*;
use super::directory::{classify, Classification, ShortEntry};
use super::report::{DirectoryNode, Excerpt, FileNode, ReportEntry, SkippedEntry, TraversalReport};
use fatscan_core::{ScanError, WalkOptions};
use log::{debug, info, warn};
use std::ops::ControlFlow;

/// State for a single interpretation pass over one disk buffer.
pub struct Fat16Walker<'a> {
    disk: &'a [u8],
    geometry: Geometry,
    chains: ChainResolver,
    options: WalkOptions,
    volume_label: Option<String>,
    // Starting clusters of the directories on the current path.
    ancestors: Vec<u16>,
}

impl<'a> Fat16Walker<'a> {
    pub fn new(disk: &'a [u8], options: WalkOptions) -> Result<Self, ScanError> {
        options.validate()?;
        let geometry = parse_boot_sector(disk)?;

        Ok(Self {
            disk,
            geometry,
            chains: ChainResolver::new(),
            options,
            volume_label: None,
            ancestors: Vec::new(),
        })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn chains(&self) -> &ChainResolver {
        &self.chains
    }

    /// Walk the fixed root directory region and everything below it.
    pub fn walk_root(&mut self) -> Result<TraversalReport, ScanError> {
        let disk = self.disk;
        let root = region(disk, self.geometry.root_dir_start, self.geometry.root_dir_len())?;
        debug!(
            "Reading root directory at offset {:#x}, {} entries",
            self.geometry.root_dir_start, self.geometry.root_entry_count
        );

        self.volume_label = None;
        let mut entries = Vec::new();
        for (index, raw) in root.chunks_exact(DIR_ENTRY_SIZE).enumerate() {
            if self.visit_entry(raw, index, 0, &mut entries).is_break() {
                break;
            }
        }

        Ok(TraversalReport {
            volume_label: self.volume_label.take(),
            entries,
        })
    }

    /// Walk the subdirectory whose chain starts at `start`.
    pub fn walk_directory_chain(&mut self, start: u16) -> Result<Vec<ReportEntry>, ScanError> {
        self.walk_directory_at(start, 1)
    }

    /// Bytes of the file's first cluster up to, not including, the first newline.
    pub fn read_file_excerpt(&mut self, start: u16) -> Result<Vec<u8>, ScanError> {
        let first = self
            .chains
            .resolve_chain(&self.geometry, self.disk, start)
            .complete()?
            .first()
            .copied()
            .ok_or(ScanError::InvalidCluster { cluster: start, value: start })?;

        let data = region(self.disk, self.geometry.cluster_offset(first), self.geometry.cluster_size())?;
        match data.iter().position(|&b| b == EXCERPT_TERMINATOR) {
            Some(end) => Ok(data[..end].to_vec()),
            None => Err(ScanError::NoNewlineFound { cluster: first }),
        }
    }

    fn walk_directory_at(&mut self, start: u16, depth: u32) -> Result<Vec<ReportEntry>, ScanError> {
        if depth > self.options.max_depth {
            return Err(ScanError::DepthLimit { depth: self.options.max_depth });
        }
        if self.ancestors.contains(&start) {
            return Err(ScanError::DirectoryLoop { cluster: start });
        }

        let clusters = self
            .chains
            .resolve_chain(&self.geometry, self.disk, start)
            .complete()?
            .to_vec();

        self.ancestors.push(start);
        let entries = self.scan_directory_clusters(&clusters, depth);
        self.ancestors.pop();

        Ok(entries)
    }

    fn scan_directory_clusters(&mut self, clusters: &[u16], depth: u32) -> Vec<ReportEntry> {
        let disk = self.disk;
        let cluster_size = self.geometry.cluster_size();
        let slots_per_cluster = cluster_size / DIR_ENTRY_SIZE;
        let mut entries = Vec::new();

        'clusters: for (position, &cluster) in clusters.iter().enumerate() {
            let first_slot = position * slots_per_cluster;
            let data = match region(disk, self.geometry.cluster_offset(cluster), cluster_size) {
                Ok(data) => data,
                Err(err) => {
                    warn!("Directory cluster {:#06x} unreadable: {}", cluster, err);
                    entries.push(ReportEntry::Skipped(SkippedEntry::new(first_slot, None, Some(cluster), &err)));
                    break;
                }
            };

            // Only the first cluster carries the `.` and `..` entries.
            let skip = if position == 0 { DOT_ENTRIES_LEN } else { 0 };
            let Some(data) = data.get(skip..) else {
                continue;
            };

            for (slot, raw) in data.chunks_exact(DIR_ENTRY_SIZE).enumerate() {
                let index = first_slot + skip / DIR_ENTRY_SIZE + slot;
                if self.visit_entry(raw, index, depth, &mut entries).is_break() {
                    break 'clusters;
                }
            }
        }

        entries
    }

    fn visit_entry(
        &mut self,
        raw: &[u8],
        index: usize,
        depth: u32,
        out: &mut Vec<ReportEntry>,
    ) -> ControlFlow<()> {
        let Ok(raw) = <&[u8; DIR_ENTRY_SIZE]>::try_from(raw) else {
            return ControlFlow::Break(());
        };

        match classify(raw, self.options.skip_deleted) {
            Ok(Classification::Unused { end_of_directory: true }) => return ControlFlow::Break(()),
            Ok(Classification::Unused { .. }) => {}
            Ok(Classification::VolumeLabel(label)) => self.record_label(&label),
            Ok(Classification::Directory(entry)) => out.push(self.visit_directory(entry, index, depth + 1)),
            Ok(Classification::File(entry)) => out.push(self.visit_file(entry, index)),
            Err(err) => {
                warn!("Skipping entry {}: {}", index, err);
                out.push(ReportEntry::Skipped(SkippedEntry::new(index, None, None, &err)));
            }
        }

        ControlFlow::Continue(())
    }

    fn visit_directory(&mut self, entry: ShortEntry, index: usize, depth: u32) -> ReportEntry {
        let name = entry.directory_name();
        let cluster = entry.start_cluster;
        debug!("Entering directory {} at cluster {:#06x}", name, cluster);

        match self.walk_directory_at(cluster, depth) {
            Ok(entries) => ReportEntry::Directory(DirectoryNode { name, cluster, entries }),
            Err(err) => {
                warn!("Skipping directory {} (entry {}): {}", name, index, err);
                ReportEntry::Skipped(SkippedEntry::new(index, Some(name), Some(cluster), &err))
            }
        }
    }

    fn visit_file(&mut self, entry: ShortEntry, index: usize) -> ReportEntry {
        let name = entry.file_name();
        let cluster = entry.start_cluster;

        // Empty files own no clusters.
        if cluster == 0 {
            return ReportEntry::File(FileNode {
                name,
                cluster,
                excerpt: Excerpt::Text { text: String::new() },
            });
        }

        match self.read_file_excerpt(cluster) {
            Ok(bytes) => ReportEntry::File(FileNode {
                name,
                cluster,
                excerpt: Excerpt::Text {
                    text: String::from_utf8_lossy(&bytes).into_owned(),
                },
            }),
            Err(err @ ScanError::NoNewlineFound { .. }) => {
                debug!("No excerpt for {}: {}", name, err);
                ReportEntry::File(FileNode {
                    name,
                    cluster,
                    excerpt: Excerpt::unavailable(&err),
                })
            }
            Err(err) => {
                warn!("Skipping file {} (entry {}): {}", name, index, err);
                ReportEntry::Skipped(SkippedEntry::new(index, Some(name), Some(cluster), &err))
            }
        }
    }

    fn record_label(&mut self, label: &str) {
        let label = label.trim_end();
        if let Some(existing) = self.volume_label.as_deref() {
            warn!("Ignoring second volume label {:?}, keeping {:?}", label, existing);
            return;
        }
        info!("Volume label: {}", label);
        self.volume_label = Some(label.to_string());
    }
}

fn region(disk: &[u8], offset: usize, len: usize) -> Result<&[u8], ScanError> {
    disk.get(offset..offset + len).ok_or(ScanError::OutOfBounds {
        offset,
        len,
        limit: disk.len(),
    })
}

/// Interpret a FAT16 image with a fresh walker.
pub fn interpret(disk: &[u8], options: &WalkOptions) -> Result<TraversalReport, ScanError> {
    Fat16Walker::new(disk, options.clone())?.walk_root()
}
