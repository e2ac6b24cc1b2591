// Traversal report produced by a directory walk

use fatscan_core::{ErrorKind, ScanError};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraversalReport {
    /// Volume label with trailing padding removed.
    pub volume_label: Option<String>,
    /// Root directory contents.
    pub entries: Vec<ReportEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportEntry {
    Directory(DirectoryNode),
    File(FileNode),
    Skipped(SkippedEntry),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryNode {
    pub name: String,
    pub cluster: u16,
    pub entries: Vec<ReportEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileNode {
    /// `NAME.EXT` as stored on disk.
    pub name: String,
    pub cluster: u16,
    pub excerpt: Excerpt,
}

/// First line of a file, or why it could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Excerpt {
    Text { text: String },
    Unavailable { kind: ErrorKind, detail: String },
}

/// An entry or branch abandoned because of a local error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    /// Slot index within the containing directory, counting `.` and `..`.
    pub entry_index: usize,
    pub name: Option<String>,
    pub cluster: Option<u16>,
    pub kind: ErrorKind,
    pub detail: String,
}

impl SkippedEntry {
    pub fn new(entry_index: usize, name: Option<String>, cluster: Option<u16>, error: &ScanError) -> Self {
        Self {
            entry_index,
            name,
            cluster,
            kind: error.kind(),
            detail: error.to_string(),
        }
    }
}

impl Excerpt {
    pub fn unavailable(error: &ScanError) -> Self {
        Excerpt::Unavailable {
            kind: error.kind(),
            detail: error.to_string(),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Excerpt::Text { text } => Some(text),
            Excerpt::Unavailable { .. } => None,
        }
    }
}

impl ReportEntry {
    pub fn display_name(&self) -> Option<&str> {
        match self {
            ReportEntry::Directory(dir) => Some(&dir.name),
            ReportEntry::File(file) => Some(&file.name),
            ReportEntry::Skipped(skipped) => skipped.name.as_deref(),
        }
    }

    pub fn as_directory(&self) -> Option<&DirectoryNode> {
        match self {
            ReportEntry::Directory(dir) => Some(dir),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            ReportEntry::File(file) => Some(file),
            _ => None,
        }
    }

    pub fn as_skipped(&self) -> Option<&SkippedEntry> {
        match self {
            ReportEntry::Skipped(skipped) => Some(skipped),
            _ => None,
        }
    }
}

impl TraversalReport {
    /// Look up an entry by `/`-separated display names, e.g. `DOCS/A.TXT`.
    pub fn find(&self, path: &str) -> Option<&ReportEntry> {
        let mut entries: &[ReportEntry] = &self.entries;
        let mut found = None;

        for part in path.split('/').filter(|p| !p.is_empty()) {
            let entry = entries.iter().find(|e| e.display_name() == Some(part))?;
            if let ReportEntry::Directory(dir) = entry {
                entries = &dir.entries;
            } else {
                entries = &[];
            }
            found = Some(entry);
        }

        found
    }

    /// Every skipped entry in the tree, depth-first.
    pub fn skipped(&self) -> Vec<&SkippedEntry> {
        fn collect<'a>(entries: &'a [ReportEntry], out: &mut Vec<&'a SkippedEntry>) {
            for entry in entries {
                match entry {
                    ReportEntry::Directory(dir) => collect(&dir.entries, out),
                    ReportEntry::Skipped(skipped) => out.push(skipped),
                    ReportEntry::File(_) => {}
                }
            }
        }

        let mut out = Vec::new();
        collect(&self.entries, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TraversalReport {
        TraversalReport {
            volume_label: Some("TESTDISK".to_string()),
            entries: vec![
                ReportEntry::Directory(DirectoryNode {
                    name: "DOCS".to_string(),
                    cluster: 2,
                    entries: vec![
                        ReportEntry::File(FileNode {
                            name: "A.TXT".to_string(),
                            cluster: 3,
                            excerpt: Excerpt::Text { text: "hello".to_string() },
                        }),
                        ReportEntry::Skipped(SkippedEntry::new(
                            3,
                            Some("B.TXT".to_string()),
                            Some(4),
                            &ScanError::BadCluster { cluster: 4 },
                        )),
                    ],
                }),
                ReportEntry::File(FileNode {
                    name: "ROOT.TXT".to_string(),
                    cluster: 5,
                    excerpt: Excerpt::unavailable(&ScanError::NoNewlineFound { cluster: 5 }),
                }),
            ],
        }
    }

    #[test]
    fn test_find_nested_entry() {
        let report = sample();
        let file = report.find("DOCS/A.TXT").and_then(ReportEntry::as_file).unwrap();
        assert_eq!(file.excerpt.text(), Some("hello"));
        assert!(report.find("DOCS/MISSING").is_none());
        assert!(report.find("ROOT.TXT/A.TXT").is_none());
    }

    #[test]
    fn test_skipped_collects_nested_errors() {
        let report = sample();
        let skipped = report.skipped();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].kind, ErrorKind::BadCluster);
        assert_eq!(skipped[0].entry_index, 3);
        assert_eq!(skipped[0].cluster, Some(4));
    }

    #[test]
    fn test_unavailable_excerpt_has_no_text() {
        let report = sample();
        let file = report.find("ROOT.TXT").and_then(ReportEntry::as_file).unwrap();
        assert!(file.excerpt.text().is_none());
        assert!(matches!(
            file.excerpt,
            Excerpt::Unavailable { kind: ErrorKind::NoNewlineFound, .. }
        ));
    }
}
