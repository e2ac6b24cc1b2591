use clap::{ArgAction, Parser, Subcommand};
use fatscan_core::{DiskImage, WalkOptions};
use fatscan_filesystems::fat16::{Excerpt, ReportEntry, TraversalReport};
use fatscan_filesystems::Fat16Walker;
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "fatscan")]
#[command(about = "Read-only FAT16 disk image inspector", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the directory tree and print names and first lines
    Scan {
        /// Path to the disk image
        image: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Print the cluster link map after the tree
        #[arg(long)]
        chains: bool,
        /// JSON file with walk options
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Deepest subdirectory nesting to walk
        #[arg(long)]
        max_depth: Option<u32>,
    },
    /// Print the boot sector geometry
    Info {
        /// Path to the disk image
        image: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Scan { image, json, chains, config, max_depth } => {
            let mut options = match config {
                Some(path) => WalkOptions::from_json_file(&path)?,
                None => WalkOptions::default(),
            };
            if let Some(depth) = max_depth {
                options.max_depth = depth;
            }

            let image = DiskImage::open(&image)?;
            let mut walker = Fat16Walker::new(image.bytes(), options)?;
            let report = walker.walk_root()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }

            if chains {
                println!("\nCluster links:");
                for (cluster, next) in walker.chains().links() {
                    println!("  {:#06x} -> {:#06x}", cluster, next);
                }
            }

            let skipped = report.skipped().len();
            if skipped > 0 {
                eprintln!("{} entries skipped due to errors", skipped);
            }
        }
        Commands::Info { image } => {
            let image = DiskImage::open(&image)?;
            let walker = Fat16Walker::new(image.bytes(), WalkOptions::default())?;
            let geometry = walker.geometry();

            println!("Image: {} ({} bytes)", image.name(), image.len());
            println!("  Bytes per sector: {}", geometry.bytes_per_sector);
            println!("  Reserved sectors: {}", geometry.reserved_sectors);
            println!("  FAT copies: {}", geometry.fat_copies);
            println!("  Sectors per FAT: {}", geometry.sectors_per_fat);
            println!("  Root entries: {}", geometry.root_entry_count);
            println!("  FAT region: {:#x}", geometry.fat_start);
            println!("  Root directory: {:#x}", geometry.root_dir_start);
            println!("  Cluster region: {:#x}", geometry.cluster_region_start);
        }
    }

    Ok(())
}

fn print_report(report: &TraversalReport) {
    match &report.volume_label {
        Some(label) => println!("disk name: {}", label),
        None => println!("disk name: (none)"),
    }
    print_entries(&report.entries, 0);
}

fn print_entries(entries: &[ReportEntry], depth: usize) {
    let indent = "    ".repeat(depth);
    for entry in entries {
        match entry {
            ReportEntry::Directory(dir) => {
                println!("{} folder {}:", indent, dir.name);
                print_entries(&dir.entries, depth + 1);
            }
            ReportEntry::File(file) => {
                println!("{}     {}:", indent, file.name);
                match &file.excerpt {
                    Excerpt::Text { text } => println!("{}         {}", indent, text),
                    Excerpt::Unavailable { detail, .. } => println!("{}         <{}>", indent, detail),
                }
            }
            ReportEntry::Skipped(skipped) => {
                println!(
                    "{}     [skipped entry {}{}: {:?}] {}",
                    indent,
                    skipped.entry_index,
                    skipped.name.as_deref().map(|n| format!(" {}", n)).unwrap_or_default(),
                    skipped.kind,
                    skipped.detail
                );
            }
        }
    }
}
