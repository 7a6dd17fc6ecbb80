use clap::{Parser, Subcommand};
use mb_core::MediaKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediabridge")]
#[command(author, version, about = "Chunked access to large media files by handle")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show size, type and name of a file
    Stat {
        /// File URI or path
        uri: String,
    },

    /// Read one bounded byte range
    Read {
        /// File URI or path
        uri: String,

        /// Absolute offset to start reading at
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Requested length (clamped to the configured read cap)
        #[arg(long, default_value_t = 4 * 1024 * 1024)]
        length: u64,

        /// Write the raw bytes to stdout instead of the JSON chunk
        #[arg(long)]
        raw: bool,
    },

    /// Compute the SHA-256 digest by streaming chunks
    Hash {
        /// File URI or path
        uri: String,

        /// Chunk size in bytes (uses config default if not specified)
        #[arg(long)]
        chunk_size: Option<u64>,
    },

    /// Detect the file type from its leading bytes
    Sniff {
        /// File URI or path
        uri: String,
    },

    /// Print a URI a native player can open
    Playable {
        /// File URI or path
        uri: String,
    },

    /// Copy a file chunk by chunk through the retrying uploader
    Copy {
        /// Source URI or path
        source: String,

        /// Destination file
        dest: PathBuf,

        /// Chunk size in bytes (uses config default if not specified)
        #[arg(long)]
        chunk_size: Option<u64>,

        /// Attempts per chunk (uses config default if not specified)
        #[arg(long)]
        retries: Option<u32>,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run the media selector over a list of local files
    Select {
        /// Media kind to accept: image, video or any
        #[arg(long, default_value = "any")]
        kind: MediaKind,

        /// Allow more than one result
        #[arg(long)]
        multiple: bool,

        /// Maximum number of results (0 = unlimited)
        #[arg(long, default_value_t = 0)]
        max_count: u32,

        /// MIME filter such as video/mp4 or image/*
        #[arg(long)]
        media_type: Option<String>,

        /// Candidate files
        paths: Vec<PathBuf>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
