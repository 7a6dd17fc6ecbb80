mod cli;

use mediabridge::config;
use mb_core::config::{Config, TransferConfig};
use mb_core::error::BoxError;
use mb_core::SelectOptions;
use mb_handles::HandleRegistry;
use mb_picker::{MediaSelector, PathListPicker};
use mb_transfer::{ProgressSender, StreamingHasher, UploadFn, UploadOptions};

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use cli::{Cli, Commands};
use std::io::{SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag.
    // Logs go to stderr so structured output on stdout stays parseable.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediabridge=debug,mb_core=debug,mb_handles=trace,mb_transfer=debug,mb_picker=debug"
                .to_string()
        } else {
            "mediabridge=info,mb_core=info,mb_handles=info,mb_transfer=info,mb_picker=info"
                .to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config;
    match cli.command {
        Commands::Validate { config: path } => {
            let path = path.or(config_path);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("mediabridge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        command => {
            let config = config::load_config_or_default(config_path.as_deref())?;
            run_command(command, config)
        }
    }
}

fn run_command(command: Commands, config: Config) -> Result<()> {
    let registry = HandleRegistry::new(config.reader.clone());

    match command {
        Commands::Stat { uri } => stat_file(&registry, &uri),
        Commands::Read {
            uri,
            offset,
            length,
            raw,
        } => read_range(&registry, &uri, offset, length, raw),
        Commands::Sniff { uri } => sniff_file(&registry, &uri),
        Commands::Playable { uri } => playable_uri(&registry, &uri),
        Commands::Hash { uri, chunk_size } => {
            let mut transfer = config.transfer.clone();
            if let Some(size) = chunk_size {
                transfer.chunk_size = size;
            }
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(hash_file(&registry, &uri, &transfer))
        }
        Commands::Copy {
            source,
            dest,
            chunk_size,
            retries,
            quiet,
        } => {
            let mut options = UploadOptions::from_config(
                chunk_size.unwrap_or(config.transfer.chunk_size),
                &config.upload,
            );
            if let Some(attempts) = retries {
                options.retry.attempts = attempts;
            }
            if !quiet {
                options = options.with_progress(percent_progress());
            }
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(copy_file(&registry, &source, &dest, options))
        }
        Commands::Select {
            kind,
            multiple,
            max_count,
            media_type,
            paths,
        } => {
            let options = SelectOptions {
                multiple,
                max_count,
                media_type,
            };
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(select_files(&config, kind, options, paths))
        }
        Commands::Validate { .. } | Commands::Version => Ok(()),
    }
}

fn stat_file(registry: &HandleRegistry, uri: &str) -> Result<()> {
    let handle = registry
        .open_scoped(uri)
        .with_context(|| format!("Failed to open {uri}"))?;
    let stat = handle.stat()?;
    println!("{}", serde_json::to_string_pretty(&stat)?);
    Ok(())
}

fn read_range(registry: &HandleRegistry, uri: &str, offset: u64, length: u64, raw: bool) -> Result<()> {
    let handle = registry
        .open_scoped(uri)
        .with_context(|| format!("Failed to open {uri}"))?;

    if raw {
        let read = handle.read_bytes(offset, length)?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&read.bytes)?;
        stdout.flush()?;
    } else {
        let chunk = handle.read_base64(offset, length)?;
        println!("{}", serde_json::to_string_pretty(&chunk)?);
    }
    Ok(())
}

fn sniff_file(registry: &HandleRegistry, uri: &str) -> Result<()> {
    let handle = registry
        .open_scoped(uri)
        .with_context(|| format!("Failed to open {uri}"))?;
    println!("{}", registry.sniff_mime(handle.handle())?);
    Ok(())
}

fn playable_uri(registry: &HandleRegistry, uri: &str) -> Result<()> {
    let handle = registry
        .open_scoped(uri)
        .with_context(|| format!("Failed to open {uri}"))?;
    println!("{}", handle.playable_uri()?);
    Ok(())
}

async fn hash_file(registry: &HandleRegistry, uri: &str, transfer: &TransferConfig) -> Result<()> {
    let handle = registry
        .open_scoped(uri)
        .with_context(|| format!("Failed to open {uri}"))?;
    let digest = StreamingHasher::with_config(registry.clone(), transfer)
        .hash(handle.handle())
        .await?;
    println!("{digest}  {uri}");
    Ok(())
}

async fn copy_file(
    registry: &HandleRegistry,
    source: &str,
    dest: &Path,
    options: UploadOptions,
) -> Result<()> {
    let handle = registry
        .open_scoped(source)
        .with_context(|| format!("Failed to open {source}"))?;
    let file = tokio::fs::File::create(dest)
        .await
        .with_context(|| format!("Failed to create {:?}", dest))?;
    let sink = FileSink {
        file: tokio::sync::Mutex::new(file),
    };

    tracing::info!(source, dest = %dest.display(), "copying");
    let summary = mb_transfer::upload(registry, handle.handle(), &sink, options).await?;

    let mut file = sink.file.into_inner();
    file.flush().await?;
    file.sync_all().await?;

    let report = serde_json::json!({
        "dest": dest.display().to_string(),
        "bytes": summary.bytes,
        "chunks": summary.chunks,
        "retries": summary.retries,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn select_files(
    config: &Config,
    kind: mb_core::MediaKind,
    options: SelectOptions,
    paths: Vec<PathBuf>,
) -> Result<()> {
    let picker = Arc::new(PathListPicker::new(paths));
    let selector = MediaSelector::with_config(picker, &config.picker);
    let result = selector.select(kind, options).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("✓ Configuration is valid");
    } else {
        println!("Configuration loaded with {} warning(s):", warnings.len());
        for warning in &warnings {
            println!("  - {}", warning);
        }
    }
    println!("  Max read bytes: {}", config.reader.max_read_bytes);
    println!("  Chunk size: {}", config.transfer.chunk_size);
    println!(
        "  Upload: {} attempt(s), {} ms delay, {:?} backoff",
        config.upload.retry_attempts, config.upload.retry_delay_ms, config.upload.backoff
    );
    println!("  Picker default max count: {}", config.picker.default_max_count);

    Ok(())
}

/// Writes uploaded chunks to a local file at their offsets.
///
/// Seeking before every write keeps a retried chunk idempotent.
struct FileSink {
    file: tokio::sync::Mutex<tokio::fs::File>,
}

#[async_trait]
impl UploadFn for FileSink {
    async fn upload(&self, chunk: &[u8], offset: u64) -> std::result::Result<(), BoxError> {
        let mut file = self.file.lock().await;
        file.seek(SeekFrom::Start(offset)).await?;
        file.write_all(chunk).await?;
        Ok(())
    }
}

/// Progress on stderr, one line per whole percent.
fn percent_progress() -> ProgressSender {
    let last = AtomicU64::new(u64::MAX);
    ProgressSender::new(move |done, total| {
        let pct = if total == 0 { 100 } else { done * 100 / total };
        if last.swap(pct, Ordering::Relaxed) != pct {
            eprintln!("{done}/{total} bytes ({pct}%)");
        }
    })
}
