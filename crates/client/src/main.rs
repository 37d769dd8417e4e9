//! PandaTools CLI
//!
//! Drives the file pipeline from the command line: local paths stand in for
//! the browser's file picker, and artifacts are saved to the output directory.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use client::config::Config;
use client::files::capture_paths;
use client::gallery::{GalleryItem, ItemContent, YieldFrames};
use client::protocol::{ToolId, TransferEvent, TransferOutcome};
use client::session::{FileListView, ToolContext, ToolPage, ViewerMode};
use client::transfer::{ArtifactSink, DirectorySink, HttpTransport};
use tracing_subscriber::EnvFilter;

/// PandaTools - preview, reorder and process files with the PandaTools service.
#[derive(Parser, Debug)]
#[command(name = "pandatools")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List the available tools
    Tools,

    /// Show the file list and the preview the viewer would open with
    Preview {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Print rendered gallery items as JSON
        #[arg(long)]
        json: bool,
    },

    /// Process files with a tool and save the result
    Run {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Page ranges for split-pdf (e.g. 1-3,5)
        #[arg(long)]
        ranges: Option<String>,

        /// Rotation angle in degrees for rotate-pdf
        #[arg(long, allow_hyphen_values = true)]
        angle: Option<String>,

        /// Password for protect-pdf and unlock-pdf
        #[arg(long)]
        password: Option<String>,

        /// Compression level for compress-pdf
        #[arg(long)]
        level: Option<String>,

        /// Pages to convert for pdf-to-jpg (e.g. 1,3,5-7; empty for all)
        #[arg(long)]
        pages: Option<String>,

        /// Directory to save the result in (overrides the config file)
        #[arg(long, short)]
        output_dir: Option<PathBuf>,
    },
}

/// Tool, files and reordering shared by `preview` and `run`.
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Tool identifier (see `pandatools tools`)
    #[arg(value_parser = parse_tool)]
    pub tool: ToolId,

    /// Files to select, in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Swap two positions (1-based) in the preview gallery, e.g. 1:2
    #[arg(long = "swap", value_name = "A:B", value_parser = parse_swap)]
    pub swaps: Vec<(usize, usize)>,
}

fn parse_tool(s: &str) -> Result<ToolId, String> {
    s.parse::<ToolId>().map_err(|e| e.to_string())
}

/// Parses `a:b` into zero-based positions.
fn parse_swap(s: &str) -> Result<(usize, usize), String> {
    let (a, b) = s
        .split_once(':')
        .ok_or_else(|| format!("expected A:B, got '{}'", s))?;
    let position = |v: &str| -> Result<usize, String> {
        match v.trim().parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n - 1),
            _ => Err(format!("invalid position '{}'", v)),
        }
    };
    Ok((position(a)?, position(b)?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default()?
    };

    // Apply environment variable overrides
    let overrides = config.apply_env_overrides();

    // Validate configuration
    config.validate()?;

    // Initialize tracing
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.to_lowercase()
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    for (variable, value) in &overrides {
        tracing::info!(%variable, %value, "Config value set from environment");
    }

    match cli.command {
        Commands::Tools => print_tools(),
        Commands::Preview { selection, json } => preview(&config, selection, json).await?,
        Commands::Run {
            selection,
            ranges,
            angle,
            password,
            level,
            pages,
            output_dir,
        } => {
            let params: BTreeMap<String, String> = [
                ("ranges", ranges),
                ("angle", angle),
                ("password", password),
                ("level", level),
                ("pages", pages),
            ]
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
            .collect();

            let output_dir = output_dir.unwrap_or_else(|| config.download.output_dir.clone());
            let succeeded = run(&config, selection, &params, output_dir).await?;
            if !succeeded {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn print_tools() {
    println!("Available tools:");
    for tool in ToolId::ALL {
        let fields: Vec<String> = tool
            .parameters()
            .iter()
            .map(|p| {
                if p.required {
                    format!("--{}", p.name)
                } else {
                    format!("[--{}]", p.name)
                }
            })
            .collect();
        println!(
            "  {:<14} {:<14} {:>5.1} MB  {}{}",
            tool.as_str(),
            tool.display_name(),
            tool.size_ceiling() as f64 / 1024.0 / 1024.0,
            if tool.accepts_multiple() { "multi-file " } else { "" },
            fields.join(" ")
        );
    }
}

/// Selects the files on a fresh page, printing the file list.
async fn open_page(
    config: &Config,
    args: &SelectionArgs,
) -> anyhow::Result<Option<ToolPage<HttpTransport>>> {
    let transport =
        HttpTransport::from_config(&config.service).context("Failed to create HTTP transport")?;
    let context = ToolContext::new(args.tool);
    let mut page: ToolPage<HttpTransport> =
        ToolPage::new(context, transport, config.gallery.clone());

    println!("{}", context.display_name());
    let files = capture_paths(&args.files)
        .await
        .context("Failed to read selected files")?;
    let accepted = page.select(files).is_ok();
    print_file_list(&page.file_list_view());
    if !accepted {
        if let Some(message) = page.status() {
            eprintln!("Error: {}", message);
        }
        return Ok(None);
    }

    if !args.swaps.is_empty() {
        page.open_viewer()?;
        if let Some(viewer) = page.viewer_mut() {
            for &(a, b) in &args.swaps {
                if !viewer.swap(a, b) {
                    eprintln!("Ignoring swap {}:{}", a + 1, b + 1);
                }
            }
        }
        page.close_viewer();
    }

    Ok(Some(page))
}

fn print_file_list(view: &FileListView) {
    match view {
        FileListView::Files {
            entries,
            reorder_hint,
        } => {
            for entry in entries {
                println!("  {:>3}. {} ({} KB)", entry.index + 1, entry.name, entry.size_kb);
            }
            if *reorder_hint {
                println!("  Tip: use --swap A:B to change the order");
            }
        }
        other => println!("  {}", other.placeholder().unwrap_or_default()),
    }
}

async fn preview(config: &Config, args: SelectionArgs, json: bool) -> anyhow::Result<()> {
    let Some(mut page) = open_page(config, &args).await? else {
        std::process::exit(1);
    };

    if page.has_pending_order() {
        page.commit_order();
        println!("Order after swaps:");
        print_file_list(&page.file_list_view());
    }

    let mode = page.open_viewer()?.clone();
    let mut items: Vec<GalleryItem> = Vec::new();
    if let Some(viewer) = page.viewer_mut() {
        viewer.render(&mut items, &mut YieldFrames).await;
    }

    match &mode {
        ViewerMode::Gallery(layout) => {
            println!("Gallery ({:?}, {} items)", layout, items.len());
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                for item in &items {
                    match &item.content {
                        ItemContent::PdfRow { name, size_kb } => {
                            println!("  [{}] {} ({} KB)", item.index, name, size_kb)
                        }
                        ItemContent::Thumbnail { url, .. } => {
                            println!("  [{}] {}", item.index, url)
                        }
                    }
                }
            }
        }
        ViewerMode::SingleDocument { url } => println!("Document preview: {}", url),
        ViewerMode::SingleImage { url } => println!("Image preview: {}", url),
        ViewerMode::Unsupported { message } => println!("{}", message),
    }

    page.close_viewer();
    Ok(())
}

async fn run(
    config: &Config,
    args: SelectionArgs,
    params: &BTreeMap<String, String>,
    output_dir: PathBuf,
) -> anyhow::Result<bool> {
    let Some(mut page) = open_page(config, &args).await? else {
        return Ok(false);
    };

    let mut events = page.subscribe();
    let cancel = page.pipeline().cancel_token();
    let outcome = {
        let submit = page.submit(params);
        tokio::pin!(submit);
        loop {
            tokio::select! {
                outcome = &mut submit => break outcome,
                Ok(event) = events.recv() => print_event(&event),
                _ = tokio::signal::ctrl_c(), if !cancel.is_cancelled() => {
                    tracing::warn!("Interrupted, abandoning upload");
                    cancel.cancel();
                }
            }
        }
    };

    match outcome {
        TransferOutcome::Success(artifact) => {
            println!(
                "\rDone: {} ({} bytes)",
                artifact.filename,
                artifact.bytes.len()
            );
            if config.download.auto_download {
                let path = DirectorySink::new(&output_dir)
                    .save(&artifact)
                    .await
                    .with_context(|| format!("Failed to save {}", artifact.filename))?;
                println!("Saved to: {}", path.display());
            } else {
                println!("auto_download is disabled; result not saved");
            }
            Ok(true)
        }
        TransferOutcome::Failure { message } => {
            eprintln!("\rError: {}", message);
            Ok(false)
        }
    }
}

fn print_event(event: &TransferEvent) {
    match event {
        TransferEvent::Started { total_bytes } => {
            tracing::debug!(total_bytes, "Upload started");
            eprint!("Uploading... 0%");
        }
        TransferEvent::ProgressTick { percent } => eprint!("\rUploading... {}%", percent),
        TransferEvent::Succeeded { .. } | TransferEvent::Failed { .. } => eprintln!(),
    }
}
