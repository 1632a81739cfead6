//! Docsview - standalone bootstrap
//!
//! Loads the viewer against an in-memory page, applies any programmatic
//! actions and writes the resulting standalone HTML page.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context as _, Result};
use clap::Parser;
use docsview::core::config::ViewerConfig;
use docsview::core::storage::FileStore;
use docsview::host::DomEvent;
use docsview::{Action, Context, DocsViewer, PageHost};
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "docsview", version, about = "Render the document viewer as a standalone page")]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Storage file override
    #[arg(long)]
    storage: Option<PathBuf>,

    /// Document to show
    #[arg(long)]
    document: Option<String>,

    /// JSON action to apply, e.g. '{"type":"add-comment","payload":{...}}'
    #[arg(long = "action", value_name = "JSON")]
    actions: Vec<String>,

    /// Write the page here instead of stdout
    #[arg(long, short)]
    out: Option<PathBuf>,

    /// Increase log verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Apply JSON actions in order, skipping malformed or rejected ones.
/// Returns how many were applied.
fn apply_actions(viewer: &mut DocsViewer<PageHost>, actions: &[String]) -> usize {
    let mut applied = 0;
    for raw in actions {
        let result = Action::from_json(raw).and_then(|action| viewer.try_action(action));
        match result {
            Ok(()) => applied += 1,
            Err(e) => tracing::warn!("Ignoring action {}: {}", raw, e),
        }
    }
    applied
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = match cli.verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(level)
        .init();

    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load_from(path)?,
        None => ViewerConfig::load().unwrap_or_else(|e| {
            tracing::warn!("Using default config: {}", e);
            ViewerConfig::default()
        }),
    };
    if let Some(path) = cli.storage {
        config.storage.path = Some(path);
    }

    let storage = FileStore::new(config.storage_path());
    tracing::info!("Using storage at {}", storage.path().display());

    let mut viewer = DocsViewer::new(PageHost::new(), Box::new(storage), config);
    viewer.init(Context::new().with_emit(|event, payload| {
        tracing::info!("{} {}", event, payload);
    }));

    apply_actions(&mut viewer, &cli.actions);

    if let Some(doc_id) = cli.document {
        viewer.dispatch(DomEvent::SelectDocument { doc_id }, Instant::now());
    }

    let page = viewer.host().render_page();
    viewer.destroy();

    match cli.out {
        Some(path) => {
            std::fs::write(&path, page)
                .with_context(|| format!("Failed to write page: {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => print!("{}", page),
    }

    Ok(())
}
