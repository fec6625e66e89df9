//! Generate static files

use anyhow::{Context, Result};
use notify::{RecursiveMode, Watcher};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::generator::Generator;
use crate::{Site, CONFIG_FILE};

/// Quiet period after a change before regenerating
const DEBOUNCE: Duration = Duration::from_millis(300);

/// Load the posts and generate the site.
///
/// Sources that fail to load are reported and left out; the rest is generated.
pub fn run(site: &Site) -> Result<()> {
    let start = Instant::now();

    let report = site.load()?;
    if report.is_clean() {
        tracing::info!("Loaded {} posts", report.collection.len());
    } else {
        tracing::info!(
            "Loaded {} posts, {} sources rejected",
            report.collection.len(),
            report.errors.len()
        );
        for error in &report.errors {
            eprintln!("  {}", error);
        }
    }

    let generator = Generator::new(site)?;
    let stats = generator.generate(&report.collection)?;

    tracing::info!(
        "Generated {} posts and {} pages in {:.2}s",
        stats.posts,
        stats.pages,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Watch the sources and configuration, regenerating on change
pub async fn watch(site: &Site) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    watcher
        .watch(&site.source_dir, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {:?}", site.source_dir))?;

    let config_path = site.base_dir.join(CONFIG_FILE);
    if config_path.exists() {
        watcher.watch(&config_path, RecursiveMode::NonRecursive)?;
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopped watching");
                break;
            }
            event = rx.recv() => {
                let Some(event) = event else { break };
                if !is_relevant(&event, &site.public_dir) {
                    continue;
                }

                // Let a burst of writes settle, then drop what piled up
                tokio::time::sleep(DEBOUNCE).await;
                while rx.try_recv().is_ok() {}

                tracing::info!("File changed, regenerating...");
                // Reopen the site so configuration edits take effect
                if let Err(e) = Site::new(&site.base_dir).and_then(|site| run(&site)) {
                    tracing::error!("Generation failed: {:#}", e);
                }
            }
        }
    }

    Ok(())
}

/// Whether `event` touches anything outside the output directory
fn is_relevant(event: &notify::Event, public_dir: &Path) -> bool {
    !event.kind.is_access() && event.paths.iter().any(|p| !p.starts_with(public_dir))
}
