use super::{ui, Context};
use crate::output::Output;
use crate::OfflineCommands;
use color_eyre::eyre::{bail, eyre};
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use teli_client::HttpClient;
use teli_core::{CacheStorage, DiskCacheStorage, FetchSource, OfflinePlan, OfflineWorker};

type DiskWorker = OfflineWorker<DiskCacheStorage, HttpClient>;

fn worker(context: &Context) -> Result<DiskWorker> {
    let offline = &context.config.offline;
    let plan = OfflinePlan::new(offline.cache_version.clone(), offline.assets.clone());
    let storage = DiskCacheStorage::new(context.paths.offline_cache_dir())
        .map_err(|e| eyre!("Failed to open offline cache: {}", e))?;
    Ok(OfflineWorker::new(plan, storage, context.client()?))
}

pub async fn run_offline(context: &Context, cmd: OfflineCommands, output: &Output) -> Result<()> {
    let worker = worker(context)?;
    match cmd {
        OfflineCommands::Install => install(&worker, output).await,
        OfflineCommands::Activate => activate(&worker, output).await,
        OfflineCommands::Fetch { path } => fetch(&worker, &path, output).await,
        OfflineCommands::Status => status(&worker, output).await,
    }
}

async fn install(worker: &DiskWorker, output: &Output) -> Result<()> {
    let version = worker.plan().version().to_string();
    let spinner = ui::spinner(format!("Caching {} assets...", worker.plan().assets().len()));
    let installed = worker.install().await;
    spinner.finish_and_clear();

    let count = installed.map_err(|e| eyre!("Install of {} failed, nothing was cached: {}", version, e))?;
    if output.is_human() {
        output.success(format!("Cached {} assets in {}", count, version));
    } else {
        output.json(&json!({ "type": "install", "version": version, "assets": count }));
    }
    Ok(())
}

async fn activate(worker: &DiskWorker, output: &Output) -> Result<()> {
    let deleted = worker
        .activate()
        .await
        .map_err(|e| eyre!("Cleanup of old caches failed: {}", e))?;

    if output.is_human() {
        if deleted.is_empty() {
            output.info(format!("{} is the only cache, nothing to delete", worker.plan().version()));
        } else {
            output.success(format!("Deleted {}", deleted.join(", ")));
        }
    } else {
        output.json(&json!({
            "type": "activate",
            "version": worker.plan().version(),
            "deleted": deleted,
        }));
    }
    Ok(())
}

async fn fetch(worker: &DiskWorker, path: &str, output: &Output) -> Result<()> {
    if !path.starts_with('/') {
        bail!("Path must start with '/', e.g. /static/style.css");
    }

    let (response, source) = worker
        .fetch(path)
        .await
        .map_err(|e| eyre!("{} is not reachable and not cached: {}", path, e))?;
    let source = match source {
        FetchSource::Network => "network",
        FetchSource::Cache => "cache",
    };

    if output.is_human() {
        let line = format!(
            "{} {} ({}, {} bytes) from {}",
            path,
            response.status,
            response.content_type.as_deref().unwrap_or("unknown type"),
            response.body.len(),
            source
        );
        if response.is_ok() {
            output.success(line);
        } else {
            output.warn(line);
        }
    } else {
        output.json(&json!({
            "type": "fetch",
            "path": path,
            "status": response.status,
            "content_type": response.content_type,
            "bytes": response.body.len(),
            "source": source,
        }));
    }
    Ok(())
}

async fn status(worker: &DiskWorker, output: &Output) -> Result<()> {
    let names = worker
        .storage()
        .keys()
        .await
        .map_err(|e| eyre!("Failed to list offline caches: {}", e))?;
    let current = worker.plan().version();
    let stale = worker.plan().stale_caches(&names);

    if !output.is_human() {
        output.json(&json!({
            "type": "status",
            "root": worker.storage().root().display().to_string(),
            "current": current,
            "installed": names.iter().any(|n| n == current),
            "stale": stale,
        }));
        return Ok(());
    }

    output.info(format!("Offline cache: {}", worker.storage().root().display()));
    if names.is_empty() {
        output.warn("No caches yet; run 'teli offline install'");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Cache").add_attribute(Attribute::Bold),
        Cell::new("State").add_attribute(Attribute::Bold),
    ]);
    for name in &names {
        let state = if name == current {
            Cell::new("current").fg(Color::Green)
        } else {
            Cell::new("stale").fg(Color::Yellow)
        };
        table.add_row(vec![Cell::new(name), state]);
    }
    output.println(table.to_string());

    if !stale.is_empty() {
        output.println(format!("{} run 'teli offline activate' to delete stale caches", "⚠".yellow()));
    }
    Ok(())
}
