use super::Context;
use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use serde_json::json;
use teli_config::Config;

pub fn run_config(context: &Context, cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show_config(context, output),
        ConfigCommands::Init { force } => init_config(context, force, output),
    }
}

fn show_config(context: &Context, output: &Output) -> Result<()> {
    let exists = context.config_file.exists();

    if !output.is_human() {
        output.json(&json!({
            "config_file": context.config_file.display().to_string(),
            "exists": exists,
            "config": context.config,
        }));
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    let mut info_table = Table::new();
    info_table.add_row(vec![
        Cell::new("Config File").add_attribute(Attribute::Bold),
        Cell::new(context.config_file.display().to_string()),
    ]);
    info_table.add_row(vec![
        Cell::new("Offline Cache").add_attribute(Attribute::Bold),
        Cell::new(context.paths.offline_cache_dir().display().to_string()),
    ]);
    info_table.load_preset(comfy_table::presets::UTF8_FULL);
    info_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    output.println(info_table.to_string());

    if !exists {
        output.warn("No config file yet, showing defaults. Run 'teli config init' to create one.");
    }

    output.println(settings_table(&context.config).to_string());
    Ok(())
}

fn settings_table(config: &Config) -> Table {
    let section = |name: &str| Cell::new(name).fg(Color::Cyan).add_attribute(Attribute::Bold);

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Section").add_attribute(Attribute::Bold),
        Cell::new("Setting").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);

    let rows: Vec<(&str, &str, String)> = vec![
        ("server", "base_url", config.server.base_url.clone()),
        ("server", "timeout_secs", config.server.timeout_secs.to_string()),
        ("search", "debounce_ms", config.search.debounce_ms.to_string()),
        ("search", "overview_chars", config.search.overview_chars.to_string()),
        ("search", "image_base", config.search.image_base.clone()),
        ("flash", "dismiss_after_ms", config.flash.dismiss_after_ms.to_string()),
        ("flash", "fade_ms", config.flash.fade_ms.to_string()),
        ("offline", "cache_version", config.offline.cache_version.clone()),
        ("offline", "assets", config.offline.assets.join(", ")),
        ("offline", "worker_path", config.offline.worker_path.clone()),
        ("logging", "level", config.logging.level.clone()),
        ("logging", "json", config.logging.json.to_string()),
        (
            "logging",
            "file",
            config
                .logging
                .file
                .as_ref()
                .map(|f| f.display().to_string())
                .unwrap_or_else(|| "stderr".to_string()),
        ),
    ];
    for (name, key, value) in rows {
        table.add_row(vec![section(name), Cell::new(key), Cell::new(value)]);
    }

    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

fn init_config(context: &Context, force: bool, output: &Output) -> Result<()> {
    let path = &context.config_file;
    if path.exists() && !force {
        output.warn(format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ));
        return Ok(());
    }

    let config = if force { Config::default() } else { context.config.clone() };
    config
        .save_to_file(path)
        .map_err(|e| eyre!("Failed to write config to {}: {}", path.display(), e))?;
    context
        .paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create data directories: {}", e))?;

    output.success(format!("Wrote {}", path.display()));
    Ok(())
}
