//! swipe-list - A terminal viewer for `net.swipe.list` documents.
//!
//! # Usage
//!
//! ```bash
//! swipe-list menu.json
//! swipe-list --lang ja https://example.com/menu.json
//! swipe-list --dump menu.json
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use swipe_list::app::App;
use swipe_list::config::{
    ConfigFlags, clear_config_flags, default_cache_dir, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use swipe_list::perf;
use swipe_list::prefetch::DEFAULT_WORKERS;

/// A terminal viewer for swipe list documents
#[derive(Parser, Debug)]
#[command(name = "swipe-list", version, about, long_about = None)]
struct Cli {
    /// List document path or URL
    #[arg(value_name = "DOCUMENT")]
    document: String,

    /// Preferred document language (e.g. en, ja, pt-BR)
    #[arg(long, value_name = "ID")]
    lang: Option<String>,

    /// Directory to cache prefetched icons in
    #[arg(long, value_name = "PATH")]
    cache_dir: Option<PathBuf>,

    /// Number of icon prefetch threads
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Print the rendered list as JSON instead of opening the viewer
    #[arg(long)]
    dump: bool,

    /// Seconds to wait for icons with --dump
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    timeout: u64,

    /// Enable timing logs
    #[arg(long)]
    perf: bool,

    /// Write prefetch and render events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os(perf::EVENT_LOG_ENV).map(PathBuf::from));
    if let Err(err) = perf::set_event_log_path(render_debug_log_path.as_deref()) {
        tracing::warn!(
            path = %render_debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            %err,
            "failed to initialize render debug log"
        );
    }

    let app = App::new(cli.document)
        .with_language_preferences(effective.language_preferences())
        .with_cache_dir(effective.cache_dir.clone().unwrap_or_else(default_cache_dir))
        .with_workers(effective.workers.unwrap_or(DEFAULT_WORKERS));

    if cli.dump {
        let output = app.dump(Duration::from_secs(cli.timeout))?;
        println!("{output}");
        return Ok(());
    }

    app.run().context("Application error")
}
