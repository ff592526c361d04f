use std::path::PathBuf;

use bhugo::attachments::BearAttachments;
use bhugo::config::{Config, load_file_config};
use bhugo::pipeline::{self, Mode, Publisher};
use bhugo::signal::shutdown_on_signal;
use bhugo::source::{BearDatabase, SeenCache};
use bhugo::writer::DocumentWriter;
use clap::Parser;
use eyre::{Context, Result, eyre};

/// Publish tagged Bear notes as Hugo page bundles.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Run the conversion once and exit (useful when scripting).
    #[arg(long)]
    once: bool,

    /// Log at debug level.
    #[arg(long)]
    debug: bool,

    /// Path to a specific configuration file.
    /// Defaults to ./.bhugo.toml, then $XDG_CONFIG_HOME/bhugo/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Path to Bear's database.sqlite.
    #[arg(long, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Root of the Hugo site.
    #[arg(long, value_name = "DIR")]
    hugo_dir: Option<PathBuf>,

    /// Directory under the Hugo root that receives the page bundles.
    #[arg(long, value_name = "DIR")]
    content_dir: Option<PathBuf>,

    /// Bear tag that marks notes for publishing, without the '#'.
    #[arg(long, value_name = "TAG")]
    tag: Option<String>,
}

fn init_logger(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.debug);
    log::info!("bhugo initializing");

    // 1. Load config file (CLI path > default paths)
    let mut file_cfg = load_file_config(cli.config.as_deref())?;

    // 2. CLI flags win over the file
    file_cfg.database = cli.database.or(file_cfg.database);
    file_cfg.hugo_dir = cli.hugo_dir.or(file_cfg.hugo_dir);
    file_cfg.content_dir = cli.content_dir.or(file_cfg.content_dir);
    file_cfg.note_tag = cli.tag.or(file_cfg.note_tag);

    let config = Config::from_file(file_cfg);
    config.validate()?;

    // 3. Acquire resources; any failure here is fatal
    if !config.database.exists() {
        return Err(eyre!(
            "Bear database not found at: {}\nUse --database to specify the path manually.",
            config.database.display()
        ));
    }
    let source = BearDatabase::open(&config.database).wrap_err_with(|| {
        format!(
            "Failed to open Bear database: {}",
            config.database.display()
        )
    })?;
    let attachments = BearAttachments::open(&config.database, config.images_dir.clone())
        .wrap_err("Failed to open Bear database for attachments")?;

    let writer = DocumentWriter::new(config.content_root(), config.managed_keys());
    writer.ensure_root()?;

    let shutdown = shutdown_on_signal().wrap_err("Failed to install signal handler")?;

    // 4. Run
    let mode = if cli.once {
        Mode::Once
    } else {
        Mode::Watch {
            interval: config.interval,
        }
    };
    let options = config.transform_options();
    let cache = SeenCache::new();
    pipeline::run(
        source,
        Publisher {
            options: &options,
            writer: &writer,
            attachments,
        },
        &cache,
        &config.note_tag,
        mode,
        &shutdown,
    );

    log::info!("bhugo exiting");
    Ok(())
}
