use clap::{Parser, Subcommand};
use plaindoc::config::{self, SiteConfig};
use plaindoc::imaging::ImageCrateProbe;
use plaindoc::layout::AmmoniaSanitizer;
use plaindoc::output;
use plaindoc::pipeline::{CancelToken, SiteBuilder};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "plaindoc")]
#[command(about = "Static documentation site generator for plain markdown")]
#[command(long_about = "\
Static documentation site generator for plain markdown

Every markdown document starts with a JSON front matter block naming its
category and its order within that category, followed by a `---` line:

  {\"category\": \"Guide\", \"order\": 1, \"date\": \"2024-03-01 09:00\"}
  ---
  # Install

  Download the binary...

Source layout:

  docs/
  ├── intro.md                 → dist/intro.html
  ├── guide/
  │   └── install.md           → dist/guide/install.html
  └── images/                  → dist/images/ (copied as-is)

Every page embeds a menu of all categories and pages. The index page lists
the same, and an optional RSS feed carries the 20 most recently dated pages.

Run 'plaindoc gen-config' to generate a documented plaindoc.toml.")]
#[command(version)]
struct Cli {
    /// Config file; defaults apply when it does not exist
    #[arg(long, default_value = "plaindoc.toml", global = true)]
    config: PathBuf,

    /// Documents directory (overrides source_dir)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Output directory (overrides output_dir)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site into the output directory
    Build,
    /// Validate documents and print the index without writing anything
    Check {
        /// Print the index as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock plaindoc.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Build => {
            let config = resolve_site_config(&cli)?;
            init_thread_pool(&config.build);

            let cancel = CancelToken::new();
            let on_interrupt = cancel.clone();
            if let Err(err) = ctrlc::set_handler(move || {
                warn!("interrupted, cancelling build");
                on_interrupt.cancel();
            }) {
                warn!(error = %err, "could not install interrupt handler");
            }

            let probe = ImageCrateProbe::new();
            let sanitizer = AmmoniaSanitizer::new();
            info!(source = %config.source_dir.display(), output = %config.output_dir.display(), "building site");
            let report = SiteBuilder::new(&config, &probe, &sanitizer)
                .with_cancel(cancel)
                .run()?;
            output::print_build_report(&report);
        }
        Command::Check { json } => {
            let config = resolve_site_config(&cli)?;
            init_thread_pool(&config.build);
            let probe = ImageCrateProbe::new();
            let sanitizer = AmmoniaSanitizer::new();
            let report = SiteBuilder::new(&config, &probe, &sanitizer).check()?;
            if json {
                println!("{}", output::format_check_json(&report)?);
            } else {
                output::print_check_report(&report);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load the config file and apply command-line overrides.
fn resolve_site_config(cli: &Cli) -> Result<SiteConfig, config::ConfigError> {
    config::load_config(&cli.config)?.with_dirs(cli.source.clone(), cli.output.clone())
}

/// Initialize the rayon thread pool based on build config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(build: &config::BuildConfig) {
    let threads = config::effective_threads(build);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
