use clap::{Parser, Subcommand};
use docframe::builtin::PluginCatalog;
use docframe::site::Site;
use docframe::{config, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    if env!("DOCFRAME_RELEASE_TAG") == "true" {
        return env!("CARGO_PKG_VERSION");
    }
    let hash = env!("DOCFRAME_GIT_HASH");
    if hash.is_empty() {
        "dev@unknown"
    } else {
        // Leaked once at startup
        Box::leak(format!("dev@{hash}").into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "docframe")]
#[command(about = "Compose documentation pages from layouts and plugins")]
#[command(long_about = "\
Compose documentation pages from layouts and plugins

Plugins listed in site.toml run in order: content plugins provide documents,
theme plugins provide outlets. Each document is rendered through the first
custom layout whose match holds (or the default layout), region by region,
outlet by outlet. Rewrite rules then move pages to their final paths.

Set DOCFRAME_LOG=debug to trace layout resolution per document.

Run 'docframe gen-config' to print a documented site.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Site configuration file
    #[arg(long, default_value = "site.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate configuration, plugins, and outlet bindings without composing
    Check,
    /// Compose every document into the page tree
    Compose {
        /// Print the page tree as JSON instead of a report
        #[arg(long)]
        json: bool,
    },
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("DOCFRAME_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog = PluginCatalog::with_builtins();

    match cli.command {
        Command::Check => {
            println!("==> Checking {}", cli.config.display());
            let site = Site::load(&cli.config, &catalog)?;
            output::print_check_output(site.registry(), site.pipeline());
            site.prepare()?;
            println!("==> Configuration is valid");
        }
        Command::Compose { json } => {
            let build = Site::load(&cli.config, &catalog)?.build()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&build.pages)?);
            } else {
                output::print_compose_output(&build);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
