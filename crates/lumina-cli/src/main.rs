use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

use lumina_bus::EventBus;
use lumina_core::{load_config, read_config, validate_config, write_default_config, LuminaConfig, Studio, CONFIG_FILE};
use lumina_gateway::{create_gateway, ConceptGateway, ProviderType};
use lumina_schema::{resolve_style_label, DESIGN_STYLES};

#[derive(Parser)]
#[command(name = "lumina", version, about = "AI logo concept studio")]
struct Cli {
    #[arg(
        long,
        default_value = "~/.lumina",
        help = "Config root directory (contains config/ and logs/)"
    )]
    config_root: PathBuf,

    #[arg(long, global = true, help = "Use the offline stub gateway")]
    offline: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Generate logo concepts for a business")]
    Generate {
        #[arg(long, help = "Business name")]
        name: String,
        #[arg(long, help = "Industry or niche")]
        industry: String,
        #[arg(long, help = "Design style id or label (see `lumina styles`)")]
        style: Option<String>,
        #[arg(long, help = "Write the concepts as JSON to this file")]
        out: Option<PathBuf>,
        #[arg(long, help = "Print JSON instead of a summary")]
        json: bool,
    },
    #[command(about = "Refine one concept of a concepts file in place")]
    Refine {
        #[arg(long, help = "Concepts JSON file")]
        concepts: PathBuf,
        #[arg(long, help = "Concept number (1-based)")]
        index: usize,
        #[arg(long, help = "What to change")]
        feedback: String,
    },
    #[command(about = "Generate and save the logo image for a concept")]
    Visualize {
        #[arg(long, help = "Concepts JSON file")]
        concepts: PathBuf,
        #[arg(long, help = "Concept number (1-based)")]
        index: usize,
        #[arg(long, default_value = ".", help = "Directory for the image")]
        out_dir: PathBuf,
    },
    #[command(about = "Edit an existing logo image")]
    EditImage {
        #[arg(long, help = "Source image")]
        image: PathBuf,
        #[arg(long, help = "Edit instruction")]
        instruction: String,
        #[arg(long, help = "Where to write the edited image")]
        out: PathBuf,
    },
    #[command(about = "Open the interactive studio")]
    Studio {
        #[arg(long, default_value = ".", help = "Directory for saved images")]
        save_dir: PathBuf,
    },
    #[command(about = "List design styles")]
    Styles,
    #[command(about = "Validate config file")]
    Validate,
    #[command(about = "Write a default config file")]
    Init {
        #[arg(long, help = "Overwrite an existing config")]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Expand ~ to home directory
    if cli.config_root.starts_with("~") {
        if let Some(home) = std::env::var_os("HOME") {
            cli.config_root = PathBuf::from(home).join(
                cli.config_root
                    .strip_prefix("~")
                    .unwrap_or(&cli.config_root),
            );
        }
    }

    let log_dir = cli.config_root.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "lumina.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // The studio owns the terminal, so it only logs to file.
    let stderr_layer = (!matches!(cli.command, Some(Commands::Studio { .. })))
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .init();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config_dir = cli.config_root.join("config");

    match command {
        Commands::Generate {
            name,
            industry,
            style,
            out,
            json,
        } => {
            let config = load_settings(&config_dir, cli.offline)?;
            let style = resolve_style_label(style.as_deref().unwrap_or(&config.studio.default_style));
            let concepts = commands::generate(gateway(&config)?, &name, &industry, &style).await?;

            if let Some(out) = &out {
                commands::write_concepts(out, &concepts)?;
                eprintln!("Wrote {} concepts to {}", concepts.len(), out.display());
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&concepts)?);
            } else {
                for (i, concept) in concepts.iter().enumerate() {
                    println!("{}", commands::format_concept(i + 1, concept));
                }
            }
        }
        Commands::Refine {
            concepts,
            index,
            feedback,
        } => {
            let config = load_settings(&config_dir, cli.offline)?;
            let concept = commands::refine(gateway(&config)?, &concepts, index, &feedback).await?;
            print!("{}", commands::format_concept(index, &concept));
        }
        Commands::Visualize {
            concepts,
            index,
            out_dir,
        } => {
            let config = load_settings(&config_dir, cli.offline)?;
            let path = commands::visualize(gateway(&config)?, &concepts, index, &out_dir).await?;
            println!("Saved {}", path.display());
        }
        Commands::EditImage {
            image,
            instruction,
            out,
        } => {
            let config = load_settings(&config_dir, cli.offline)?;
            commands::edit_image(gateway(&config)?, &image, &instruction, &out).await?;
            println!("Saved {}", out.display());
        }
        Commands::Studio { save_dir } => {
            let config = load_settings(&config_dir, cli.offline)?;
            run_studio(&config, save_dir).await?;
        }
        Commands::Styles => {
            for style in DESIGN_STYLES {
                println!("{:<12} {}", style.id, style.label);
            }
        }
        Commands::Validate => {
            // Requires the file; defaults are not validated here.
            let config = load_config(&config_dir)?;
            let provider = match config.gateway.provider {
                ProviderType::Gemini => "gemini",
                ProviderType::Stub => "stub",
            };
            println!(
                "Config valid. provider={provider}, text_model={}, image_model={}, default_style={}",
                config.gateway.text_model, config.gateway.image_model, config.studio.default_style
            );
        }
        Commands::Init { force } => {
            let path = config_dir.join(CONFIG_FILE);
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            write_default_config(&config_dir)?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}

/// Reads the config, forcing the stub gateway when `offline` is set.
fn load_settings(config_dir: &Path, offline: bool) -> Result<LuminaConfig> {
    let mut config = read_config(config_dir)?;
    if offline {
        config.gateway.provider = ProviderType::Stub;
    }
    validate_config(&config)?;
    Ok(config)
}

fn gateway(config: &LuminaConfig) -> Result<Arc<dyn ConceptGateway>> {
    create_gateway(&config.gateway_config())
}

async fn run_studio(config: &LuminaConfig, save_dir: PathBuf) -> Result<()> {
    let bus = EventBus::new(256);
    let studio = Studio::new(gateway(config)?, lumina_tui::system_clipboard())
        .with_publisher(bus.publisher())
        .with_copy_window(config.studio.copy_feedback_window());
    let options = lumina_tui::TuiOptions {
        default_style: config.studio.default_style.clone(),
        save_dir,
    };
    lumina_tui::run_tui(studio, &bus, options).await
}
