use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Parser;

use cc_hud::{
    config::{config_path, default_config_toml, load_config},
    diagnostics::Diagnostics,
    providers::{ProcessStdinCollector, StdinCollector},
    render::render_to,
    HudError, HudRunner,
};

const INITIALIZING: &str = "[cc-hud] Initializing...";

#[derive(Debug, Parser)]
#[command(name = "cc-hud", version, about = "Statusline HUD for Claude Code")]
struct Cli {
    /// Shell command printing `{"label": "..."}` to show in the header
    #[arg(long, value_name = "CMD")]
    extra_cmd: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write the default config file if it does not exist yet
    #[arg(long)]
    init: bool,

    /// Print the effective config and exit
    #[arg(long)]
    print: bool,
}

fn main() {
    let cli = Cli::parse();
    let diagnostics = Diagnostics::from_env_values(
        std::env::var("CC_HUD_DEBUG").ok().as_deref(),
        std::env::var("DEBUG").ok().as_deref(),
    );
    diagnostics.install_subscriber();

    // Exit 0 either way; a failing statusline command makes the host flap.
    if let Err(err) = run(cli, diagnostics) {
        println!("[cc-hud] Error: {err}");
    }
}

fn run(cli: Cli, diagnostics: Diagnostics) -> Result<(), HudError> {
    let path = cli.config.clone().unwrap_or_else(config_path);

    if cli.init {
        return init_config(&path);
    }
    if cli.print {
        let config = load_config(&path, &diagnostics);
        print!("{}", toml::to_string(&config)?);
        return Ok(());
    }

    let input = ProcessStdinCollector
        .read_input()
        .map_err(HudError::Stdin)?;
    let config = load_config(&path, &diagnostics);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(HudError::Runtime)?;
    let runner = HudRunner::new(diagnostics, cli.extra_cmd);

    match runtime.block_on(runner.prepare(&input, config, Utc::now()))? {
        Some(ctx) => render_to(&ctx, &diagnostics, |line| println!("{line}")),
        None => println!("{INITIALIZING}"),
    }
    Ok(())
}

fn init_config(path: &Path) -> Result<(), HudError> {
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }
    let config_error = |source| HudError::Config {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(config_error)?;
    }
    std::fs::write(path, default_config_toml()).map_err(config_error)?;
    println!("Created config: {}", path.display());
    Ok(())
}
