#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! Terminal player for TALES stories.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::process;

use tales_engine::config::CONFIG_FILE;
use tales_engine::{Interpreter, RunOutcome, TerminalPresenter, load_config, load_program, script_name};

#[derive(Parser)]
#[command(author, version, about = "Play a story written in the TALES scripting language.")]
struct Cli {
    /// Script to play.
    script: PathBuf,
    /// Scene to start in instead of the first one.
    #[arg(long, value_name = "NAME")]
    scene: Option<String>,
    /// Settings file.
    #[arg(long, value_name = "FILE", default_value = CONFIG_FILE)]
    config: PathBuf,
    /// Root directory for saved games.
    #[arg(long, value_name = "DIR")]
    save_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = load_config(&cli.config);
    if let Some(dir) = cli.save_dir {
        config.save_dir = dir;
    }
    if cli.scene.is_some() {
        config.start_scene = cli.scene;
    }

    info!("Start: loading script '{}'", cli.script.display());
    let program = load_program(&cli.script)?;
    let name = script_name(&cli.script);
    let mut interpreter = Interpreter::new(program, &name, config.start_scene.as_deref())
        .with_context(|| format!("starting story '{name}'"))?
        .with_save_root(&config.save_dir);

    let mut presenter = TerminalPresenter::new(&config);
    presenter.show_title(&name);
    let outcome = interpreter.run(&mut presenter);
    info!("story ended: {outcome:?}");
    if outcome == RunOutcome::Halted {
        process::exit(2);
    }
    Ok(())
}
