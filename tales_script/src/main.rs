//! CLI entry point for tales_script.
//! Usage: cargo run -p tales_script -- check story.tales

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tales_script::{parse_script, render_outline, tokenize};

#[derive(Parser)]
#[command(author, version, about = "Inspect and validate TALES scripts.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lex and parse a script, reporting the first error.
    Check { script: PathBuf },
    /// Print the token stream line by line.
    Tokens { script: PathBuf },
    /// Print the parsed scene tree.
    Outline { script: PathBuf },
    /// Parse a script and write the AST as RON.
    Compile {
        script: PathBuf,
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli.command) {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn read_script(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("unable to read '{}'", path.display()))
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Check { script } => {
            let program = parse_script(&read_script(&script)?)?;
            println!(
                "{}: OK ({} scenes, {} elements)",
                script.display(),
                program.scene_ids().len(),
                program.len()
            );
        },
        Command::Tokens { script } => {
            let lines = tokenize(&read_script(&script)?)?;
            for (line, tokens) in &lines {
                let rendered: Vec<String> = tokens.iter().map(ToString::to_string).collect();
                println!("{line:>4}: {}", rendered.join(" "));
            }
        },
        Command::Outline { script } => {
            let program = parse_script(&read_script(&script)?)?;
            print!("{}", render_outline(&program));
        },
        Command::Compile { script, out } => {
            let program = parse_script(&read_script(&script)?)?;
            let ron = ron::ser::to_string_pretty(&program, ron::ser::PrettyConfig::default())
                .context("serializing program")?;
            match out {
                Some(path) => {
                    fs::write(&path, ron).with_context(|| format!("writing '{}'", path.display()))?;
                    println!("wrote {}", path.display());
                },
                None => println!("{ron}"),
            }
        },
    }
    Ok(())
}
