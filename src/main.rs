//! projpack CLI - pack project sources into TXT containers

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use projpack::logging::{init_file_logging, trim_log, LOG_FILE_NAME};
use projpack::ops::{build, diff_builds, list_builds};
use projpack::{Config, RunContext, Settings};

#[derive(Parser)]
#[command(name = "projpack")]
#[command(about = "pack project text sources into size-bounded TXT containers")]
#[command(version)]
struct Cli {
    /// project root
    #[arg(short, long, global = true, default_value = ".", env = "PROJPACK_ROOT")]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// write a default projpack.toml into a project directory
    Init {
        /// project directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// scan the project and write a new build (default)
    Build {
        /// log diagnostic lines and echo them to the terminal
        #[arg(short, long)]
        debug: bool,
    },

    /// show group changes between two builds
    Diff {
        /// older build id
        old: String,

        /// newer build id
        new: String,
    },

    /// list stored builds, oldest first
    Builds,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: Cli) -> projpack::Result<()> {
    match cli.command.unwrap_or(Commands::Build { debug: false }) {
        Commands::Init { path } => {
            let path = Config::init(&project_root(&path)?)?;
            println!("wrote {}", path.display());
        }

        Commands::Build { debug } => {
            let settings = load_settings(&cli.root)?;
            run_build(&settings, debug)?;
        }

        Commands::Diff { old, new } => {
            let settings = load_settings(&cli.root)?;
            let result = diff_builds(&settings.dest_root, &old, &new)?;
            for line in result.lines() {
                println!("{}", line);
            }
        }

        Commands::Builds => {
            let settings = load_settings(&cli.root)?;
            for id in list_builds(&settings.dest_root)? {
                println!("{}", id);
            }
        }
    }

    Ok(())
}

fn project_root(path: &Path) -> projpack::Result<PathBuf> {
    std::fs::canonicalize(path).map_err(|_| projpack::Error::NoProjectRoot(path.to_path_buf()))
}

fn load_settings(root: &Path) -> projpack::Result<Settings> {
    let root = project_root(root)?;
    Config::load_or_default(&root)?.into_settings(&root)
}

fn run_build(settings: &Settings, debug: bool) -> projpack::Result<()> {
    let log_path = settings.dest_root.join(LOG_FILE_NAME);
    init_file_logging(&log_path, debug)?;

    let ctx = RunContext::new(debug, Some(log_path.clone()));
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    println!("{}", env!("CARGO_PKG_DESCRIPTION"));
    println!();
    if debug {
        println!("{}", settings.summary());
    }

    let outcome = build(settings, &ctx);
    if let Err(e) = &outcome {
        ctx.fail(false, format!("build aborted: {}", e));
    }

    // trimming is best effort, the build result matters more
    if let Err(e) = trim_log(&log_path, settings.log_max_lines) {
        eprintln!("warning: {}", e);
    }

    let summary = outcome?;
    if !summary.dropped.is_empty() {
        println!("{} file(s) skipped for size", summary.dropped.len());
    }
    if !summary.removed_builds.is_empty() {
        println!("removed {} old build(s)", summary.removed_builds.len());
    }
    println!("done: {}", summary.build_dir.display());
    Ok(())
}
