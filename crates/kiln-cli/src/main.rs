use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use kiln_descriptor::Classpath;
use std::io;
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

use commands::Session;
use logging::LogLevel;

/// Kiln build descriptor loader.
///
/// Reads a Gradle Kotlin-DSL build script (or its TOML form), validates it,
/// and reports the ordered task list and the resolved dependency set.
///
/// EXAMPLES:
///     kiln check build.gradle.kts          Validate a descriptor
///     kiln plan build.gradle.kts test      Tasks needed to run `test`
///     kiln deps build.gradle.kts           Resolved dependencies
///     kiln export build.gradle.kts -o build.toml
///
/// ENVIRONMENT VARIABLES:
///     KILN_LOG          Tracing filter directives (falls back to RUST_LOG)
///     KILN_STRICT       Set to 'true' to reject unsupported statements
///     KILN_FORMAT       'text' or 'json'
///     NO_COLOR          Set to disable colored output
#[derive(Parser)]
#[command(name = "kiln")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Reject statements the loader does not model instead of ignoring them
    #[arg(long, global = true)]
    strict: bool,

    /// Log verbosity level (default: error)
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevel>,

    /// Raise log verbosity (repeatable)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable colored output
    #[arg(
        long,
        env = "NO_COLOR",
        global = true,
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a build descriptor
    ///
    /// Prints warnings and exits with a non-zero status when the
    /// descriptor is malformed.
    ///
    /// EXAMPLES:
    ///     kiln check build.gradle.kts
    ///     kiln check build.toml --json
    #[command(visible_alias = "c")]
    Check {
        /// Path to the descriptor (.gradle.kts or .toml)
        file: PathBuf,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the ordered task list
    ///
    /// Without goals, plans `build` when the descriptor has it and every
    /// task otherwise.
    ///
    /// EXAMPLES:
    ///     kiln plan build.gradle.kts
    ///     kiln plan build.gradle.kts test jar
    ///     kiln plan build.gradle.kts --json
    #[command(visible_alias = "p")]
    Plan {
        /// Path to the descriptor
        file: PathBuf,
        /// Tasks to plan for
        goals: Vec<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List resolved dependencies
    ///
    /// EXAMPLES:
    ///     kiln deps build.gradle.kts
    ///     kiln deps build.gradle.kts --classpath test-runtime
    #[command(visible_alias = "d")]
    Deps {
        /// Path to the descriptor
        file: PathBuf,
        /// Only dependencies visible on this classpath
        /// (api, compile, runtime, test-compile, test-runtime)
        #[arg(long)]
        classpath: Option<Classpath>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Write the TOML form of a descriptor
    ///
    /// EXAMPLES:
    ///     kiln export build.gradle.kts
    ///     kiln export build.gradle.kts -o build.toml
    Export {
        /// Path to the descriptor
        file: PathBuf,
        /// Output file (defaults to stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     kiln completions bash > ~/.bash_completions/kiln.bash
    ///     kiln completions zsh > ~/.zfunc/_kiln
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = cli
        .log_level
        .unwrap_or_else(|| LogLevel::default().raised(cli.verbose));
    logging::init(level)?;

    let open = |file: PathBuf, json: bool| Session::open(file, cli.strict, json, cli.no_color);

    match cli.command {
        Commands::Check { file, json } => commands::check::run(&open(file, json)?),
        Commands::Plan { file, goals, json } => commands::plan::run(&open(file, json)?, &goals),
        Commands::Deps {
            file,
            classpath,
            json,
        } => commands::deps::run(&open(file, json)?, classpath),
        Commands::Export { file, output } => {
            commands::export::run(&open(file, false)?, output.as_deref())
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "kiln", &mut io::stdout());
            Ok(())
        }
    }
}
