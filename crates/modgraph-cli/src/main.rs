use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use modgraph_core::DependencyKind;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;

/// Module dependency graph analyzer.
///
/// Loads module facts from scan files, resolves every declared dependency,
/// and produces packaging reports: exported packages, dependency listings,
/// kit contents, disabled autoloads and cluster-boundary violations.
///
/// EXAMPLES:
///     modgraph report kits --scan platform.toml     Print kit contents
///     modgraph report modules --json                Modules as JSON
///     modgraph run                                  Write every configured report
///     modgraph check --deny-warnings                Fail on any warning
///     modgraph resolve "org.example.api/1"          Show matching modules
///
/// ENVIRONMENT VARIABLES:
///     MODGRAPH_JSON         Set to '1' for JSON output by default
///     MODGRAPH_MAX_FRIENDS  Cross-group friend limit
///     MODGRAPH_GENERATE     Comma separated groups to report on
///     MODGRAPH_FORMAT       Default format for configured outputs
///     RUST_LOG              Log filter (overrides -v)
///     NO_COLOR              Set to disable colored output
#[derive(Parser)]
#[command(name = "modgraph")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one report
    ///
    /// Report kinds: public-packages, friend-packages, group-friend-packages,
    /// shared-packages, modules, dependencies, implementation-dependencies,
    /// group-dependencies, group-implementation-dependencies, kits,
    /// disabled-autoloads, reverse-dependencies.
    ///
    /// EXAMPLES:
    ///     modgraph report public-packages --scan ide.toml
    ///     modgraph report friend-packages --max-friends 3
    ///     modgraph report dependencies --generate ide -o deps.txt
    #[command(visible_alias = "r")]
    Report {
        /// Report kind
        kind: String,
        /// Scan file to load (repeatable; defaults to [inputs] scans)
        #[arg(long = "scan", short = 's')]
        scans: Vec<PathBuf>,
        /// Group to report on (repeatable)
        #[arg(long, short = 'g')]
        generate: Vec<String>,
        /// Cross-group friend count above which a warning is printed
        #[arg(long)]
        max_friends: Option<usize>,
        /// Write the report to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Output in JSON format
        #[arg(long, env = "MODGRAPH_JSON")]
        json: bool,
    },

    /// Write every report listed under [[output]] in modgraph.toml
    ///
    /// EXAMPLES:
    ///     modgraph run
    Run,

    /// Resolve all dependencies and run the policy analyses
    ///
    /// Unsatisfied dependencies, duplicate modules and malformed facts fail
    /// the command. Warnings (ambiguous kit ownership, excessive friends,
    /// cluster-boundary violations, unresolved recommendations) are printed
    /// and only fail it with --deny-warnings.
    ///
    /// EXAMPLES:
    ///     modgraph check
    ///     modgraph check --deny-warnings --scan all.json
    #[command(visible_alias = "c")]
    Check {
        /// Scan file to load (repeatable; defaults to [inputs] scans)
        #[arg(long = "scan", short = 's')]
        scans: Vec<PathBuf>,
        /// Treat warnings as errors
        #[arg(long)]
        deny_warnings: bool,
        /// Output in JSON format
        #[arg(long, env = "MODGRAPH_JSON")]
        json: bool,
    },

    /// Show which modules satisfy a dependency token
    ///
    /// EXAMPLES:
    ///     modgraph resolve "org.example.api/1-2 > 1.5"
    ///     modgraph resolve org.example.Capability --kind requires
    Resolve {
        /// Dependency token
        token: String,
        /// How the token is matched
        #[arg(long, value_enum, default_value_t = KindArg::Direct)]
        kind: KindArg,
        /// Scan file to load (repeatable; defaults to [inputs] scans)
        #[arg(long = "scan", short = 's')]
        scans: Vec<PathBuf>,
        /// Output in JSON format
        #[arg(long, env = "MODGRAPH_JSON")]
        json: bool,
    },

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     modgraph completions bash > /etc/bash_completion.d/modgraph
    ///     modgraph completions zsh > ~/.zfunc/_modgraph
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Dependency kind accepted by `resolve`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    /// Module code-base with optional major range
    Direct,
    /// Token that some module must provide
    Requires,
    /// Token that some module should provide
    Recommends,
}

impl From<KindArg> for DependencyKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Direct => DependencyKind::Direct,
            KindArg::Requires => DependencyKind::Requires,
            KindArg::Recommends => DependencyKind::Recommends,
        }
    }
}

fn init_logging(verbose: u8, no_color: bool) {
    let level = match verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_ansi(!no_color))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cli_config = config::Config::from_env();
    init_logging(cli.verbose, cli_config.no_color);

    match cli.command {
        Commands::Report {
            kind,
            scans,
            generate,
            max_friends,
            output,
            json,
        } => {
            // Command-line flag overrides environment variable
            let args = commands::report::ReportArgs {
                kind,
                scans,
                generate,
                max_friends,
                output,
                json: json || cli_config.default_json,
            };
            commands::report::run(args)?;
        }
        Commands::Run => {
            commands::run::run()?;
        }
        Commands::Check {
            scans,
            deny_warnings,
            json,
        } => {
            let args = commands::check::CheckArgs {
                scans,
                deny_warnings,
                json: json || cli_config.default_json,
            };
            commands::check::run(args)?;
        }
        Commands::Resolve {
            token,
            kind,
            scans,
            json,
        } => {
            let args = commands::resolve::ResolveArgs {
                token,
                kind: kind.into(),
                scans,
                json: json || cli_config.default_json,
            };
            commands::resolve::run(args)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}
