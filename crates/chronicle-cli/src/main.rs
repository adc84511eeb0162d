#![forbid(unsafe_code)]

mod cmd;
mod input;
mod output;

use std::env;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "chron: causal-relation graphs over event timelines",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Output format: pretty, text or json. Defaults to pretty on a TTY.
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Construction",
        about = "Build a relation graph from events",
        long_about = "Score event pairs, break cycles, drop implied edges and emit the graph.",
        after_help = "EXAMPLES:\n    # Build from an event file and write the graph\n    chron build --events events.json -o graph.json\n\n    # Use source text for marker evidence\n    chron build --events events.json --text article.txt -o graph.json\n\n    # Stricter threshold, four scoring threads\n    chron build --events events.json --threshold 0.6 --workers 4 --format json"
    )]
    Build(cmd::build::BuildArgs),

    #[command(
        next_help_heading = "Read",
        about = "Query a graph",
        long_about = "Run one structural query (path, causal_chain, influence, prerequisite, parallel, impact).",
        after_help = "EXAMPLES:\n    # All paths between two events\n    chron query --graph graph.json --type path --start e1 --end e9\n\n    # What an event led to\n    chron query --graph graph.json --type impact --node e3\n\n    # Read the request from a file\n    chron query --graph graph.json --request q.json --format json"
    )]
    Query(cmd::query::QueryArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show levels and critical path",
        long_about = "Recompute topological levels, slack and the critical path of a stored graph.",
        after_help = "EXAMPLES:\n    # Human-readable report\n    chron analyze --graph graph.json\n\n    # Emit machine-readable output\n    chron analyze --graph graph.json --format json"
    )]
    Analyze(cmd::analyze::AnalyzeArgs),

    #[command(
        next_help_heading = "Read",
        about = "Check a graph's invariants",
        long_about = "Check acyclicity, threshold, minimality, temporal order and stats of a stored graph. Exits 1 on any violation.",
        after_help = "EXAMPLES:\n    # Verify with the configured threshold\n    chron verify --graph graph.json\n\n    # Verify against an explicit threshold\n    chron verify --graph graph.json --threshold 0.5 --format json"
    )]
    Verify(cmd::verify::VerifyArgs),

    #[command(
        next_help_heading = "Shell",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash\n    chron completions bash > ~/.local/share/bash-completion/completions/chron"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CHRONICLE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "chronicle=debug,info"
        } else {
            "chronicle=info,warn"
        })
    });

    let format = env::var("CHRONICLE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// `Ok(false)` means the command ran but found problems.
fn run(cli: &Cli, output: OutputMode) -> anyhow::Result<bool> {
    match &cli.command {
        Commands::Build(args) => cmd::build::run_build(args, output).map(|()| true),
        Commands::Query(args) => cmd::query::run_query(args, output).map(|()| true),
        Commands::Analyze(args) => cmd::analyze::run_analyze(args, output).map(|()| true),
        Commands::Verify(args) => cmd::verify::run_verify(args, output),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command).map(|()| true)
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }
    let output = cli.output_mode();

    match run(&cli, output) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            if render_error(output, &CliError::from(&err)).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["chron", "analyze", "--graph", "g.json", "--format", "text"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
        assert_eq!(cli.output_mode(), OutputMode::Text);
    }

    #[test]
    fn json_flag_sets_output_mode() {
        let cli = Cli::parse_from(["chron", "--json", "analyze", "--graph", "g.json"]);
        assert!(cli.json);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn format_flag_wins_over_json_flag() {
        let cli = Cli::parse_from([
            "chron", "--json", "--format", "pretty", "analyze", "--graph", "g.json",
        ]);
        assert!(cli.output_mode().is_pretty());
    }

    #[test]
    fn build_overrides_parse() {
        let cli = Cli::parse_from([
            "chron",
            "build",
            "--events",
            "e.json",
            "--threshold",
            "0.6",
            "--window",
            "10",
            "-o",
            "g.json",
        ]);
        let Commands::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.threshold, Some(0.6));
        assert_eq!(args.window, Some(10));
        assert_eq!(args.out.as_deref(), Some(std::path::Path::new("g.json")));
    }

    #[test]
    fn query_requires_type_or_request() {
        assert!(Cli::try_parse_from(["chron", "query", "--graph", "g.json"]).is_err());
        assert!(
            Cli::try_parse_from([
                "chron", "query", "--graph", "g.json", "--type", "path", "--request", "q.json",
            ])
            .is_err()
        );
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["chron", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions(cmd::completions::CompletionsArgs {
                shell: clap_complete::Shell::Bash,
            })
        ));
    }

    #[test]
    fn all_subcommands_listed() {
        let subcommands = [
            vec!["chron", "build", "--events", "e.json"],
            vec!["chron", "query", "--graph", "g.json", "--type", "impact", "--node", "x"],
            vec!["chron", "analyze", "--graph", "g.json"],
            vec!["chron", "verify", "--graph", "g.json"],
            vec!["chron", "completions", "zsh"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(result.is_ok(), "failed to parse {args:?}: {:?}", result.err());
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
