use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::{BaseUrl, ConfigOverrides, GeneratorConfig};
use crate::generator::{format_output, generate_from_document, ordered_operations, print_handlers, write_output};
use crate::logging::{init_logging, LogConfig};
use crate::spec::{load_document, Operation};

/// Command-line interface for oas-mockgen
#[derive(Parser, Debug)]
#[command(name = "oas-mockgen", version)]
#[command(about = "Generate MSW mock handlers from an OpenAPI 3 specification", long_about = None)]
pub struct Cli {
    /// Log at debug level unless a more verbose level is configured
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every command that reads a specification
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Configuration file (default: oas-mockgen.toml next to the OpenAPI document, then in the current directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Only keep these paths (comma-separated)
    #[arg(short = 'm', long)]
    pub includes: Option<String>,

    /// Drop these paths (comma-separated)
    #[arg(short, long)]
    pub excludes: Option<String>,

    /// Treat include/exclude patterns as regular expressions
    #[arg(long, default_value_t = false)]
    pub regex: bool,

    /// Only keep these status codes (comma-separated)
    #[arg(short, long)]
    pub codes: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate handler modules from an OpenAPI spec
    Generate {
        /// Path or http(s) URL of the OpenAPI specification (YAML or JSON)
        spec: String,

        /// Output directory; the handlers module is printed to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Prefix handler paths: bare flag uses the first server URL, a value is used as is
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        base_url: Option<String>,

        /// Bake response bodies once at generation time
        #[arg(long = "static", default_value_t = false)]
        static_mode: bool,

        /// Emit TypeScript modules
        #[arg(long, default_value_t = false)]
        typescript: bool,

        /// Merge JSON request bodies into POST/PUT/PATCH responses
        #[arg(long, default_value_t = false)]
        echo_request_body: bool,

        /// Upper bound on generated array lengths
        #[arg(long)]
        max_array_length: Option<usize>,

        /// Seed for static-mode values
        #[arg(long)]
        seed: Option<u64>,

        /// Run prettier over the output directory
        #[arg(long, default_value_t = false)]
        prettier: bool,
    },
    /// List operations in handler order with their route keys and status codes
    Inspect {
        /// Path or http(s) URL of the OpenAPI specification (YAML or JSON)
        spec: String,

        #[command(flatten)]
        selection: SelectionArgs,
    },
}

fn parse_base_url(raw: &str) -> BaseUrl {
    match raw {
        "true" => BaseUrl::Enabled(true),
        "false" => BaseUrl::Enabled(false),
        url => BaseUrl::Fixed(url.to_string()),
    }
}

impl Commands {
    /// The configuration file merged with this command's flags
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is missing or invalid.
    pub fn config(&self) -> anyhow::Result<GeneratorConfig> {
        let (spec, selection) = match self {
            Commands::Generate { spec, selection, .. } | Commands::Inspect { spec, selection } => {
                (spec, selection)
            }
        };
        let file = GeneratorConfig::discover(selection.config.as_deref(), spec)?;
        let mut overrides = ConfigOverrides {
            includes: selection.includes.clone(),
            excludes: selection.excludes.clone(),
            regex: selection.regex,
            codes: selection.codes.clone(),
            ..ConfigOverrides::default()
        };
        if let Commands::Generate {
            output,
            base_url,
            static_mode,
            typescript,
            echo_request_body,
            max_array_length,
            seed,
            ..
        } = self
        {
            overrides.output = output.clone();
            overrides.base_url = base_url.as_deref().map(parse_base_url);
            overrides.static_mode = *static_mode;
            overrides.typescript = *typescript;
            overrides.echo_request_body = *echo_request_body;
            overrides.max_array_length = *max_array_length;
            overrides.seed = *seed;
        }
        Ok(file.merge(overrides))
    }
}

/// One line per operation: route key followed by its status codes
pub fn inspect_lines(operations: &[Operation]) -> Vec<String> {
    operations
        .iter()
        .map(|op| {
            let codes: Vec<String> = op
                .response
                .iter()
                .map(|r| {
                    if r.is_empty_body() {
                        format!("{} (empty)", r.status())
                    } else {
                        r.status().to_string()
                    }
                })
                .collect();
            format!("{}\t{}", op.route_key(), codes.join(", "))
        })
        .collect()
}

/// Execute a parsed command line
///
/// # Errors
///
/// Returns the first fatal error of the run.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.command.config()?;
    match &cli.command {
        Commands::Generate { spec, prettier, .. } => {
            let document = load_document(spec)?;
            let output = generate_from_document(&document, &config)?;
            match &config.output {
                Some(dir) => {
                    write_output(&output, dir)?;
                    if *prettier {
                        format_output(dir)?;
                    }
                    info!(dir = %dir.display(), files = output.files.len(), "generation complete");
                }
                None => {
                    let stdout = std::io::stdout();
                    let mut lock = stdout.lock();
                    print_handlers(&output, &mut lock)?;
                    lock.flush().context("failed to flush stdout")?;
                }
            }
            Ok(())
        }
        Commands::Inspect { spec, .. } => {
            let document = load_document(spec)?;
            let operations = ordered_operations(&document, &config)?;
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            for line in inspect_lines(&operations) {
                writeln!(lock, "{line}").context("failed to write to stdout")?;
            }
            Ok(())
        }
    }
}

/// Parse the process arguments, set up logging and run
///
/// # Errors
///
/// Returns the first fatal error of the run.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut log_config = LogConfig::from_env();
    if cli.verbose {
        log_config = log_config.verbose();
    }
    // A subscriber may already be installed by an embedding program.
    init_logging(&log_config).ok();
    run(cli)
}
