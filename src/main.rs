use clap::{Parser as ClapParser, Subcommand};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;
use uql_lang::cli::{self, CliError, RunOptions, RunResult};
use uql_lang::{to_json, to_json_pretty};

#[derive(ClapParser)]
#[command(name = "uql")]
#[command(about = "UQL - A pipe-style query language for JSON, CSV, XML and YAML payloads")]
#[command(version)]
struct Cli {
    /// Log every pipeline stage to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and execute a query
    Run {
        /// The query to execute
        query: String,

        /// Input text (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Parse the input as JSON before running the query
        #[arg(short, long)]
        json: bool,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't execute
        #[arg(long)]
        syntax_only: bool,
    },

    /// List the functions available to queries
    Functions,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("UQL_LOG").unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            query,
            input,
            json,
            pretty,
            syntax_only,
        } => run(query, input, json, pretty, syntax_only),
        Commands::Functions => {
            print!("{}", cli::functions_overview());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(
    query: String,
    input: Option<String>,
    json_input: bool,
    pretty: bool,
    syntax_only: bool,
) -> Result<(), CliError> {
    let input = match input {
        Some(s) => Some(s),
        None if !syntax_only && !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = RunOptions {
        query,
        input,
        json_input,
        pretty,
        syntax_only,
    };

    match cli::execute_run(&options)? {
        RunResult::SyntaxValid => println!("Syntax is valid"),
        RunResult::Success(output) => {
            let text = if options.pretty {
                to_json_pretty(&output)
            } else {
                to_json(&output)
            };
            println!("{}", text);
        }
    }
    Ok(())
}
