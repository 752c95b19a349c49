//! Command-line interface implementation for render.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, CommandFactory, Parser};
use std::path::PathBuf;

use crate::error::ExitStatus;
use crate::generate::Options;

/// Command-line arguments structure for render.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "render: generate files from templates and JSON/YAML data",
    long_about = None
)]
pub struct Args {
    /// Template file or directory
    #[arg(value_name = "TEMPLATE")]
    pub template: PathBuf,

    /// Data file (.json, .yaml or .yml)
    #[arg(value_name = "DATA")]
    pub data: PathBuf,

    /// Output path. A trailing '/' renders a file into a directory; a path
    /// containing '{{ }}' renders once per item
    #[arg(short, long, value_name = "PATH")]
    pub output: String,

    /// Overwrite existing files whose content differs
    #[arg(short, long)]
    pub force: bool,

    /// Show what would be written without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Control file to use instead of the one in the template directory
    #[arg(long, value_name = "FILE")]
    pub control: Option<PathBuf>,

    /// Print a JSON report on stdout
    #[arg(long)]
    pub json: bool,

    /// jq expression applied to the data before rendering
    #[arg(long, value_name = "EXPR")]
    pub query: Option<String>,

    /// jq expression selecting the items to render, one output per result
    #[arg(long, value_name = "EXPR")]
    pub item_query: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

impl From<Args> for Options {
    fn from(args: Args) -> Self {
        Options {
            template: args.template,
            data: args.data,
            output: args.output,
            force: args.force,
            dry_run: args.dry_run,
            control: args.control,
            query: args.query,
            item_query: args.item_query,
        }
    }
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With the usage status code if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                eprintln!("\n{}", e.render());
                std::process::exit(ExitStatus::UsageError.code());
            } else {
                e.exit();
            }
        }
    }
}
