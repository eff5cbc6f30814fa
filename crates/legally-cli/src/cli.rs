//! Command-line definition

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use legally_content::SectionKey;
use std::path::PathBuf;

/// Value of `--section` selecting the whole analysis
pub const FULL_SECTION: &str = "full";

fn section_arg() -> Arg {
    Arg::new("section")
        .long("section")
        .short('s')
        .value_parser([FULL_SECTION, "risks", "recommendations", "summary"])
        .default_value(FULL_SECTION)
        .help("Section to print")
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print the whole view as JSON")
}

/// Build the `legally` command
#[must_use]
pub fn command() -> Command {
    Command::new("legally")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Legal document analysis from the terminal")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Path to legally.toml"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("render")
                .about("Render a markdown analysis file")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Markdown file"),
                )
                .arg(
                    Arg::new("document-type")
                        .long("document-type")
                        .help("Document type shown with the analysis"),
                )
                .arg(section_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("analyze")
                .about("Upload a PDF for analysis and render the result")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("PDF file"),
                )
                .arg(section_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("wait")
                .about("Poll a backend task until it finishes and render its result")
                .arg(Arg::new("task").required(true).help("Task id"))
                .arg(section_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("history")
                .about("List past analyses")
                .arg(
                    Arg::new("token")
                        .long("token")
                        .env("LEGALLY_TOKEN")
                        .required(true)
                        .hide_env_values(true)
                        .help("Bearer token"),
                ),
        )
        .subcommand(
            Command::new("chat")
                .about("Ask the legal assistant")
                .arg(
                    Arg::new("message")
                        .required(true)
                        .num_args(1..)
                        .help("Question"),
                ),
        )
        .subcommand(
            Command::new("export-chat")
                .about("Save the chat transcript")
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Output file (default legal_chat_<date>.txt)"),
                ),
        )
        .subcommand(Command::new("stats").about("Show chat index statistics"))
}

/// Section selected by `--section`; `None` is the full analysis
#[must_use]
pub fn selected_section(args: &ArgMatches) -> Option<SectionKey> {
    args.get_one::<String>("section")
        .filter(|s| s.as_str() != FULL_SECTION)
        .and_then(|s| s.parse().ok())
}
