use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use docsan_core::{Assembler, AssemblerConfig, Document, MetaAllowList, fetch_file, fetch_stdin, generated_tag, sanitize_document};
use owo_colors::OwoColorize;

mod echo;

use echo::{format_size, print_banner, print_info, print_step, print_success, print_timing, print_warning};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for the processed document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Html,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "html" => Ok(Self::Html),
            _ => Err(format!("Invalid format: {}. Valid options: json, html", s)),
        }
    }
}

/// Sanitize HTML documents into JSON document records
#[derive(Parser, Debug)]
#[command(name = "docsan")]
#[command(author = "Docsan Contributors")]
#[command(version)]
#[command(about = "Sanitize HTML documents into JSON document records", long_about = None)]
struct Args {
    /// Local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (json, html)
    #[arg(short, long, default_value = "json", value_name = "FORMAT")]
    format: OutputFormat,

    /// Meta name to keep in the record (repeatable)
    #[arg(long = "meta", value_name = "NAME", default_values_t = [String::from("docid")])]
    meta: Vec<String>,

    /// Generator tag written to the record
    #[arg(long, value_name = "TAG")]
    generated: Option<String>,

    /// Indent JSON output
    #[arg(long)]
    pretty: bool,

    /// Print progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let started = Instant::now();

    if args.verbose {
        print_banner();
    }

    let bytes = if args.input == "-" {
        if args.verbose {
            print_step(1, 3, "Reading from stdin");
        }
        fetch_stdin().context("Failed to read from stdin")?
    } else {
        if args.verbose {
            print_step(1, 3, &format!("Reading from file {}", args.input.bright_white()));
        }
        fetch_file(&args.input).with_context(|| format!("Failed to read file: {}", args.input))?
    };

    if args.verbose {
        eprintln!("  {} {}\n", "Size:".dimmed(), format_size(bytes.len()).bright_white());
        print_step(2, 3, "Parsing HTML document");
    }

    let parse_started = Instant::now();
    let mut doc = Document::parse_bytes(&bytes).context("Failed to parse HTML")?;

    if args.verbose {
        if let Some(title) = doc.title() {
            eprintln!("  {} {}", "Title:".dimmed(), title.bright_white());
        }
        print_timing("Parse", parse_started.elapsed());
        eprintln!();
    }

    let output = match args.format {
        OutputFormat::Json => {
            if args.verbose {
                print_step(3, 3, "Assembling document record");
            }
            let assembler = Assembler::new(AssemblerConfig {
                meta_names: MetaAllowList::new(args.meta.iter().cloned()),
                generated: args.generated.clone().unwrap_or_else(generated_tag),
            });

            let assemble_started = Instant::now();
            let record = assembler.assemble(doc);

            if args.verbose {
                eprintln!("  {} {}", "Doc id:".dimmed(), record.doc_id.bright_white());
                eprintln!("  {} {}", "Metas:".dimmed(), record.metas.len().to_string().bright_white());
                for warning in &record.warnings {
                    print_warning(&warning.to_string());
                }
                print_timing("Assemble", assemble_started.elapsed());
                eprintln!();
            }

            record.to_json(args.pretty).context("Failed to encode record")?
        }
        OutputFormat::Html => {
            if args.verbose {
                print_step(3, 3, "Sanitizing document");
            }
            let count = sanitize_document(&mut doc);
            if args.verbose {
                print_info(&format!("Commented out {} elements", count));
                eprintln!();
            }
            doc.to_html()
        }
    };

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            println!("{}", output);
        }
    }

    if args.verbose {
        print_timing("Total", started.elapsed());
    }

    Ok(())
}
