//! tabulog CLI - Convert E-Prime output to uniform tables
//!
//! # Commands
//!
//! ```bash
//! tabulog convert stroop-1-1.txt -o stroop.tsv     # Log or table to TSV
//! tabulog convert stroop.txt --json -e "rt_s={Stim.RT}/1000"
//! tabulog detect stroop-1-1.txt                    # Show encoding and format
//! tabulog columns stroop-1-1.txt --sorted          # List column names
//! tabulog eval "4*(3+2)"                           # Evaluate a constant expression
//! tabulog parse "{a}+{b}*2"                        # Show how an expression parses
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tabulog::logs::{self, log_info, LogFormat};
use tabulog::reader::{decode_auto, detect_format};
use tabulog::{
    convert_file, convert_file_to_path, evaluate, parse, read_file, ColumnConfig, ConvertOptions, EmptyContext, EnvSettings, ErrorPolicy,
    FileFormat, OutputFormat,
};

#[derive(Parser)]
#[command(name = "tabulog")]
#[command(about = "Convert E-Prime logs and tables to TSV or JSON, with computed columns", long_about = None)]
struct Cli {
    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log output format: text or json
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a log or table, adding computed columns
    Convert {
        /// Input file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Input format
        #[arg(short, long, value_enum, default_value = "auto")]
        format: FormatArg,

        /// JSON file with computed column definitions
        #[arg(long)]
        computed: Option<PathBuf>,

        /// Computed column as NAME=EXPRESSION (repeatable)
        #[arg(short = 'e', long = "expr", value_name = "NAME=EXPR")]
        exprs: Vec<String>,

        /// Sort stored columns by name
        #[arg(long)]
        sort_columns: bool,

        /// Only write these columns, comma separated
        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,

        /// Write JSON instead of TSV
        #[arg(long)]
        json: bool,

        /// When a computed column fails on a row: abort, blank or skip
        #[arg(long, default_value = "abort")]
        on_error: ErrorPolicy,
    },

    /// Print the detected encoding and format of a file
    Detect {
        /// Input file
        input: PathBuf,
    },

    /// List the columns of a file
    Columns {
        /// Input file
        input: PathBuf,

        /// Sort names instead of first-seen order
        #[arg(long)]
        sorted: bool,
    },

    /// Evaluate an expression that has no column references
    Eval {
        /// Expression text
        expression: String,
    },

    /// Print the fully parenthesized form of an expression
    Parse {
        /// Expression text
        expression: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Auto,
    Log,
    Excel,
    Eprime,
    Raw,
}

impl FormatArg {
    fn forced(self) -> Option<FileFormat> {
        match self {
            FormatArg::Auto => None,
            FormatArg::Log => Some(FileFormat::EprimeLog),
            FormatArg::Excel => Some(FileFormat::ExcelTsv),
            FormatArg::Eprime => Some(FileFormat::EprimeTsv),
            FormatArg::Raw => Some(FileFormat::RawTsv),
        }
    }
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let env = EnvSettings::from_env();
    logs::configure(cli.quiet || env.quiet, cli.log_format.unwrap_or(env.log_format));

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            format,
            computed,
            exprs,
            sort_columns,
            columns,
            json,
            on_error,
        } => {
            let computed = computed.or(env.config_path);
            cmd_convert(
                &input,
                output.as_deref(),
                format.forced(),
                computed.as_deref(),
                &exprs,
                sort_columns,
                columns,
                json,
                on_error,
            )
        }

        Commands::Detect { input } => cmd_detect(&input),

        Commands::Columns { input, sorted } => cmd_columns(&input, sorted),

        Commands::Eval { expression } => cmd_eval(&expression),

        Commands::Parse { expression } => cmd_parse(&expression),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    format: Option<FileFormat>,
    computed: Option<&Path>,
    exprs: &[String],
    sort_columns: bool,
    columns: Option<Vec<String>>,
    json: bool,
    on_error: ErrorPolicy,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match computed {
        Some(path) => {
            log_info(format!("Computed columns from {}", path.display()));
            ColumnConfig::load(path)?
        }
        None => ColumnConfig::default(),
    };
    for expr in exprs {
        config.push_definition(expr)?;
    }
    if columns.is_some() {
        config.columns = columns;
    }
    config.sort_columns |= sort_columns;

    let options = ConvertOptions {
        format,
        config,
        output_format: if json { OutputFormat::Json } else { OutputFormat::Tsv },
        on_error,
    };

    match output {
        Some(path) => {
            convert_file_to_path(input, path, &options)?;
            eprintln!("💾 Output written to: {}", path.display());
        }
        None => {
            convert_file(input, io::stdout().lock(), &options)?;
        }
    }
    Ok(())
}

fn cmd_detect(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(input)?;
    let (content, encoding) = decode_auto(&bytes)?;
    let format = detect_format(&content)?;

    println!("Encoding: {}", encoding);
    println!("Format: {}", format);
    Ok(())
}

fn cmd_columns(input: &Path, sorted: bool) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = read_file(input, None)?;
    let data = &outcome.data;

    let mut stdout = io::stdout().lock();
    if sorted {
        for name in data.sorted_columns() {
            writeln!(stdout, "{}", name)?;
        }
    } else {
        for name in data.columns() {
            writeln!(stdout, "{}", name)?;
        }
    }
    Ok(())
}

fn cmd_eval(expression: &str) -> Result<(), Box<dyn std::error::Error>> {
    let expr = parse(expression)?;
    let value = evaluate(&expr, &EmptyContext)?;
    println!("{}", value);
    Ok(())
}

fn cmd_parse(expression: &str) -> Result<(), Box<dyn std::error::Error>> {
    let expr = parse(expression)?;
    println!("{}", expr);
    Ok(())
}
