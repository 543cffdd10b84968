//! Rowcsv CLI - read and write CSV files as JSON rows
//!
//! # Commands
//!
//! ```bash
//! rowcsv read input.csv                  # CSV to JSON array of rows
//! rowcsv read input.csv --key Id         # CSV to JSON object keyed by a column
//! rowcsv write rows.json -o out.csv      # JSON array of rows to CSV
//! rowcsv columns input.csv               # Print header names
//! rowcsv column input.csv Name           # Print one column's values
//! rowcsv operations                      # Show available callback operations
//! ```
//!
//! Every command accepts `--config codec.json` for dialect and callbacks,
//! and `--verbose` (or `ROWCSV_VERBOSE=1`) to echo the codec log.

use clap::{Parser, Subcommand};
use rowcsv::{
    logs, CallbackPipeline, CodecConfig, ColumnRef, Dialect, Input, Output, Reader, ReaderOptions,
    Row, Writer, WriterOptions,
};
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rowcsv")]
#[command(about = "Read and write CSV files as rows", long_about = None)]
struct Cli {
    /// JSON configuration file (dialect, callbacks)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Echo codec log to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a CSV file and output JSON
    Read {
        /// Input CSV file ("-" for stdin)
        input: PathBuf,

        #[command(flatten)]
        format: FormatArgs,

        /// Key rows by this column (name or position)
        #[arg(short, long)]
        key: Option<String>,

        /// Fail when a key appears twice
        #[arg(long, requires = "key")]
        detect_duplicates: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a JSON array of rows as CSV
    Write {
        /// Input JSON file ("-" for stdin)
        input: PathBuf,

        #[command(flatten)]
        format: FormatArgs,

        /// Append to the output file instead of replacing it
        #[arg(long, requires = "output")]
        append: bool,

        /// Fail on columns outside the column order
        #[arg(long)]
        strict: bool,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the column names of a CSV file
    Columns {
        /// Input CSV file
        input: PathBuf,

        #[command(flatten)]
        format: FormatArgs,
    },

    /// Print the values of one column
    Column {
        /// Input CSV file
        input: PathBuf,

        /// Column name or position
        column: String,

        #[command(flatten)]
        format: FormatArgs,
    },

    /// Show available callback operations
    Operations,
}

#[derive(clap::Args)]
struct FormatArgs {
    /// Field delimiter (overrides the configuration file)
    #[arg(short, long)]
    delimiter: Option<char>,

    /// The file has no header record
    #[arg(long)]
    no_header: bool,

    /// Explicit column names, comma-separated; leave a name empty to drop
    /// that column (e.g. "id,,name")
    #[arg(long)]
    columns: Option<String>,
}

impl FormatArgs {
    fn column_names(&self) -> Option<Vec<Option<String>>> {
        self.columns.as_ref().map(|list| {
            list.split(',')
                .map(|name| Some(name.trim().to_string()).filter(|n| !n.is_empty()))
                .collect()
        })
    }

    fn dialect(&self, config: &CodecConfig) -> Dialect {
        let dialect = config.dialect.clone().unwrap_or_default();
        match self.delimiter {
            Some(d) => Dialect {
                delimiter: d.to_string(),
                ..dialect
            },
            None => dialect,
        }
    }
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let verbose = cli.verbose
        || std::env::var("ROWCSV_VERBOSE")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
    logs::set_echo(verbose);

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Read {
            input,
            format,
            key,
            detect_duplicates,
            output,
        } => cmd_read(&config, &input, &format, key, detect_duplicates, output.as_deref()),

        Commands::Write {
            input,
            format,
            append,
            strict,
            output,
        } => cmd_write(&config, &input, &format, append, strict, output.as_deref()),

        Commands::Columns { input, format } => cmd_columns(&config, &input, &format),

        Commands::Column {
            input,
            column,
            format,
        } => cmd_column(&config, &input, &format, column),

        Commands::Operations => cmd_operations(),
    });

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> CliResult<CodecConfig> {
    match path {
        Some(p) => {
            eprintln!("⚙️  Config: {}", p.display());
            Ok(CodecConfig::from_file(p)?)
        }
        None => Ok(CodecConfig::default()),
    }
}

fn reader(
    config: &CodecConfig,
    input: &Path,
    format: &FormatArgs,
    options: ReaderOptions,
) -> CliResult<Reader<'static>> {
    let options = ReaderOptions {
        has_header: !format.no_header,
        column_names: format.column_names(),
        dialect: format.dialect(config),
        ..options
    };
    let input = if input == Path::new("-") {
        Input::stdin()
    } else {
        Input::path(input)
    };
    let callbacks: CallbackPipeline = config.callbacks()?;
    Ok(Reader::new(input, options)?.with_callbacks(callbacks))
}

fn cmd_read(
    config: &CodecConfig,
    input: &Path,
    format: &FormatArgs,
    key: Option<String>,
    detect_duplicates: bool,
    output: Option<&Path>,
) -> CliResult<()> {
    eprintln!("📄 Reading CSV: {}", input.display());

    let options = ReaderOptions {
        key_by_column: key.map(ColumnRef::from),
        detect_duplicate_keys: detect_duplicates,
        ..ReaderOptions::default()
    };
    let keyed = options.key_by_column.is_some();
    let mut reader = reader(config, input, format, options)?;

    let json = if keyed {
        let rows = reader.to_map()?;
        eprintln!("✅ Read {} keyed rows", rows.len());
        serde_json::to_string_pretty(&rows)?
    } else {
        let rows = reader.to_vec()?;
        eprintln!("✅ Read {} rows", rows.len());
        serde_json::to_string_pretty(&rows)?
    };
    if let Some(columns) = reader.column_names()? {
        eprintln!("   Columns: {}", columns.names().collect::<Vec<_>>().join(", "));
    }

    write_output(&json, output)
}

fn cmd_write(
    config: &CodecConfig,
    input: &Path,
    format: &FormatArgs,
    append: bool,
    strict: bool,
    output: Option<&Path>,
) -> CliResult<()> {
    eprintln!("📄 Reading rows: {}", input.display());

    let content = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(input)?
    };
    let values: Vec<Value> = serde_json::from_str(&content)?;
    let rows = values
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            Row::from_value(value).ok_or_else(|| format!("Row {} is not an object or array", i))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let options = WriterOptions {
        has_header: !format.no_header,
        column_names: format.column_names(),
        append,
        allow_unknown_columns: !strict,
        dialect: format.dialect(config),
    };
    let sink = match output {
        Some(p) => Output::path(p),
        None => Output::stdout(),
    };
    let mut writer = Writer::new(sink, options)?.with_callbacks(config.callbacks()?);
    let count = writer.write_from(rows)?;
    writer.flush()?;

    eprintln!("✅ Wrote {} rows ({} records)", count, writer.line_number());
    if let Some(p) = output {
        eprintln!("💾 Output written to: {}", p.display());
    }
    Ok(())
}

fn cmd_columns(config: &CodecConfig, input: &Path, format: &FormatArgs) -> CliResult<()> {
    eprintln!("📄 Columns of: {}", input.display());

    let mut reader = reader(config, input, format, ReaderOptions::default())?;
    match reader.column_names()? {
        Some(columns) => {
            for (i, name) in columns.iter().enumerate() {
                println!("{}\t{}", i, name.unwrap_or(""));
            }
        }
        None => eprintln!("⚠️  No column names (headerless file or empty input)"),
    }
    Ok(())
}

fn cmd_column(
    config: &CodecConfig,
    input: &Path,
    format: &FormatArgs,
    column: String,
) -> CliResult<()> {
    eprintln!("📄 Column '{}' of: {}", column, input.display());

    let mut reader = reader(config, input, format, ReaderOptions::default())?;
    let values = reader
        .column(ColumnRef::from(column))?
        .collect::<Result<Vec<_>, _>>()?;
    eprintln!("✅ {} values", values.len());

    write_output(&serde_json::to_string_pretty(&values)?, None)
}

fn cmd_operations() -> CliResult<()> {
    println!("{}", rowcsv::operations_description());
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> CliResult<()> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
