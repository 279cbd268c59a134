//! MCF CLI
//!
//! Converts delimited text tables to MCF files and back.

use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use mcf::convert::{decode_file, encode_file, inspect_file};
use mcf::{Config, InferencePolicy, McfError};
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "\
Usage: mcf encode <input-table-file> <output-binary-file>
       mcf decode <input-binary-file> <output-table-file>
       mcf inspect <input-binary-file>";

/// MCF converter
#[derive(Parser, Debug)]
#[command(name = "mcf")]
#[command(about = "Convert delimited text tables to and from the MCF columnar format")]
#[command(version)]
struct Args {
    /// Field delimiter of the text side
    #[arg(short, long, default_value_t = ',', global = true)]
    delimiter: char,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode a delimited text table into an MCF file
    Encode {
        /// Input text table
        input: PathBuf,

        /// Output MCF file
        output: PathBuf,

        /// Deflate level (0-9)
        #[arg(short, long, default_value_t = 6)]
        level: u32,

        /// Scan every value to pick column types instead of the first row only
        #[arg(long)]
        full_scan: bool,

        /// Encode columns on worker threads
        #[arg(long)]
        parallel: bool,
    },

    /// Decode an MCF file into a delimited text table
    Decode {
        /// Input MCF file
        input: PathBuf,

        /// Output text table
        output: PathBuf,

        /// Only decode these columns (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        columns: Option<Vec<String>>,
    },

    /// Print the header of an MCF file
    Inspect {
        /// Input MCF file
        input: PathBuf,
    },
}

fn main() {
    // Logs go to stderr; stdout carries usage and summaries
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,mcf=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(_) => {
            println!("{}", USAGE);
            process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> mcf::Result<()> {
    let delimiter = u8::try_from(args.delimiter)
        .map_err(|_| McfError::Usage(format!("delimiter {:?} must be ASCII", args.delimiter)))?;

    match args.command {
        Commands::Encode {
            input,
            output,
            level,
            full_scan,
            parallel,
        } => {
            let inference = if full_scan {
                InferencePolicy::FullScan
            } else {
                InferencePolicy::FirstValue
            };
            let config = Config::builder()
                .delimiter(delimiter)
                .compression_level(level)
                .inference(inference)
                .parallel_encode(parallel)
                .build();
            config.validate()?;

            println!("Converting {} → {} ...", input.display(), output.display());
            let stats = encode_file(&input, &output, &config)?;
            println!(
                "Done: {} columns, {} rows, {} bytes",
                stats.columns, stats.rows, stats.bytes
            );
        }

        Commands::Decode {
            input,
            output,
            columns,
        } => {
            let config = Config::builder().delimiter(delimiter).build();

            println!("Decoding {} → {} ...", input.display(), output.display());
            let stats = decode_file(&input, &output, columns.as_deref(), &config)?;
            println!(
                "Done: {} columns, {} rows, {} bytes",
                stats.columns, stats.rows, stats.bytes
            );
        }

        Commands::Inspect { input } => {
            let header = inspect_file(&input)?;
            println!("version:     {}", header.version);
            println!("header size: {}", header.header_size()?);
            println!("rows:        {}", header.row_count);
            println!("columns:     {}", header.columns.len());
            for column in &header.columns {
                println!(
                    "  {:<24} {:<8} data @{} ({} -> {} bytes)",
                    column.name,
                    column.column_type,
                    column.data.offset,
                    column.data.uncompressed_size,
                    column.data.compressed_size
                );
                if let Some(offsets) = &column.offsets {
                    println!(
                        "  {:<24} {:<8} offsets @{} ({} -> {} bytes)",
                        "",
                        "",
                        offsets.offset,
                        offsets.uncompressed_size,
                        offsets.compressed_size
                    );
                }
            }
        }
    }

    Ok(())
}
