use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tokpack::codec::{self, EncodingMask, Position, TokenCodec, TokenRecord};
use tokpack::output;
use tokpack::postings::{encode_block, PayloadBlockReader};
use tokpack::utils::{get_config_path, parse_hex, to_hex, CodecConfig};

#[derive(Parser)]
#[command(name = "tokpack")]
#[command(about = "Encode and decode per-token postings payloads")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a JSON token record and print the bytes as hex
    Encode {
        /// JSON file with the record (stdin when omitted or "-")
        input: Option<PathBuf>,

        /// Fields to emit, e.g. "all", "none", "offset|parent"
        #[arg(short, long)]
        mask: Option<String>,

        /// Start position of the posting
        #[arg(short, long)]
        start: Option<Position>,
    },
    /// Decode hex bytes back into a token record
    Decode {
        /// Encoded record as hex
        hex: String,

        /// Start position of the posting
        #[arg(short, long)]
        start: Option<Position>,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the header bits of an encoded record
    Inspect {
        /// Encoded record as hex
        hex: String,
    },
    /// Encode a JSON array of {"start", "record"} entries into a payload block
    EncodeBlock {
        /// JSON file with the entries (stdin when omitted or "-")
        input: Option<PathBuf>,

        /// Fields to emit, e.g. "all", "none", "offset|parent"
        #[arg(short, long)]
        mask: Option<String>,
    },
    /// Decode a payload block and print its entries as JSON
    DecodeBlock {
        /// Payload block as hex
        hex: String,
    },
    /// Show the effective configuration
    Config {
        /// Print only the config file path
        #[arg(long)]
        path: bool,

        /// Write the default configuration file if none exists
        #[arg(long)]
        init: bool,
    },
}

/// One posting in a block, as read from or written to JSON
#[derive(Debug, Serialize, Deserialize)]
struct BlockEntry {
    start: Position,
    record: TokenRecord,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("TOKPACK_LOG", "warn")).init();

    let cli = Cli::parse();
    let config = CodecConfig::load()?;
    let color = config.color && !cli.no_color;

    match cli.command {
        Commands::Encode { input, mask, start } => {
            let mask = resolve_mask(&config, mask.as_deref())?;
            let start = start.unwrap_or(config.start_position);
            let record: TokenRecord = serde_json::from_str(&read_input(input.as_ref())?)
                .context("Failed to parse token record JSON")?;

            let bytes = TokenCodec::new(mask).encode(&record, start)?;
            println!("{}", to_hex(&bytes));
        }
        Commands::Decode { hex, start, json } => {
            let start = start.unwrap_or(config.start_position);
            let bytes = parse_hex(&hex)?;
            let record = codec::decode(&bytes, start)
                .with_context(|| format!("Failed to decode {} bytes", bytes.len()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                let mut stdout = output::stdout(color);
                output::print_record(&mut stdout, &record, start)?;
            }
        }
        Commands::Inspect { hex } => {
            let bytes = parse_hex(&hex)?;
            let header = codec::decode_header(&bytes)?;
            let mut stdout = output::stdout(color);
            output::print_header(&mut stdout, &header, bytes.len())?;
        }
        Commands::EncodeBlock { input, mask } => {
            let mask = resolve_mask(&config, mask.as_deref())?;
            let entries: Vec<BlockEntry> = serde_json::from_str(&read_input(input.as_ref())?)
                .context("Failed to parse block entries JSON")?;
            let entries: Vec<(Position, TokenRecord)> =
                entries.into_iter().map(|e| (e.start, e.record)).collect();

            let block = encode_block(mask, &entries)?;
            println!("{}", to_hex(&block));
        }
        Commands::DecodeBlock { hex } => {
            let bytes = parse_hex(&hex)?;
            let entries = PayloadBlockReader::new(&bytes)
                .map(|entry| entry.map(|(start, record)| BlockEntry { start, record }))
                .collect::<codec::Result<Vec<_>>>()
                .context("Failed to decode payload block")?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Commands::Config { path, init } => {
            let config_path = get_config_path()?;
            if init && !config_path.exists() {
                let written = CodecConfig::default().save()?;
                eprintln!("Wrote default config to {}", written.display());
            }

            if path {
                println!("{}", config_path.display());
            } else {
                println!("{}", serde_json::to_string_pretty(&config)?);
                println!("effective mask: {}", config.effective_mask()?);
            }
        }
    }

    Ok(())
}

/// Command-line mask, else `TOKPACK_MASK`, else the config default
fn resolve_mask(config: &CodecConfig, flag: Option<&str>) -> Result<EncodingMask> {
    match flag {
        Some(value) => value
            .parse::<EncodingMask>()
            .with_context(|| format!("Invalid --mask '{}'", value)),
        None => config.effective_mask(),
    }
}

fn read_input(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}
