use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use buswatch_core::{CanMeta, Direction, ParseContext, ParserRegistry, ProtocolParser};

#[derive(Parser, Debug)]
#[command(name = "buswatch")]
#[command(version)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BUSWATCH_BUILD_COMMIT"),
    ")"
))]
#[command(
    about = "Frame decoder for field-bus captures (MODBUS RTU / CANopen).",
    long_about = None,
    after_help = "Examples:\n  buswatch decode \"01 03 00 00 00 0A C5 CD\" --port serial\n  buswatch decode 05 --port can --can-id 0x701\n  buswatch decode 48656C6C6F --port serial --parser raw-serial -o result.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PortArg {
    Serial,
    Can,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DirectionArg {
    Tx,
    Rx,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode one captured frame and print the result as JSON.
    Decode {
        /// Frame bytes as hex ("01 03 00 00" or "0103...")
        hex: String,

        /// Port type the frame was captured from
        #[arg(long, value_enum)]
        port: PortArg,

        /// Data direction
        #[arg(long, value_enum, default_value = "rx")]
        direction: DirectionArg,

        /// Originating port index
        #[arg(long, default_value_t = 0)]
        port_index: u32,

        /// CAN identifier (hex with 0x prefix, or decimal); required for --port can
        #[arg(long, value_parser = parse_int_arg)]
        can_id: Option<u32>,

        /// Declared CAN DLC; defaults to the payload length
        #[arg(long)]
        can_dlc: Option<u8>,

        /// Remote transmission request frame
        #[arg(long)]
        rtr: bool,

        /// Extended (29-bit) CAN identifier
        #[arg(long)]
        ext: bool,

        /// Force a specific parser id instead of auto-detection
        #[arg(long)]
        parser: Option<String>,

        /// Output file path (JSON); defaults to stdout
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },

    /// List the registered parsers.
    Parsers,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decode {
            hex,
            port,
            direction,
            port_index,
            can_id,
            can_dlc,
            rtr,
            ext,
            parser,
            output,
            pretty,
            compact,
            quiet,
        } => cmd_decode(DecodeArgs {
            hex,
            port,
            direction,
            port_index,
            can_id,
            can_dlc,
            rtr,
            ext,
            parser,
            output,
            pretty,
            compact,
            quiet,
        }),
        Commands::Parsers => cmd_parsers(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(err.to_string(), None)
    }
}

struct DecodeArgs {
    hex: String,
    port: PortArg,
    direction: DirectionArg,
    port_index: u32,
    can_id: Option<u32>,
    can_dlc: Option<u8>,
    rtr: bool,
    ext: bool,
    parser: Option<String>,
    output: Option<PathBuf>,
    pretty: bool,
    compact: bool,
    quiet: bool,
}

fn cmd_decode(args: DecodeArgs) -> Result<(), CliError> {
    let data = parse_hex(&args.hex)?;

    let direction = match args.direction {
        DirectionArg::Tx => Direction::Transmit,
        DirectionArg::Rx => Direction::Receive,
    };

    let context = match args.port {
        PortArg::Serial => {
            if args.can_id.is_some() || args.can_dlc.is_some() || args.rtr || args.ext {
                return Err(CliError::new(
                    "CAN options are not valid for --port serial",
                    Some("drop --can-id/--can-dlc/--rtr/--ext or use --port can".to_string()),
                ));
            }
            ParseContext::serial(direction, args.port_index)
        }
        PortArg::Can => {
            let id = args.can_id.ok_or_else(|| {
                CliError::new(
                    "missing CAN identifier",
                    Some("pass --can-id, e.g. --can-id 0x701".to_string()),
                )
            })?;
            let dlc = args.can_dlc.unwrap_or(data.len().min(8) as u8);
            ParseContext::can(
                direction,
                args.port_index,
                CanMeta {
                    id,
                    dlc,
                    rtr: args.rtr,
                    ext: args.ext,
                },
            )
        }
    };

    let registry = ParserRegistry::with_builtins();
    let result = match args.parser.as_deref() {
        Some(id) => registry.parse_with(id, &data, &context).ok_or_else(|| {
            CliError::new(
                format!("parser \"{id}\" not found"),
                Some("run `buswatch parsers` to list available ids".to_string()),
            )
        })?,
        None => registry
            .auto_detect_and_parse(&data, &context)
            .ok_or_else(|| {
                CliError::new(
                    "no parser claimed the frame",
                    Some("pass at least one byte, or force a parser with --parser".to_string()),
                )
            })?,
    };

    if args.pretty && args.compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    let json = if args.pretty {
        serde_json::to_string_pretty(&result)
            .context("JSON serialization failed")
            .map_err(CliError::from)?
    } else {
        serde_json::to_string(&result)
            .context("JSON serialization failed")
            .map_err(CliError::from)?
    };

    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)
                        .with_context(|| {
                            format!("Failed to create output directory: {}", parent.display())
                        })
                        .map_err(CliError::from)?;
                }
            }
            fs::write(&path, json)
                .with_context(|| format!("Failed to write result: {}", path.display()))
                .map_err(CliError::from)?;
            if !args.quiet {
                eprintln!("OK: result written -> {}", path.display());
            }
        }
        None => {
            println!("{json}");
        }
    }
    Ok(())
}

fn cmd_parsers() -> Result<(), CliError> {
    let registry = ParserRegistry::with_builtins();
    for parser in registry.get_all() {
        let ports: Vec<&str> = parser
            .port_types()
            .iter()
            .map(|p| match p {
                buswatch_core::PortType::Serial => "serial",
                buswatch_core::PortType::Can => "can",
            })
            .collect();
        println!(
            "{:<12} {:<12} [{}] {}",
            parser.id(),
            parser.name(),
            ports.join(", "),
            parser.description()
        );
    }
    Ok(())
}

fn parse_int_arg(value: &str) -> Result<u32, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|_| format!("invalid integer \"{value}\""))
}

fn parse_hex(input: &str) -> Result<Vec<u8>, CliError> {
    let mut digits = String::with_capacity(input.len());
    for token in input.split([' ', '\t', ',', ':']) {
        let token = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        digits.push_str(token);
    }

    if digits.len() % 2 != 0 {
        return Err(CliError::new(
            format!("odd number of hex digits in \"{input}\""),
            Some("each byte needs two hex digits, e.g. \"01 03\"".to_string()),
        ));
    }

    let mut bytes = Vec::with_capacity(digits.len() / 2);
    for pair in digits.as_bytes().chunks(2) {
        let pair = std::str::from_utf8(pair).map_err(|_| {
            CliError::new(
                format!("invalid characters in \"{input}\""),
                Some("only hex digits, spaces, commas and 0x prefixes are accepted".to_string()),
            )
        })?;
        let byte = u8::from_str_radix(pair, 16).map_err(|_| {
            CliError::new(
                format!("invalid hex byte \"{pair}\""),
                Some("only hex digits, spaces, commas and 0x prefixes are accepted".to_string()),
            )
        })?;
        bytes.push(byte);
    }
    Ok(bytes)
}
