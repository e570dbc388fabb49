mod commands;
mod input;
mod shutdown;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use osumem_core::Config;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "osumem")]
#[command(about = "Read live osu! state from process memory")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = osumem_core::config::CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Attach to this process id instead of searching by name
    #[arg(short, long, env = "OSUMEM_PID", global = true)]
    pid: Option<u32>,

    /// More logging (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Follow the client and log status changes and misses
    Watch,
    /// Read every record once and print it as JSON
    Dump {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Find where a signature matches
    Scan {
        /// Signature such as "F8 01 74 04 83 65"; checks every built-in
        /// signature when omitted
        pattern: Option<String>,

        /// Stop after this many matches
        #[arg(short, long, default_value_t = 16)]
        limit: usize,
    },
    /// Evaluate an address expression
    Eval {
        /// Expression such as "[[Base - 0x33]] + 0xC"
        expr: String,

        /// Decode the result as i8..u64, f32, f64, string or [type]
        #[arg(short, long)]
        shape: Option<String>,
    },
    /// Dump raw memory at an address expression
    Hexdump {
        /// Address or expression
        address: String,

        /// Number of bytes
        #[arg(short, long, default_value_t = 256)]
        size: usize,

        /// Hide the ASCII column
        #[arg(long)]
        no_ascii: bool,
    },
    /// Print the built-in signatures and record layouts
    Schema,
}

fn log_filter(verbose: u8) -> Result<EnvFilter> {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return Ok(EnvFilter::from_default_env());
    }
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    Ok(EnvFilter::new("").add_directive(format!("osumem={}", level).parse()?))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose)?)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(&cli.config)?;

    match cli.command {
        Command::Watch => commands::watch::run(&config, cli.pid),
        Command::Dump { output } => commands::dump::run(&config, cli.pid, output.as_deref()),
        Command::Scan { pattern, limit } => {
            commands::scan::run(&config, cli.pid, pattern.as_deref(), limit)
        }
        Command::Eval { expr, shape } => {
            commands::eval::run(&config, cli.pid, &expr, shape.as_deref())
        }
        Command::Hexdump {
            address,
            size,
            no_ascii,
        } => commands::hexdump::run(&config, cli.pid, &address, size, !no_ascii),
        Command::Schema => commands::schema::run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["osumem", "eval", "Base", "-vv", "--pid", "42"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.pid, Some(42));
        assert!(matches!(cli.command, Command::Eval { ref expr, shape: None } if expr == "Base"));
    }

    #[test]
    fn test_parse_hexdump_defaults() {
        let cli = Cli::try_parse_from(["osumem", "hexdump", "[Base - 0x33]"]).unwrap();
        match cli.command {
            Command::Hexdump {
                address,
                size,
                no_ascii,
            } => {
                assert_eq!(address, "[Base - 0x33]");
                assert_eq!(size, 256);
                assert!(!no_ascii);
            }
            _ => panic!("expected hexdump"),
        }
        assert_eq!(cli.config, PathBuf::from("osumem.toml"));
    }
}
