// railscope test application -- CLI for exercising the acquisition card
// against real hardware or a mock transport.
//
// Usage:
//   railscope-test-app list
//   railscope-test-app --port /dev/ttyUSB0 stream
//   railscope-test-app --port /dev/ttyUSB0 stream --limit 100
//   railscope-test-app --port /dev/ttyUSB0 power
//   railscope-test-app --mock power
//   railscope-test-app --port /dev/ttyUSB0 --log-file notes.txt power

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::{self, error::RecvError};

use railscope::{
    available_ports, format_hex, format_volts, wire, Card, CardBuilder, CardEvent, PowerRails,
};
use railscope_test_harness::MockTransport;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// railscope test application -- exercises the card from the command line.
#[derive(Parser)]
#[command(name = "railscope-test-app", version, about)]
struct Cli {
    /// Serial port path (e.g. /dev/ttyUSB0, COM3).
    /// Required for `stream` and `power` unless --mock is used.
    #[arg(long)]
    port: Option<String>,

    /// Override the card's default 921600 baud link rate.
    #[arg(long)]
    baud: Option<u32>,

    /// Use a mock transport with canned replies instead of hardware.
    /// Useful for verifying CLI wiring and the decode path end to end.
    #[arg(long)]
    mock: bool,

    /// Append the session log to this file instead of printing to stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides this).
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List serial ports on this machine.
    List,

    /// Start the live sample stream and print points until it completes.
    Stream {
        /// Stop after this many samples even if no terminator arrives.
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Query the power rails once and print all seven channels.
    Power,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    match &cli.command {
        Command::List => list_ports(),
        Command::Stream { limit } => run_stream(&cli, *limit).await,
        Command::Power => run_power(&cli).await,
    }
}

/// Route the session log to stderr or, with --log-file, to an append-mode
/// notes file.
fn init_logging(cli: &Cli) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if cli.verbose { "debug" } else { "info" })
    });

    match &cli.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn list_ports() -> Result<()> {
    let ports = available_ports().context("failed to enumerate serial ports")?;
    if ports.is_empty() {
        println!("no serial ports found");
    } else {
        for port in ports {
            println!("{port}");
        }
    }
    Ok(())
}

async fn run_stream(cli: &Cli, limit: Option<u64>) -> Result<()> {
    let card = build_card(cli).await?;
    let mut events = card.subscribe();

    tracing::info!(command = %format_hex(&wire::encode_start_stream()), "starting sample stream");
    card.start_stream()
        .await
        .context("failed to send the start command")?;

    let result = pump_stream(&mut events, limit).await;
    card.close().await.ok();
    result
}

/// Print stream samples until the terminator, the limit, a timeout, or
/// Ctrl-C.
async fn pump_stream(
    events: &mut broadcast::Receiver<CardEvent>,
    limit: Option<u64>,
) -> Result<()> {
    let mut count: u64 = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("interrupted after {count} samples");
                return Ok(());
            }
            event = events.recv() => match event {
                Ok(CardEvent::StreamSample { index, value }) => {
                    println!("{index:>8}  {value:+.4}");
                    count += 1;
                    if limit.is_some_and(|limit| count >= limit) {
                        println!("sample limit reached ({count})");
                        return Ok(());
                    }
                }
                Ok(CardEvent::StreamComplete) => {
                    println!("stream complete: {count} samples");
                    return Ok(());
                }
                Ok(CardEvent::ResponseTimeout { kind }) => {
                    bail!("no response to the {kind} command -- check the port and card power");
                }
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "consumer lagging; samples dropped");
                }
                Err(RecvError::Closed) => return Ok(()),
            }
        }
    }
}

async fn run_power(cli: &Cli) -> Result<()> {
    let card = build_card(cli).await?;
    let mut events = card.subscribe();

    tracing::info!(command = %format_hex(&wire::encode_power_query()), "querying power rails");
    card.query_power()
        .await
        .context("failed to send the power query")?;

    let rails = wait_power(&mut events).await;
    card.close().await.ok();
    let rails = rails?;

    println!("power rails:");
    for (label, volts) in PowerRails::LABELS.iter().zip(rails.as_array()) {
        println!("  {label:>7}  {}", format_volts(volts));
    }
    Ok(())
}

async fn wait_power(events: &mut broadcast::Receiver<CardEvent>) -> Result<PowerRails> {
    loop {
        match events.recv().await {
            Ok(CardEvent::PowerReading(rails)) => return Ok(rails),
            Ok(CardEvent::ResponseTimeout { .. }) => {
                bail!("hardware not responding -- no power frame within the deadline");
            }
            Ok(_) => {}
            Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => bail!("card session ended unexpectedly"),
        }
    }
}

// ---------------------------------------------------------------------------
// Card construction
// ---------------------------------------------------------------------------

async fn build_card(cli: &Cli) -> Result<Card> {
    let mut builder = CardBuilder::new();
    if let Some(baud) = cli.baud {
        builder = builder.baud_rate(baud);
    }

    if cli.mock {
        return Ok(builder.build_with_transport(Box::new(mock_transport(&cli.command))));
    }

    let port = cli
        .port
        .as_deref()
        .context("--port is required (or pass --mock); try `railscope-test-app list`")?;
    builder
        .serial_port(port)
        .build()
        .await
        .with_context(|| format!("failed to connect on {port}"))
}

/// Canned replies for --mock operation, chunked awkwardly on purpose so a
/// mock run exercises the decoder's reassembly path.
fn mock_transport(command: &Command) -> MockTransport {
    let mut mock = MockTransport::new();
    match command {
        Command::Stream { .. } => {
            let reply = mock_stream_reply();
            let chunks: Vec<&[u8]> = reply.chunks(5).collect();
            mock.expect_chunked(&wire::encode_start_stream(), &chunks);
        }
        Command::Power => {
            mock.expect(&wire::encode_power_query(), &mock_power_reply());
        }
        Command::List => {}
    }
    mock
}

/// Twelve samples ramping down from the 2.5 V reference, then the
/// terminator.
fn mock_stream_reply() -> Vec<u8> {
    let mut bytes = Vec::new();
    for i in 0..12u16 {
        bytes.extend_from_slice(&(i * 0x0400).to_be_bytes());
    }
    bytes.extend_from_slice(&wire::STREAM_TERMINATOR);
    bytes
}

/// One valid power frame with all rails near nominal.
fn mock_power_reply() -> Vec<u8> {
    let mut frame = vec![wire::POWER_FRAME_HEADER, wire::POWER_FRAME_SUB_ID];
    for raw in [3921u16, 3047, 1048, 2714, 3047, 1048, 2707] {
        frame.extend_from_slice(&raw.to_be_bytes());
    }
    frame.push(wire::xor_checksum(&frame));
    frame
}
