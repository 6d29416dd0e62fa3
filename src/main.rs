use std::path::PathBuf;
use std::process::ExitCode;

use bmsview::config::Config;
use bmsview::logging;
use bmsview::{
    forward_events, BluestBackend, Command, ConnectionController, DiscoveryController, PeripheralId, Session,
    TerminalNotifier,
};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Parser)]
#[command(name = "bmsview")]
#[command(about = "Discover and connect to Battery Management Systems over Bluetooth LE")]
struct Args {
    /// Path to config.toml. Defaults to the user config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Scan once and list the devices found
    Scan,
    /// Scan, then connect to the device with this id until Ctrl-C
    Connect { id: String },
    /// Follow the adapter state and read commands from stdin
    Watch,
}

type BmsSession<'a> = Session<'a, BluestBackend, TerminalNotifier>;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    let level = match args.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    logging::init_logger(level);

    let backend = BluestBackend::new().await?;
    let notifier = TerminalNotifier::new(config.adapter.offer_enable);
    let discovery = DiscoveryController::new(&backend)
        .with_window(config.scan_window())
        .with_services(config.service_filter()?);
    let connection = ConnectionController::new(&backend, &notifier).with_params(config.link_params());
    let mut session = Session::new(discovery, connection, &notifier);

    match args.mode {
        Mode::Scan => session.handle_command(Command::Scan).await,
        Mode::Connect { id } => {
            session.handle_command(Command::Scan).await;
            session.handle_command(Command::Connect(PeripheralId::new(id))).await;
            if session.connection().connected().is_none() {
                return Ok(ExitCode::FAILURE);
            }
            println!("Press Ctrl-C to disconnect");
            tokio::signal::ctrl_c().await?;
            session.handle_command(Command::Disconnect).await;
        }
        Mode::Watch => watch(&backend, &mut session).await,
    }

    Ok(ExitCode::SUCCESS)
}

async fn watch(backend: &BluestBackend, session: &mut BmsSession<'_>) {
    let (events_tx, events_rx) = mpsc::channel(32);
    let (commands_tx, commands_rx) = mpsc::channel(32);

    println!("Commands: scan, connect <id>, disconnect, list, quit");
    tokio::spawn(read_commands(commands_tx));

    let pump = async {
        forward_events(backend, events_tx).await;
        std::future::pending::<()>().await
    };

    tokio::select! {
        () = session.run(events_rx, commands_rx) => {}
        () = pump => {}
    }
}

async fn read_commands(tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!("Failed to read stdin: {err}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(command) => {
                let quit = command == Command::Quit;
                if tx.send(command).await.is_err() || quit {
                    break;
                }
            }
            Err(err) => eprintln!("{err}"),
        }
    }
}
