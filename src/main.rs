//! FCU Controller - interactive terminal client for the FCU command server.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fcu_controller::commands::CommandTable;
use fcu_controller::config::{ConfigLoader, ControllerConfig};
use fcu_controller::display::{self, TerminalRenderer};
use fcu_controller::prompt::{next_wake, InputAction, Wake};
use fcu_controller::session::CommandSession;

#[derive(Parser)]
#[command(
    name = "fcu-controller",
    about = "FCU Drone Controller Client",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Server host (default: localhost).
    #[arg(long)]
    host: Option<String>,

    /// Server port (default: 8888).
    #[arg(long)]
    port: Option<u16>,

    /// Read timeout in seconds (default: 10).
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Path to a config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not echo raw JSON responses.
    #[arg(long)]
    no_raw: bool,
}

impl Cli {
    fn apply(&self, config: &mut ControllerConfig) {
        if let Some(host) = &self.host {
            config.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(timeout) = self.timeout {
            config.read_timeout_secs = timeout;
        }
        if self.no_raw {
            config.show_raw_json = false;
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Reads stdin on a dedicated thread so a pending read never holds up exit.
fn spawn_input_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.blocking_send(line.clone()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
    });
    rx
}

async fn interactive(session: &mut CommandSession<TerminalRenderer>, commands: &CommandTable) {
    display::print_interactive_intro(commands);

    let mut input = spawn_input_reader();
    let mut state = session.subscribe_state();
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        display::print_prompt();

        let line = match next_wake(&mut input, interrupt.as_mut(), &mut state).await {
            Wake::Line(line) => line,
            Wake::InputClosed | Wake::ConnectionLost => break,
            Wake::Interrupted => {
                println!();
                display::print_notice("Shutting down...");
                break;
            }
        };

        match InputAction::parse(&line, commands) {
            InputAction::Nothing => {}
            InputAction::Quit => {
                display::print_notice("Exiting...");
                break;
            }
            InputAction::Help => display::print_help(commands),
            InputAction::Clear => display::clear_screen(),
            InputAction::Send(command) => {
                display::print_executing(command.name(), &command.info().description);
                if let Err(e) = session.send_command(&command).await {
                    display::print_error(e.category(), &e.to_string());
                }
            }
            InputAction::Unknown(text) => display::print_not_found(&text),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let loader = cli
        .config
        .clone()
        .map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let mut config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            display::print_error("config", &e.to_string());
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut config);

    let commands = match config.command_table() {
        Ok(commands) => commands,
        Err(e) => {
            display::print_error("config", &e.to_string());
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        host = %config.host,
        port = config.port,
        read_timeout = ?config.read_timeout(),
        "Starting FCU controller"
    );

    display::print_banner();

    let renderer = Arc::new(TerminalRenderer::new(commands.clone(), config.show_raw_json));
    let mut session =
        CommandSession::new(commands.clone(), renderer).with_read_timeout(config.read_timeout());

    if let Err(e) = session.connect(&config.host, config.port).await {
        display::print_error(e.category(), &e.to_string());
        return ExitCode::FAILURE;
    }
    display::print_connected(&config.host, config.port);

    interactive(&mut session, &commands).await;

    session.disconnect().await;
    display::print_notice("Disconnected from server");
    ExitCode::SUCCESS
}
