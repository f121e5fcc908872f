//! Colored terminal rendering of server responses.
//!
//! [`TerminalRenderer`] is the response handler used by the interactive
//! client. The free functions print local (non-server) output.

use std::io::{self, Write};

use chrono::Local;
use owo_colors::OwoColorize;
use serde_json::Value;

use crate::commands::{CommandCategory, CommandInfo, CommandTable};
use crate::protocol::{Payload, RawLine, ResponseRecord};
use crate::session::{DisconnectReason, ResponseHandler};

const RULE_WIDTH: usize = 60;

/// Current wall-clock time for the prompt.
fn clock() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

fn flush() {
    let _ = io::stdout().flush();
}

/// Formats a numeric field with `precision` decimals, or `N/A`.
#[must_use]
pub fn format_number(value: Option<&Value>, precision: usize) -> String {
    match value.and_then(Value::as_f64) {
        Some(n) => format!("{n:.precision$}"),
        None => "N/A".to_string(),
    }
}

/// A titled block of telemetry rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetrySection {
    pub title: String,
    pub rows: Vec<String>,
}

fn axes(source: &Value, keys: &[(&str, &str)], precision: usize, unit: &str) -> Vec<String> {
    keys.iter()
        .map(|(key, label)| {
            let value = format_number(source.get(key), precision);
            if unit.is_empty() {
                format!("{label} {value}")
            } else {
                format!("{label} {value} {unit}")
            }
        })
        .collect()
}

/// Extracts the telemetry sections the renderer knows how to show.
///
/// Unknown keys are ignored; missing numeric fields render as `N/A`.
#[must_use]
pub fn telemetry_sections(data: &Payload) -> Vec<TelemetrySection> {
    const XYZ: [(&str, &str); 3] = [("x", "X:"), ("y", "Y:"), ("z", "Z:")];
    let mut sections = Vec::new();

    if let Some(pos) = data.get("world_position") {
        sections.push(TelemetrySection {
            title: "World Position".to_string(),
            rows: axes(pos, &XYZ, 3, ""),
        });
    }

    if let Some(orient) = data.get("orientation") {
        sections.push(TelemetrySection {
            title: "Orientation".to_string(),
            rows: axes(
                orient,
                &[("roll", "Roll: "), ("pitch", "Pitch:"), ("yaw", "Yaw:  ")],
                3,
                "rad",
            ),
        });
    }

    if let Some(linear) = data.get("velocity").and_then(|v| v.get("linear")) {
        sections.push(TelemetrySection {
            title: "Linear Velocity".to_string(),
            rows: axes(linear, &XYZ, 3, "m/s"),
        });
    }

    if let Some(acc) = data.get("imu").and_then(|v| v.get("linear_acceleration")) {
        sections.push(TelemetrySection {
            title: "IMU Acceleration".to_string(),
            rows: axes(acc, &XYZ, 3, "m/s²"),
        });
    }

    if let Some(gnss) = data.get("gnss") {
        let mut rows = axes(
            gnss,
            &[("latitude", "Latitude: "), ("longitude", "Longitude:")],
            6,
            "",
        );
        rows.extend(axes(gnss, &[("altitude", "Altitude: ")], 3, "m"));
        sections.push(TelemetrySection {
            title: "GNSS".to_string(),
            rows,
        });
    }

    if let Some(Value::Array(topics)) = data.get("topics") {
        let rows = topics
            .iter()
            .map(|topic| {
                let name = topic.get("name").and_then(Value::as_str).unwrap_or("Unknown");
                let kind = topic.get("type").and_then(Value::as_str).unwrap_or("Unknown");
                format!("{name:<30} {kind}")
            })
            .collect();
        sections.push(TelemetrySection {
            title: format!("ROS Topics ({} total)", topics.len()),
            rows,
        });
    }

    sections
}

/// Response handler that prints to stdout.
#[derive(Debug, Clone)]
pub struct TerminalRenderer {
    commands: CommandTable,
    show_raw_json: bool,
}

impl TerminalRenderer {
    #[must_use]
    pub fn new(commands: CommandTable, show_raw_json: bool) -> Self {
        Self {
            commands,
            show_raw_json,
        }
    }

    /// Tokens in `listed` that the table knows, in the server's order.
    fn listed_commands<'a>(&'a self, listed: &'a Payload) -> Vec<(&'a str, &'a CommandInfo)> {
        listed
            .keys()
            .filter_map(|token| {
                self.commands
                    .get(token)
                    .map(|info| (token.as_str(), info))
            })
            .collect()
    }

    fn print_listed_commands(&self, listed: &Payload) {
        println!("\n{}", "Available Commands:".bold());
        println!("{}", "=".repeat(50));
        for (token, info) in self.listed_commands(listed) {
            println!("  {:<3} - {}", token.cyan(), info.name.green());
            println!("      {}", info.description.white());
        }
        println!("{}", "=".repeat(50));
    }
}

impl ResponseHandler for TerminalRenderer {
    fn on_generic(&self, message: &str) {
        println!("{} {}", "ℹ".white(), message);
        flush();
    }

    fn on_received(&self, line: &RawLine, record: &ResponseRecord) {
        if !self.show_raw_json || !record.is_structured() {
            return;
        }
        if let Ok(value) = serde_json::from_str::<Value>(line.as_str()) {
            let pretty = serde_json::to_string_pretty(&value).unwrap_or_else(|_| line.to_string());
            println!("{}", "JSON Response:".white());
            println!("  {pretty}\n");
        }
    }

    fn on_welcome(&self, message: &str, data: &Payload) {
        println!("{} {}", "✓".green(), message.bold());
        if !data.is_empty() {
            self.print_listed_commands(data);
        }
        flush();
    }

    fn on_command_ack(&self, message: &str, command_id: Option<&str>) {
        println!("{} Command executed: {}", "✓".green(), message.bold());
        if let Some(id) = command_id {
            println!("  Command ID: {}", id.cyan());
        }
        flush();
    }

    fn on_status(&self, message: &str) {
        println!("{} Status: {}", "ℹ".yellow(), message);
        flush();
    }

    fn on_debug(&self, message: &str, data: &Payload) {
        println!("{} Debug info: {}", "ℹ".magenta(), message.bold());
        for section in telemetry_sections(data) {
            println!("  {}", format!("{}:", section.title).bold());
            for row in section.rows {
                println!("    {}", row.cyan());
            }
        }
        flush();
    }

    fn on_help(&self, message: &str, commands: &Payload) {
        println!("{} Help: {}", "ℹ".cyan(), message.bold());
        if !commands.is_empty() {
            self.print_listed_commands(commands);
        }
        flush();
    }

    fn on_error(&self, message: &str) {
        println!("{} Error: {}", "✗".red(), message);
        flush();
    }

    fn on_goodbye(&self, message: &str) {
        println!("{} {}", "ℹ".yellow(), message);
        flush();
    }

    fn on_unstructured(&self, raw_text: &str) {
        println!("{}", "Raw Response:".white());
        println!("  {raw_text}");
        flush();
    }

    fn on_disconnected(&self, reason: &DisconnectReason) {
        println!("\n{} Connection lost: {}", "✗".red(), reason);
        flush();
    }
}

/// Print the startup banner.
pub fn print_banner() {
    println!("{}", "FCU Drone Controller Client".blue().bold());
    println!("{}", "=".repeat(40));
    flush();
}

/// Print a successful connection.
pub fn print_connected(host: &str, port: u16) {
    println!(
        "{} Connected to FCU server at {}",
        "✓".green(),
        format!("{host}:{port}").cyan()
    );
    println!("{} Ready for commands!", "✓".green());
    flush();
}

/// Print the interactive mode introduction.
pub fn print_interactive_intro(commands: &CommandTable) {
    let tokens: String = commands.iter().map(|(t, _)| t).collect();
    println!("\n{}", "Interactive Mode Started!".green());
    println!("Type {} for help, {} to quit", "'h'".cyan(), "'q'".cyan());
    println!("Commands: {}\n", tokens.cyan());
    flush();
}

/// Print the input prompt.
pub fn print_prompt() {
    print!("{} {} ", clock().dimmed(), ">".green().bold());
    flush();
}

/// Print the local help screen, grouped by category.
pub fn print_help(commands: &CommandTable) {
    println!("\n{}", "Available Commands:".bold());
    println!("{}", "─".repeat(RULE_WIDTH));

    let mut first = true;
    for category in CommandCategory::ALL {
        let mut entries = commands.in_category(category).peekable();
        if entries.peek().is_none() {
            continue;
        }
        if !first {
            println!();
        }
        first = false;
        println!("{}", format!("{}:", category.title()).bold());
        for (token, info) in entries {
            println!(
                "  {}  {} {}",
                token.cyan(),
                format!("{:<12}", info.name).green(),
                info.description.white()
            );
        }
    }

    println!("{}", "─".repeat(RULE_WIDTH));
    println!(
        "Also try: {}, {}, {}, {}",
        "clear".cyan(),
        "ls".cyan(),
        "help".cyan(),
        "quit".cyan()
    );
    flush();
}

/// Print the command about to be sent.
pub fn print_executing(name: &str, description: &str) {
    println!("{} Executing: {} - {}", ">".cyan(), name.bold(), description);
    flush();
}

/// Print an unknown-input notice.
pub fn print_not_found(input: &str) {
    println!(
        "{} Command not found: {}",
        "✗".red(),
        format!("'{input}'").bold()
    );
    println!("  Type {} for available commands", "'h'".cyan());
    flush();
}

/// Print an error with its category.
pub fn print_error(category: &str, message: &str) {
    println!("{} [{}] {}", "✗".red(), category.red().bold(), message);
    flush();
}

/// Print a neutral notice.
pub fn print_notice(message: &str) {
    println!("{} {}", "ℹ".yellow(), message);
    flush();
}

/// Clear the terminal.
pub fn clear_screen() {
    print!("\x1b[2J\x1b[H");
    flush();
}
