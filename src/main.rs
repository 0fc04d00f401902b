use clap::{Parser, Subcommand};
use std::error::Error;
use std::io::{self, BufRead, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use triton_sim::text::DEFAULT_TEXT_LIMIT;
use triton_sim::{DeviceConfig, SharedDevice, TextLimit};

mod monitor;

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// Longest partial line kept while waiting for its newline.
const MAX_LINE_BYTES: usize = 4096;

#[derive(Parser)]
#[command(name = "triton_cli")]
#[command(about = "Triton dilution refrigerator simulator", long_about = None)]
struct Cli {
    /// Maximum characters returned when reading status or automation text (at least 500)
    #[arg(long, global = true, default_value_t = DEFAULT_TEXT_LIMIT)]
    status_limit: usize,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Type protocol lines on stdin. Lines starting with '@' are backdoor commands.
    Manual,
    /// List available serial ports
    Ports,
    /// Answer protocol lines arriving on a serial port
    Serial {
        /// Serial port name, e.g. /dev/ttyUSB0 or COM3
        #[arg(short, long)]
        port: String,
        /// Baud rate
        #[arg(short, long, default_value_t = 9600)]
        baud: u32,
        /// Show a live dashboard of the published values while serving
        #[arg(long)]
        monitor: bool,
    },
}

// The main entry point for the command-line simulator application.
fn main() -> CliResult<()> {
    let cli = Cli::parse();

    // The dashboard owns the terminal, so only errors are logged under it.
    let quiet = matches!(cli.command, Commands::Serial { monitor: true, .. });
    init_tracing(cli.verbose, quiet);

    let config = DeviceConfig {
        text_limit: TextLimit::new(cli.status_limit)?,
    };
    let device = SharedDevice::new(config);
    info!(status_limit = cli.status_limit, "simulator started");

    match cli.command {
        Commands::Manual => run_manual_mode(&device),
        Commands::Ports => list_ports(),
        Commands::Serial {
            port,
            baud,
            monitor: false,
        } => run_serial_mode(&device, &port, baud, &AtomicBool::new(false)),
        Commands::Serial {
            port,
            baud,
            monitor: true,
        } => run_serial_with_monitor(device, port, baud),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

// Handles the manual command input mode.
fn run_manual_mode(device: &SharedDevice) -> CliResult<()> {
    println!("=========================");
    println!("    Triton Simulator     ");
    println!("=========================");
    println!("Enter READ:/SET: commands, '@' backdoor commands, or 'exit' to quit.");
    print!("> ");
    io::stdout().flush()?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let input = line?;
        let command = input.trim();

        if command == "exit" {
            break;
        }

        if !command.is_empty() {
            match command.strip_prefix('@') {
                Some(backdoor) => run_backdoor_command(device, backdoor),
                None => {
                    let response = process_and_display_command(device, command);
                    println!("< {}", response);
                }
            }
        }
        print!("> ");
        io::stdout().flush()?;
    }
    Ok(())
}

fn run_backdoor_command(device: &SharedDevice, command: &str) {
    match device.with_backdoor(|backdoor| backdoor.execute_line(command)) {
        Ok(()) => println!("< OK"),
        Err(e) => eprintln!("[ERROR] {}", e),
    }
}

fn list_ports() -> CliResult<()> {
    let ports = serialport::available_ports()?;
    if ports.is_empty() {
        eprintln!("[ERROR] No serial ports found.");
    }
    for port in ports {
        println!("{}", port.port_name);
    }
    Ok(())
}

// Handles the serial port listening mode until `stop` is raised.
fn run_serial_mode(device: &SharedDevice, port_name: &str, baud_rate: u32, stop: &AtomicBool) -> CliResult<()> {
    let mut port = serialport::new(port_name, baud_rate)
        .timeout(Duration::from_millis(10))
        .open()?;

    info!(port = port_name, baud_rate, "listening on serial port");

    let mut serial_buf: Vec<u8> = vec![0; 128];
    let mut pending: Vec<u8> = Vec::new();
    while !stop.load(Ordering::Relaxed) {
        match port.read(serial_buf.as_mut_slice()) {
            Ok(bytes_read) => {
                for command in take_lines(&mut pending, &serial_buf[..bytes_read]) {
                    let response = process_and_display_command(device, &command);
                    port.write_all(response.as_bytes())?;
                    port.write_all(b"\n")?;
                }
            }
            Err(ref e) if e.kind() == io::ErrorKind::TimedOut => (),
            Err(e) => error!(error = %e, "serial port error"),
        }
    }
    Ok(())
}

// Appends `bytes` to `pending` and returns every complete, non-blank line.
// A partial line longer than MAX_LINE_BYTES is discarded.
fn take_lines(pending: &mut Vec<u8>, bytes: &[u8]) -> Vec<String> {
    pending.extend_from_slice(bytes);
    let mut lines = Vec::new();
    while let Some(end) = pending.iter().position(|&b| b == b'\n') {
        let line: Vec<u8> = pending.drain(..=end).collect();
        let text = String::from_utf8_lossy(&line);
        let command = text.trim();
        if !command.is_empty() {
            lines.push(command.to_string());
        }
    }
    if pending.len() > MAX_LINE_BYTES {
        warn!(bytes = pending.len(), "discarding unterminated serial input");
        pending.clear();
    }
    lines
}

fn run_serial_with_monitor(device: SharedDevice, port_name: String, baud_rate: u32) -> CliResult<()> {
    let stop = Arc::new(AtomicBool::new(false));

    let server = {
        let device = device.clone();
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let result = run_serial_mode(&device, &port_name, baud_rate, &stop);
            // Take the dashboard down with the server.
            stop.store(true, Ordering::Relaxed);
            result
        })
    };

    let shown = monitor::run(&device, &stop);
    stop.store(true, Ordering::Relaxed);

    match server.join() {
        Ok(result) => result?,
        Err(_) => return Err("serial thread panicked".into()),
    }
    Ok(shown?)
}

// Common function to process a command string and log the exchange.
fn process_and_display_command(device: &SharedDevice, command: &str) -> String {
    let response = device.respond(command);
    info!(request = command, %response, "handled command");
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_input_is_split_into_lines() {
        let mut pending = Vec::new();
        assert!(take_lines(&mut pending, b"READ:SYS:DR:").is_empty());
        let lines = take_lines(&mut pending, b"STATUS\r\n\nREAD:SYS:DR:ACTN\nSET");
        assert_eq!(lines, ["READ:SYS:DR:STATUS", "READ:SYS:DR:ACTN"]);
        assert_eq!(pending, b"SET");
    }

    #[test]
    fn unterminated_input_is_bounded() {
        let mut pending = Vec::new();
        for _ in 0..100 {
            take_lines(&mut pending, &[b'x'; 128]);
            assert!(pending.len() <= MAX_LINE_BYTES);
        }
        let lines = take_lines(&mut pending, b"\nREAD:SYS:DR:STATUS\n");
        assert_eq!(lines.last().map(String::as_str), Some("READ:SYS:DR:STATUS"));
    }

    #[test]
    fn cli_parses_serial_options() {
        let cli = Cli::parse_from(["triton_cli", "--status-limit", "600", "serial", "--port", "COM3"]);
        assert_eq!(cli.status_limit, 600);
        assert!(matches!(
            cli.command,
            Commands::Serial { ref port, baud: 9600, monitor: false } if port == "COM3"
        ));
    }
}
