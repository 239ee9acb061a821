//! Operator console
//!
//! Reads commands from stdin on a blocking thread, forwards them to the
//! sequencer task and prints each reply.

use std::io::{self, BufRead, Write};

use embassy_futures::block_on;
use heapless::String;
use reactor_core::config::settings::parse_bool;
use reactor_core::config::{StepField, TempChannel};
use thiserror::Error;
use tracing::{info, warn};

use crate::channels::{Command, Reply, COMMAND_CHANNEL, REPLY_CHANNEL};

const HELP: &str = "\
commands:
  start [n]                 start step n, or the first pending step
  pause | resume            freeze or continue the active step
  skip                      finish the active step now
  stop | reset              cancel the run and clear all lamps
  auto on|off               advance to the next step automatically
  set <n> <field> <value>   edit a step (enabled, target_temperature,
                            target_channel, target_rpm, dosing_volume,
                            duration_hours, duration_minutes, timing_mode)
  peer tr|tj                control channel of the other unit
  status                    show program state
  quit                      save settings and exit";

/// Console input errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command {0:?}, try `help`")]
    Unknown(std::string::String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("unknown field {0:?}")]
    Field(std::string::String),
    #[error("value is too long")]
    ValueTooLong,
}

/// A parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Empty,
    Help,
    Command(Command),
}

/// Parse one console line
pub fn parse_line(line: &str) -> Result<Input, ParseError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(Input::Empty);
    };
    let args: Vec<&str> = words.collect();

    let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("help" | "?", _) => return Ok(Input::Help),
        ("start", []) => Command::Start(None),
        ("start", [n]) => Command::Start(Some(step_number(n, "start [n]")?)),
        ("pause", []) => Command::Pause,
        ("resume", []) => Command::Resume,
        ("skip", []) => Command::Skip,
        ("stop", []) => Command::Stop,
        ("reset", []) => Command::Reset,
        ("status", []) => Command::Status,
        ("quit" | "exit", []) => Command::Shutdown,
        ("auto", [flag]) => {
            Command::SetAutoMode(parse_bool(flag).ok_or(ParseError::Usage("auto on|off"))?)
        }
        ("peer", [channel]) => Command::SetPeerChannel(
            TempChannel::parse(channel).ok_or(ParseError::Usage("peer tr|tj"))?,
        ),
        ("set", [n, field, value @ ..]) if !value.is_empty() => {
            let step = step_number(n, "set <n> <field> <value>")?;
            let field = StepField::parse(field).ok_or_else(|| ParseError::Field(field.to_string()))?;
            let value = String::try_from(value.join(" ").as_str()).map_err(|_| ParseError::ValueTooLong)?;
            Command::Edit { step, field, value }
        }
        ("start", _) => return Err(ParseError::Usage("start [n]")),
        ("auto", _) => return Err(ParseError::Usage("auto on|off")),
        ("peer", _) => return Err(ParseError::Usage("peer tr|tj")),
        ("set", _) => return Err(ParseError::Usage("set <n> <field> <value>")),
        _ => return Err(ParseError::Unknown(line.trim().to_string())),
    };
    Ok(Input::Command(command))
}

fn step_number(text: &str, usage: &'static str) -> Result<u8, ParseError> {
    text.parse().map_err(|_| ParseError::Usage(usage))
}

/// Send a command and wait for its reply
fn request(command: Command) -> Reply {
    block_on(async {
        COMMAND_CHANNEL.send(command).await;
        REPLY_CHANNEL.receive().await
    })
}

/// Console thread body; exits the process after shutdown
pub fn run() {
    info!("Console ready, type `help` for commands");
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Console read failed");
                break;
            }
        };
        match parse_line(&line) {
            Ok(Input::Empty) => {}
            Ok(Input::Help) => {
                let _ = writeln!(stdout, "{}", HELP);
            }
            Ok(Input::Command(command)) => {
                let reply = request(command);
                let _ = writeln!(stdout, "{}", reply);
                if reply == Reply::ShuttingDown {
                    std::process::exit(0);
                }
            }
            Err(e) => {
                let _ = writeln!(stdout, "{}", e);
            }
        }
    }

    // End of input
    let reply = request(Command::Shutdown);
    let _ = writeln!(stdout, "{}", reply);
    std::process::exit(if reply == Reply::ShuttingDown { 0 } else { 1 });
}
