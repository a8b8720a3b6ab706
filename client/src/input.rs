//! Line-oriented player commands read from stdin

use crate::movement::Intent;
use log::{debug, error, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const HELP: &str = "w/a/s/d or up/down/left/right to move, `name <text>` to rename, `color` to recolor, `quit` to leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Move(Intent),
    /// Empty text asks for a generated name
    Rename(String),
    CycleColor,
    Quit,
}

pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "w" | "up" => Command::Move(Intent::Up),
        "s" | "down" => Command::Move(Intent::Down),
        "a" | "left" => Command::Move(Intent::Left),
        "d" | "right" => Command::Move(Intent::Right),
        "name" => Command::Rename(rest.to_string()),
        "color" => Command::CycleColor,
        "quit" | "exit" => Command::Quit,
        _ => return None,
    };
    Some(command)
}

/// Forwards parsed stdin commands until stdin closes or the receiver is gone
pub fn spawn_stdin_reader(commands: mpsc::UnboundedSender<Command>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => match parse_command(&line) {
                    Some(command) => {
                        if commands.send(command).is_err() {
                            break;
                        }
                    }
                    None => warn!("Unknown command {:?}. {}", line.trim(), HELP),
                },
                Ok(None) => {
                    debug!("stdin closed");
                    break;
                }
                Err(e) => {
                    error!("Error reading stdin: {}", e);
                    break;
                }
            }
        }
    })
}
