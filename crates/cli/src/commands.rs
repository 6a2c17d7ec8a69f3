//! Console input parsing

use std::path::PathBuf;

/// One line typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send text as a user turn
    Say(String),
    /// Rename the persona and reconfigure the session
    Persona(String),
    /// Switch the assistant voice and reconfigure the session
    Voice(String),
    /// Stream a WAV file as microphone input
    Play(PathBuf),
    Start,
    Stop,
    Help,
    Quit,
    /// Unrecognized slash command
    Unknown(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Self::Say(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name.to_ascii_lowercase().as_str() {
            "persona" if !arg.is_empty() => Self::Persona(arg.to_string()),
            "voice" if !arg.is_empty() => Self::Voice(arg.to_ascii_lowercase()),
            "play" if !arg.is_empty() => Self::Play(PathBuf::from(arg)),
            "start" => Self::Start,
            "stop" => Self::Stop,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

pub const HELP: &str = "\
Type a message to send it as a user turn.
  /persona <name>  rename the persona and resend the session config
  /voice <voice>   switch the assistant voice (applies to new responses)
  /play <file.wav> speak a recorded WAV file into the session
  /stop            end the voice session
  /start           open a new voice session
  /quit            exit";
