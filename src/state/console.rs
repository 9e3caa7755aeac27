//! Console command parsing.
//!
//! Input starting with `/` or `!` is a command; anything else is chat.
//! Arguments are space separated, and may be double-quoted to include
//! spaces (slot names often have them).

use thiserror::Error;

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect {
        address: String,
        slot_name: String,
        password: String,
    },
    Disconnect,
    /// Chat text forwarded to the server as-is
    Say(String),
    Messages(MessageOption),
    /// Toggle a derived behavior by name
    Toggle(String),
}

/// Argument to the `messages` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOption {
    ToggleHidden,
    ToggleMuted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("Please provide {0}.")]
    MissingArgument(&'static str),

    #[error("Unknown option \"{0}\". Try \"mute\" or \"hide\".")]
    UnknownOption(String),

    #[error("Command not recognized: {0}")]
    UnknownCommand(String),

    #[error("Nothing to send.")]
    Empty,
}

/// Parse one line of console input.
pub fn parse_input(input: &str) -> Result<Command, ConsoleError> {
    let input = input.trim();
    match input.chars().next() {
        None => Err(ConsoleError::Empty),
        Some('/') | Some('!') => parse_command(&input[1..]),
        Some(_) => Ok(Command::Say(input.to_string())),
    }
}

fn parse_command(line: &str) -> Result<Command, ConsoleError> {
    let (verb, rest) = match line.split_once(' ') {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb.to_ascii_lowercase().as_str() {
        "connect" => parse_connect(rest),
        "disconnect" => Ok(Command::Disconnect),
        "hint" => Ok(Command::Say(format!("!hint {rest}").trim_end().to_string())),
        "message" | "messages" => parse_message_option(rest),
        "solarwind" | "slidejump" => Ok(Command::Toggle("SlideJump".to_string())),
        _ => Err(ConsoleError::UnknownCommand(line.to_string())),
    }
}

fn parse_connect(args: &str) -> Result<Command, ConsoleError> {
    let mut tokens = Tokens::new(args);
    let address = tokens
        .next()
        .ok_or(ConsoleError::MissingArgument("an ip address, slot name, and (if necessary) password"))?;
    let slot_name = tokens
        .next()
        .ok_or(ConsoleError::MissingArgument("a slot name and (if necessary) password"))?;
    let password = tokens.next().unwrap_or_default();

    Ok(Command::Connect {
        address,
        slot_name,
        password,
    })
}

fn parse_message_option(args: &str) -> Result<Command, ConsoleError> {
    let option = Tokens::new(args)
        .next()
        .ok_or(ConsoleError::MissingArgument("an option, such as \"mute\" or \"hide\""))?;

    match option.to_ascii_lowercase().as_str() {
        "hide" | "unhide" | "show" => Ok(Command::Messages(MessageOption::ToggleHidden)),
        "mute" | "unmute" => Ok(Command::Messages(MessageOption::ToggleMuted)),
        _ => Err(ConsoleError::UnknownOption(option)),
    }
}

/// Whitespace-separated tokens with double-quote grouping.
struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Tokens<'a> {
    fn new(input: &'a str) -> Self {
        Self { rest: input }
    }
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let input = self.rest.trim_start();
        if input.is_empty() {
            self.rest = input;
            return None;
        }

        if let Some(quoted) = input.strip_prefix('"') {
            // Unterminated quotes run to the end of the line
            let (token, rest) = quoted.split_once('"').unwrap_or((quoted, ""));
            self.rest = rest;
            return Some(token.to_string());
        }

        let (token, rest) = input.split_once(' ').unwrap_or((input, ""));
        self.rest = rest;
        Some(token.to_string())
    }
}
