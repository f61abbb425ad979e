//! Interactive input parsing

/// What one line of interactive input asks for
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Send the line as a message
    Send(String),
    /// `/stop`: stop the reply being streamed
    Stop,
    /// `/clear`: forget the conversation
    Clear,
    /// `/quit` or `/exit`
    Quit,
    /// `/help`
    Help,
    /// A slash command that does not exist
    Unknown(String),
    /// Blank line
    Empty,
}

/// Help text for interactive mode
pub const HELP: &str = "Commands: /stop  /clear  /quit  (Ctrl-C stops a reply, or exits when idle)";

impl Command {
    /// Parse one input line
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }

        match trimmed {
            "/stop" => Self::Stop,
            "/clear" => Self::Clear,
            "/quit" | "/exit" => Self::Quit,
            "/help" => Self::Help,
            other if other.starts_with('/') && !other.contains(char::is_whitespace) => {
                Self::Unknown(other.to_string())
            }
            _ => Self::Send(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_commands() {
        assert_eq!(Command::parse("/stop"), Command::Stop);
        assert_eq!(Command::parse("  /clear  "), Command::Clear);
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("/exit"), Command::Quit);
        assert_eq!(Command::parse("/help"), Command::Help);
        assert_eq!(Command::parse("/nope"), Command::Unknown("/nope".to_string()));
    }

    #[test]
    fn test_messages() {
        assert_eq!(Command::parse("Hi there"), Command::Send("Hi there".to_string()));
        // A path-like message is still a message
        assert_eq!(
            Command::parse("/usr/bin is where?"),
            Command::Send("/usr/bin is where?".to_string())
        );
        assert_eq!(Command::parse("   \t"), Command::Empty);
    }
}
