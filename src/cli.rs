use std::path::PathBuf;

use clap::Parser;

use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::runtime::Command;

#[derive(Parser, Debug)]
#[command(name = "order-chat")]
#[command(version)]
#[command(about = "Terminal client for order-support live chat")]
pub struct Args {
    /// TOML config file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// WebSocket URL of the chat channel
    #[arg(long)]
    pub server: Option<String>,

    /// Base URL of the history API
    #[arg(long)]
    pub api: Option<String>,

    /// Display name of the local participant
    #[arg(long, short)]
    pub name: Option<String>,

    /// Join as a support agent
    #[arg(long)]
    pub admin: bool,

    /// Typing idle window in milliseconds
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Order conversation to open on start
    #[arg(long, short)]
    pub session: Option<String>,
}

impl Args {
    /// Defaults, then the config file, then env, then these flags.
    pub fn resolve_config(&self) -> Result<ChatConfig, ChatError> {
        let mut config = match &self.config {
            Some(path) => ChatConfig::load(path)?,
            None => ChatConfig::default(),
        };
        config.apply_env();
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut ChatConfig) {
        if let Some(server) = &self.server {
            config.server_url = server.clone();
        }
        if let Some(api) = &self.api {
            config.api_base = api.clone();
        }
        if let Some(name) = &self.name {
            config.participant.name = name.clone();
        }
        if self.admin {
            config.participant.is_admin = true;
        }
        if let Some(ms) = self.debounce_ms {
            config.debounce_ms = ms;
        }
    }
}

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    Chat(Command),
    Support(String),
    Quit,
    Empty,
    Unknown(String),
}

/// Interpret a stdin line. Plain text is a message; `/`-prefixed words are
/// commands.
pub fn parse_line(line: &str) -> InputLine {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return InputLine::Empty;
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return InputLine::Chat(Command::Send(trimmed.to_string()));
    };
    let (word, arg) = match rest.split_once(char::is_whitespace) {
        Some((w, a)) => (w, a.trim()),
        None => (rest, ""),
    };
    match word {
        "open" if !arg.is_empty() => InputLine::Chat(Command::Open(arg.to_string())),
        "close" => InputLine::Chat(Command::Close),
        "typing" => InputLine::Chat(Command::Activity),
        "support" if !arg.is_empty() => InputLine::Support(arg.to_string()),
        "quit" | "exit" => InputLine::Quit,
        _ => InputLine::Unknown(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_args_parse_minimal() {
        let args = Args::parse_from(["order-chat"]);
        assert!(args.config.is_none());
        assert!(args.server.is_none());
        assert!(!args.admin);
        assert!(args.session.is_none());
    }

    #[test]
    fn test_args_parse_full() {
        let args = Args::parse_from([
            "order-chat",
            "--server",
            "ws://h/ws/chat",
            "--api",
            "http://h",
            "--name",
            "Ann",
            "--admin",
            "--debounce-ms",
            "3000",
            "--session",
            "42",
        ]);
        assert_eq!(args.server.as_deref(), Some("ws://h/ws/chat"));
        assert_eq!(args.api.as_deref(), Some("http://h"));
        assert_eq!(args.name.as_deref(), Some("Ann"));
        assert!(args.admin);
        assert_eq!(args.debounce_ms, Some(3000));
        assert_eq!(args.session.as_deref(), Some("42"));
    }

    #[test]
    fn test_overrides_win_over_config() {
        let args = Args::parse_from(["order-chat", "-n", "Bob", "--debounce-ms", "3000"]);
        let mut config = ChatConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config.participant.name, "Bob");
        assert_eq!(config.debounce_ms, 3_000);
        assert_eq!(config.server_url, ChatConfig::default().server_url);
    }

    #[test]
    fn test_resolve_config_rejects_zero_debounce() {
        let args = Args::parse_from(["order-chat", "--debounce-ms", "0"]);
        assert!(matches!(args.resolve_config(), Err(ChatError::Config(_))));
    }

    #[rstest]
    #[case("hello there", InputLine::Chat(Command::Send("hello there".into())))]
    #[case("  padded  ", InputLine::Chat(Command::Send("padded".into())))]
    #[case("/open ord-42", InputLine::Chat(Command::Open("ord-42".into())))]
    #[case("/close", InputLine::Chat(Command::Close))]
    #[case("/typing", InputLine::Chat(Command::Activity))]
    #[case("/support what is the price", InputLine::Support("what is the price".into()))]
    #[case("/quit", InputLine::Quit)]
    #[case("/exit", InputLine::Quit)]
    #[case("", InputLine::Empty)]
    #[case("/open", InputLine::Unknown("/open".into()))]
    #[case("/dance", InputLine::Unknown("/dance".into()))]
    fn test_parse_line(#[case] line: &str, #[case] expected: InputLine) {
        assert_eq!(parse_line(line), expected);
    }
}
