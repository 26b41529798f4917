use clap::Parser;
use colored::*;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

use order_chat::cli::{parse_line, Args, InputLine};
use order_chat::runtime::{self, Command};
use order_chat::support::SupportDesk;
use order_chat::{ChatClient, ConsoleView, WsChannel};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they do not interleave with the transcript.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.resolve_config()?;

    eprintln!(
        "{}",
        format!("  Connecting to {} as {}", config.server_url, config.participant.name).bright_green()
    );
    eprintln!(
        "{}",
        "  /open ID, /close, /typing, /support TEXT, /quit".bright_blue()
    );

    let (channel, events) = WsChannel::connect(&config.server_url).await?;
    let (client, history) = ChatClient::new(
        channel,
        config.history(),
        ConsoleView::new(),
        config.client_options(),
    );

    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>(64);
    if let Some(session) = &args.session {
        cmd_tx.send(Command::Open(session.clone())).await?;
    }

    let desk = SupportDesk::new();
    let input = tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = LinesStream::new(stdin.lines());
        while let Some(Ok(line)) = lines.next().await {
            match parse_line(&line) {
                InputLine::Chat(cmd) => {
                    if cmd_tx.send(cmd).await.is_err() {
                        break;
                    }
                }
                InputLine::Support(question) => {
                    let desk = desk.clone();
                    tokio::spawn(async move {
                        if let Some(reply) = desk.respond(&question).await {
                            println!("{} {}", "Support:".bright_cyan().bold(), reply);
                        }
                    });
                }
                InputLine::Quit => break,
                InputLine::Empty => {}
                InputLine::Unknown(cmd) => {
                    eprintln!("{}", format!("  unknown command: {}", cmd).red());
                }
            }
        }
        let _ = cmd_tx.send(Command::Shutdown).await;
    });

    runtime::run(client, history, events, cmd_rx).await;
    input.abort();
    Ok(())
}
