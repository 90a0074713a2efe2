//! Line-oriented console transport
//!
//! Reads one message per line and prints the service's replies. Lines
//! starting with a known `/command` are commands; every other non-empty line
//! is an answer to the current question.

use crate::core::service::{CalculatorService, Command, InboundEvent, Outbound, Payload};
use crate::types::{ChatId, UserId};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// One parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    Payload(Payload),
    Quit,
    Blank,
}

pub fn parse_line(line: &str) -> ConsoleLine {
    let line = line.trim();
    let command = match line {
        "" => return ConsoleLine::Blank,
        "/quit" | "/exit" => return ConsoleLine::Quit,
        "/start" => Command::Start,
        "/cancel" => Command::Cancel,
        "/export" => Command::Export,
        "/help" => Command::Help,
        answer => return ConsoleLine::Payload(Payload::Text(answer.to_string())),
    };
    ConsoleLine::Payload(Payload::Command(command))
}

/// Run the console until `/quit` or end of input
///
/// # Arguments
///
/// * `service` - The calculator handling every line
/// * `user` - User id the console speaks as (decides export access)
/// * `chat` - Chat id of the console conversation
/// * `input` - Line source, usually buffered stdin
/// * `output` - Reply sink, usually stdout
///
/// # Errors
///
/// Returns an error only if reading input or writing output fails.
pub async fn run_console<R, W>(
    service: &CalculatorService,
    user: UserId,
    chat: ChatId,
    input: R,
    mut output: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let help = service
        .handle(InboundEvent::command(user, chat, Command::Help))
        .await;
    write_replies(&mut output, &help).await?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let payload = match parse_line(&line) {
            ConsoleLine::Payload(payload) => payload,
            ConsoleLine::Blank => continue,
            ConsoleLine::Quit => break,
        };

        let replies = service.handle(InboundEvent { user, chat, payload }).await;
        write_replies(&mut output, &replies).await?;
    }

    debug!("console input closed");
    output.flush().await
}

async fn write_replies<W>(output: &mut W, replies: &[Outbound]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for reply in replies {
        let text = match reply {
            Outbound::Text(text) => format!("{text}\n\n"),
            Outbound::Document(path) => format!("Calculation log: {}\n\n", path.display()),
        };
        output.write_all(text.as_bytes()).await?;
    }
    output.flush().await
}
