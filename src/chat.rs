// Interactive terminal chat over a ChatSession.
//
// Lines are sent as chat messages. Commands:
//   /good [id]  mark a model reply as a good response (default: the latest one)
//   /bad [id]   mark a model reply as a bad response
//   /quit       leave the chat

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use crate::{
    actions::Actions,
    session::{ChatSession, Feedback, Notification},
};

enum Command {
    Say(String),
    Rate(Feedback, Option<u64>),
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    let mut parts = trimmed.split_whitespace();
    match parts.next() {
        Some("/quit") | Some("/exit") => Command::Quit,
        Some(cmd @ ("/good" | "/bad")) => {
            let feedback = if cmd == "/good" { Feedback::Positive } else { Feedback::Negative };
            match parts.next().map(str::parse::<u64>) {
                None => Command::Rate(feedback, None),
                Some(Ok(id)) => Command::Rate(feedback, Some(id)),
                Some(Err(_)) => Command::Unknown(trimmed.to_string()),
            }
        }
        Some(word) if word.starts_with('/') => Command::Unknown(trimmed.to_string()),
        _ => Command::Say(line.to_string()),
    }
}

/// Runs the chat loop until `/quit` or end of input. Returns the session so
/// callers can inspect the conversation.
pub async fn run_chat<R, W>(actions: &Actions, input: R, mut output: W) -> Result<ChatSession>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Starting interactive chat session...");
    let mut session = ChatSession::new();
    let mut lines = input.lines();

    output
        .write_all(b"Chat started. Commands: /good [id], /bad [id], /quit\n> ")
        .await?;
    output.flush().await?;

    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Command::Quit => break,
            Command::Say(text) => match session.send(actions, &text).await {
                Ok(reply) => {
                    let rendered = format!("[{}] model: {}\n", reply.id, reply.content);
                    output.write_all(rendered.as_bytes()).await?;
                }
                Err(e) => warn!("Message not sent: {}", e),
            },
            Command::Rate(feedback, id) => {
                let target = id.or_else(|| session.last_model_message().map(|msg| msg.id));
                let text = match target {
                    None => "Nothing to rate yet.".to_string(),
                    Some(id) => match session.give_feedback(actions, id, feedback).await {
                        Ok(Notification::FeedbackSubmitted(text)) => format!("Feedback Submitted: {}", text),
                        Ok(Notification::FeedbackError(text)) => format!("Feedback Error: {}", text),
                        Err(e) => format!("Cannot rate message: {}", e),
                    },
                };
                output.write_all(format!("{}\n", text).as_bytes()).await?;
            }
            Command::Unknown(cmd) => {
                output
                    .write_all(format!("Unknown command: {}\n", cmd).as_bytes())
                    .await?;
            }
        }
        output.write_all(b"> ").await?;
        output.flush().await?;
    }

    output.write_all(b"\nBye.\n").await?;
    output.flush().await?;
    info!(messages = session.messages().len(), "Chat session finished.");
    Ok(session)
}
