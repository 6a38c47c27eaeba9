//! Interactive terminal front end.
//!
//! SYSTEM CONTEXT
//! ==============
//! Reads one command per line, turns it into an [`Event`] for the controller,
//! and redraws the screen after every state change. API completions are
//! interleaved with input through `tokio::select!`, so the console stays
//! responsive while requests are in flight.

pub mod command;
pub mod render;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::controller::Controller;
use crate::net::api::RecordApi;
use crate::state::records::Event;
use command::{Command, ParseError};

/// Run the console until `quit` or end of input. On end of input, in-flight
/// requests are allowed to finish and the final screen is drawn.
///
/// # Errors
///
/// Returns an I/O error if reading input or writing output fails.
pub async fn run<A, R, W>(mut controller: Controller<A>, input: R, mut output: W) -> std::io::Result<()>
where
    A: RecordApi + 'static,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    controller.dispatch(Event::Mount);
    draw(&mut output, &render::render(controller.state())).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    controller.settle().await;
                    draw(&mut output, &render::render(controller.state())).await?;
                    break;
                };
                match command::parse_command(&line, controller.state()) {
                    Ok(Command::Quit) => break,
                    Ok(Command::Help) => draw(&mut output, command::HELP).await?,
                    Ok(Command::Dispatch(event)) => {
                        tracing::debug!(?event, "console event");
                        controller.dispatch(event);
                        draw(&mut output, &render::render(controller.state())).await?;
                    }
                    Err(ParseError::Empty) => {}
                    Err(e) => draw(&mut output, &format!("{e}. Type `help` for commands.")).await?,
                }
            }
            progressed = controller.next_completion(), if controller.in_flight() > 0 => {
                if progressed {
                    draw(&mut output, &render::render(controller.state())).await?;
                }
            }
        }
    }
    Ok(())
}

async fn draw<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> std::io::Result<()> {
    output.write_all(text.as_bytes()).await?;
    if !text.ends_with('\n') {
        output.write_all(b"\n").await?;
    }
    output.write_all(b"\n").await?;
    output.flush().await
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
