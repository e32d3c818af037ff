use anyhow::Result;
use async_stream::stream;
use futures::stream::Stream;
use std::pin::Pin;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

const PROMPT: &str = "You: ";
const REPLY_LABEL: &str = "\u{1b}[93mGemini\u{1b}[0m";
const BANNER: &str = "Chat with Gemini (use 'ctrl-c' to quit)";

/// User messages, one per line. The stream ends with the input.
pub type InputStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

pub fn stdin_lines() -> InputStream {
    Box::pin(stream! {
        let mut reader = BufReader::new(tokio::io::stdin());
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            match reader.read_until(b'\n', &mut buffer).await {
                Ok(0) => break,
                Ok(_) => yield Ok(decode_line(&buffer)),
                Err(error) => {
                    yield Err(anyhow::Error::from(error));
                    break;
                }
            }
        }
    })
}

/// Strip the line ending; invalid UTF-8 is replaced rather than rejected.
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

pub async fn write_banner<W: AsyncWrite + Unpin>(output: &mut W) -> Result<()> {
    output.write_all(format!("{BANNER}\n").as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

pub async fn write_prompt<W: AsyncWrite + Unpin>(output: &mut W) -> Result<()> {
    output.write_all(PROMPT.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

pub async fn write_reply<W: AsyncWrite + Unpin>(output: &mut W, reply: &str) -> Result<()> {
    output
        .write_all(format!("{REPLY_LABEL}: {reply}\n").as_bytes())
        .await?;
    output.flush().await?;
    Ok(())
}
