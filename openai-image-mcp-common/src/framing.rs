//! Line-delimited JSON framing for the stdio transport.
//!
//! Each message is one JSON object on its own line. Inbound lines that are
//! blank or do not parse as a message are logged and skipped: they never end
//! the stream and never get a response. This tolerates diagnostic output
//! interleaved on the same channel.

use futures::{Sink, Stream, stream};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;
use std::pin::Pin;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Boxed inbound message stream.
pub type MessageStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

/// Boxed outbound message sink.
pub type MessageSink<T> = Pin<Box<dyn Sink<T, Error = io::Error> + Send>>;

/// Decode one message per line from `reader`.
///
/// The stream ends at EOF or on a read error.
pub fn decode_lines<R, T>(reader: R) -> MessageStream<T>
where
    R: AsyncRead + Unpin + Send + 'static,
    T: DeserializeOwned + Send + 'static,
{
    let lines = BufReader::new(reader).lines();
    Box::pin(stream::unfold(lines, |mut lines| async move {
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<T>(line) {
                        Ok(message) => return Some((message, lines)),
                        Err(e) => {
                            tracing::warn!(error = %e, "Ignoring malformed line on input stream");
                        }
                    }
                }
                Ok(None) => {
                    tracing::debug!("Input stream closed");
                    return None;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Error reading input stream");
                    return None;
                }
            }
        }
    }))
}

/// Encode each message as one line on `writer`, flushing after every message.
pub fn encode_lines<W, T>(writer: W) -> MessageSink<T>
where
    W: AsyncWrite + Unpin + Send + 'static,
    T: Serialize + Send + 'static,
{
    Box::pin(futures::sink::unfold(writer, |mut writer, message: T| async move {
        let mut line = serde_json::to_vec(&message).map_err(io::Error::other)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok::<_, io::Error>(writer)
    }))
}

/// Stdin/stdout framing pair for the stdio transport.
pub fn stdio<In, Out>() -> (MessageSink<Out>, MessageStream<In>)
where
    In: DeserializeOwned + Send + 'static,
    Out: Serialize + Send + 'static,
{
    (encode_lines(tokio::io::stdout()), decode_lines(tokio::io::stdin()))
}
