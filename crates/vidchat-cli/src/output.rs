//! JSON-lines message stream.

use std::io::{self, Write};

use tracing::trace;
use vidchat_model::ChatMessage;

use crate::logging::redact_value;

/// Writes one compact JSON object per message, newline terminated.
pub struct JsonLinesWriter<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Serialize and write one message. Flushes after every line so a
    /// downstream reader sees live messages as they arrive.
    pub fn write_message(&mut self, message: &ChatMessage) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, message)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.written += 1;
        trace!(
            message_id = %message.message_id,
            text = redact_value(message.message.as_deref().unwrap_or_default()),
            "wrote message"
        );
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// A closed downstream pipe ends the stream quietly.
pub fn is_closed_pipe(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::BrokenPipe
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn one_object_per_line() {
        let mut output = JsonLinesWriter::new(Vec::new());
        output.write_message(&ChatMessage::text("1", "first")).unwrap();
        output.write_message(&ChatMessage::text("2", "second\nline")).unwrap();
        assert_eq!(output.written(), 2);

        let text = String::from_utf8(output.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["message_id"], "2");
        assert_eq!(second["message"], "second\nline");
    }

    #[test]
    fn broken_pipe_is_recognized() {
        assert!(is_closed_pipe(&io::Error::from(io::ErrorKind::BrokenPipe)));
        assert!(!is_closed_pipe(&io::Error::from(io::ErrorKind::PermissionDenied)));
    }
}
