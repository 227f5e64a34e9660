use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::BufRead;

/// Result of asking a source for the next line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// The read was cancelled by an interrupt; ask again.
    Interrupted,
    Eof,
}

/// Provider of raw command lines.
pub trait LineSource {
    /// Block until a line is available. `prompt` is shown only by sources
    /// that talk to a terminal.
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome>;

    /// Called for each line the session accepted for execution.
    fn accepted(&mut self, _line: &str) {}
}

/// Interactive terminal input through the line editor.
pub struct EditorSource {
    editor: DefaultEditor,
}

impl EditorSource {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadOutcome::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(err) => Err(err.into()),
        }
    }

    fn accepted(&mut self, line: &str) {
        if let Err(err) = self.editor.add_history_entry(line) {
            tracing::warn!("failed to add line to editor history: {err}");
        }
    }
}

/// Line-by-line input from a script file or a non-terminal stdin.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    /// Bytes that are not valid UTF-8 are replaced rather than ending the input.
    fn read_line(&mut self, _prompt: &str) -> Result<ReadOutcome> {
        let mut raw = Vec::new();
        match self.reader.read_until(b'\n', &mut raw) {
            Ok(0) => Ok(ReadOutcome::Eof),
            Ok(_) => {
                let bytes = raw.strip_suffix(b"\n").unwrap_or(&raw);
                let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
                Ok(ReadOutcome::Line(String::from_utf8_lossy(bytes).into_owned()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => Ok(ReadOutcome::Interrupted),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reader_source_strips_line_endings() {
        let mut source = ReaderSource::new(Cursor::new("ls\r\npwd\nlast"));
        assert_eq!(source.read_line("$ ").unwrap(), ReadOutcome::Line("ls".into()));
        assert_eq!(source.read_line("$ ").unwrap(), ReadOutcome::Line("pwd".into()));
        assert_eq!(source.read_line("$ ").unwrap(), ReadOutcome::Line("last".into()));
        assert_eq!(source.read_line("$ ").unwrap(), ReadOutcome::Eof);
    }

    #[test]
    fn test_reader_source_decodes_invalid_utf8_lossily() {
        let mut source = ReaderSource::new(Cursor::new(&b"echo caf\xe9\nnext\n"[..]));
        assert_eq!(
            source.read_line("").unwrap(),
            ReadOutcome::Line("echo caf\u{fffd}".into())
        );
        assert_eq!(source.read_line("").unwrap(), ReadOutcome::Line("next".into()));
        assert_eq!(source.read_line("").unwrap(), ReadOutcome::Eof);
    }

    #[test]
    fn test_reader_source_keeps_blank_lines() {
        let mut source = ReaderSource::new(Cursor::new("\n\n"));
        assert_eq!(source.read_line("").unwrap(), ReadOutcome::Line(String::new()));
        assert_eq!(source.read_line("").unwrap(), ReadOutcome::Line(String::new()));
        assert_eq!(source.read_line("").unwrap(), ReadOutcome::Eof);
    }
}
