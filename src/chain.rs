//! Splitting of one input line into a chain of command segments.
//!
//! The grammar is flat: segments are separated by `;`, `&&` and `||`, and a
//! comment starts at a `#` that begins the line or follows whitespace.

use std::fmt;

use crate::error::ShellError;

/// Connective between a segment and the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOp {
    /// First segment of a line.
    None,
    /// `&&`: run only if the previous status was zero.
    And,
    /// `||`: run only if the previous status was non-zero.
    Or,
    /// `;`: always run.
    Seq,
}

impl ChainOp {
    /// Whether a segment joined by this operator runs after `previous` status.
    pub fn should_run(self, previous: i32) -> bool {
        match self {
            ChainOp::None | ChainOp::Seq => true,
            ChainOp::And => previous == 0,
            ChainOp::Or => previous != 0,
        }
    }
}

impl fmt::Display for ChainOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainOp::None => Ok(()),
            ChainOp::And => write!(f, "&&"),
            ChainOp::Or => write!(f, "||"),
            ChainOp::Seq => write!(f, ";"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSegment {
    pub op: ChainOp,
    pub text: String,
    /// A lone `&` or `|` seen inside the segment; such a segment is rejected
    /// when its turn comes.
    pub stray: Option<char>,
}

pub type CommandChain = Vec<CommandSegment>;

/// Cut `line` at the first comment marker.
pub fn strip_comment(line: &str) -> &str {
    let mut prev: Option<char> = None;
    for (idx, ch) in line.char_indices() {
        if ch == '#' && prev.is_none_or(char::is_whitespace) {
            return &line[..idx];
        }
        prev = Some(ch);
    }
    line
}

struct ChainFSM {
    input: Vec<char>,
    pos: usize,
    buffer: String,
    stray: Option<char>,
    pending: ChainOp,
    trailing: Option<ChainOp>,
    out: CommandChain,
}

impl ChainFSM {
    fn new(line: &str) -> Self {
        ChainFSM {
            input: line.chars().collect(),
            pos: 0,
            buffer: String::new(),
            stray: None,
            pending: ChainOp::None,
            trailing: None,
            out: Vec::new(),
        }
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn make_chain(mut self) -> Result<CommandChain, ShellError> {
        while let Some(ch) = self.read_char() {
            match ch {
                '&' | '|' if self.peek_char() == Some(ch) => {
                    self.read_char();
                    let op = if ch == '&' { ChainOp::And } else { ChainOp::Or };
                    self.finish_segment(op);
                }
                ';' => self.finish_segment(ChainOp::Seq),
                '&' | '|' => {
                    self.stray.get_or_insert(ch);
                    self.buffer.push(ch);
                }
                c => self.buffer.push(c),
            }
        }

        let had_text = !self.buffer.trim().is_empty();
        self.flush_segment();
        match self.trailing {
            Some(op) if !had_text => {
                tracing::debug!(target: "parse", "trailing operator {op}");
                Err(ShellError::Syntax(op.to_string()))
            }
            _ => Ok(self.out),
        }
    }

    fn finish_segment(&mut self, op: ChainOp) {
        self.flush_segment();
        self.pending = op;
        self.trailing = Some(op);
    }

    fn flush_segment(&mut self) {
        let text = std::mem::take(&mut self.buffer);
        let stray = self.stray.take();
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let op = if self.out.is_empty() {
            ChainOp::None
        } else {
            self.pending
        };
        self.out.push(CommandSegment {
            op,
            text: text.to_string(),
            stray,
        });
    }
}

/// Split a raw line into its segments.
///
/// Comment-only and blank lines yield an empty chain. A line that ends in
/// an operator is rejected as a whole with [`ShellError::Syntax`].
pub fn split_chain(line: &str) -> Result<CommandChain, ShellError> {
    let chain = ChainFSM::new(strip_comment(line)).make_chain()?;
    tracing::debug!(target: "parse", "split {:?} into {} segment(s)", line, chain.len());
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops_and_texts(line: &str) -> Vec<(ChainOp, String)> {
        split_chain(line)
            .unwrap()
            .into_iter()
            .map(|s| (s.op, s.text))
            .collect()
    }

    #[test]
    fn test_single_segment() {
        assert_eq!(ops_and_texts("ls -l"), vec![(ChainOp::None, "ls -l".into())]);
    }

    #[test]
    fn test_all_operators() {
        assert_eq!(
            ops_and_texts("a && b || c ; d"),
            vec![
                (ChainOp::None, "a".into()),
                (ChainOp::And, "b".into()),
                (ChainOp::Or, "c".into()),
                (ChainOp::Seq, "d".into()),
            ]
        );
    }

    #[test]
    fn test_operators_without_spaces() {
        assert_eq!(
            ops_and_texts("a&&b||c;d"),
            vec![
                (ChainOp::None, "a".into()),
                (ChainOp::And, "b".into()),
                (ChainOp::Or, "c".into()),
                (ChainOp::Seq, "d".into()),
            ]
        );
    }

    #[test]
    fn test_blank_segments_are_dropped() {
        assert_eq!(
            ops_and_texts("a ;; b"),
            vec![(ChainOp::None, "a".into()), (ChainOp::Seq, "b".into())]
        );
        assert_eq!(ops_and_texts("; a"), vec![(ChainOp::None, "a".into())]);
    }

    #[test]
    fn test_comments_are_stripped() {
        assert_eq!(ops_and_texts("echo hi # && rm -rf"), vec![(ChainOp::None, "echo hi".into())]);
        assert_eq!(ops_and_texts("echo a#b"), vec![(ChainOp::None, "echo a#b".into())]);
        assert!(split_chain("# just a comment").unwrap().is_empty());
        assert!(split_chain("   ").unwrap().is_empty());
    }

    #[test]
    fn test_trailing_operator_is_syntax_error() {
        let err = split_chain("ls &&").unwrap_err();
        assert!(matches!(err, ShellError::Syntax(ref t) if t == "&&"));
        assert!(split_chain("ls ;").is_err());
        assert!(split_chain("||").is_err());
    }

    #[test]
    fn test_lone_ampersand_marks_segment() {
        let chain = split_chain("sleep 1 & ; echo ok").unwrap();
        assert_eq!(chain[0].stray, Some('&'));
        assert_eq!(chain[1].stray, None);
        assert_eq!(chain[1].text, "echo ok");
    }

    #[test]
    fn test_should_run() {
        assert!(ChainOp::Seq.should_run(1));
        assert!(ChainOp::And.should_run(0));
        assert!(!ChainOp::And.should_run(2));
        assert!(ChainOp::Or.should_run(2));
        assert!(!ChainOp::Or.should_run(0));
    }
}
