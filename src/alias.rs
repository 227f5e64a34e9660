use crate::vars::NamedValueList;

/// User-defined aliases, listed in definition order.
#[derive(Debug, Clone, Default)]
pub struct AliasStore {
    aliases: NamedValueList,
}

impl AliasStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.aliases.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.aliases.set(name, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter()
    }
}

/// One operand of the `alias` builtin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasOperand {
    /// `name=value`: define or redefine.
    Define { name: String, value: String },
    /// bare `name`: print the current definition.
    Show(String),
}

/// Group the whitespace-split words given to `alias` into operands.
///
/// Tokenization does not honour quotes, so `ll="ls -l"` reaches the builtin
/// as `ll="ls` and `-l"`. A value that opens a quote keeps absorbing the
/// following words (rejoined with single spaces) until the matching quote
/// closes; the surrounding quotes are then dropped. An unterminated quote
/// runs to the end of the arguments.
pub fn parse_operands(args: &[String]) -> Vec<AliasOperand> {
    let mut operands = Vec::new();
    let mut words = args.iter();

    while let Some(word) = words.next() {
        let Some((name, raw_value)) = word.split_once('=') else {
            operands.push(AliasOperand::Show(word.clone()));
            continue;
        };

        let mut value = raw_value.to_string();
        if let Some(quote) = value.chars().next().filter(|c| *c == '"' || *c == '\'') {
            while !is_closed(&value, quote) {
                match words.next() {
                    Some(next) => {
                        value.push(' ');
                        value.push_str(next);
                    }
                    None => break,
                }
            }
            value = strip_quotes(&value, quote);
        }

        operands.push(AliasOperand::Define {
            name: name.to_string(),
            value,
        });
    }

    operands
}

fn is_closed(value: &str, quote: char) -> bool {
    value.len() > 1 && value.ends_with(quote)
}

fn strip_quotes(value: &str, quote: char) -> String {
    let inner = value.strip_prefix(quote).unwrap_or(value);
    inner.strip_suffix(quote).unwrap_or(inner).to_string()
}
