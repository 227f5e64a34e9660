//! Alias and variable expansion of a command segment.
//!
//! Expansion is purely textual. It runs once per segment, just before the
//! segment is tokenized, so it always sees the current session state.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::alias::AliasStore;
use crate::session::SessionState;

static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:(\?)|(\$)|([A-Za-z0-9_]+))").expect("variable pattern is valid")
});

const ALIAS_BUILTIN: &str = "alias";

fn leading_word(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or("")
}

/// Replace the leading word of `text` with its alias definition.
///
/// Applied once per segment: a definition that itself starts with an alias
/// name is left as written.
pub fn expand_alias(text: &str, aliases: &AliasStore) -> String {
    let trimmed = text.trim_start();
    let word_end = trimmed
        .find(char::is_whitespace)
        .unwrap_or(trimmed.len());
    let (first_word, rest) = trimmed.split_at(word_end);

    match aliases.get(first_word) {
        Some(value) if !first_word.is_empty() => format!("{value}{rest}"),
        _ => text.to_string(),
    }
}

/// Substitute `$?`, `$$` and `$NAME` anywhere in `text`.
///
/// Unset names expand to the empty string; a `$` not followed by one of the
/// recognised forms is kept literally.
pub fn expand_variables(text: &str, state: &SessionState) -> String {
    VARIABLE
        .replace_all(text, |caps: &Captures<'_>| {
            if caps.get(1).is_some() {
                state.last_status.to_string()
            } else if caps.get(2).is_some() {
                state.pid.to_string()
            } else {
                state
                    .env
                    .get_var(&caps[3])
                    .unwrap_or_default()
                    .to_string()
            }
        })
        .into_owned()
}

/// Both expansion passes, alias first, so that variables inside an alias
/// body see the environment as it is when the segment runs.
///
/// Operands of the `alias` builtin skip the variable pass: a definition
/// stores `$NAME` as written and it is substituted when the alias is used.
pub fn expand(text: &str, state: &SessionState) -> String {
    let aliased = expand_alias(text, &state.aliases);
    let expanded = if leading_word(&aliased) == ALIAS_BUILTIN {
        aliased
    } else {
        expand_variables(&aliased, state)
    };
    tracing::debug!(target: "expansion", "{:?} -> {:?}", text, expanded);
    expanded
}

/// Split expanded text into an argument vector. Quotes are not removed.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(String::from).collect()
}
