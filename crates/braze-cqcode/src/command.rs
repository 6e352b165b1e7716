//! Command extraction.
//!
//! A message is rendered to its CQ string and split shell-style: quoted
//! runs group (and may span newlines), backslash escapes protect quote
//! characters, and a token glued to an embedded marker is never split in
//! the middle of the marker.

use std::sync::LazyLock;

use regex::Regex;

/// Configuration for command extraction.
///
/// Passed explicitly into every call; build one at startup and share it by
/// reference. Concurrent readers need no synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandConfig {
    /// When set, only strings starting with `prefix` are commands, and
    /// the prefix is stripped from the extracted command token.
    pub strict: bool,
    /// Command prefix checked in strict mode.
    pub prefix: String,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            strict: false,
            prefix: "/".to_string(),
        }
    }
}

impl CommandConfig {
    /// Strict extraction with the default `/` prefix.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }
}

// Private sentinels standing in for escaped characters while the
// tokenizer runs, so a quote-grouping pattern never sees an escaped quote.
const ESCAPED_BACKSLASH: &str = r"\0x5c";
const ESCAPED_DOUBLE_QUOTE: &str = r"\0x22";
const ESCAPED_SINGLE_QUOTE: &str = r"\0x27";

/// Token pattern, in priority order: single-quoted run, double-quoted
/// run, run glued around an embedded marker, plain whitespace-delimited
/// run.
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"'[\s\S]*?'|"[\s\S]*?"|\S*\[CQ:[\s\S]*?\]\S*|\S+"#).expect("valid token pattern")
});

/// Reports whether `input` should be treated as a command.
pub fn is_command(input: &str, config: &CommandConfig) -> bool {
    if input.is_empty() {
        return false;
    }
    if config.strict && !input.starts_with(&config.prefix) {
        return false;
    }
    true
}

/// Splits a command string into the command token and its arguments.
///
/// Returns an empty command and no arguments when `input` holds no token,
/// or when strict mode is on and the first token lacks the prefix. Tokens
/// keep their CQ encoding; callers that need typed media back out of an
/// argument re-run the message decoder on it.
pub fn parse_command(input: &str, config: &CommandConfig) -> (String, Vec<String>) {
    let masked = input
        .replace(r"\\", ESCAPED_BACKSLASH)
        .replace(r#"\""#, ESCAPED_DOUBLE_QUOTE)
        .replace(r"\'", ESCAPED_SINGLE_QUOTE);

    let mut tokens = TOKEN.find_iter(&masked).map(|m| m.as_str());
    let Some(first) = tokens.next() else {
        return (String::new(), Vec::new());
    };

    let cmd = if config.strict {
        match first.strip_prefix(&config.prefix) {
            Some(stripped) => stripped.to_string(),
            None => return (String::new(), Vec::new()),
        }
    } else {
        first.to_string()
    };

    let args = tokens
        .map(|token| {
            token
                .trim_matches(|c| c == '\'' || c == '"')
                .replace(ESCAPED_SINGLE_QUOTE, "'")
                .replace(ESCAPED_DOUBLE_QUOTE, "\"")
                .replace(ESCAPED_BACKSLASH, "\\")
        })
        .collect();

    (cmd, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{Emoji, Face, Music, Text};
    use crate::message::Message;

    #[test]
    fn test_is_command() {
        let relaxed = CommandConfig::default();
        let strict = CommandConfig::strict();

        assert!(!is_command("", &relaxed));
        assert!(!is_command("", &strict));
        assert!(is_command("anything", &relaxed));
        assert!(is_command("/cmd", &strict));
        assert!(!is_command("cmd", &strict));
        assert!(!is_command("   ", &strict));
    }

    #[test]
    fn test_parse_command_quotes_and_marker() {
        let (cmd, args) = parse_command(
            r#"/cmd 'a b' "c d" [CQ:face,id=5]"#,
            &CommandConfig::strict(),
        );
        assert_eq!(cmd, "cmd");
        assert_eq!(args, vec!["a b", "c d", "[CQ:face,id=5]"]);
    }

    #[test]
    fn test_parse_command_relaxed_keeps_prefixless() {
        let (cmd, args) = parse_command("roll 2d6", &CommandConfig::default());
        assert_eq!(cmd, "roll");
        assert_eq!(args, vec!["2d6"]);
    }

    #[test]
    fn test_parse_command_wrong_prefix_strict() {
        let (cmd, args) = parse_command("cmd arg", &CommandConfig::strict());
        assert!(cmd.is_empty());
        assert!(args.is_empty());
    }

    #[test]
    fn test_parse_command_custom_prefix() {
        let config = CommandConfig {
            strict: true,
            prefix: "!!".to_string(),
        };
        let (cmd, args) = parse_command("!!ban spammer", &config);
        assert_eq!(cmd, "ban");
        assert_eq!(args, vec!["spammer"]);
    }

    #[test]
    fn test_message_command_full() {
        // A command whose token is itself a marker, with quoting, escaped
        // quotes, glued markers and a marker value spanning newlines.
        let mut msg = Message::new();
        msg.push(Text::new("/"))
            .push(Face::new(170))
            .push(Text::new(
                " arg1 'a \\'r \ng 2' \"a \\\"r \\\\\\\"g 3\\\\\" arg4\nargemoji",
            ))
            .push(Emoji { id: 10086 })
            .push(Text::new(" arg5"))
            .push(Music {
                content: "Alice\nLove\nBob".to_string(),
                ..Default::default()
            });

        let config = CommandConfig::strict();
        assert!(msg.is_command(&config));

        let (cmd, args) = msg.command(&config);
        assert_eq!(cmd, "[CQ:face,id=170]");
        assert_eq!(
            args,
            vec![
                "arg1",
                "a 'r \ng 2",
                "a \"r \\\"g 3\\",
                "arg4",
                "argemoji[CQ:emoji,id=10086]",
                "arg5[CQ:music,type=,id=,url=,audio=,title=,content=Alice\nLove\nBob,image=]",
            ]
        );
    }
}
