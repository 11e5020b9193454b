//! Command parser - Splits raw chat text into a command name and arguments

/// A command token found at the start of a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub mention: Option<String>,
    pub raw_arguments: String,
}

/// Parse the command marked by a leading `bot_command` entity.
///
/// `entity_length` is the entity's length in UTF-16 code units, as the Bot API
/// reports it. The name is whatever the entity covers, minus the leading `/`
/// and any `@bot` suffix; the one character after the entity is the separator
/// and everything past it is the argument string, untouched.
pub fn parse_command(text: &str, entity_length: usize) -> Option<ParsedCommand> {
    let end = utf16_to_byte_offset(text, entity_length);
    let body = text[..end].strip_prefix('/')?;

    let (name, mention) = match body.split_once('@') {
        Some((name, bot)) => (name, Some(bot.to_string())),
        None => (body, None),
    };
    if name.is_empty() {
        return None;
    }

    let rest = &text[end..];
    let raw_arguments = match rest.chars().next() {
        Some(separator) => &rest[separator.len_utf8()..],
        None => "",
    };

    Some(ParsedCommand {
        name: name.to_string(),
        mention,
        raw_arguments: raw_arguments.to_string(),
    })
}

fn utf16_to_byte_offset(text: &str, units: usize) -> usize {
    let mut seen = 0;
    for (idx, c) in text.char_indices() {
        if seen >= units {
            return idx;
        }
        seen += c.len_utf16();
    }
    text.len()
}

/// Split raw arguments on single spaces, keeping empty segments.
///
/// `"a  b"` yields `["a", "", "b"]` and an empty string yields `[""]`, so
/// handlers see exactly what the sender typed.
pub fn parse_arguments(raw: &str) -> Vec<String> {
    raw.split(' ').map(str::to_string).collect()
}
