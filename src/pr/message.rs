use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::types::ParsedMessage;
use super::PrError;

enum Section {
    Title,
    Body,
}

/// Split an edited draft into title and body, git-commit style.
///
/// The first block of non-blank lines is the title, joined with spaces;
/// everything after it is the body. The first line starting with `#` ends
/// the message, whatever follows it.
pub fn parse_message<I, S>(lines: I) -> ParsedMessage
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut section = Section::Title;
    let mut title_parts: Vec<String> = Vec::new();
    let mut body_parts: Vec<String> = Vec::new();

    for line in lines {
        let line = line.as_ref();
        if line.starts_with('#') {
            break;
        }

        match section {
            Section::Title if !line.trim().is_empty() => title_parts.push(line.to_string()),
            Section::Title => {
                section = Section::Body;
                body_parts.push(line.to_string());
            }
            Section::Body => body_parts.push(line.to_string()),
        }
    }

    ParsedMessage {
        title: title_parts.join(" ").trim().to_string(),
        body: body_parts.join("\n").trim().to_string(),
    }
}

/// Read the edited draft back from disk.
pub fn read_message(path: &Path) -> Result<ParsedMessage, PrError> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::new();
    for line in reader.lines() {
        let mut line = line?;
        if line.ends_with('\r') {
            line.pop();
        }
        lines.push(line);
    }
    Ok(parse_message(lines))
}
