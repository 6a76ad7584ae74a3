//! Template tokenizer.
//!
//! Splits a template into literal text and tag bodies. Tag bodies are kept
//! verbatim; evaluation happens in [`crate::render`].

use crate::error::RenderError;

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal output.
    Text(String),
    /// `<%= expr %>`: evaluated and HTML-escaped.
    Escaped { expr: String, line: usize },
    /// `<%- expr %>`: evaluated and emitted as-is.
    Raw { expr: String, line: usize },
    /// `<% expr %>` / `<%_ expr %>`: evaluated, output discarded.
    Scriptlet { expr: String, line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opener {
    Escaped,
    Raw,
    Comment,
    Slurp,
    Scriptlet,
}

impl Opener {
    /// Classify the characters following `<%`; returns the opener and how
    /// many modifier bytes it consumed.
    fn detect(after_open: &str) -> (Self, usize) {
        match after_open.as_bytes().first() {
            Some(b'=') => (Self::Escaped, 1),
            Some(b'-') => (Self::Raw, 1),
            Some(b'#') => (Self::Comment, 1),
            Some(b'_') => (Self::Slurp, 1),
            _ => (Self::Scriptlet, 0),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Escaped => "<%=",
            Self::Raw => "<%-",
            Self::Comment => "<%#",
            Self::Slurp => "<%_",
            Self::Scriptlet => "<%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trim {
    None,
    /// `-%>`: eat one following newline.
    Newline,
    /// `_%>`: eat following spaces and tabs.
    Whitespace,
}

/// Parse `template` into segments.
pub fn parse(template: &str) -> Result<Vec<Segment>, RenderError> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut rest = template;
    let mut line = 1;

    while let Some(start) = rest.find("<%") {
        let before = &rest[..start];
        push_text(&mut text, before);
        line += count_newlines(before);

        let after_open = &rest[start + 2..];

        // `<%%` is a literal `<%`.
        if let Some(stripped) = after_open.strip_prefix('%') {
            text.push_str("<%");
            rest = stripped;
            continue;
        }

        let (opener, skip) = Opener::detect(after_open);
        let body_and_tail = &after_open[skip..];
        let close = body_and_tail
            .find("%>")
            .ok_or(RenderError::UnclosedTag(opener.as_str()))?;

        let mut body = &body_and_tail[..close];
        let mut tail = &body_and_tail[close + 2..];

        let trim = if let Some(stripped) = body.strip_suffix('-') {
            body = stripped;
            Trim::Newline
        } else if let Some(stripped) = body.strip_suffix('_') {
            body = stripped;
            Trim::Whitespace
        } else {
            Trim::None
        };

        if opener == Opener::Slurp {
            let kept = text.trim_end_matches([' ', '\t']).len();
            text.truncate(kept);
        }

        let tag_line = line;
        line += count_newlines(body);

        let segment = match opener {
            Opener::Comment => None,
            Opener::Escaped => Some(Segment::Escaped { expr: body.to_string(), line: tag_line }),
            Opener::Raw => Some(Segment::Raw { expr: body.to_string(), line: tag_line }),
            Opener::Slurp | Opener::Scriptlet => {
                Some(Segment::Scriptlet { expr: body.to_string(), line: tag_line })
            }
        };

        if let Some(segment) = segment {
            flush_text(&mut segments, &mut text);
            segments.push(segment);
        }

        match trim {
            Trim::None => {}
            Trim::Newline => {
                if let Some(stripped) = tail.strip_prefix("\r\n").or_else(|| tail.strip_prefix('\n')) {
                    tail = stripped;
                    line += 1;
                }
            }
            Trim::Whitespace => tail = tail.trim_start_matches([' ', '\t']),
        }

        rest = tail;
    }

    push_text(&mut text, rest);
    flush_text(&mut segments, &mut text);
    Ok(segments)
}

fn push_text(buf: &mut String, raw: &str) {
    // `%%>` outside a tag is a literal `%>`.
    buf.push_str(&raw.replace("%%>", "%>"));
}

fn flush_text(segments: &mut Vec<Segment>, text: &mut String) {
    if !text.is_empty() {
        segments.push(Segment::Text(std::mem::take(text)));
    }
}

fn count_newlines(s: &str) -> usize {
    s.bytes().filter(|b| *b == b'\n').count()
}
