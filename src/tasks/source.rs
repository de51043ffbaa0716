//! Lexical scanning of JavaScript and CSS sources
//!
//! Splits a source into code, string and comment segments. The linters
//! mask strings and comments before matching rules; the minifiers drop
//! comments and squeeze whitespace in code while keeping strings and
//! regular expression literals intact.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Code,
    String,
    Regex,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub kind: SegmentKind,
    pub text: &'a str,
}

/// Source dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `//` and `/* */` comments, `'`, `"` and `` ` `` strings, `/re/` literals
    Js,
    /// `/* */` comments, `'` and `"` strings
    Css,
}

/// Split `src` into segments; an unterminated string or comment runs to the end
pub fn scan(src: &str, dialect: Dialect) -> Vec<Segment<'_>> {
    let bytes = src.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut i = 0;
    // Offset of the last significant code byte, or of the last byte of the
    // last string or regex literal
    let mut last: Option<usize> = None;

    while i < bytes.len() {
        let c = bytes[i];
        let next = bytes.get(i + 1).copied();

        let end = if c == b'/' && next == Some(b'*') {
            Some((SegmentKind::Comment, block_comment_end(bytes, i)))
        } else if c == b'/' && next == Some(b'/') && dialect == Dialect::Js {
            Some((SegmentKind::Comment, line_end(bytes, i)))
        } else if c == b'"' || c == b'\'' || (c == b'`' && dialect == Dialect::Js) {
            Some((SegmentKind::String, string_end(bytes, i, c)))
        } else if c == b'/' && dialect == Dialect::Js && regex_allowed(bytes, last) {
            regex_end(bytes, i).map(|to| (SegmentKind::Regex, to))
        } else {
            None
        };

        match end {
            Some((kind, to)) => {
                push(&mut segments, src, SegmentKind::Code, start, i);
                push(&mut segments, src, kind, i, to);
                if kind != SegmentKind::Comment {
                    last = Some(to - 1);
                }
                start = to;
                i = to;
            }
            None => {
                if !c.is_ascii_whitespace() {
                    last = Some(i);
                }
                i += 1;
            }
        }
    }
    push(&mut segments, src, SegmentKind::Code, start, bytes.len());

    segments
}

fn push<'a>(segments: &mut Vec<Segment<'a>>, src: &'a str, kind: SegmentKind, from: usize, to: usize) {
    if to > from {
        segments.push(Segment {
            kind,
            text: &src[from..to],
        });
    }
}

/// Keywords after which `/` starts a regular expression
const REGEX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case",
    "do", "else", "yield", "await",
];

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

/// Whether a `/` following the byte at `last` starts a regex rather than a division
fn regex_allowed(bytes: &[u8], last: Option<usize>) -> bool {
    let Some(end) = last else {
        return true;
    };
    let b = bytes[end];
    if b"(,=:[!&|?{};+-*%<>~^".contains(&b) {
        return true;
    }
    if !is_word_byte(b) {
        return false;
    }

    let begin = bytes[..=end]
        .iter()
        .rposition(|&b| !is_word_byte(b))
        .map(|p| p + 1)
        .unwrap_or(0);
    REGEX_KEYWORDS
        .iter()
        .any(|k| k.as_bytes() == &bytes[begin..=end])
}

/// End of a regex literal starting at `from`, flags included
///
/// A line break before the closing `/` means this was not a regex.
fn regex_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut i = from + 1;
    let mut in_class = false;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return None,
            b'[' => {
                in_class = true;
                i += 1;
            }
            b']' => {
                in_class = false;
                i += 1;
            }
            b'/' if !in_class => {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                    i += 1;
                }
                return Some(i);
            }
            _ => i += 1,
        }
    }
    None
}

fn block_comment_end(bytes: &[u8], from: usize) -> usize {
    let mut i = from + 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return i + 2;
        }
        i += 1;
    }
    bytes.len()
}

fn line_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|p| from + p)
        .unwrap_or(bytes.len())
}

fn string_end(bytes: &[u8], from: usize, quote: u8) -> usize {
    let mut i = from + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' if quote != b'`' => return i,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Replace strings and comments with spaces, keeping newlines and offsets
pub fn mask(src: &str, dialect: Dialect) -> String {
    let mut out = String::with_capacity(src.len());
    for segment in scan(src, dialect) {
        match segment.kind {
            SegmentKind::Code => out.push_str(segment.text),
            SegmentKind::String | SegmentKind::Regex => {
                // Keep the delimiters so `a == ''` still reads as a comparison
                let text = segment.text;
                for (index, ch) in text.char_indices() {
                    if index == 0 || index + ch.len_utf8() == text.len() {
                        out.push(ch);
                    } else {
                        push_blank(&mut out, ch);
                    }
                }
            }
            SegmentKind::Comment => {
                for ch in segment.text.chars() {
                    push_blank(&mut out, ch);
                }
            }
        }
    }
    out
}

fn push_blank(out: &mut String, ch: char) {
    if ch == '\n' {
        out.push('\n');
    } else {
        for _ in 0..ch.len_utf8() {
            out.push(' ');
        }
    }
}

/// 1-based line number of a byte offset
pub fn line_of(src: &str, offset: usize) -> usize {
    src.as_bytes()[..offset.min(src.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}
