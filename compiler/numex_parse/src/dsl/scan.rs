//! Character-level scanning shared by the DSL parser.
//!
//! Expression texts are not tokenized here; the scanner only needs to know
//! where strings and parentheses are so it can split statements and find
//! header colons at the top level.

/// A scan failure at a byte offset into the scanned text.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) struct ScanError {
    pub offset: usize,
    pub message: &'static str,
}

/// One non-blank source line with comments removed.
#[derive(Copy, Clone, Debug)]
pub(super) struct Line<'a> {
    /// 1-based line number.
    pub number: u32,
    /// Indent width; a tab counts as 4.
    pub indent: usize,
    /// 1-based column of the first content byte.
    pub column: u32,
    pub text: &'a str,
}

/// Width of leading spaces and tabs.
pub(super) fn measure_indent(raw: &str) -> (usize, usize) {
    let mut width = 0;
    let mut bytes = 0;
    for b in raw.bytes() {
        match b {
            b' ' => width += 1,
            b'\t' => width += 4,
            _ => break,
        }
        bytes += 1;
    }
    (width, bytes)
}

/// Split `source` into code lines, dropping blank and comment-only lines.
pub(super) fn code_lines(source: &str) -> Result<Vec<Line<'_>>, (u32, u32, &'static str)> {
    let mut lines = Vec::new();
    for (idx, raw) in source.split('\n').enumerate() {
        let number = idx as u32 + 1;
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let (indent, start) = measure_indent(raw);
        let content = &raw[start..];
        let code = strip_comment(content)
            .map_err(|e| (number, (start + e.offset) as u32 + 1, e.message))?
            .trim_end();
        if code.is_empty() {
            continue;
        }
        lines.push(Line {
            number,
            indent,
            column: start as u32 + 1,
            text: code,
        });
    }
    Ok(lines)
}

/// Cut `text` at the first `#` outside a string literal.
pub(super) fn strip_comment(text: &str) -> Result<&str, ScanError> {
    let mut quote: Option<(char, usize)> = None;
    let mut chars = text.char_indices();
    while let Some((i, c)) = chars.next() {
        match quote {
            Some((q, _)) => {
                if c == '\\' {
                    chars.next();
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => quote = Some((c, i)),
                '#' => return Ok(&text[..i]),
                _ => {}
            },
        }
    }
    match quote {
        Some((_, start)) => Err(ScanError {
            offset: start,
            message: "unterminated string literal",
        }),
        None => Ok(text),
    }
}

/// Byte offsets and characters outside strings and parentheses.
///
/// Fails on unbalanced parentheses or an unterminated string.
pub(super) fn top_level(text: &str) -> Result<Vec<(usize, char)>, ScanError> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut open_at = Vec::new();
    let mut quote: Option<(char, usize)> = None;
    let mut chars = text.char_indices();
    while let Some((i, c)) = chars.next() {
        if let Some((q, _)) = quote {
            if c == '\\' {
                chars.next();
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some((c, i)),
            '(' => {
                if depth == 0 {
                    out.push((i, c));
                }
                depth += 1;
                open_at.push(i);
                continue;
            }
            ')' => {
                if depth == 0 {
                    return Err(ScanError {
                        offset: i,
                        message: "unexpected ')'",
                    });
                }
                depth -= 1;
                open_at.pop();
                continue;
            }
            _ => {}
        }
        if depth == 0 {
            out.push((i, c));
        }
    }
    if let Some((_, start)) = quote {
        return Err(ScanError {
            offset: start,
            message: "unterminated string literal",
        });
    }
    if let Some(&open) = open_at.first() {
        return Err(ScanError {
            offset: open,
            message: "unclosed '(' in expression",
        });
    }
    Ok(out)
}

/// Split `text` at top-level occurrences of `sep`; each piece keeps its
/// byte offset.
pub(super) fn split_top_level(text: &str, sep: char) -> Result<Vec<(usize, &str)>, ScanError> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (i, c) in top_level(text)? {
        if c == sep {
            pieces.push((start, &text[start..i]));
            start = i + c.len_utf8();
        }
    }
    pieces.push((start, &text[start..]));
    Ok(pieces)
}

/// First top-level occurrence of `target`.
pub(super) fn find_top_level(text: &str, target: char) -> Result<Option<usize>, ScanError> {
    Ok(top_level(text)?
        .into_iter()
        .find(|(_, c)| *c == target)
        .map(|(i, _)| i))
}

/// Offset of the parenthesis closing the one at `open`, skipping strings.
pub(super) fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = text[open..].char_indices();
    while let Some((i, c)) = chars.next() {
        if let Some(q) = quote {
            if c == '\\' {
                chars.next();
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

#[inline]
pub(super) fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

#[inline]
pub(super) fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Leading identifier of `text`, if any.
pub(super) fn leading_word(text: &str) -> &str {
    if !text.starts_with(is_ident_start) {
        return "";
    }
    let end = text.find(|c: char| !is_ident_char(c)).unwrap_or(text.len());
    &text[..end]
}

/// Forward-only cursor over one line of text.
pub(super) struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str, pos: usize) -> Self {
        Cursor { text, pos }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    pub fn skip_space(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    pub fn eat(&mut self, c: char) -> bool {
        self.skip_space();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn ident(&mut self) -> Option<&'a str> {
        self.skip_space();
        let word = leading_word(self.rest());
        if word.is_empty() {
            return None;
        }
        self.pos += word.len();
        Some(word)
    }

    /// Consume `keyword` when it is the next whole word.
    pub fn keyword(&mut self, keyword: &str) -> bool {
        self.skip_space();
        if leading_word(self.rest()) == keyword {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    pub fn advance_to(&mut self, pos: usize) {
        self.pos = pos;
    }
}
