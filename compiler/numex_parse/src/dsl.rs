//! Line-based parser for DSL programs.
//!
//! ```text
//! # me:fp = fast
//! def kernel(x, y):
//!     acc = 0
//!     for i in range(4):
//!         if i == 2: continue
//!         acc = acc + x * i
//!     result = acc + y
//! ```
//!
//! Indentation delimits blocks (a tab counts as four columns). The `def`
//! header is optional: a headerless body is parsed the same way. Expression
//! texts are kept verbatim together with their line and column.

mod pragma;
mod scan;

use numex_diagnostic::DslError;
use numex_ir::{Pragmas, MAX_NESTING};

use scan::{
    code_lines, find_top_level, leading_word, matching_paren, split_top_level, strip_comment,
    top_level, Cursor, Line, ScanError,
};

/// An expression text and where it starts (1-based).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExprText {
    pub text: String,
    pub line: u32,
    pub column: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DslParam {
    pub name: String,
    pub line: u32,
    pub column: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DslStmt {
    pub kind: DslStmtKind,
    pub line: u32,
    pub column: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DslStmtKind {
    Assign {
        name: String,
        value: ExprText,
    },
    /// A bare expression.
    Expr(ExprText),
    Print {
        args: Vec<ExprText>,
    },
    /// `for var in range(limit):`
    For {
        var: String,
        limit: ExprText,
        body: Vec<DslStmt>,
    },
    If {
        cond: ExprText,
        then_body: Vec<DslStmt>,
        elifs: Vec<(ExprText, Vec<DslStmt>)>,
        else_body: Option<Vec<DslStmt>>,
    },
    Return(ExprText),
    Break,
    Continue,
}

/// A parsed DSL source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DslProgram {
    /// Function name, when the source has a `def` header.
    pub name: Option<String>,
    pub params: Vec<DslParam>,
    pub pragmas: Pragmas,
    pub body: Vec<DslStmt>,
}

/// Parse a DSL program.
pub fn parse_program(source: &str) -> Result<DslProgram, DslError> {
    let pragmas = pragma::scan_pragmas(source)?;
    let lines = code_lines(source)
        .map_err(|(line, column, message)| DslError::new(line, column, message))?;
    let Some(first) = lines.first().copied() else {
        return Err(DslError::new(1, 1, "expected 'def'"));
    };

    let mut parser = BlockParser { lines, pos: 0 };
    let program = if leading_word(first.text) == "def" {
        let (name, params, colon) = parse_header(&first)?;
        let body = parser.body_after(first, colon, 0, false)?;
        if let Some(extra) = parser.peek() {
            return Err(error_at(&extra, 0, "unexpected content after function"));
        }
        DslProgram {
            name: Some(name),
            params,
            pragmas,
            body,
        }
    } else {
        let body = parser.block(first.indent, 1, false)?;
        if let Some(extra) = parser.peek() {
            return Err(error_at(&extra, 0, "unexpected dedent"));
        }
        DslProgram {
            name: None,
            params: Vec::new(),
            pragmas,
            body,
        }
    };

    tracing::debug!(
        name = program.name.as_deref().unwrap_or("<anonymous>"),
        statements = program.body.len(),
        "parsed DSL program"
    );
    Ok(program)
}

/// Whether `source` should be compiled as a DSL program rather than a
/// single expression.
///
/// True for a `def` header, a comment or pragma, more than one line of
/// code, a `;` separator, a statement keyword, or an assignment.
pub fn looks_like_dsl(source: &str) -> bool {
    let mut code = source
        .split('\n')
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty());
    let Some(first) = code.next() else {
        return false;
    };
    if code.next().is_some() {
        return true;
    }
    let text = first.trim();
    match strip_comment(text) {
        Ok(stripped) if stripped.len() != text.len() => return true,
        Ok(_) => {}
        Err(_) => return false,
    }
    if matches!(
        leading_word(text),
        "def" | "for" | "if" | "print" | "return" | "break" | "continue"
    ) {
        return true;
    }
    let Ok(top) = top_level(text) else {
        return false;
    };
    let bytes = text.as_bytes();
    top.iter().any(|&(i, c)| match c {
        ';' => true,
        '=' => {
            let prev = i.checked_sub(1).map(|p| bytes[p]);
            let next = bytes.get(i + 1).copied();
            !matches!(prev, Some(b'=' | b'!' | b'<' | b'>')) && next != Some(b'=')
        }
        _ => false,
    })
}

fn error_at(line: &Line<'_>, offset: usize, message: impl Into<String>) -> DslError {
    DslError::new(line.number, line.column + offset as u32, message)
}

fn scan_error(line: &Line<'_>, base: usize, e: ScanError) -> DslError {
    error_at(line, base + e.offset, e.message)
}

/// Expression text starting `base` bytes into the line.
fn expr_text(line: &Line<'_>, base: usize, text: &str) -> Result<ExprText, DslError> {
    let trimmed = text.trim();
    let lead = text.len() - text.trim_start().len();
    if trimmed.is_empty() {
        return Err(error_at(line, base + lead, "expected expression"));
    }
    Ok(ExprText {
        text: trimmed.to_string(),
        line: line.number,
        column: line.column + (base + lead) as u32,
    })
}

/// `def name(params):`, returning the offset of the colon.
fn parse_header(line: &Line<'_>) -> Result<(String, Vec<DslParam>, usize), DslError> {
    let mut cursor = Cursor::new(line.text, 0);
    cursor.keyword("def");
    let Some(name) = cursor.ident() else {
        cursor.skip_space();
        return Err(error_at(line, cursor.pos(), "expected function name"));
    };
    if !cursor.eat('(') {
        return Err(error_at(line, cursor.pos(), "expected '(' after function name"));
    }

    let mut params: Vec<DslParam> = Vec::new();
    if !cursor.eat(')') {
        loop {
            cursor.skip_space();
            let start = cursor.pos();
            let Some(param) = cursor.ident() else {
                return Err(error_at(line, start, "expected parameter name"));
            };
            if params.iter().any(|p| p.name == param) {
                return Err(error_at(line, start, "duplicate parameter name"));
            }
            params.push(DslParam {
                name: param.to_string(),
                line: line.number,
                column: line.column + start as u32,
            });
            if cursor.eat(',') {
                continue;
            }
            if cursor.eat(')') {
                break;
            }
            cursor.skip_space();
            return Err(error_at(
                line,
                cursor.pos(),
                "expected ',' or ')' in parameter list",
            ));
        }
    }
    if !cursor.eat(':') {
        cursor.skip_space();
        return Err(error_at(line, cursor.pos(), "expected ':' after signature"));
    }
    Ok((name.to_string(), params, cursor.pos() - 1))
}

struct BlockParser<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
}

impl<'a> BlockParser<'a> {
    fn peek(&self) -> Option<Line<'a>> {
        self.lines.get(self.pos).copied()
    }

    /// Statements at exactly `indent`, up to the first line indented less.
    fn block(
        &mut self,
        indent: usize,
        depth: usize,
        in_loop: bool,
    ) -> Result<Vec<DslStmt>, DslError> {
        let mut body = Vec::new();
        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(error_at(&line, 0, "unexpected indent"));
            }
            match leading_word(line.text) {
                "for" => body.push(self.for_stmt(line, depth)?),
                "if" => body.push(self.if_stmt(line, depth, in_loop)?),
                "elif" => {
                    return Err(error_at(&line, 0, "unexpected 'elif' without matching 'if'"))
                }
                "else" => {
                    return Err(error_at(&line, 0, "unexpected 'else' without matching 'if'"))
                }
                "def" => return Err(error_at(&line, 0, "unexpected 'def' inside function")),
                _ => {
                    self.pos += 1;
                    body.extend(simple_statements(&line, 0, line.text, in_loop)?);
                }
            }
        }
        Ok(body)
    }

    /// The body of a compound statement whose header ends at `colon`:
    /// inline simple statements, or an indented block on the next lines.
    fn body_after(
        &mut self,
        header: Line<'a>,
        colon: usize,
        depth: usize,
        in_loop: bool,
    ) -> Result<Vec<DslStmt>, DslError> {
        if depth + 1 > MAX_NESTING {
            return Err(error_at(&header, 0, "too many nested blocks"));
        }
        self.pos += 1;
        let rest = &header.text[colon + 1..];
        if !rest.trim().is_empty() {
            return simple_statements(&header, colon + 1, rest, in_loop);
        }
        match self.peek() {
            Some(next) if next.indent > header.indent => {
                self.block(next.indent, depth + 1, in_loop)
            }
            _ => Err(error_at(&header, colon, "expected indented block after ':'")),
        }
    }

    fn for_stmt(&mut self, line: Line<'a>, depth: usize) -> Result<DslStmt, DslError> {
        let text = line.text;
        let mut cursor = Cursor::new(text, 0);
        cursor.keyword("for");
        let Some(var) = cursor.ident() else {
            cursor.skip_space();
            return Err(error_at(&line, cursor.pos(), "expected loop variable"));
        };
        if !cursor.keyword("in") {
            return Err(error_at(&line, cursor.pos(), "expected 'in' after loop variable"));
        }
        if !cursor.keyword("range") {
            return Err(error_at(&line, cursor.pos(), "expected 'range' in loop"));
        }
        if !cursor.eat('(') {
            return Err(error_at(&line, cursor.pos(), "expected '(' after range"));
        }
        let open = cursor.pos() - 1;
        let Some(close) = matching_paren(text, open) else {
            return Err(error_at(&line, open, "unclosed '(' in range"));
        };
        let inner = &text[open + 1..close];
        if inner.trim().is_empty() {
            return Err(error_at(&line, open + 1, "expected expression in range()"));
        }
        let limit = expr_text(&line, open + 1, inner)?;
        cursor.advance_to(close + 1);
        if !cursor.eat(':') {
            return Err(error_at(&line, cursor.pos(), "expected ':' after range()"));
        }
        let colon = cursor.pos() - 1;

        let body = self.body_after(line, colon, depth, true)?;
        Ok(DslStmt {
            kind: DslStmtKind::For {
                var: var.to_string(),
                limit,
                body,
            },
            line: line.number,
            column: line.column,
        })
    }

    fn if_stmt(
        &mut self,
        line: Line<'a>,
        depth: usize,
        in_loop: bool,
    ) -> Result<DslStmt, DslError> {
        let (cond, colon) = conditional_header(&line, "if")?;
        let then_body = self.body_after(line, colon, depth, in_loop)?;

        let mut elifs = Vec::new();
        let mut else_body: Option<Vec<DslStmt>> = None;
        while let Some(next) = self.peek() {
            if next.indent != line.indent {
                break;
            }
            match leading_word(next.text) {
                "elif" => {
                    if else_body.is_some() {
                        return Err(error_at(&next, 0, "elif not allowed after else"));
                    }
                    let (cond, colon) = conditional_header(&next, "elif")?;
                    let body = self.body_after(next, colon, depth, in_loop)?;
                    elifs.push((cond, body));
                }
                "else" => {
                    if else_body.is_some() {
                        return Err(error_at(&next, 0, "else already defined"));
                    }
                    let mut cursor = Cursor::new(next.text, 0);
                    cursor.keyword("else");
                    if !cursor.eat(':') {
                        return Err(error_at(&next, cursor.pos(), "expected ':' after else"));
                    }
                    let colon = cursor.pos() - 1;
                    else_body = Some(self.body_after(next, colon, depth, in_loop)?);
                }
                _ => break,
            }
        }

        Ok(DslStmt {
            kind: DslStmtKind::If {
                cond,
                then_body,
                elifs,
                else_body,
            },
            line: line.number,
            column: line.column,
        })
    }
}

/// `if cond:` or `elif cond:`; returns the condition and the colon offset.
fn conditional_header(line: &Line<'_>, keyword: &str) -> Result<(ExprText, usize), DslError> {
    let start = keyword.len();
    let rest = &line.text[start..];
    let colon = find_top_level(rest, ':').map_err(|e| scan_error(line, start, e))?;
    let Some(colon) = colon else {
        return Err(error_at(line, line.text.len(), "expected ':' after condition"));
    };
    if rest[..colon].trim().is_empty() {
        return Err(error_at(
            line,
            start,
            format!("expected condition after '{keyword}'"),
        ));
    }
    let cond = expr_text(line, start, &rest[..colon])?;
    Ok((cond, start + colon))
}

/// `;`-separated simple statements in `text`, which starts `base` bytes
/// into the line.
fn simple_statements(
    line: &Line<'_>,
    base: usize,
    text: &str,
    in_loop: bool,
) -> Result<Vec<DslStmt>, DslError> {
    let pieces = split_top_level(text, ';').map_err(|e| scan_error(line, base, e))?;
    let mut out = Vec::with_capacity(pieces.len());
    for (offset, piece) in pieces {
        if piece.trim().is_empty() {
            continue;
        }
        out.push(simple_statement(line, base + offset, piece, in_loop)?);
    }
    Ok(out)
}

fn simple_statement(
    line: &Line<'_>,
    base: usize,
    piece: &str,
    in_loop: bool,
) -> Result<DslStmt, DslError> {
    let at = base + (piece.len() - piece.trim_start().len());
    let text = piece.trim();
    let word = leading_word(text);
    let after = &text[word.len()..];

    let kind = match word {
        "return" => DslStmtKind::Return(expr_text(line, at + word.len(), after)?),
        "break" | "continue" => {
            let rest = after.trim();
            if leading_word(rest) == "if" {
                return Err(error_at(
                    line,
                    at,
                    "deprecated 'break if'/'continue if' syntax; use 'if <cond>:' with break/continue",
                ));
            }
            if !in_loop {
                return Err(error_at(line, at, "break/continue only allowed inside loops"));
            }
            if !rest.is_empty() {
                return Err(error_at(
                    line,
                    at + word.len(),
                    format!("unexpected content after '{word}'"),
                ));
            }
            if word == "break" {
                DslStmtKind::Break
            } else {
                DslStmtKind::Continue
            }
        }
        "print" if after.trim_start().starts_with('(') => print_args(line, at, text)?,
        "for" | "if" | "elif" | "else" | "def" => {
            return Err(error_at(line, at, "compound statement must start a line"));
        }
        _ if !word.is_empty() && is_assignment(after) => {
            let eq = word.len() + (after.len() - after.trim_start().len());
            DslStmtKind::Assign {
                name: word.to_string(),
                value: expr_text(line, at + eq + 1, &text[eq + 1..])?,
            }
        }
        _ => DslStmtKind::Expr(expr_text(line, at, text)?),
    };

    Ok(DslStmt {
        kind,
        line: line.number,
        column: line.column + at as u32,
    })
}

fn is_assignment(after_name: &str) -> bool {
    let rest = after_name.trim_start();
    rest.starts_with('=') && !rest.starts_with("==")
}

/// `print(a, b, ...)`; `text` starts at `at` and begins with `print`.
fn print_args(line: &Line<'_>, at: usize, text: &str) -> Result<DslStmtKind, DslError> {
    let Some(open) = text.find('(') else {
        return Err(error_at(line, at, "expected '(' after print"));
    };
    let Some(close) = matching_paren(text, open) else {
        return Err(error_at(line, at + open, "unclosed '(' in expression"));
    };
    if !text[close + 1..].trim().is_empty() {
        return Err(error_at(line, at + close + 1, "unexpected content after print()"));
    }
    let inner = &text[open + 1..close];
    if inner.trim().is_empty() {
        return Ok(DslStmtKind::Print { args: Vec::new() });
    }
    let base = at + open + 1;
    let args = split_top_level(inner, ',')
        .map_err(|e| scan_error(line, base, e))?
        .into_iter()
        .map(|(offset, arg)| expr_text(line, base + offset, arg))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DslStmtKind::Print { args })
}
