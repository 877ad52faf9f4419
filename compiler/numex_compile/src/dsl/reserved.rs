//! Pre-scan for reserved geometry identifiers.

use numex_ir::Reserved;
use numex_lexer::{lex, TokenKind};
use numex_parse::dsl::{DslStmt, DslStmtKind, ExprText};

/// Every reserved identifier referenced anywhere in `body`, in order of
/// first appearance.
pub(super) fn scan(body: &[DslStmt]) -> Vec<Reserved> {
    let mut found = Vec::new();
    visit_block(body, &mut found);
    found
}

fn visit_block(body: &[DslStmt], found: &mut Vec<Reserved>) {
    for stmt in body {
        match &stmt.kind {
            DslStmtKind::Assign { value, .. } => visit_text(value, found),
            DslStmtKind::Expr(text) | DslStmtKind::Return(text) => visit_text(text, found),
            DslStmtKind::Print { args } => args.iter().for_each(|a| visit_text(a, found)),
            DslStmtKind::For { limit, body, .. } => {
                visit_text(limit, found);
                visit_block(body, found);
            }
            DslStmtKind::If {
                cond,
                then_body,
                elifs,
                else_body,
            } => {
                visit_text(cond, found);
                visit_block(then_body, found);
                for (cond, body) in elifs {
                    visit_text(cond, found);
                    visit_block(body, found);
                }
                if let Some(body) = else_body {
                    visit_block(body, found);
                }
            }
            DslStmtKind::Break | DslStmtKind::Continue => {}
        }
    }
}

fn visit_text(text: &ExprText, found: &mut Vec<Reserved>) {
    // Malformed text is reported when the expression itself is compiled.
    let Ok(tokens) = lex(&text.text) else {
        return;
    };
    for token in tokens {
        if token.kind != TokenKind::Ident {
            continue;
        }
        if let Some(reserved) = Reserved::parse(&text.text[token.span.range()]) {
            if !found.contains(&reserved) {
                found.push(reserved);
            }
        }
    }
}
