//! `# me:...` pragma lines.
//!
//! Pragmas are comment lines before the first line of code. Comments that
//! do not start with `me:` are ignored.

use numex_diagnostic::DslError;
use numex_ir::{CompilerHint, FpMode, Pragmas};

use super::scan::leading_word;

/// Collect the pragmas preceding the first code line of `source`.
pub(super) fn scan_pragmas(source: &str) -> Result<Pragmas, DslError> {
    let mut pragmas = Pragmas::default();
    for (idx, raw) in source.split('\n').enumerate() {
        let content = raw.trim_start_matches([' ', '\t', '\r']);
        if content.is_empty() {
            continue;
        }
        let Some(comment) = content.strip_prefix('#') else {
            break;
        };
        let Some(pragma) = comment.trim().strip_prefix("me:") else {
            continue;
        };
        let at = |message: &str| {
            DslError::new(idx as u32 + 1, (raw.len() - content.len()) as u32 + 1, message)
        };
        let name = leading_word(pragma);
        let value = &pragma[name.len()..];
        match name {
            "fp" => {
                if pragmas.fp.is_some() {
                    return Err(at("duplicate me:fp pragma"));
                }
                let mode = match pragma_value(value, "fp", "fp mode").map_err(|m| at(&m))? {
                    "strict" => FpMode::Strict,
                    "contract" => FpMode::Contract,
                    "fast" => FpMode::Fast,
                    _ => {
                        return Err(at(
                            "unknown me:fp value (expected 'strict', 'contract', or 'fast')",
                        ))
                    }
                };
                pragmas.fp = Some(mode);
            }
            "compiler" => {
                if pragmas.compiler.is_some() {
                    return Err(at("duplicate me:compiler pragma"));
                }
                let hint = match pragma_value(value, "compiler", "compiler")
                    .map_err(|m| at(&m))?
                {
                    "tcc" => CompilerHint::Tcc,
                    "cc" => CompilerHint::Cc,
                    _ => return Err(at("unknown me:compiler value (expected 'tcc' or 'cc')")),
                };
                pragmas.compiler = Some(hint);
            }
            _ => return Err(at("unknown me:* pragma (supported: me:fp, me:compiler)")),
        }
    }
    Ok(pragmas)
}

/// Parse `= value` after a pragma name.
fn pragma_value<'a>(text: &'a str, name: &str, what: &str) -> Result<&'a str, String> {
    let Some(rest) = text.trim_start().strip_prefix('=') else {
        return Err(format!("expected '=' after me:{name}"));
    };
    let rest = rest.trim_start();
    let value = leading_word(rest);
    if value.is_empty() {
        return Err(format!("expected {what} value after me:{name}="));
    }
    if !rest[value.len()..].trim().is_empty() {
        return Err(format!("unexpected trailing content in me:{name} pragma"));
    }
    Ok(value)
}
