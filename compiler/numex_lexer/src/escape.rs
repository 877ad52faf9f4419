//! String literal escape processing.
//!
//! Valid escapes: `\\` `\"` `\'` `\n` `\t` `\uXXXX` `\UXXXXXXXX`.
//! Code points above U+10FFFF and surrogates are rejected.

/// Resolve escapes in a literal's content (between the quotes).
///
/// On failure returns the byte offset of the offending backslash within
/// `content`.
pub fn cook_string(content: &str) -> Result<String, usize> {
    if !content.contains('\\') {
        return Ok(content.to_string());
    }

    let mut result = String::with_capacity(content.len());
    let mut chars = content.char_indices();
    while let Some((i, c)) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        let resolved = match chars.next() {
            Some((_, '\\')) => '\\',
            Some((_, '"')) => '"',
            Some((_, '\'')) => '\'',
            Some((_, 'n')) => '\n',
            Some((_, 't')) => '\t',
            Some((_, 'u')) => hex_code_point(&mut chars, 4).ok_or(i)?,
            Some((_, 'U')) => hex_code_point(&mut chars, 8).ok_or(i)?,
            _ => return Err(i),
        };
        result.push(resolved);
    }
    Ok(result)
}

fn hex_code_point(chars: &mut std::str::CharIndices<'_>, digits: usize) -> Option<char> {
    let mut value: u32 = 0;
    for _ in 0..digits {
        let (_, c) = chars.next()?;
        value = (value << 4) | c.to_digit(16)?;
    }
    // `from_u32` rejects surrogates and values past U+10FFFF.
    char::from_u32(value)
}
