//! Cell-reference tokenizers.
//!
//! Both scanners walk the input once, left to right, and return
//! non-overlapping [`Token`]s carrying the byte span, the matched text and the
//! parsed reference. Rewriting is a separate pass ([`substitute`]), so a
//! caller can inspect every match before anything changes.
//!
//! Tokens are made of ASCII bytes only, which keeps every span on a char
//! boundary even when the surrounding text is not ASCII.

use std::fmt;

use crate::error::{CellRefError, Result};

/// One reference found in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<T> {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub reference: T,
}

/// An A1-style reference as written, e.g. `B30`, `$B$30`, `da$7`.
///
/// Column letters keep their original spelling so a rewrite only touches the
/// row component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Ref {
    pub col_absolute: bool,
    pub column: String,
    pub row_absolute: bool,
    pub row: u64,
}

impl A1Ref {
    pub fn with_row(&self, row: u64) -> Self {
        Self {
            row,
            ..self.clone()
        }
    }
}

impl fmt::Display for A1Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.col_absolute {
            f.write_str("$")?;
        }
        f.write_str(&self.column)?;
        if self.row_absolute {
            f.write_str("$")?;
        }
        write!(f, "{}", self.row)
    }
}

/// One axis of an R1C1 reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefSpec {
    /// `R` / `C` with nothing after it: the anchor's own index.
    Same,
    /// `R2`: a literal 1-based index.
    Absolute(u32),
    /// `R[-1]`: an offset from the anchor.
    Relative(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct R1C1Ref {
    pub row: RefSpec,
    pub col: RefSpec,
}

impl R1C1Ref {
    /// Parse a complete R1C1 reference such as `R2C[-1]` or `rc3`.
    pub fn parse(s: &str) -> Result<Self> {
        match r1c1_at(s.as_bytes(), 0) {
            Some((end, reference)) if end == s.len() => Ok(reference),
            _ => Err(CellRefError::InvalidR1C1(s.to_string())),
        }
    }
}

/// Find every A1 reference: `$? letters+ $? digits+`, where the match is not
/// directly followed by a letter. A digit run that runs into a letter gives up
/// its last digit, so `B30x` yields `B3`.
pub fn scan_a1(text: &str) -> Vec<Token<A1Ref>> {
    scan(text, a1_at)
}

/// Find every R1C1 reference: `R (\[-?n\] | n?) C (\[-?n\] | n?)`, case
/// insensitive. A match must not start inside a word (`ARC`, `Source`) and must
/// not run into a following letter.
pub fn scan_r1c1(text: &str) -> Vec<Token<R1C1Ref>> {
    scan(text, r1c1_at)
}

/// Rebuild `text` with every token replaced by `replace(token)`.
///
/// Tokens must be sorted and non-overlapping, which is what the scanners
/// produce.
pub fn substitute<T, F>(text: &str, tokens: &[Token<T>], mut replace: F) -> Result<String>
where
    F: FnMut(&Token<T>) -> Result<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for token in tokens {
        out.push_str(&text[cursor..token.start]);
        out.push_str(&replace(token)?);
        cursor = token.end;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

fn scan<T>(text: &str, at: fn(&[u8], usize) -> Option<(usize, T)>) -> Vec<Token<T>> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match at(bytes, i) {
            Some((end, reference)) => {
                out.push(Token {
                    start: i,
                    end,
                    text: text[i..end].to_string(),
                    reference,
                });
                i = end;
            }
            None => i += 1,
        }
    }
    out
}

pub(crate) fn a1_at(bytes: &[u8], start: usize) -> Option<(usize, A1Ref)> {
    let mut pos = start;
    let col_absolute = eat(bytes, &mut pos, b'$');
    let column = take_while(bytes, &mut pos, u8::is_ascii_alphabetic);
    if column.is_empty() {
        return None;
    }
    let row_absolute = eat(bytes, &mut pos, b'$');
    let mut digits = take_while(bytes, &mut pos, u8::is_ascii_digit);
    if bytes.get(pos).is_some_and(u8::is_ascii_alphabetic) {
        // Give back the last digit: `B30x` matches as `B3`, with a digit next.
        if digits.len() < 2 {
            return None;
        }
        digits = &digits[..digits.len() - 1];
        pos -= 1;
    }
    if digits.is_empty() {
        return None;
    }

    let reference = A1Ref {
        col_absolute,
        column: ascii(column).to_string(),
        row_absolute,
        row: ascii(digits).parse().ok()?,
    };
    Some((pos, reference))
}

fn r1c1_at(bytes: &[u8], start: usize) -> Option<(usize, R1C1Ref)> {
    if !matches!(bytes.get(start), Some(b'R' | b'r')) {
        return None;
    }
    if start > 0 && bytes[start - 1].is_ascii_alphanumeric() {
        return None;
    }

    let mut pos = start + 1;
    let row = spec_at(bytes, &mut pos)?;
    if !matches!(bytes.get(pos), Some(b'C' | b'c')) {
        return None;
    }
    pos += 1;
    let col = spec_at(bytes, &mut pos)?;
    if bytes.get(pos).is_some_and(u8::is_ascii_alphabetic) {
        return None;
    }

    Some((pos, R1C1Ref { row, col }))
}

fn spec_at(bytes: &[u8], pos: &mut usize) -> Option<RefSpec> {
    if bytes.get(*pos) == Some(&b'[') {
        let mut p = *pos + 1;
        let negative = eat(bytes, &mut p, b'-');
        let digits = take_while(bytes, &mut p, u8::is_ascii_digit);
        if digits.is_empty() || bytes.get(p) != Some(&b']') {
            // Not a bracketed offset; the empty spec leaves `[` in front of
            // the caller, which then fails to find `C`.
            return Some(RefSpec::Same);
        }
        let offset: i64 = ascii(digits).parse().ok()?;
        *pos = p + 1;
        return Some(RefSpec::Relative(if negative { -offset } else { offset }));
    }

    let digits = take_while(bytes, pos, u8::is_ascii_digit);
    if digits.is_empty() {
        Some(RefSpec::Same)
    } else {
        Some(RefSpec::Absolute(ascii(digits).parse().ok()?))
    }
}

fn eat(bytes: &[u8], pos: &mut usize, b: u8) -> bool {
    if bytes.get(*pos) == Some(&b) {
        *pos += 1;
        true
    } else {
        false
    }
}

fn take_while<'a>(bytes: &'a [u8], pos: &mut usize, pred: fn(&u8) -> bool) -> &'a [u8] {
    let start = *pos;
    while bytes.get(*pos).is_some_and(pred) {
        *pos += 1;
    }
    &bytes[start..*pos]
}

fn ascii(bytes: &[u8]) -> &str {
    // Only ever called on runs of ASCII letters/digits.
    std::str::from_utf8(bytes).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<T>(tokens: &[Token<T>]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_scan_a1_finds_references_in_formula() {
        let tokens = scan_a1("=SUM(B2:B30)-$C$4+d$7");
        assert_eq!(texts(&tokens), vec!["B2", "B30", "$C$4", "d$7"]);

        let c4 = &tokens[2].reference;
        assert!(c4.col_absolute);
        assert!(c4.row_absolute);
        assert_eq!(c4.column, "C");
        assert_eq!(c4.row, 4);

        assert_eq!(tokens[0].start, 5);
        assert_eq!(tokens[0].end, 7);
    }

    #[test]
    fn test_scan_a1_digits_followed_by_letter() {
        assert_eq!(texts(&scan_a1("B30x")), vec!["B3"]);
        assert_eq!(texts(&scan_a1("ABC12D")), vec!["ABC1"]);
        assert!(scan_a1("B3x").is_empty());
        assert!(scan_a1("B$3x").is_empty());
        assert!(scan_a1("1/1/2015").is_empty());
        assert_eq!(texts(&scan_a1("Q1 2015")), vec!["Q1"]);
    }

    #[test]
    fn test_scan_a1_keeps_spans_on_char_boundaries() {
        let text = "€ A1 – B2";
        let tokens = scan_a1(text);
        assert_eq!(texts(&tokens), vec!["A1", "B2"]);
        for t in &tokens {
            assert_eq!(&text[t.start..t.end], t.text);
        }
    }

    #[test]
    fn test_scan_r1c1_variants() {
        let tokens = scan_r1c1("=R[-1]C+RC[-2]*R2C3-rc");
        assert_eq!(texts(&tokens), vec!["R[-1]C", "RC[-2]", "R2C3", "rc"]);
        assert_eq!(
            tokens[0].reference,
            R1C1Ref {
                row: RefSpec::Relative(-1),
                col: RefSpec::Same
            }
        );
        assert_eq!(
            tokens[2].reference,
            R1C1Ref {
                row: RefSpec::Absolute(2),
                col: RefSpec::Absolute(3)
            }
        );
    }

    #[test]
    fn test_scan_r1c1_ignores_words() {
        assert!(scan_r1c1("Source").is_empty());
        assert!(scan_r1c1("ARC").is_empty());
        assert!(scan_r1c1("Record").is_empty());
    }

    #[test]
    fn test_r1c1_parse_requires_whole_input() {
        assert!(R1C1Ref::parse("R2C[-1]").is_ok());
        assert!(R1C1Ref::parse("R2C[-1]x").is_err());
        assert!(R1C1Ref::parse("R[C").is_err());
        assert!(R1C1Ref::parse("").is_err());
    }

    #[test]
    fn test_substitute_rebuilds_text() {
        let text = "=B30+$B$2";
        let tokens = scan_a1(text);
        let out = substitute(text, &tokens, |t| Ok(format!("<{}>", t.text))).unwrap();
        assert_eq!(out, "=<B30>+<$B$2>");
    }
}
