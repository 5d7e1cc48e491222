//! Identifier sanitizing
//!
//! Turns raw schema identifiers into names usable as exported Go identifiers.

use unicode_general_category::{get_general_category, GeneralCategory};

/// Go keywords, none of which may appear as a generated identifier
const GO_KEYWORDS: [&str; 25] = [
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Options controlling how raw names are sanitized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NamingOptions {
    /// Delete every underscore before capitalizing
    pub strip_underscores: bool,
}

/// Capitalize the first character, leaving the rest untouched
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Remove all underscores from the string
pub fn nounderscore(s: &str) -> String {
    s.replace('_', "")
}

/// Map a raw identifier to its clean form
///
/// Pure and deterministic. Two raw names may map to the same clean name; callers
/// that need uniqueness check for it themselves.
pub fn sanitize(raw: &str, options: NamingOptions) -> String {
    if options.strip_underscores {
        capitalize(&nounderscore(raw))
    } else {
        capitalize(raw)
    }
}

/// Quote `s` as an interpreted Go string literal
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Letters in Go's sense: general categories Lu, Ll, Lt, Lm and Lo, plus `_`
fn is_go_letter(c: char) -> bool {
    c == '_'
        || matches!(
            get_general_category(c),
            GeneralCategory::UppercaseLetter
                | GeneralCategory::LowercaseLetter
                | GeneralCategory::TitlecaseLetter
                | GeneralCategory::ModifierLetter
                | GeneralCategory::OtherLetter
        )
}

/// Digits in Go's sense: general category Nd only
fn is_go_digit(c: char) -> bool {
    get_general_category(c) == GeneralCategory::DecimalNumber
}

/// Check whether `s` is usable as a Go identifier
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    if !is_go_letter(first) {
        return false;
    }

    if !chars.all(|c| is_go_letter(c) || is_go_digit(c)) {
        return false;
    }

    s != "_" && !GO_KEYWORDS.contains(&s)
}
