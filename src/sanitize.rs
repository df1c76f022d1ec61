//! Turning raw ASN.1 identifiers into C identifiers.
//!
//! ASN.1 allows `-` inside identifiers and has no notion of C's reserved
//! words, so everything that ends up in generated code passes through a
//! [`Sanitizer`] first.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::util::is_c_ident;

/// C reserved words. A generated identifier that lands on one of these must
/// be escaped before it can be used as a declaration name.
///
/// We use [`phf`](https://github.com/rust-phf/rust-phf) for this, since the
/// set is fixed at compile time.
static C_KEYWORDS: phf::Set<&'static str> = phf::phf_set! {
    // C89.
    "auto", "break", "case", "char", "const", "continue", "default", "do",
    "double", "else", "enum", "extern", "float", "for", "goto", "if", "int",
    "long", "register", "return", "short", "signed", "sizeof", "static",
    "struct", "switch", "typedef", "union", "unsigned", "void", "volatile",
    "while",

    // C99.
    "inline", "restrict", "_Bool", "_Complex", "_Imaginary",

    // C11.
    "_Alignas", "_Alignof", "_Atomic", "_Generic", "_Noreturn",
    "_Static_assert", "_Thread_local",
};

/// Maps a raw schema identifier to a valid identifier in the output language.
pub trait Sanitizer {
    /// Sanitize `raw`. If `avoid_reserved` is set, the result must also not be
    /// a reserved word of the output language.
    ///
    /// Non-empty input must produce a valid identifier. What happens to empty
    /// input is up to the implementation.
    fn sanitize(&self, raw: &str, avoid_reserved: bool) -> String;
}

/// The sanitizer for C output.
#[derive(Clone, Copy, Debug, Default)]
pub struct CSanitizer;

impl CSanitizer {
    /// Is `s` a C reserved word?
    pub fn is_reserved(s: &str) -> bool {
        C_KEYWORDS.contains(s)
    }
}

impl Sanitizer for CSanitizer {
    fn sanitize(&self, raw: &str, avoid_reserved: bool) -> String {
        static INVALID_RUN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]+").expect("invalid regex"));

        if raw.is_empty() {
            return String::new();
        }

        let mut ident = INVALID_RUN.replace_all(raw, "_").into_owned();
        if ident.starts_with(|c: char| c.is_ascii_digit()) {
            ident.insert(0, '_');
        }
        if avoid_reserved && Self::is_reserved(&ident) {
            ident.push('_');
        }
        debug_assert!(is_c_ident(&ident), "sanitized {:?} to {:?}", raw, ident);
        ident
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn replaces_hyphens_and_other_junk() {
        let s = CSanitizer;
        assert_eq!(s.sanitize("Foo", false), "Foo");
        assert_eq!(s.sanitize("foo-bar", false), "foo_bar");
        assert_eq!(s.sanitize("foo--bar", false), "foo_bar");
        assert_eq!(s.sanitize("a.b c", false), "a_b_c");
        assert_eq!(s.sanitize("3gpp", false), "_3gpp");
        assert_eq!(s.sanitize("", true), "");
    }

    #[test]
    fn escapes_reserved_words_only_on_request() {
        let s = CSanitizer;
        assert_eq!(s.sanitize("default", false), "default");
        assert_eq!(s.sanitize("default", true), "default_");
        assert_eq!(s.sanitize("struct", true), "struct_");
        assert_eq!(s.sanitize("Default", true), "Default");
        assert_eq!(s.sanitize("int-value", true), "int_value");
    }
}
