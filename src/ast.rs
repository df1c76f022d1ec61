//! Our abstract syntax tree and parser for ASN.1 schemas.
//!
//! We only parse the subset of ASN.1 that matters for naming: module
//! headers, type assignments, and the structure of constructed types.
//! Information object classes and parameterized types are not supported.
//! Constraints, tags, `DEFAULT` values, `IMPORTS`/`EXPORTS` and value
//! assignments are parsed but thrown away.
//!
//! The AST implements [`Drive`] from the [`derive-visitor`
//! crate](https://github.com/nikis05/derive-visitor), so that
//! [`crate::collect`] can walk it without writing traversal code by hand.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use derive_visitor::Drive;

use crate::{
    errors::{Result, SourceError},
    known_files::{FileId, KnownFiles},
    schema::Span,
};

/// ASN.1 reserved words. None of these can be used as a bare identifier.
static KEYWORDS: phf::Set<&'static str> = phf::phf_set! {
    "ABSENT", "ALL", "APPLICATION", "AUTOMATIC", "BEGIN", "BIT", "BMPString",
    "BOOLEAN", "BY", "CHARACTER", "CHOICE", "COMPONENT", "COMPONENTS",
    "CONSTRAINED", "CONTAINING", "DEFAULT", "DEFINITIONS", "EMBEDDED",
    "ENCODED", "END", "ENUMERATED", "EXCEPT", "EXPLICIT", "EXPORTS",
    "EXTENSIBILITY", "EXTERNAL", "FALSE", "FROM", "GeneralizedTime",
    "GeneralString", "GraphicString", "IA5String", "IDENTIFIER", "IMPLICIT",
    "IMPLIED", "IMPORTS", "INCLUDES", "INSTANCE", "INTEGER", "INTERSECTION",
    "ISO646String", "MAX", "MIN", "MINUS-INFINITY", "NULL", "NumericString",
    "OBJECT", "ObjectDescriptor", "OCTET", "OF", "OPTIONAL", "PATTERN", "PDV",
    "PLUS-INFINITY", "PRESENT", "PrintableString", "PRIVATE", "REAL",
    "RELATIVE-OID", "SEQUENCE", "SET", "SIZE", "STRING", "SYNTAX",
    "T61String", "TAGS", "TeletexString", "TRUE", "TYPE-IDENTIFIER", "UNION",
    "UNIQUE", "UNIVERSAL", "UniversalString", "UTCTime", "UTF8String",
    "VideotexString", "VisibleString", "WITH",
};

/// Restricted character string and time types. We treat these all the same.
static STRING_TYPES: &[&str] = &[
    "BMPString",
    "GeneralizedTime",
    "GeneralString",
    "GraphicString",
    "IA5String",
    "ISO646String",
    "NumericString",
    "PrintableString",
    "T61String",
    "TeletexString",
    "UniversalString",
    "UTCTime",
    "UTF8String",
    "VideotexString",
    "VisibleString",
];

/// A function that compares two strings for equality.
type StrCmp = dyn Fn(&str, &str) -> bool;

/// An identifier and where it appeared.
#[derive(Clone, Debug, Drive, Eq, PartialEq)]
pub struct Name {
    #[drive(skip)]
    pub text: String,
    #[drive(skip)]
    pub span: Span,
}

/// An ASN.1 module: `Name DEFINITIONS ::= BEGIN ... END`.
#[derive(Clone, Debug, Drive)]
pub struct ModuleDefinition {
    pub name: Name,
    pub assignments: Vec<TypeAssignment>,
}

/// `Name ::= Type`.
#[derive(Clone, Debug, Drive)]
pub struct TypeAssignment {
    pub name: Name,
    pub ty: Type,
}

/// A type, wherever it appears.
#[derive(Clone, Debug, Drive)]
pub struct Type {
    #[drive(skip)]
    pub span: Span,
    pub body: TypeBody,
}

/// The different sorts of type we understand.
#[derive(Clone, Debug, Drive)]
pub enum TypeBody {
    Sequence(Vec<Component>),
    Set(Vec<Component>),
    Choice(Vec<Component>),
    SequenceOf(Box<Element>),
    SetOf(Box<Element>),
    Enumerated(Vec<NamedNumber>),
    Integer(Vec<NamedNumber>),
    BitString(Vec<NamedNumber>),
    Boolean,
    Null,
    OctetString,
    Real,
    ObjectIdentifier,
    /// The string type's name, like `IA5String`.
    #[allow(dead_code)]
    CharacterString(#[drive(skip)] String),
    /// The referenced type's name.
    #[allow(dead_code)]
    Reference(#[drive(skip)] String),
}

/// A named member of a `SEQUENCE`, `SET` or `CHOICE`.
#[derive(Clone, Debug, Drive)]
pub struct Component {
    pub name: Name,
    pub ty: Type,
    /// `OPTIONAL` or `DEFAULT`.
    #[allow(dead_code)]
    #[drive(skip)]
    pub optional: bool,
}

/// The element type of `SEQUENCE OF` or `SET OF`, which may be named.
#[derive(Clone, Debug, Drive)]
pub struct Element {
    pub name: Option<Name>,
    pub ty: Type,
}

/// An enumerator, a named bit, or a named `INTEGER` value.
#[derive(Clone, Debug, Drive, Eq, PartialEq)]
pub struct NamedNumber {
    pub name: Name,
    #[drive(skip)]
    pub value: Option<i64>,
}

/// Parse a schema file, which may contain several modules.
pub fn parse_schema(files: &KnownFiles, file_id: FileId) -> Result<Vec<ModuleDefinition>> {
    let source = files.source_code(file_id)?;

    // Parse with or without tracing, as appropriate. The tracing code throws
    // off error positions, so we don't want to use it unless we're going to
    // use `pegviz` to visualize the parse.
    #[cfg(feature = "trace")]
    let result = schema::modules_traced(source);
    #[cfg(not(feature = "trace"))]
    let result = schema::modules(source);

    match result {
        Ok(modules) => Ok(modules),
        // Prepare a user-friendly error message.
        Err(e) => {
            let start = e.location.offset.min(source.len());
            let end = (start + 1).min(source.len());
            let diagnostic = Diagnostic::error()
                .with_message("Failed to parse schema")
                .with_labels(vec![Label::primary(file_id, start..end)
                    .with_message(format!("expected {}", e.expected))]);
            Err(Box::new(SourceError {
                source: e,
                diagnostic,
            })
            .into())
        }
    }
}

// We use `rust-peg`, which implements a
// [Parsing Expression
// Grammar](https://en.wikipedia.org/wiki/Parsing_expression_grammar).
//
// Grammar notes:
//   - Every token rule consumes the whitespace and comments that follow it,
//     so rules never need to mention whitespace except at the very start.
//   - Keywords are matched using `k` (eg `k("SEQUENCE")`) and punctuation
//     using `t` (eg `t("::=")`).
//   - ASN.1 is case sensitive. Type references start with an uppercase
//     letter and component names with a lowercase letter, which is what lets
//     us tell `SEQUENCE OF item Foo` from `SEQUENCE OF Foo`.
peg::parser! {
    /// The subset of ASN.1 that we need.
    pub grammar schema() for str {
        /// Alternate entry point for tracing the parse with `pegviz`.
        pub rule modules_traced() -> Vec<ModuleDefinition> = traced(<modules()>)

        /// Main entry point.
        pub rule modules() -> Vec<ModuleDefinition>
            = _ ms:module_definition()+ ![_] { ms }

        rule module_definition() -> ModuleDefinition
            = name:type_reference() braced()? k("DEFINITIONS") tag_default()?
              extensibility()? t("::=") k("BEGIN")
              exports()? imports()?
              assignments:assignment()*
              k("END")
              { ModuleDefinition { name, assignments: assignments.into_iter().flatten().collect() } }

        rule tag_default()
            = (k("AUTOMATIC") / k("IMPLICIT") / k("EXPLICIT")) k("TAGS")

        rule extensibility() = k("EXTENSIBILITY") k("IMPLIED")

        /// We don't resolve references between modules, so we skip these.
        rule exports() = k("EXPORTS") (!";" [_])* t(";")
        rule imports() = k("IMPORTS") (!";" [_])* t(";")

        /// Value assignments don't define any types, so we skip them.
        rule assignment() -> Option<TypeAssignment>
            = a:type_assignment() { Some(a) }
            / value_identifier() ty() t("::=") value() { None }

        rule type_assignment() -> TypeAssignment
            = name:type_reference() t("::=") ty:ty() { TypeAssignment { name, ty } }

        /// A possibly tagged and constrained type.
        rule ty() -> Type
            = tag()? s:position!() body:type_body() e:position!() constraint()*
              { Type { span: s..e, body } }

        rule type_body() -> TypeBody
            = k("SEQUENCE") c:components() { TypeBody::Sequence(c) }
            / k("SEQUENCE") size_constraint()? k("OF") e:element() { TypeBody::SequenceOf(Box::new(e)) }
            / k("SET") c:components() { TypeBody::Set(c) }
            / k("SET") size_constraint()? k("OF") e:element() { TypeBody::SetOf(Box::new(e)) }
            / k("CHOICE") c:components() { TypeBody::Choice(c) }
            / k("ENUMERATED") n:named_numbers() { TypeBody::Enumerated(n) }
            / k("INTEGER") n:named_numbers()? { TypeBody::Integer(n.unwrap_or_default()) }
            / k("BIT") k("STRING") n:named_numbers()? { TypeBody::BitString(n.unwrap_or_default()) }
            / k("BOOLEAN") { TypeBody::Boolean }
            / k("NULL") { TypeBody::Null }
            / k("OCTET") k("STRING") { TypeBody::OctetString }
            / k("REAL") { TypeBody::Real }
            / k("OBJECT") k("IDENTIFIER") { TypeBody::ObjectIdentifier }
            / s:string_type() { TypeBody::CharacterString(s) }
            / r:type_reference() { TypeBody::Reference(r.text) }

        rule string_type() -> String
            = word:$(ident_text()) _ {?
                if STRING_TYPES.contains(&word) {
                    Ok(word.to_owned())
                } else {
                    Err("string type")
                }
            }

        /// `{ a INTEGER, b BOOLEAN OPTIONAL, ... }`.
        rule components() -> Vec<Component>
            = t("{") items:(component_item() ** t(",")) t(",")? t("}")
              { items.into_iter().flatten().collect() }

        rule component_item() -> Option<Component>
            = t("...") exception()? { None }
            / t("[[") (component_item() ** t(",")) t("]]") { None }
            / c:component() { Some(c) }

        rule component() -> Component
            = name:value_identifier() ty:ty() optional:presence()
              { Component { name, ty, optional } }

        rule presence() -> bool
            = k("OPTIONAL") { true }
            / k("DEFAULT") value() { true }
            / { false }

        rule element() -> Element
            = name:value_identifier() ty:ty() { Element { name: Some(name), ty } }
            / ty:ty() { Element { name: None, ty } }

        /// `{ red(0), green, blue(2), ... }`.
        rule named_numbers() -> Vec<NamedNumber>
            = t("{") items:(named_number_item() ** t(",")) t("}")
              { items.into_iter().flatten().collect() }

        rule named_number_item() -> Option<NamedNumber>
            = t("...") exception()? { None }
            / name:value_identifier() value:(t("(") n:signed_number() t(")") { n })?
              { Some(NamedNumber { name, value }) }

        rule signed_number() -> i64
            = n:$("-"? ['0'..='9']+) _ {? n.parse().or(Err("number")) }

        /// `[0]`, `[APPLICATION 3] IMPLICIT`, etc.
        rule tag()
            = t("[") (!"]" [_])* t("]") (k("IMPLICIT") / k("EXPLICIT"))?

        rule size_constraint()
            = constraint()
            / k("SIZE") constraint()

        /// A parenthesized constraint. We only care about skipping it.
        rule constraint()
            = t("(") (constraint() / (!['(' | ')'] [_]))* t(")")

        rule exception() = t("!") value()

        /// Some value. We only care about skipping it.
        rule value()
            = braced()
            / quiet! { ("\"" (!"\"" [_])* "\"" / "'" (!"'" [_])* "'" ['A'..='Z']?) _ }
            / quiet! { "-"? ['a'..='z' | 'A'..='Z' | '0'..='9' | '.']+ _ }
            / expected!("value")

        /// A braced block, such as an object identifier. We only care about
        /// skipping it.
        rule braced()
            = t("{") (braced() / (!['{' | '}'] [_]))* t("}")

        /// A type reference, which starts with an uppercase letter.
        rule type_reference() -> Name
            = n:name() {?
                if n.text.starts_with(|c: char| c.is_ascii_uppercase()) {
                    Ok(n)
                } else {
                    Err("type reference")
                }
            }

        /// A component or value name, which starts with a lowercase letter.
        rule value_identifier() -> Name
            = n:name() {?
                if n.text.starts_with(|c: char| c.is_ascii_lowercase()) {
                    Ok(n)
                } else {
                    Err("identifier")
                }
            }

        rule name() -> Name
            = s:position!() text:$(ident_text()) e:position!() _ {?
                if KEYWORDS.contains(text) {
                    // Wanted an identifier, but got a bare keyword.
                    Err("identifier")
                } else {
                    Ok(Name { text: text.to_owned(), span: s..e })
                }
            }

        /// Letters, digits and single hyphens. A double hyphen starts a
        /// comment.
        rule ident_text()
            = ['a'..='z' | 'A'..='Z'] ("-"? ['a'..='z' | 'A'..='Z' | '0'..='9'])*

        /// Keywords. These are case sensitive, and may not be followed by
        /// another identifier character.
        rule k(kw: &'static str)
            = want(kw, &str::eq) [_]*<{kw.len()}> !("-"? ['a'..='z' | 'A'..='Z' | '0'..='9']) _
            {
                if !KEYWORDS.contains(kw) {
                    panic!("BUG: {:?} is not in KEYWORDS", kw);
                }
            }

        /// Punctuation.
        rule t(token: &'static str)
            = want(token, &str::eq) [_]*<{token.len()}> _

        /// Tricky zero-length rule for asserting the next token without
        /// advancing the parse location.
        rule want(s: &'static str, cmp: &StrCmp)
            = &(found:$([_]*<{s.len()}>) {?
                if cmp(found, s) {
                    Ok(())
                } else {
                    Err(s)
                }
            })
            / {? Err(s) }

        /// Optional whitespace and comments.
        rule _ = (whitespace_char() / line_comment() / block_comment())*

        rule whitespace_char() = quiet! { [' ' | '\t' | '\r' | '\n'] }

        /// `--` comments end at the end of the line, or at the next `--`.
        rule line_comment()
            = quiet! { "--" (!("--" / "\n") [_])* ("--" / "\n" / ![_]) }

        rule block_comment() = quiet! { "/*" (!"*/" [_])* } "*/"

        /// Tracing rule for `pegviz`. See
        /// https://github.com/fasterthanlime/pegviz.
        rule traced<T>(e: rule<T>) -> T =
            &(input:$([_]*) {
                #[cfg(feature = "trace")]
                println!("[PEG_INPUT_START]\n{}\n[PEG_TRACE_START]", input);
            })
            e:e()? {?
                #[cfg(feature = "trace")]
                println!("[PEG_TRACE_STOP]");
                e.ok_or("")
            }
    }
}
