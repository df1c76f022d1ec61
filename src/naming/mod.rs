//! Deriving C names for schema definitions.
//!
//! For each definition, the code generator needs a family of related names:
//! the declaration name, the `struct` tag, the name used when the type is
//! embedded in a container, and the names of the presence (`_PR`) and member
//! (`e_`) enumerations. [`Namer`] computes all of them at once as a
//! [`NameBundle`], and registers the globally visible ones in a
//! [`NameRegistry`] so that clashes between definitions can be reported at
//! the end of the run.
//!
//! Every name in a bundle is a fixed template over three base names:
//!
//! - `base`: the declaration name, hierarchical if compound names are on
//!   and the kind supports it, with reserved words escaped.
//! - `part`: the same, without escaping. Only used inside enumeration names,
//!   which can never be a bare reserved word.
//! - `member`: always flat, always escaped. Used when the definition is
//!   spliced into its container.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    sanitize::Sanitizer,
    schema::{DefId, DefinitionTree},
};

use self::base_name::build_base_name;
pub use self::registry::{NameRegistry, DEFAULT_MAX_CLASHES};

mod base_name;
mod registry;

/// Appended to a standalone type's short name.
const TYPE_SUFFIX: &str = "_t";
/// Prefix of a record type's full name.
const STRUCT_KEYWORD: &str = "struct ";
/// Prefix of an enumeration type name.
const ENUM_KEYWORD: &str = "enum ";
/// Suffix of presence enumeration names.
const PRESENCE_SUFFIX: &str = "_PR";
/// Prefix of member enumeration values.
const MEMBERS_PREFIX: &str = "e_";
/// The presence value meaning "nothing is present".
const NOTHING: &str = "NOTHING";

/// Every name the code generator needs for one definition.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct NameBundle {
    /// `Foo`, or `Outer__Foo` with compound names.
    pub base_name: String,
    /// `Foo_t`, or `Foo` when embedded. Empty for anonymous types.
    pub short_name: String,
    /// `struct Foo`.
    pub full_name: String,
    /// The name of this definition inside its container.
    pub as_member_name: String,
    /// `enum Foo_PR`.
    pub presence_enum_type: String,
    /// `Foo_PR`, the prefix of presence values.
    pub presence_enum_prefix: String,
    /// `enum Foo`.
    pub members_enum_type: String,
    /// `e_Foo`, the prefix of member enumeration values.
    pub members_enum_prefix: String,
}

impl NameBundle {
    /// Fill in the templates.
    fn compose(base: &str, part: &str, member: &str, anonymous: bool, embed: bool) -> Self {
        let short_name = match (anonymous, embed) {
            (true, _) => String::new(),
            (false, true) => member.to_owned(),
            (false, false) => format!("{}{}", member, TYPE_SUFFIX),
        };
        Self {
            base_name: base.to_owned(),
            short_name,
            full_name: format!("{}{}", STRUCT_KEYWORD, base),
            as_member_name: member.to_owned(),
            presence_enum_type: format!("{}{}{}", ENUM_KEYWORD, part, PRESENCE_SUFFIX),
            presence_enum_prefix: format!("{}{}", part, PRESENCE_SUFFIX),
            members_enum_type: format!("{}{}", ENUM_KEYWORD, base),
            members_enum_prefix: format!("{}{}", MEMBERS_PREFIX, part),
        }
    }

    /// The names that must be unique across the whole run. `short_name` and
    /// `as_member_name` are scoped by their container, so they may repeat.
    pub fn global_names(&self) -> [&str; 6] {
        [
            &self.base_name,
            &self.full_name,
            &self.presence_enum_type,
            &self.presence_enum_prefix,
            &self.members_enum_type,
            &self.members_enum_prefix,
        ]
    }
}

/// Settings that hold for a whole run.
#[derive(Clone, Copy, Debug, Default)]
pub struct NamingOptions {
    /// Use hierarchical names (`Outer__Inner`) for nested definitions whose
    /// own members need names.
    pub compound_names: bool,
}

/// How a particular bundle is wanted.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NameRequest {
    /// Escape reserved words in the declaration name.
    pub avoid_keywords: bool,
    /// The type is being used inline as a member of its container.
    pub embed: bool,
}

impl NameRequest {
    /// A standalone declaration.
    pub const DECLARATION: Self = Self {
        avoid_keywords: true,
        embed: false,
    };

    /// A type embedded in its container.
    pub const EMBEDDED: Self = Self {
        avoid_keywords: true,
        embed: true,
    };

    /// Names used only to build other names.
    const UNESCAPED: Self = Self {
        avoid_keywords: false,
        embed: false,
    };
}

/// Generates names for the definitions of one compilation run.
///
/// A `Namer` owns the run's [`NameRegistry`]. Bundles are cached per
/// definition and request, so asking again is cheap and never registers
/// anything twice.
pub struct Namer<'a> {
    tree: &'a DefinitionTree,
    sanitizer: &'a dyn Sanitizer,
    options: NamingOptions,
    registry: NameRegistry,
    cache: HashMap<(DefId, NameRequest), NameBundle>,
}

impl<'a> Namer<'a> {
    /// Create a namer with an empty registry.
    pub fn new(
        tree: &'a DefinitionTree,
        sanitizer: &'a dyn Sanitizer,
        options: NamingOptions,
    ) -> Self {
        Self {
            tree,
            sanitizer,
            options,
            registry: NameRegistry::new(),
            cache: HashMap::new(),
        }
    }

    /// Start over with an empty registry and cache.
    #[allow(dead_code)]
    pub fn reset(&mut self) {
        self.registry.reset();
        self.cache.clear();
    }

    /// The registry of every global name generated so far.
    pub fn registry(&self) -> &NameRegistry {
        &self.registry
    }

    /// Has `def` been named at least once?
    #[allow(dead_code)]
    pub fn is_named(&self, def: DefId) -> bool {
        self.registry.is_named(def)
    }

    /// Names for `def` as a standalone declaration.
    pub fn generate_names(&mut self, def: DefId) -> NameBundle {
        self.generate_names_with(def, NameRequest::DECLARATION)
    }

    /// Names for `def` embedded in its container.
    pub fn generate_embedded_names(&mut self, def: DefId) -> NameBundle {
        self.generate_names_with(def, NameRequest::EMBEDDED)
    }

    /// Names for `def`, as specified by `request`.
    pub fn generate_names_with(&mut self, def: DefId, request: NameRequest) -> NameBundle {
        if let Some(bundle) = self.cache.get(&(def, request)) {
            trace!(%def, ?request, "name cache hit");
            return bundle.clone();
        }

        let definition = self.tree.get(def);
        let hierarchical = self.options.compound_names && definition.kind.uses_compound_names();
        let base = self.base_name(def, hierarchical, request.avoid_keywords);
        let part = self.base_name(def, hierarchical, false);
        let member = self.base_name(def, false, true);
        let bundle =
            NameBundle::compose(&base, &part, &member, definition.anonymous, request.embed);

        for name in bundle.global_names() {
            self.registry.register(name, def);
        }
        self.registry.mark_named(def);
        debug!(%def, identifier = %definition.identifier, base_name = %bundle.base_name, "named definition");

        self.cache.insert((def, request), bundle.clone());
        bundle
    }

    /// The name of the field holding member `child_identifier` of `def`:
    /// `Foo_member`.
    pub fn member_field_name(&mut self, def: DefId, child_identifier: &str) -> String {
        let base = self.generate_names_with(def, NameRequest::UNESCAPED).base_name;
        format!("{}_{}", base, self.sanitizer.sanitize(child_identifier, false))
    }

    /// The presence value for alternative `child` of `def` (`Foo_PR_child`),
    /// or the "nothing present" value `Foo_PR_NOTHING` if `child` is `None`.
    pub fn presence_value_name(&mut self, def: DefId, child: Option<DefId>) -> String {
        let base = self.generate_names_with(def, NameRequest::UNESCAPED).base_name;
        let value = match child {
            Some(child) => self.sanitizer.sanitize(&self.tree.get(child).identifier, false),
            None => NOTHING.to_owned(),
        };
        format!("{}{}_{}", base, PRESENCE_SUFFIX, value)
    }

    fn base_name(&self, def: DefId, hierarchical: bool, avoid_keywords: bool) -> String {
        build_base_name(self.tree, self.sanitizer, def, hierarchical, avoid_keywords)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        sanitize::CSanitizer,
        schema::{DefKind, NewDefinition},
    };

    use super::*;

    const COMPOUND: NamingOptions = NamingOptions {
        compound_names: true,
    };

    #[test]
    fn bundle_templates() {
        let mut tree = DefinitionTree::new();
        let m = tree.add_test_module("M");
        let foo = tree.add_named(m, None, DefKind::Choice, "Foo", 1);

        let mut namer = Namer::new(&tree, &CSanitizer, NamingOptions::default());
        assert_eq!(
            namer.generate_names(foo),
            NameBundle {
                base_name: "Foo".to_owned(),
                short_name: "Foo_t".to_owned(),
                full_name: "struct Foo".to_owned(),
                as_member_name: "Foo".to_owned(),
                presence_enum_type: "enum Foo_PR".to_owned(),
                presence_enum_prefix: "Foo_PR".to_owned(),
                members_enum_type: "enum Foo".to_owned(),
                members_enum_prefix: "e_Foo".to_owned(),
            }
        );
        assert_eq!(namer.generate_embedded_names(foo).short_name, "Foo");
        assert!(namer.is_named(foo));
    }

    #[test]
    fn anonymous_types_have_no_short_name() {
        let mut tree = DefinitionTree::new();
        let m = tree.add_test_module("M");
        let list = tree.add_named(m, None, DefKind::SequenceOf, "List", 1);
        let member = tree.add(NewDefinition {
            kind: DefKind::Sequence,
            identifier: "Member".to_owned(),
            parent: Some(list),
            module: m,
            line: 1,
            span: None,
            anonymous: true,
        });

        let mut namer = Namer::new(&tree, &CSanitizer, COMPOUND);
        let bundle = namer.generate_embedded_names(member);
        assert_eq!(bundle.short_name, "");
        assert_eq!(bundle.base_name, "List__Member");
        assert_eq!(bundle.as_member_name, "Member");
    }

    #[test]
    fn reserved_words_escape_declarations_but_not_enum_prefixes() {
        let mut tree = DefinitionTree::new();
        let m = tree.add_test_module("M");
        let def = tree.add_named(m, None, DefKind::Enumerated, "default", 1);

        let mut namer = Namer::new(&tree, &CSanitizer, NamingOptions::default());
        let bundle = namer.generate_names(def);
        assert_eq!(bundle.base_name, "default_");
        assert_eq!(bundle.short_name, "default__t");
        assert_eq!(bundle.full_name, "struct default_");
        assert_eq!(bundle.members_enum_type, "enum default_");
        assert_eq!(bundle.presence_enum_prefix, "default_PR");
        assert_eq!(bundle.members_enum_prefix, "e_default");
    }

    #[test]
    fn compound_names_only_for_kinds_with_named_members() {
        let mut tree = DefinitionTree::new();
        let m = tree.add_test_module("M");
        let outer = tree.add_named(m, None, DefKind::Sequence, "Outer", 1);
        let inner = tree.add_named(m, Some(outer), DefKind::Sequence, "inner", 2);
        let flag = tree.add_named(m, Some(outer), DefKind::Boolean, "flag", 3);

        let mut namer = Namer::new(&tree, &CSanitizer, COMPOUND);
        let outer_base = namer.generate_names(outer).base_name;
        assert_eq!(
            namer.generate_embedded_names(inner).base_name,
            format!("{}__inner", outer_base)
        );
        assert_eq!(namer.generate_embedded_names(flag).base_name, "flag");

        let mut flat = Namer::new(&tree, &CSanitizer, NamingOptions::default());
        assert_eq!(flat.generate_embedded_names(inner).base_name, "inner");
    }

    #[test]
    fn structurally_identical_trees_get_identical_names() {
        fn build() -> (DefinitionTree, DefId) {
            let mut tree = DefinitionTree::new();
            let m = tree.add_test_module("M");
            let outer = tree.add_named(m, None, DefKind::Set, "Outer", 1);
            let inner = tree.add_named(m, Some(outer), DefKind::BitString, "bits", 2);
            (tree, inner)
        }
        let (tree1, def1) = build();
        let (tree2, def2) = build();
        let bundle1 = Namer::new(&tree1, &CSanitizer, COMPOUND).generate_names(def1);
        let bundle2 = Namer::new(&tree2, &CSanitizer, COMPOUND).generate_names(def2);
        assert_eq!(bundle1, bundle2);
    }

    #[test]
    fn generating_twice_is_idempotent() {
        let mut tree = DefinitionTree::new();
        let m = tree.add_test_module("M");
        let foo = tree.add_named(m, None, DefKind::Sequence, "Foo", 1);

        let mut namer = Namer::new(&tree, &CSanitizer, NamingOptions::default());
        let first = namer.generate_names(foo);
        let len = namer.registry().len();
        assert_eq!(len, 6);
        let second = namer.generate_names(foo);
        assert_eq!(first, second);
        assert_eq!(namer.registry().len(), len);

        // Other requests may add new strings, but never clash with ourselves.
        namer.generate_embedded_names(foo);
        namer.member_field_name(foo, "a");
        assert!(namer.registry().len() <= len + 6);
        assert!(!namer.registry().has_any_clash());
    }

    #[test]
    fn same_name_in_two_modules_clashes() {
        let mut tree = DefinitionTree::new();
        let m1 = tree.add_test_module("M1");
        let m2 = tree.add_test_module("M2");
        let seq = tree.add_named(m1, None, DefKind::Sequence, "Foo", 2);
        tree.add_named(m1, Some(seq), DefKind::Integer, "a", 2);
        let int = tree.add_named(m2, None, DefKind::Integer, "Foo", 5);

        let mut namer = Namer::new(&tree, &CSanitizer, NamingOptions::default());
        assert_eq!(namer.generate_names(seq).base_name, "Foo");
        assert_eq!(namer.generate_names(int).base_name, "Foo");
        assert!(namer.registry().has_any_clash());

        let entry = namer.registry().get("Foo").unwrap();
        assert_eq!(entry.owner, seq);
        assert_eq!(entry.clash_with, Some(int));

        // All six global names clash, but it's one problem.
        assert_eq!(namer.registry().clash_count(), 6);
        let diagnostics = namer.registry().clash_diagnostics(&tree, 5);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "Name \"Foo\" is generated by M1.Foo at line M1.asn1:2 and M2.Foo at line M2.asn1:5"
        );
    }

    #[test]
    fn renaming_after_a_clash_changes_nothing() {
        let mut tree = DefinitionTree::new();
        let m1 = tree.add_test_module("M1");
        let m2 = tree.add_test_module("M2");
        let first = tree.add_named(m1, None, DefKind::Sequence, "Foo", 2);
        let second = tree.add_named(m2, None, DefKind::Sequence, "Foo", 5);

        let mut namer = Namer::new(&tree, &CSanitizer, NamingOptions::default());
        namer.generate_names(first);
        namer.generate_names(second);
        let len = namer.registry().len();
        let clash_count = namer.registry().clash_count();
        assert_eq!((len, clash_count), (6, 6));

        // `second` lost every name to `first`. Asking again, in any form,
        // must not add entries or report anything new.
        namer.generate_names(second);
        namer.generate_embedded_names(second);
        namer.member_field_name(second, "a");
        namer.presence_value_name(second, None);
        assert!(namer.registry().has_any_clash());
        assert_eq!(namer.registry().len(), len);
        assert_eq!(namer.registry().clash_count(), clash_count);
        assert_eq!(namer.registry().clash_groups().len(), 1);
    }

    #[test]
    fn member_and_presence_names() {
        let mut tree = DefinitionTree::new();
        let m = tree.add_test_module("M");
        let event = tree.add_named(m, None, DefKind::Sequence, "Event", 1);
        // An anonymous CHOICE borrowing its container's name.
        let choice = tree.add(NewDefinition {
            kind: DefKind::Choice,
            identifier: "Event".to_owned(),
            parent: Some(event),
            module: m,
            line: 2,
            span: None,
            anonymous: true,
        });
        let start = tree.add_named(m, Some(choice), DefKind::Null, "start", 3);
        let stop = tree.add_named(m, Some(choice), DefKind::Null, "stop", 4);

        let mut namer = Namer::new(&tree, &CSanitizer, NamingOptions::default());
        assert_eq!(namer.presence_value_name(choice, Some(start)), "Event_PR_start");
        assert_eq!(namer.presence_value_name(choice, Some(stop)), "Event_PR_stop");
        assert_eq!(namer.presence_value_name(choice, None), "Event_PR_NOTHING");
        assert_eq!(namer.member_field_name(event, "time-stamp"), "Event_time_stamp");
    }

    #[test]
    fn nothing_sentinel_exists_without_alternatives() {
        let mut tree = DefinitionTree::new();
        let m = tree.add_test_module("M");
        let empty = tree.add_named(m, None, DefKind::Choice, "Empty", 1);

        let mut namer = Namer::new(&tree, &CSanitizer, COMPOUND);
        assert!(namer
            .presence_value_name(empty, None)
            .ends_with("_PR_NOTHING"));
    }

    #[test]
    fn member_names_use_unescaped_base() {
        let mut tree = DefinitionTree::new();
        let m = tree.add_test_module("M");
        let def = tree.add_named(m, None, DefKind::Sequence, "union", 1);

        let mut namer = Namer::new(&tree, &CSanitizer, NamingOptions::default());
        assert_eq!(namer.member_field_name(def, "default"), "union_default");
        assert_eq!(namer.generate_names(def).base_name, "union_");
    }

    #[test]
    fn reset_starts_a_new_run() {
        let mut tree = DefinitionTree::new();
        let m = tree.add_test_module("M");
        let foo = tree.add_named(m, None, DefKind::Sequence, "Foo", 1);

        let mut namer = Namer::new(&tree, &CSanitizer, NamingOptions::default());
        namer.generate_names(foo);
        namer.reset();
        assert!(namer.registry().is_empty());
        assert!(!namer.is_named(foo));
        namer.generate_names(foo);
        assert_eq!(namer.registry().len(), 6);
    }
}
