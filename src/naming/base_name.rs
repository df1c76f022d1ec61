//! Building base names by walking up the definition tree.

use crate::{
    sanitize::Sanitizer,
    schema::{DefId, DefinitionTree},
};

/// Separates the components of a hierarchical name.
pub const COMPONENT_SEPARATOR: &str = "__";

/// Build the base name of `def`.
///
/// With `hierarchical` set, the names of all enclosing definitions are
/// prepended, outermost first, joined by [`COMPONENT_SEPARATOR`]. Reserved
/// word escaping (`avoid_keywords`) only ever applies to the first component
/// of the result: inner components are already qualified by their prefix.
///
/// Returns an empty string only for an anonymous definition with no named
/// ancestors. Callers treat that as "no standalone name".
pub fn build_base_name(
    tree: &DefinitionTree,
    sanitizer: &dyn Sanitizer,
    def: DefId,
    hierarchical: bool,
    avoid_keywords: bool,
) -> String {
    let definition = tree.get(def);

    let mut name = match definition.parent {
        Some(parent) if hierarchical => {
            let mut prefix = build_base_name(tree, sanitizer, parent, hierarchical, false);
            if !prefix.is_empty() {
                prefix.push_str(COMPONENT_SEPARATOR);
            }
            prefix
        }
        _ => String::new(),
    };

    let first_component = name.is_empty();
    name.push_str(&sanitizer.sanitize(&definition.identifier, avoid_keywords && first_component));
    name
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        sanitize::CSanitizer,
        schema::{DefKind, NewDefinition},
    };

    use super::*;

    #[test]
    fn flat_names_ignore_parents() {
        let mut tree = DefinitionTree::new();
        let m = tree.add_test_module("M");
        let outer = tree.add_named(m, None, DefKind::Sequence, "Outer", 1);
        let inner = tree.add_named(m, Some(outer), DefKind::Sequence, "inner-part", 2);

        assert_eq!(
            build_base_name(&tree, &CSanitizer, inner, false, true),
            "inner_part"
        );
    }

    #[test]
    fn hierarchical_names_join_ancestors() {
        let mut tree = DefinitionTree::new();
        let m = tree.add_test_module("M");
        let outer = tree.add_named(m, None, DefKind::Sequence, "Outer", 1);
        let inner = tree.add_named(m, Some(outer), DefKind::Sequence, "Inner", 2);
        let leaf = tree.add_named(m, Some(inner), DefKind::Enumerated, "kind", 3);

        let outer_name = build_base_name(&tree, &CSanitizer, outer, true, true);
        let inner_name = build_base_name(&tree, &CSanitizer, inner, true, true);
        assert_eq!(inner_name, format!("{}__{}", outer_name, "Inner"));
        assert_eq!(
            build_base_name(&tree, &CSanitizer, leaf, true, true),
            "Outer__Inner__kind"
        );
    }

    #[test]
    fn keywords_are_only_escaped_in_the_first_component() {
        let mut tree = DefinitionTree::new();
        let m = tree.add_test_module("M");
        let top = tree.add_named(m, None, DefKind::Sequence, "default", 1);
        let child = tree.add_named(m, Some(top), DefKind::Choice, "switch", 2);

        assert_eq!(build_base_name(&tree, &CSanitizer, top, true, true), "default_");
        assert_eq!(build_base_name(&tree, &CSanitizer, top, true, false), "default");
        // The prefix is built without escaping, and `switch` is not first.
        assert_eq!(
            build_base_name(&tree, &CSanitizer, child, true, true),
            "default__switch"
        );
        // Flat, `switch` is first again.
        assert_eq!(build_base_name(&tree, &CSanitizer, child, false, true), "switch_");
    }

    #[test]
    fn anonymous_without_named_ancestors_is_empty() {
        let mut tree = DefinitionTree::new();
        let m = tree.add_test_module("M");
        let anon = tree.add(NewDefinition {
            kind: DefKind::Sequence,
            identifier: String::new(),
            parent: None,
            module: m,
            line: 1,
            span: None,
            anonymous: true,
        });

        assert_eq!(build_base_name(&tree, &CSanitizer, anon, true, true), "");
    }
}
