//! Lowering parsed modules into a [`DefinitionTree`]. We rely on
//! [`derive_visitor`] to traverse the AST.

use std::mem;

use codespan_reporting::files::line_starts;
use derive_visitor::{Drive, Visitor};
use tracing::trace;

use crate::{
    ast::{Component, Element, ModuleDefinition, Name, NamedNumber, Type, TypeAssignment, TypeBody},
    errors::Result,
    known_files::{FileId, KnownFiles},
    schema::{DefId, DefKind, DefinitionTree, ModuleId, ModuleInfo, NewDefinition, Span},
};

/// The name borrowed by an unnamed `SEQUENCE OF` or `SET OF` element.
pub const ANONYMOUS_ELEMENT_NAME: &str = "Member";

/// Add every module in `modules`, parsed from `file_id`, to `tree`.
pub fn collect_definitions(
    tree: &mut DefinitionTree,
    files: &KnownFiles,
    file_id: FileId,
    modules: &[ModuleDefinition],
) -> Result<Vec<ModuleId>> {
    let source_file = files.path(file_id)?.to_owned();
    let line_starts = line_starts(files.source_code(file_id)?).collect::<Vec<_>>();

    let mut collector = DefinitionCollector {
        tree: mem::take(tree),
        module: None,
        line_starts,
        pending: None,
        stack: vec![],
    };
    let mut module_ids = vec![];
    for module in modules {
        let module_id = collector.tree.add_module(ModuleInfo {
            name: module.name.text.clone(),
            source_file: source_file.clone(),
            file_id: Some(file_id),
        });
        collector.module = Some(module_id);
        module.drive(&mut collector);
        module_ids.push(module_id);
    }
    *tree = collector.tree;
    Ok(module_ids)
}

/// The name a definition will get once we see its type.
struct Pending {
    identifier: String,
    span: Option<Span>,
    anonymous: bool,
}

impl Pending {
    fn named(name: &Name) -> Self {
        Self {
            identifier: name.text.clone(),
            span: Some(name.span.clone()),
            anonymous: false,
        }
    }

    fn anonymous() -> Self {
        Self {
            identifier: ANONYMOUS_ELEMENT_NAME.to_owned(),
            span: None,
            anonymous: true,
        }
    }
}

/// Turns each [`Type`] in a module into a [`crate::schema::Definition`],
/// named by whatever introduced it: an assignment, a component, or a
/// `SEQUENCE OF` element.
#[derive(Visitor)]
#[visitor(TypeAssignment(enter), Component(enter), Element(enter), Type(enter, exit))]
struct DefinitionCollector {
    tree: DefinitionTree,
    module: Option<ModuleId>,
    // Byte offsets of the start of each line.
    line_starts: Vec<usize>,
    pending: Option<Pending>,
    // Definitions we're currently inside, innermost last.
    stack: Vec<DefId>,
}

impl DefinitionCollector {
    fn enter_type_assignment(&mut self, assignment: &TypeAssignment) {
        self.pending = Some(Pending::named(&assignment.name));
    }

    fn enter_component(&mut self, component: &Component) {
        self.pending = Some(Pending::named(&component.name));
    }

    fn enter_element(&mut self, element: &Element) {
        self.pending = Some(match &element.name {
            Some(name) => Pending::named(name),
            None => Pending::anonymous(),
        });
    }

    fn enter_type(&mut self, ty: &Type) {
        let Some(module) = self.module else {
            return;
        };
        let pending = self.pending.take().unwrap_or_else(Pending::anonymous);
        let span = pending.span.unwrap_or_else(|| ty.span.clone());
        let (kind, named_values) = classify(&ty.body);

        let id = self.tree.add(NewDefinition {
            kind,
            identifier: pending.identifier,
            parent: self.stack.last().copied(),
            module,
            line: self.line_number(span.start),
            span: Some(span),
            anonymous: pending.anonymous,
        });
        if !named_values.is_empty() {
            self.tree.set_named_values(id, named_values);
        }
        trace!(%id, identifier = %self.tree.get(id).identifier, %kind, "collected definition");
        self.stack.push(id);
    }

    fn exit_type(&mut self, _ty: &Type) {
        if self.module.is_some() {
            self.stack.pop();
        }
    }

    /// The 1-based line containing `offset`.
    fn line_number(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }
}

/// Work out the kind of a type, and any named values it declares.
fn classify(body: &TypeBody) -> (DefKind, Vec<String>) {
    let names = |values: &[NamedNumber]| values.iter().map(|v| v.name.text.clone()).collect();
    match body {
        TypeBody::Sequence(_) => (DefKind::Sequence, vec![]),
        TypeBody::Set(_) => (DefKind::Set, vec![]),
        TypeBody::Choice(_) => (DefKind::Choice, vec![]),
        TypeBody::SequenceOf(_) => (DefKind::SequenceOf, vec![]),
        TypeBody::SetOf(_) => (DefKind::SetOf, vec![]),
        TypeBody::Enumerated(values) => (DefKind::Enumerated, names(values)),
        TypeBody::Integer(values) => (DefKind::Integer, names(values)),
        TypeBody::BitString(values) => (DefKind::BitString, names(values)),
        TypeBody::Boolean => (DefKind::Boolean, vec![]),
        TypeBody::Null => (DefKind::Null, vec![]),
        TypeBody::OctetString => (DefKind::OctetString, vec![]),
        TypeBody::Real => (DefKind::Real, vec![]),
        TypeBody::ObjectIdentifier => (DefKind::ObjectIdentifier, vec![]),
        TypeBody::CharacterString(_) => (DefKind::CharacterString, vec![]),
        TypeBody::Reference(_) => (DefKind::Reference, vec![]),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::ast::parse_schema;

    use super::*;

    fn collect(source: &str) -> DefinitionTree {
        let mut files = KnownFiles::new();
        let file_id = files.add_string("test.asn1", source);
        let modules = match parse_schema(&files, file_id) {
            Ok(modules) => modules,
            Err(e) => {
                e.emit(&files);
                panic!("parse error");
            }
        };
        let mut tree = DefinitionTree::new();
        collect_definitions(&mut tree, &files, file_id, &modules).expect("collect failed");
        tree
    }

    /// `(depth, identifier, kind, anonymous, line)` for every definition.
    fn summarize(tree: &DefinitionTree) -> Vec<(usize, String, DefKind, bool, usize)> {
        tree.iter()
            .map(|(id, d)| {
                (
                    tree.depth(id),
                    d.identifier.clone(),
                    d.kind,
                    d.anonymous,
                    d.line,
                )
            })
            .collect()
    }

    #[test]
    fn nested_components_get_parents() {
        let tree = collect(
            "M DEFINITIONS ::= BEGIN
Event ::= SEQUENCE {
  action CHOICE {
    start NULL,
    stop NULL
  },
  items SEQUENCE OF SEQUENCE { x INTEGER }
}
END
",
        );
        let s = |x: &str| x.to_owned();
        assert_eq!(
            summarize(&tree),
            vec![
                (0, s("Event"), DefKind::Sequence, false, 2),
                (1, s("action"), DefKind::Choice, false, 3),
                (2, s("start"), DefKind::Null, false, 4),
                (2, s("stop"), DefKind::Null, false, 5),
                (1, s("items"), DefKind::SequenceOf, false, 7),
                (2, s("Member"), DefKind::Sequence, true, 7),
                (3, s("x"), DefKind::Integer, false, 7),
            ]
        );
    }

    #[test]
    fn modules_and_named_values() {
        let tree = collect(
            "A DEFINITIONS ::= BEGIN
               Color ::= ENUMERATED { red, green-ish(5) }
             END
             B DEFINITIONS ::= BEGIN
               Flags ::= BIT STRING { a(0), b(1) }
             END",
        );
        let top = tree.top_level().collect::<Vec<_>>();
        assert_eq!(top.len(), 2);
        assert_eq!(tree.module_of(top[0]).name, "A");
        assert_eq!(tree.module_of(top[1]).name, "B");
        assert_eq!(tree.module_of(top[1]).source_file.to_str(), Some("test.asn1"));
        assert_eq!(tree.get(top[0]).named_values, vec!["red", "green-ish"]);
        assert_eq!(tree.get(top[1]).named_values, vec!["a", "b"]);
    }

    #[test]
    fn named_elements_are_not_anonymous() {
        let tree = collect("M DEFINITIONS ::= BEGIN Tags ::= SET OF tag IA5String END");
        let (_, element) = tree.iter().nth(1).expect("missing element");
        assert_eq!(element.identifier, "tag");
        assert!(!element.anonymous);
        assert_eq!(element.kind, DefKind::CharacterString);
    }
}
