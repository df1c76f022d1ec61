//! The definition tree that naming works on.
//!
//! Parsed modules are lowered into a flat arena of [`Definition`]s (see
//! [`crate::collect`]). Nested components point back at their container
//! through [`Definition::parent`], which is all the naming code needs to
//! build hierarchical names.

use std::{fmt, ops::Range, path::PathBuf};

use serde::Serialize;

use crate::known_files::FileId;

/// A byte range in a schema file.
pub type Span = Range<usize>;

/// Index of a module in a [`DefinitionTree`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct ModuleId(usize);

/// Index of a definition in a [`DefinitionTree`].
///
/// This is the identity of a definition: two structurally identical
/// definitions are still different definitions if their ids differ.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct DefId(usize);

impl fmt::Display for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What sort of type a definition is.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefKind {
    Sequence,
    SequenceOf,
    Set,
    SetOf,
    Choice,
    Enumerated,
    Integer,
    BitString,
    Boolean,
    Null,
    OctetString,
    Real,
    ObjectIdentifier,
    CharacterString,
    /// A reference to another type by name.
    Reference,
}

impl DefKind {
    /// Is this a constructed type?
    pub fn is_constructed(self) -> bool {
        matches!(
            self,
            DefKind::Sequence
                | DefKind::SequenceOf
                | DefKind::Set
                | DefKind::SetOf
                | DefKind::Choice
        )
    }

    /// Should definitions of this kind get hierarchical names when compound
    /// names are turned on? These are the kinds whose members or values may
    /// need names of their own: named components, enumerators and named
    /// bits.
    pub fn uses_compound_names(self) -> bool {
        self.is_constructed()
            || matches!(
                self,
                DefKind::Enumerated | DefKind::Integer | DefKind::BitString
            )
    }

    /// Does this kind need a presence enumeration (a `_PR` discriminant)?
    pub fn has_presence(self) -> bool {
        self == DefKind::Choice
    }
}

impl fmt::Display for DefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DefKind::Sequence => "SEQUENCE",
            DefKind::SequenceOf => "SEQUENCE OF",
            DefKind::Set => "SET",
            DefKind::SetOf => "SET OF",
            DefKind::Choice => "CHOICE",
            DefKind::Enumerated => "ENUMERATED",
            DefKind::Integer => "INTEGER",
            DefKind::BitString => "BIT STRING",
            DefKind::Boolean => "BOOLEAN",
            DefKind::Null => "NULL",
            DefKind::OctetString => "OCTET STRING",
            DefKind::Real => "REAL",
            DefKind::ObjectIdentifier => "OBJECT IDENTIFIER",
            DefKind::CharacterString => "character string",
            DefKind::Reference => "type reference",
        };
        f.write_str(s)
    }
}

/// Information about a schema module.
#[derive(Clone, Debug)]
pub struct ModuleInfo {
    /// The ASN.1 module name.
    pub name: String,
    /// The file the module was read from.
    pub source_file: PathBuf,
    /// Set when the module was parsed from a file in [`crate::known_files`],
    /// so that diagnostics can show source snippets.
    pub file_id: Option<FileId>,
}

/// A single type definition, either a top-level assignment or a nested
/// component.
#[derive(Clone, Debug)]
pub struct Definition {
    pub kind: DefKind,
    /// The schema identifier. Anonymous definitions carry a borrowed name
    /// here.
    pub identifier: String,
    /// The enclosing definition, for nested components.
    pub parent: Option<DefId>,
    pub module: ModuleId,
    /// 1-based line number.
    pub line: usize,
    /// Where the definition starts, if we parsed it from a known file.
    pub span: Option<Span>,
    /// True when the definition has no user-given name.
    pub anonymous: bool,
    /// Nested component definitions, in declaration order.
    pub children: Vec<DefId>,
    /// Named numbers, enumerators or named bits.
    pub named_values: Vec<String>,
}

/// All the modules and definitions of one compilation run.
#[derive(Debug, Default)]
pub struct DefinitionTree {
    modules: Vec<ModuleInfo>,
    defs: Vec<Definition>,
}

/// Arguments for [`DefinitionTree::add`] that don't have obvious defaults.
#[derive(Clone, Debug)]
pub struct NewDefinition {
    pub kind: DefKind,
    pub identifier: String,
    pub parent: Option<DefId>,
    pub module: ModuleId,
    pub line: usize,
    pub span: Option<Span>,
    pub anonymous: bool,
}

impl DefinitionTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module.
    pub fn add_module(&mut self, module: ModuleInfo) -> ModuleId {
        let id = ModuleId(self.modules.len());
        self.modules.push(module);
        id
    }

    /// Add a module that wasn't parsed from a known file, named after
    /// `<name>.asn1`.
    #[cfg(test)]
    pub fn add_test_module(&mut self, name: &str) -> ModuleId {
        self.add_module(ModuleInfo {
            name: name.to_owned(),
            source_file: format!("{}.asn1", name).into(),
            file_id: None,
        })
    }

    /// Add a definition. If it has a parent, it is appended to the parent's
    /// children.
    ///
    /// Panics if `parent` or `module` do not belong to this tree.
    pub fn add(&mut self, new: NewDefinition) -> DefId {
        assert!(new.module.0 < self.modules.len(), "unknown module");
        let id = DefId(self.defs.len());
        if let Some(parent) = new.parent {
            self.defs[parent.0].children.push(id);
        }
        self.defs.push(Definition {
            kind: new.kind,
            identifier: new.identifier,
            parent: new.parent,
            module: new.module,
            line: new.line,
            span: new.span,
            anonymous: new.anonymous,
            children: vec![],
            named_values: vec![],
        });
        id
    }

    /// Convenience wrapper around [`Self::add`] for a named definition
    /// without a span.
    #[cfg(test)]
    pub fn add_named(
        &mut self,
        module: ModuleId,
        parent: Option<DefId>,
        kind: DefKind,
        identifier: &str,
        line: usize,
    ) -> DefId {
        self.add(NewDefinition {
            kind,
            identifier: identifier.to_owned(),
            parent,
            module,
            line,
            span: None,
            anonymous: false,
        })
    }

    /// Record the named values (enumerators, named bits, named numbers) of a
    /// definition.
    pub fn set_named_values(&mut self, id: DefId, values: Vec<String>) {
        self.defs[id.0].named_values = values;
    }

    /// Look up a definition.
    pub fn get(&self, id: DefId) -> &Definition {
        &self.defs[id.0]
    }

    /// Look up a module.
    pub fn module(&self, id: ModuleId) -> &ModuleInfo {
        &self.modules[id.0]
    }

    /// The module a definition belongs to.
    pub fn module_of(&self, id: DefId) -> &ModuleInfo {
        self.module(self.get(id).module)
    }

    /// Iterate over all definitions, in the order they were added. Parents
    /// always come before their children.
    pub fn iter(&self) -> impl Iterator<Item = (DefId, &Definition)> + '_ {
        self.defs.iter().enumerate().map(|(i, d)| (DefId(i), d))
    }

    /// Iterate over top-level definitions.
    #[cfg(test)]
    pub fn top_level(&self) -> impl Iterator<Item = DefId> + '_ {
        self.iter()
            .filter(|(_, d)| d.parent.is_none())
            .map(|(id, _)| id)
    }

    /// How deeply nested is this definition? Top-level definitions are at
    /// depth 0.
    pub fn depth(&self, id: DefId) -> usize {
        let mut depth = 0;
        let mut current = self.get(id).parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.get(parent).parent;
        }
        depth
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Is the tree empty?
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
