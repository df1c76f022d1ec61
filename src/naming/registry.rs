//! The global name registry, and reporting of name clashes.
//!
//! Every globally visible name the [`super::Namer`] generates is registered
//! here along with the definition that produced it. If a second definition
//! produces the same name, we record a clash instead of silently emitting two
//! conflicting declarations. Clashes are never resolved automatically, since
//! users write code against the generated names.

use std::collections::{HashMap, HashSet};

use codespan_reporting::diagnostic::{Diagnostic, Label};
use tracing::{debug, trace};

use crate::{
    errors::{emit_diagnostic, Error, Result},
    known_files::{FileId, KnownFiles},
    schema::{DefId, DefinitionTree},
};

/// How many clashes we print before summarizing the rest.
pub const DEFAULT_MAX_CLASHES: usize = 5;

/// A registered name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NameEntry {
    pub name: String,
    /// The definition that first generated this name.
    pub owner: DefId,
    /// The first other definition that generated the same name. Once set,
    /// this never changes.
    pub clash_with: Option<DefId>,
}

/// What [`NameRegistry::register`] did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Registration {
    /// The name was new.
    Added,
    /// The name belongs to another definition.
    Clash,
    /// Nothing to do: we've seen this name from this definition, or the
    /// definition had already been named before.
    AlreadyKnown,
}

/// Every name generated during one compilation run.
///
/// Create a fresh registry (or [`NameRegistry::reset`] this one) before each
/// independent run, or stale names will clash with the new ones.
#[derive(Debug, Default)]
pub struct NameRegistry {
    /// All entries, in registration order.
    entries: Vec<NameEntry>,
    /// Index into `entries` by name.
    by_name: HashMap<String, usize>,
    /// Definitions that have completed their first naming pass.
    named: HashSet<DefId>,
}

impl NameRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, so we can start a new run.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.by_name.clear();
        self.named.clear();
    }

    /// Register `name` as generated by `owner`.
    ///
    /// A name already registered by another definition is a clash, unless
    /// `owner` has already been named once. Registering never adds a second
    /// entry for the same name.
    pub fn register(&mut self, name: &str, owner: DefId) -> Registration {
        if let Some(&idx) = self.by_name.get(name) {
            let entry = &mut self.entries[idx];
            if entry.owner == owner || self.named.contains(&owner) {
                return Registration::AlreadyKnown;
            }
            match entry.clash_with {
                None => {
                    debug!(name, first = %entry.owner, second = %owner, "name clash");
                    entry.clash_with = Some(owner);
                }
                Some(earlier) => {
                    debug!(name, first = %entry.owner, %earlier, ignored = %owner, "repeated name clash");
                }
            }
            return Registration::Clash;
        }

        trace!(name, %owner, "registering name");
        self.by_name.insert(name.to_owned(), self.entries.len());
        self.entries.push(NameEntry {
            name: name.to_owned(),
            owner,
            clash_with: None,
        });
        Registration::Added
    }

    /// Record that `def` has finished its first naming pass.
    pub fn mark_named(&mut self, def: DefId) {
        self.named.insert(def);
    }

    /// Has `def` finished its first naming pass?
    pub fn is_named(&self, def: DefId) -> bool {
        self.named.contains(&def)
    }

    /// Number of distinct names registered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is the registry empty?
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, in registration order.
    pub fn entries(&self) -> &[NameEntry] {
        &self.entries
    }

    /// Look up an entry by name.
    #[allow(dead_code)]
    pub fn get(&self, name: &str) -> Option<&NameEntry> {
        self.by_name.get(name).map(|&idx| &self.entries[idx])
    }

    /// Entries with a recorded clash, in registration order.
    pub fn clashes(&self) -> impl Iterator<Item = &NameEntry> + '_ {
        self.entries().iter().filter(|e| e.clash_with.is_some())
    }

    /// Number of clashing names.
    pub fn clash_count(&self) -> usize {
        self.clashes().count()
    }

    /// Did any two definitions generate the same name?
    pub fn has_any_clash(&self) -> bool {
        self.clashes().next().is_some()
    }

    /// Group clashing entries by the pair of definitions involved, in the
    /// order the clashes were first registered. Two definitions with the same
    /// identifier usually clash on every name in their bundles, and we only
    /// want to tell the user about that once.
    pub fn clash_groups(&self) -> Vec<ClashGroup<'_>> {
        let mut groups: Vec<ClashGroup<'_>> = vec![];
        let mut by_pair = HashMap::new();
        for entry in self.clashes() {
            let Some(second) = entry.clash_with else {
                continue;
            };
            let idx = *by_pair.entry((entry.owner, second)).or_insert_with(|| {
                groups.push(ClashGroup {
                    first: entry.owner,
                    second,
                    names: vec![],
                });
                groups.len() - 1
            });
            groups[idx].names.push(&entry.name);
        }
        groups
    }

    /// Build one diagnostic per clashing pair of definitions, up to
    /// `max_clashes`, plus a summary diagnostic for any we didn't show.
    pub fn clash_diagnostics(
        &self,
        tree: &DefinitionTree,
        max_clashes: usize,
    ) -> Vec<Diagnostic<FileId>> {
        let groups = self.clash_groups();
        let mut diagnostics = groups
            .iter()
            .take(max_clashes)
            .map(|group| clash_diagnostic(tree, group))
            .collect::<Vec<_>>();

        if groups.len() > max_clashes {
            diagnostics.push(Diagnostic::error().with_message(format!(
                "... {} more name clashes not shown",
                groups.len() - max_clashes
            )));
        }
        diagnostics
    }

    /// Print every clash (up to `max_clashes`) to stderr. Any clash at all is
    /// fatal for the run, so we return an error if we printed anything.
    pub fn report_clashes(
        &self,
        tree: &DefinitionTree,
        files: &KnownFiles,
        max_clashes: usize,
    ) -> Result<()> {
        if !self.has_any_clash() {
            return Ok(());
        }
        let count = self.clash_groups().len();
        for diagnostic in self.clash_diagnostics(tree, max_clashes) {
            emit_diagnostic(files, &diagnostic);
        }
        Err(Error::name_clashes(count))
    }
}

/// All the names two definitions both generated.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClashGroup<'a> {
    /// The definition that registered the names first.
    pub first: DefId,
    pub second: DefId,
    /// The clashing names, in registration order. Never empty.
    pub names: Vec<&'a str>,
}

/// Describe a clash between two definitions.
fn clash_diagnostic(tree: &DefinitionTree, group: &ClashGroup<'_>) -> Diagnostic<FileId> {
    let describe = |def: DefId| {
        let definition = tree.get(def);
        let module = tree.module_of(def);
        format!(
            "{}.{} at line {}:{}",
            module.name,
            definition.identifier,
            module.source_file.display(),
            definition.line
        )
    };

    let label = |def: DefId, primary: bool| {
        let definition = tree.get(def);
        let file_id = tree.module_of(def).file_id?;
        let span = definition.span.clone()?;
        Some(if primary {
            Label::primary(file_id, span).with_message("first generated here")
        } else {
            Label::secondary(file_id, span).with_message("also generated here")
        })
    };

    let mut diagnostic = Diagnostic::error()
        .with_message(format!(
            "Name \"{}\" is generated by {} and {}",
            group.names[0],
            describe(group.first),
            describe(group.second)
        ))
        .with_labels(
            [label(group.first, true), label(group.second, false)]
                .into_iter()
                .flatten()
                .collect(),
        );
    if group.names.len() > 1 {
        diagnostic = diagnostic.with_notes(vec![format!(
            "these names clash as well: {}",
            group.names[1..].join(", ")
        )]);
    }
    diagnostic
}
