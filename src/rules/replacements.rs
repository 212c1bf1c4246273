//! Module replacement declarations.
//!
//! `module("org.old:lib").replaced_by("org.new:lib")` tells conflict resolution that the
//! two modules provide the same thing. Declarations are keyed by module; a later
//! declaration for the same module overwrites the earlier one. A declaration that would
//! make a module (transitively) replace itself is rejected.

use anyhow::Result;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use tracing::debug;

use crate::core::CmetaError;
use crate::identity::ModuleIdentifier;

/// What a module is replaced by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// The replacing module
    pub target: ModuleIdentifier,
    /// Why the replacement was declared
    pub reason: Option<String>,
}

/// Read-only replacement lookup handed to conflict resolution.
pub trait ModuleReplacementsData {
    /// The replacement declared for `module`.
    fn replacement_for(&self, module: &ModuleIdentifier) -> Option<&Replacement>;

    /// Whether `module` replaces or is replaced by another module.
    fn participates_in_replacements(&self, module: &ModuleIdentifier) -> bool;
}

/// All replacement declarations of a build.
#[derive(Debug, Default)]
pub struct ComponentModuleMetadataContainer {
    replacements: HashMap<ModuleIdentifier, Replacement>,
}

impl ComponentModuleMetadataContainer {
    /// An empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Details for the module written as `group:name`.
    pub fn module(&mut self, notation: &str) -> Result<ComponentModuleMetadataDetails<'_>> {
        let id: ModuleIdentifier = notation.parse()?;
        Ok(ComponentModuleMetadataDetails {
            container: self,
            id,
        })
    }

    /// Number of declared replacements.
    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    /// Whether nothing is replaced.
    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    /// Declared replacements, sorted by replaced module.
    pub fn iter(&self) -> impl Iterator<Item = (&ModuleIdentifier, &Replacement)> {
        let mut entries: Vec<_> = self.replacements.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter()
    }

    fn declare(&mut self, module: ModuleIdentifier, replacement: Replacement) -> Result<()> {
        if let Some(cycle) = self.cycle_with(&module, &replacement.target) {
            return Err(CmetaError::ReplacementCycle {
                module: module.to_string(),
                target: replacement.target.to_string(),
                cycle,
            }
            .into());
        }
        debug!("Module {} is replaced by {}", module, replacement.target);
        self.replacements.insert(module, replacement);
        Ok(())
    }

    /// The cycle `module -> target` would introduce, formatted as `a -> b -> a`.
    fn cycle_with(&self, module: &ModuleIdentifier, target: &ModuleIdentifier) -> Option<String> {
        let mut graph: DiGraph<&ModuleIdentifier, ()> = DiGraph::new();
        let mut nodes: HashMap<&ModuleIdentifier, NodeIndex> = HashMap::new();

        for (from, replacement) in &self.replacements {
            // The new declaration overwrites this module's previous one.
            if from == module {
                continue;
            }
            let a = node_index(&mut graph, &mut nodes, from);
            let b = node_index(&mut graph, &mut nodes, &replacement.target);
            graph.add_edge(a, b, ());
        }
        let a = node_index(&mut graph, &mut nodes, module);
        let b = node_index(&mut graph, &mut nodes, target);
        graph.add_edge(a, b, ());

        if toposort(&graph, None).is_ok() {
            return None;
        }

        // Each module has at most one replacement, so the cycle is the chain from `target`.
        let mut path = vec![module.to_string()];
        let mut current = target;
        while current != module {
            path.push(current.to_string());
            current = &self.replacements.get(current)?.target;
        }
        path.push(module.to_string());
        Some(path.join(" -> "))
    }
}

fn node_index<'a>(
    graph: &mut DiGraph<&'a ModuleIdentifier, ()>,
    nodes: &mut HashMap<&'a ModuleIdentifier, NodeIndex>,
    id: &'a ModuleIdentifier,
) -> NodeIndex {
    *nodes.entry(id).or_insert_with(|| graph.add_node(id))
}

impl ModuleReplacementsData for ComponentModuleMetadataContainer {
    fn replacement_for(&self, module: &ModuleIdentifier) -> Option<&Replacement> {
        self.replacements.get(module)
    }

    fn participates_in_replacements(&self, module: &ModuleIdentifier) -> bool {
        self.replacements.contains_key(module) || self.replacements.values().any(|r| &r.target == module)
    }
}

/// Replacement details of one module.
pub struct ComponentModuleMetadataDetails<'a> {
    container: &'a mut ComponentModuleMetadataContainer,
    id: ModuleIdentifier,
}

impl ComponentModuleMetadataDetails<'_> {
    /// The module these details describe.
    pub fn id(&self) -> &ModuleIdentifier {
        &self.id
    }

    /// Declare that this module is replaced by `target` (`group:name`).
    pub fn replaced_by(&mut self, target: &str) -> Result<()> {
        self.declare(target, None)
    }

    /// Declare a replacement with a reason.
    pub fn replaced_by_because(&mut self, target: &str, reason: &str) -> Result<()> {
        self.declare(target, Some(reason.to_string()))
    }

    /// The replacement currently declared for this module.
    pub fn replacement(&self) -> Option<&Replacement> {
        self.container.replacement_for(&self.id)
    }

    fn declare(&mut self, target: &str, reason: Option<String>) -> Result<()> {
        let target: ModuleIdentifier = target.parse()?;
        self.container.declare(
            self.id.clone(),
            Replacement {
                target,
                reason,
            },
        )
    }
}
