//! Reference/Cycle Analyzer (spec.md §4.7): finds cyclic dependencies
//! among `components.schemas`, chooses which participants must be boxed
//! (`Boxed<T>`/`indirect enum`) to make the cycle representable, and
//! assigns every schema a topological "layer" (longest path from a leaf)
//! that the Sharding Planner uses to keep generated files acyclic.

use std::collections::{HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::document::{AdditionalProperties, OrderedMap, Schema};
use crate::error::{Error, Result};

/// Direct (non-transitive) `$ref` edges among `components.schemas`, plus
/// the boxing/layering decisions computed from them.
#[derive(Debug, Default)]
pub struct CycleAnalysis {
    /// Schema names that must render their cyclic reference through
    /// `Boxed<T>` (or `indirect case`) rather than an inline value.
    pub boxed: HashSet<String>,
    /// `name -> layer`, where layer 0 has no remaining (post-boxing)
    /// outgoing references and layer N depends on at least one layer
    /// N-1 schema.
    pub layers: HashMap<String, u32>,
}

impl CycleAnalysis {
    pub fn is_boxed(&self, name: &str) -> bool {
        self.boxed.contains(name)
    }

    pub fn layer_of(&self, name: &str) -> u32 {
        self.layers.get(name).copied().unwrap_or(0)
    }

    pub fn max_layer(&self) -> u32 {
        self.layers.values().copied().max().unwrap_or(0)
    }
}

/// A schema becomes a nominal Swift declaration (struct/enum) that can
/// carry an explicit box point. Type aliases, scalars, and bare
/// references have no such point — a cycle made up entirely of these
/// cannot be broken by boxing.
fn is_boxable(schema: &Schema) -> bool {
    matches!(schema, Schema::Object { .. } | Schema::OneOf { .. })
}

fn direct_refs(schema: &Schema, out: &mut Vec<String>) {
    match schema {
        Schema::Reference(reference) => {
            if let Some(name) = reference.strip_prefix("#/components/schemas/") {
                out.push(name.to_string());
            }
        }
        Schema::Array { items: Some(items) } => direct_refs(items, out),
        Schema::Object {
            properties,
            additional_properties,
            ..
        } => {
            for (_, prop) in properties.iter() {
                direct_refs(prop, out);
            }
            if let AdditionalProperties::Schema(inner) = additional_properties {
                direct_refs(inner, out);
            }
        }
        Schema::AllOf(members) | Schema::AnyOf(members) => {
            for member in members {
                direct_refs(member, out);
            }
        }
        Schema::OneOf { variants, .. } => {
            for variant in variants {
                direct_refs(variant, out);
            }
        }
        Schema::Not(inner) => direct_refs(inner, out),
        Schema::Array { items: None }
        | Schema::Fragment
        | Schema::Null
        | Schema::Boolean
        | Schema::Integer { .. }
        | Schema::Number { .. }
        | Schema::String { .. } => {}
    }
}

/// Analyze `schemas`, raising [`Error::UnrecoverableCycle`] if any cycle
/// has no boxable participant.
pub fn analyze(schemas: &OrderedMap<Schema>) -> Result<CycleAnalysis> {
    let names: Vec<&str> = schemas.keys().collect();
    let mut index = HashMap::new();
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    for name in &names {
        let idx = graph.add_node((*name).to_string());
        index.insert((*name).to_string(), idx);
    }
    for name in &names {
        let Some(schema) = schemas.get(name) else { continue };
        let mut refs = Vec::new();
        direct_refs(schema, &mut refs);
        let from = index[*name];
        for target in refs {
            if let Some(&to) = index.get(&target) {
                graph.add_edge(from, to, ());
            }
        }
    }

    let boxed = resolve_cycles(schemas, &graph, &index)?;

    // Recompute the graph with boxed nodes' outgoing edges removed: boxing
    // replaces an inline value with an indirection, so it no longer forces
    // the referenced type to be fully defined first.
    let mut acyclic: DiGraph<String, ()> = DiGraph::new();
    let mut acyclic_index = HashMap::new();
    for name in &names {
        acyclic_index.insert((*name).to_string(), acyclic.add_node((*name).to_string()));
    }
    for name in &names {
        if boxed.contains(*name) {
            continue;
        }
        let Some(schema) = schemas.get(name) else { continue };
        let mut refs = Vec::new();
        direct_refs(schema, &mut refs);
        let from = acyclic_index[*name];
        for target in refs {
            if let Some(&to) = acyclic_index.get(&target) {
                acyclic.add_edge(from, to, ());
            }
        }
    }

    let layers = longest_path_layers(&acyclic, &acyclic_index, &names);

    Ok(CycleAnalysis { boxed, layers })
}

/// Greedily compute a feedback vertex set per nontrivial SCC, preferring
/// boxable nodes and breaking ties alphabetically for determinism.
fn resolve_cycles(
    schemas: &OrderedMap<Schema>,
    graph: &DiGraph<String, ()>,
    index: &HashMap<String, NodeIndex>,
) -> Result<HashSet<String>> {
    let mut boxed = HashSet::new();

    loop {
        let sccs = tarjan_scc(graph);
        let mut progressed = false;

        for scc in &sccs {
            let has_internal_cycle = scc.len() > 1
                || scc
                    .iter()
                    .any(|&n| graph.find_edge(n, n).is_some());
            if !has_internal_cycle {
                continue;
            }

            let mut members: Vec<&str> = scc
                .iter()
                .map(|&n| graph.node_weight(n).unwrap().as_str())
                .filter(|name| !boxed.contains(*name))
                .collect();
            members.sort_unstable();

            let candidate = members
                .iter()
                .find(|name| schemas.get(**name).is_some_and(is_boxable));

            match candidate {
                Some(name) => {
                    boxed.insert((*name).to_string());
                    progressed = true;
                }
                None if members.is_empty() => {
                    // Already fully boxed from a previous pass.
                }
                None => {
                    return Err(Error::UnrecoverableCycle {
                        members: members.into_iter().map(str::to_string).collect(),
                    });
                }
            }
        }

        if !progressed {
            break;
        }

        // Boxing one node can still leave the rest of a large SCC cyclic
        // (e.g. a three-member cycle where only the first boxed member's
        // back-edge was removed); re-check with that node's outgoing
        // edges dropped before deciding the SCC is fully resolved.
        let remaining_cyclic = {
            let mut pruned = graph.clone();
            for name in &boxed {
                if let Some(&idx) = index.get(name) {
                    let outgoing: Vec<_> = pruned
                        .edges(idx)
                        .map(|e| e.id())
                        .collect();
                    for edge in outgoing {
                        pruned.remove_edge(edge);
                    }
                }
            }
            tarjan_scc(&pruned)
                .into_iter()
                .any(|scc| scc.len() > 1 || scc.iter().any(|&n| pruned.find_edge(n, n).is_some()))
        };

        if !remaining_cyclic {
            break;
        }
    }

    Ok(boxed)
}

fn longest_path_layers(
    graph: &DiGraph<String, ()>,
    index: &HashMap<String, NodeIndex>,
    names: &[&str],
) -> HashMap<String, u32> {
    let mut layers = HashMap::new();
    let mut visiting = HashSet::new();

    fn layer_of(
        node: NodeIndex,
        graph: &DiGraph<String, ()>,
        layers: &mut HashMap<String, u32>,
        visiting: &mut HashSet<NodeIndex>,
    ) -> u32 {
        let name = graph.node_weight(node).unwrap().clone();
        if let Some(&l) = layers.get(&name) {
            return l;
        }
        if !visiting.insert(node) {
            // Defensive: the caller only feeds in an already-acyclic
            // graph, but guard against a stray cycle rather than
            // recursing forever.
            return 0;
        }

        let max_dep = graph
            .neighbors(node)
            .map(|dep| layer_of(dep, graph, layers, visiting))
            .max();
        let layer = max_dep.map_or(0, |m| m + 1);

        visiting.remove(&node);
        layers.insert(name, layer);
        layer
    }

    for name in names {
        if let Some(&idx) = index.get(*name) {
            layer_of(idx, graph, &mut layers, &mut visiting);
        }
    }

    layers
}
