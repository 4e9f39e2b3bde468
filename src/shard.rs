//! Sharding Planner (spec.md §4.8): splits the IR's named declarations
//! across multiple output files along the layered DAG the Reference
//! Analyzer computes (`crate::graph`), so no emitted file ever forward-
//! references a type declared in a file that comes later in the layering.
//!
//! Three steps per layer, straight out of spec.md §4.8:
//! 1. Group same-layer declarations into **islands** — connected
//!    sub-graphs, where two declarations join the same island if one
//!    references the other, or both reference a common third
//!    declaration ("sibling").
//! 2. **LPT bin-packing**: sort islands by decreasing weight, assign
//!    each to the currently least-loaded of `shard_count` bins.
//! 3. Split each bin into files capped at `max_files_per_shard`
//!    declarations per file.

use std::collections::{HashMap, HashSet};

use crate::document::TypeUsage;
use crate::ir::{AssociatedValue, Declaration, DeclarationKind, FunctionDecl, VariableDecl};

/// Sharding knobs (spec.md §4.8 "sharding config").
#[derive(Debug, Clone, Default)]
pub struct ShardingConfig {
    /// Number of bins to LPT-pack schema islands into, per layer.
    /// Layers absent from the map default to 1 bin.
    pub type_shard_counts: HashMap<u32, usize>,
    /// Max declarations per schema output file.
    pub max_files_per_shard: usize,
    /// Number of bins to LPT-pack operation islands into, per layer.
    pub operation_layer_shard_counts: HashMap<u32, usize>,
    /// Max declarations per operation output file.
    pub max_files_per_shard_ops: usize,
    /// Optional leading-segment prefix applied to every emitted file name
    /// (spec.md §6 "with a module prefix P").
    pub module_prefix: Option<String>,
}

impl ShardingConfig {
    fn shard_count(&self, layer: u32) -> usize {
        self.type_shard_counts.get(&layer).copied().unwrap_or(1).max(1)
    }

    fn op_shard_count(&self, layer: u32) -> usize {
        self.operation_layer_shard_counts.get(&layer).copied().unwrap_or(1).max(1)
    }

    fn max_per_file(&self) -> usize {
        if self.max_files_per_shard == 0 {
            usize::MAX
        } else {
            self.max_files_per_shard
        }
    }

    fn max_per_ops_file(&self) -> usize {
        if self.max_files_per_shard_ops == 0 {
            usize::MAX
        } else {
            self.max_files_per_shard_ops
        }
    }
}

/// One emitted file: its deterministic name plus the declarations it holds.
#[derive(Debug, Clone)]
pub struct PlannedFile {
    pub name: String,
    pub declarations: Vec<Declaration>,
}

/// The full sharded output for `mode = types` (spec.md §6).
#[derive(Debug, Clone)]
pub struct ShardPlan {
    /// `Types_root.swift` — the API protocol declaration alone, so every
    /// other file can import it without depending on a specific layer.
    pub root: PlannedFile,
    /// `Components_base.swift` — re-export glue for the schema layer files.
    pub components_base: PlannedFile,
    pub component_files: Vec<PlannedFile>,
    /// `Operations_base.swift` — re-export glue for the operation layer files.
    pub operations_base: PlannedFile,
    pub operation_files: Vec<PlannedFile>,
}

/// Plan `Components_*`/`Types_L*` files for the named schema declarations.
///
/// `named` is `(schema name, declaration)` in document order; `layer_of`
/// gives each schema's layer (from [`crate::graph::CycleAnalysis`]).
pub fn plan_schemas(
    named: Vec<(String, Declaration)>,
    layer_of: impl Fn(&str) -> u32,
    config: &ShardingConfig,
) -> Vec<PlannedFile> {
    let known: HashSet<String> = named.iter().map(|(name, _)| name.clone()).collect();

    let mut by_layer: HashMap<u32, Vec<(String, Declaration)>> = HashMap::new();
    for (name, decl) in named {
        let layer = layer_of(&name);
        by_layer.entry(layer).or_default().push((name, decl));
    }

    let mut layers: Vec<u32> = by_layer.keys().copied().collect();
    layers.sort_unstable();

    let mut files = Vec::new();
    for layer in layers {
        let items = by_layer.remove(&layer).unwrap_or_default();
        let islands = build_islands(&items, &known);
        let bins = pack_lpt(islands, config.shard_count(layer));
        for (shard_index, bin) in bins.into_iter().enumerate() {
            let shard = shard_index + 1;
            for (file_index, chunk) in bin.chunks(config.max_per_file()).enumerate() {
                let file = file_index + 1;
                files.push(PlannedFile {
                    name: schema_file_name(layer, shard, file, config.module_prefix.as_deref()),
                    declarations: chunk.iter().map(|(_, decl)| decl.clone()).collect(),
                });
            }
        }
    }
    files
}

/// Plan `Operations_L*` files. `named` is `(operation id, declaration,
/// layer)`, where an operation's layer is the highest layer among the
/// component schemas its Input/Output reference (so an operation file
/// never precedes a schema file it depends on).
pub fn plan_operations(named: Vec<(String, Declaration, u32)>, config: &ShardingConfig) -> Vec<PlannedFile> {
    let known: HashSet<String> = named.iter().map(|(name, _, _)| name.clone()).collect();

    let mut by_layer: HashMap<u32, Vec<(String, Declaration)>> = HashMap::new();
    for (name, decl, layer) in named {
        by_layer.entry(layer).or_default().push((name, decl));
    }

    let mut layers: Vec<u32> = by_layer.keys().copied().collect();
    layers.sort_unstable();

    let mut files = Vec::new();
    for layer in layers {
        let items = by_layer.remove(&layer).unwrap_or_default();
        let islands = build_islands(&items, &known);
        let bins = pack_lpt(islands, config.op_shard_count(layer));
        for (shard_index, bin) in bins.into_iter().enumerate() {
            let shard = shard_index + 1;
            for (file_index, chunk) in bin.chunks(config.max_per_ops_file()).enumerate() {
                let file = file_index + 1;
                files.push(PlannedFile {
                    name: operation_file_name(layer, shard, file, config.module_prefix.as_deref()),
                    declarations: chunk.iter().map(|(_, decl)| decl.clone()).collect(),
                });
            }
        }
    }
    files
}

fn schema_file_name(layer: u32, shard: usize, file: usize, prefix: Option<&str>) -> String {
    let label = layer + 1;
    let base = if label == 1 {
        format!("Components_{shard}_{file}.swift")
    } else {
        format!("Types_L{label}_{shard}_{file}.swift")
    };
    match prefix {
        Some(p) => format!("{p}{base}"),
        None => base,
    }
}

fn operation_file_name(layer: u32, shard: usize, file: usize, prefix: Option<&str>) -> String {
    match prefix {
        Some(p) => format!("{p}operations_L{}_{shard}_{file}.swift", layer + 1),
        None => format!("Operations_L{}_{shard}_{file}.swift", layer + 1),
    }
}

/// `Components_base.swift` / `Operations_base.swift` names (spec.md §6),
/// with the module-prefix and operation-lowercasing rules applied.
pub fn base_file_name(kind: BaseFileKind, prefix: Option<&str>) -> String {
    match (kind, prefix) {
        (BaseFileKind::Components, None) => "Components_base.swift".to_string(),
        (BaseFileKind::Components, Some(p)) => format!("{p}Components_base.swift"),
        (BaseFileKind::Operations, None) => "Operations_base.swift".to_string(),
        (BaseFileKind::Operations, Some(p)) => format!("{p}operations_base.swift"),
        (BaseFileKind::Root, None) => "Types_root.swift".to_string(),
        (BaseFileKind::Root, Some(p)) => format!("{p}Types_root.swift"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseFileKind {
    Components,
    Operations,
    Root,
}

/// Union-find over one layer's declarations: two declarations join the
/// same island if one references the other (both present in `known`), or
/// their reference sets intersect on some third, already-known name.
fn build_islands(items: &[(String, Declaration)], known: &HashSet<String>) -> Vec<Vec<(String, Declaration)>> {
    let refs: Vec<HashSet<String>> = items
        .iter()
        .map(|(_, decl)| {
            let mut out = HashSet::new();
            collect_known_references(decl, known, &mut out);
            out
        })
        .collect();

    let mut parent: Vec<usize> = (0..items.len()).collect();
    fn find(parent: &mut [usize], x: usize) -> usize {
        if parent[x] != x {
            parent[x] = find(parent, parent[x]);
        }
        parent[x]
    }
    fn union(parent: &mut [usize], a: usize, b: usize) {
        let ra = find(parent, a);
        let rb = find(parent, b);
        if ra != rb {
            parent[ra.max(rb)] = ra.min(rb);
        }
    }

    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            let (name_i, _) = &items[i];
            let (name_j, _) = &items[j];
            let direct = refs[i].contains(name_j.as_str()) || refs[j].contains(name_i.as_str());
            let shared_sibling = refs[i].intersection(&refs[j]).next().is_some();
            if direct || shared_sibling {
                union(&mut parent, i, j);
            }
        }
    }

    let mut groups: HashMap<usize, Vec<(String, Declaration)>> = HashMap::new();
    for (i, (name, decl)) in items.iter().enumerate() {
        let root = find(&mut parent, i);
        groups.entry(root).or_default().push((name.clone(), decl.clone()));
    }

    let mut islands: Vec<Vec<(String, Declaration)>> = groups.into_values().collect();
    // Deterministic order: by each island's first (document-order) member.
    islands.sort_by(|a, b| a[0].0.cmp(&b[0].0));
    islands
}

/// LPT bin-packing: islands sorted by decreasing weight (declaration
/// count), each assigned to the currently least-loaded bin.
fn pack_lpt(mut islands: Vec<Vec<(String, Declaration)>>, bin_count: usize) -> Vec<Vec<(String, Declaration)>> {
    islands.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].0.cmp(&b[0].0)));

    let mut bins: Vec<Vec<(String, Declaration)>> = vec![Vec::new(); bin_count.max(1)];
    let mut loads = vec![0usize; bin_count.max(1)];
    for island in islands {
        let (lightest, _) = loads
            .iter()
            .enumerate()
            .min_by_key(|(_, load)| **load)
            .expect("at least one bin");
        loads[lightest] += island.len();
        bins[lightest].extend(island);
    }
    bins
}

/// Walk `decl`'s type usages and record every reference whose short name
/// is in `known` — i.e. every reference to another named top-level
/// declaration in this sharding pass, ignoring builtins/imports.
pub(crate) fn collect_known_references(decl: &Declaration, known: &HashSet<String>, out: &mut HashSet<String>) {
    match &decl.kind {
        DeclarationKind::Struct(s) => {
            for member in &s.members {
                collect_known_references(member, known, out);
            }
        }
        DeclarationKind::Enum(e) => {
            for case in &e.cases {
                if let crate::ir::EnumCaseKind::AssociatedValue(values) = &case.kind {
                    for AssociatedValue { usage, .. } in values {
                        note_usage(usage, known, out);
                    }
                }
            }
            for member in &e.members {
                collect_known_references(member, known, out);
            }
        }
        DeclarationKind::TypeAlias(t) => note_usage(&t.target, known, out),
        DeclarationKind::Protocol(p) => {
            for req in &p.requirements {
                collect_known_references(req, known, out);
            }
        }
        DeclarationKind::Extension(ext) => {
            for member in &ext.members {
                collect_known_references(member, known, out);
            }
        }
        DeclarationKind::Function(FunctionDecl {
            parameters, return_type, ..
        }) => {
            for param in parameters {
                note_usage(&param.usage, known, out);
            }
            if let Some(usage) = return_type {
                note_usage(usage, known, out);
            }
        }
        DeclarationKind::Variable(VariableDecl { usage, .. }) => {
            if let Some(usage) = usage {
                note_usage(usage, known, out);
            }
        }
    }
}

fn note_usage(usage: &TypeUsage, known: &HashSet<String>, out: &mut HashSet<String>) {
    let short = usage.name.short_name();
    if known.contains(short) {
        out.insert(short.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TypeName;
    use crate::ir::{Access, DeclarationKind, StructDecl, VariableDecl, VariableKind};

    fn struct_decl(name: &str, field_refs: &[&str]) -> Declaration {
        let members = field_refs
            .iter()
            .enumerate()
            .map(|(i, target)| {
                let usage = TypeUsage::required(TypeName::new(format!("#/{target}"), vec![(*target).to_string()]));
                Declaration::new(DeclarationKind::Variable(VariableDecl {
                    access: Access::Public,
                    kind: VariableKind::Var,
                    is_static: false,
                    name: format!("field{i}"),
                    usage: Some(usage),
                    initializer: None,
                }))
            })
            .collect();
        Declaration::new(DeclarationKind::Struct(StructDecl {
            access: Access::Public,
            name: name.to_string(),
            conformances: Vec::new(),
            members,
        }))
    }

    #[test]
    fn schema_file_name_layer_zero_uses_components_prefix() {
        assert_eq!(schema_file_name(0, 1, 1, None), "Components_1_1.swift");
        assert_eq!(schema_file_name(1, 1, 1, None), "Types_L2_1_1.swift");
        assert_eq!(schema_file_name(2, 1, 1, None), "Types_L3_1_1.swift");
    }

    #[test]
    fn schema_file_name_applies_module_prefix() {
        assert_eq!(schema_file_name(0, 1, 1, Some("P")), "PComponents_1_1.swift");
        assert_eq!(schema_file_name(1, 1, 1, Some("P")), "PTypes_L2_1_1.swift");
    }

    #[test]
    fn operation_file_name_lowercases_under_prefix() {
        assert_eq!(operation_file_name(0, 1, 1, None), "Operations_L1_1_1.swift");
        assert_eq!(operation_file_name(0, 1, 1, Some("P")), "Poperations_L1_1_1.swift");
    }

    #[test]
    fn direct_reference_places_two_schemas_in_one_island() {
        let items = vec![
            ("A".to_string(), struct_decl("A", &["B"])),
            ("B".to_string(), struct_decl("B", &[])),
        ];
        let known: HashSet<String> = items.iter().map(|(n, _)| n.clone()).collect();
        let islands = build_islands(&items, &known);
        assert_eq!(islands.len(), 1);
        assert_eq!(islands[0].len(), 2);
    }

    #[test]
    fn unrelated_schemas_stay_in_separate_islands() {
        let items = vec![
            ("A".to_string(), struct_decl("A", &[])),
            ("B".to_string(), struct_decl("B", &[])),
        ];
        let known: HashSet<String> = items.iter().map(|(n, _)| n.clone()).collect();
        let islands = build_islands(&items, &known);
        assert_eq!(islands.len(), 2);
    }

    #[test]
    fn shared_sibling_reference_joins_an_island() {
        let items = vec![
            ("A".to_string(), struct_decl("A", &["Shared"])),
            ("B".to_string(), struct_decl("B", &["Shared"])),
            ("Shared".to_string(), struct_decl("Shared", &[])),
        ];
        let known: HashSet<String> = items.iter().map(|(n, _)| n.clone()).collect();
        let islands = build_islands(&items, &known);
        assert_eq!(islands.len(), 1, "A and B share a reference to Shared");
    }

    #[test]
    fn lpt_packs_into_requested_bin_count_and_balances_load() {
        let islands = vec![
            vec![("Big".to_string(), struct_decl("Big", &[]))],
            vec![
                ("Small1".to_string(), struct_decl("Small1", &[])),
                ("Small2".to_string(), struct_decl("Small2", &[])),
            ],
        ];
        let bins = pack_lpt(islands, 2);
        assert_eq!(bins.len(), 2);
        let total: usize = bins.iter().map(Vec::len).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn plan_schemas_splits_layers_into_separate_files_in_layer_order() {
        let named = vec![
            ("A".to_string(), struct_decl("A", &[])),
            ("B".to_string(), struct_decl("B", &[])),
            ("C".to_string(), struct_decl("C", &["A"])),
            ("D".to_string(), struct_decl("D", &["B"])),
            ("E".to_string(), struct_decl("E", &["C", "D"])),
        ];
        let layer_of = |name: &str| match name {
            "A" | "B" => 0,
            "C" | "D" => 1,
            "E" => 2,
            _ => unreachable!(),
        };
        let config = ShardingConfig {
            max_files_per_shard: 10,
            max_files_per_shard_ops: 10,
            ..ShardingConfig::default()
        };
        let files = plan_schemas(named, layer_of, &config);
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"Components_1_1.swift"));
        assert!(names.contains(&"Types_L2_1_1.swift"));
        assert!(names.contains(&"Types_L3_1_1.swift"));
    }
}
