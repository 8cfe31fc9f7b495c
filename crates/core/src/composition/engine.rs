//! Override-aware resolution of configuration units.
//!
//! The engine takes the frozen provider list (core provider first, then
//! explicit registrations, then discovered providers), materializes every
//! unit and groups the units into layers:
//!
//! - each unit type has exactly one base producer; two producers of one type
//!   that do not override it are a conflict
//! - a provider that overrides a registered type joins the layer holding that
//!   type's base producer; edges to unregistered types are ignored
//! - layers keep the registration position of their base producer
//!
//! Resolution is all-or-nothing and consumes the engine.

use crate::composition::{
    AppliedOverride, CompositionLayer, LayerEntry, Resolution, ResolvedComposition, SkipReason,
    SkippedOverride,
};
use crate::errors::BootError;
use crate::units::{ConfigUnit, ConfigUnitProvider, UnitTypeId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

struct Node {
    name: String,
    unit_type: UnitTypeId,
    overrides: Vec<UnitTypeId>,
    unit: Arc<dyn ConfigUnit>,
}

/// Single-use resolver over a frozen provider list
pub struct CompositionEngine {
    providers: Vec<ConfigUnitProvider>,
}

impl CompositionEngine {
    pub fn new(providers: Vec<ConfigUnitProvider>) -> Self {
        Self { providers }
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Resolve the providers into ordered, override-aware layers
    pub fn resolve(self) -> Result<Resolution, BootError> {
        let nodes = materialize(&self.providers)?;

        // unit type -> producers, in registration order
        let mut producers: BTreeMap<UnitTypeId, Vec<usize>> = BTreeMap::new();
        for (index, node) in nodes.iter().enumerate() {
            producers.entry(node.unit_type).or_default().push(index);
        }

        let bases = select_bases(&nodes, &producers)?;

        let mut applied_targets: Vec<Vec<UnitTypeId>> = vec![Vec::new(); nodes.len()];
        let mut applied = Vec::new();
        let mut skipped = Vec::new();

        for (index, node) in nodes.iter().enumerate() {
            for &target in &node.overrides {
                match bases.get(&target) {
                    None => skipped.push(SkippedOverride {
                        provider: node.name.clone(),
                        target,
                        reason: SkipReason::NotRegistered,
                    }),
                    Some(&base) if base == index => skipped.push(SkippedOverride {
                        provider: node.name.clone(),
                        target,
                        reason: SkipReason::SelfOverride,
                    }),
                    Some(&base) => {
                        applied_targets[index].push(target);
                        applied.push(AppliedOverride {
                            overriding: node.name.clone(),
                            base: nodes[base].name.clone(),
                            unit_type: target,
                        });
                    }
                }
            }
        }

        detect_cycles(&nodes, &applied_targets)?;

        let placement = Placement::compute(&bases, &applied_targets);
        let layers = build_layers(&nodes, &placement);

        for line in &applied {
            tracing::debug!("{}", line);
        }
        for note in &skipped {
            tracing::debug!("{}", note);
        }
        tracing::info!(
            "Resolved {} providers into {} layers ({} overrides applied, {} ignored)",
            nodes.len(),
            layers.len(),
            applied.len(),
            skipped.len()
        );

        Ok(Resolution::new(
            ResolvedComposition::new(layers),
            applied,
            skipped,
        ))
    }
}

fn materialize(providers: &[ConfigUnitProvider]) -> Result<Vec<Node>, BootError> {
    providers
        .iter()
        .map(|provider| {
            let unit = provider.produce()?;
            Ok(Node {
                name: provider.name().to_string(),
                unit_type: unit.unit_type(),
                overrides: provider.overrides(),
                unit,
            })
        })
        .collect()
}

/// Pick the base producer of every registered type.
///
/// Producers that list their own type as overridden are not base candidates.
/// With no candidate the earliest producer is the base.
fn select_bases(
    nodes: &[Node],
    producers: &BTreeMap<UnitTypeId, Vec<usize>>,
) -> Result<HashMap<UnitTypeId, usize>, BootError> {
    let mut bases = HashMap::new();

    for (&unit_type, indices) in producers {
        let candidates: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| !nodes[i].overrides.contains(&unit_type))
            .collect();

        if candidates.len() > 1 {
            return Err(BootError::CompositionConflict {
                unit_type: unit_type.short_name().to_string(),
                providers: candidates.iter().map(|&i| nodes[i].name.clone()).collect(),
            });
        }

        let base = candidates.first().copied().unwrap_or(indices[0]);
        bases.insert(unit_type, base);
    }

    Ok(bases)
}

/// Fail on any cycle in the type graph formed by applied override edges
fn detect_cycles(nodes: &[Node], applied_targets: &[Vec<UnitTypeId>]) -> Result<(), BootError> {
    let mut graph: BTreeMap<UnitTypeId, BTreeSet<UnitTypeId>> = BTreeMap::new();
    for (index, targets) in applied_targets.iter().enumerate() {
        let from = nodes[index].unit_type;
        for &to in targets {
            if from != to {
                graph.entry(from).or_default().insert(to);
                graph.entry(to).or_default();
            }
        }
    }

    let types: Vec<UnitTypeId> = graph.keys().copied().collect();
    let type_to_index: HashMap<UnitTypeId, usize> =
        types.iter().enumerate().map(|(i, &t)| (t, i)).collect();

    let mut visited = vec![false; types.len()];
    let mut temp_mark = vec![false; types.len()];
    let mut path = Vec::new();

    for i in 0..types.len() {
        if !visited[i] {
            visit_type(
                i,
                &types,
                &type_to_index,
                &graph,
                &mut visited,
                &mut temp_mark,
                &mut path,
            )?;
        }
    }

    Ok(())
}

fn visit_type(
    index: usize,
    types: &[UnitTypeId],
    type_to_index: &HashMap<UnitTypeId, usize>,
    graph: &BTreeMap<UnitTypeId, BTreeSet<UnitTypeId>>,
    visited: &mut Vec<bool>,
    temp_mark: &mut Vec<bool>,
    path: &mut Vec<usize>,
) -> Result<(), BootError> {
    if temp_mark[index] {
        let start = path.iter().position(|&i| i == index).unwrap_or(0);
        return Err(cycle_error(&path[start..], types));
    }

    if visited[index] {
        return Ok(());
    }

    temp_mark[index] = true;
    path.push(index);

    if let Some(targets) = graph.get(&types[index]) {
        for target in targets {
            if let Some(&target_index) = type_to_index.get(target) {
                visit_type(
                    target_index,
                    types,
                    type_to_index,
                    graph,
                    visited,
                    temp_mark,
                    path,
                )?;
            }
        }
    }

    path.pop();
    temp_mark[index] = false;
    visited[index] = true;

    Ok(())
}

/// Report a cycle starting from its smallest type name
fn cycle_error(cycle: &[usize], types: &[UnitTypeId]) -> BootError {
    let mut names: Vec<String> = cycle
        .iter()
        .map(|&i| types[i].short_name().to_string())
        .collect();
    if let Some(min) = (0..names.len()).min_by(|&a, &b| names[a].cmp(&names[b])) {
        names.rotate_left(min);
    }
    BootError::OverrideCycle { types: names }
}

/// Which layers each provider belongs to, and how deep in the override chain
struct Placement {
    roots: Vec<Vec<usize>>,
    depth: Vec<usize>,
}

impl Placement {
    fn compute(bases: &HashMap<UnitTypeId, usize>, applied_targets: &[Vec<UnitTypeId>]) -> Self {
        let count = applied_targets.len();
        let mut placement = Placement {
            roots: vec![Vec::new(); count],
            depth: vec![0; count],
        };
        let mut done = vec![false; count];

        for index in 0..count {
            placement.place(index, bases, applied_targets, &mut done);
        }

        placement
    }

    // terminates because the type graph was checked for cycles
    fn place(
        &mut self,
        index: usize,
        bases: &HashMap<UnitTypeId, usize>,
        applied_targets: &[Vec<UnitTypeId>],
        done: &mut Vec<bool>,
    ) {
        if done[index] {
            return;
        }

        if applied_targets[index].is_empty() {
            self.roots[index] = vec![index];
            self.depth[index] = 0;
        } else {
            let mut roots = Vec::new();
            let mut depth = 0;
            for target in &applied_targets[index] {
                let Some(&base) = bases.get(target) else {
                    continue;
                };
                self.place(base, bases, applied_targets, done);
                depth = depth.max(self.depth[base] + 1);
                for &root in &self.roots[base] {
                    if !roots.contains(&root) {
                        roots.push(root);
                    }
                }
            }
            self.roots[index] = roots;
            self.depth[index] = depth;
        }

        done[index] = true;
    }

    fn is_root(&self, index: usize) -> bool {
        self.roots[index] == [index]
    }
}

fn build_layers(nodes: &[Node], placement: &Placement) -> Vec<CompositionLayer> {
    let entry = |index: usize| {
        let node = &nodes[index];
        LayerEntry::new(
            node.name.clone(),
            node.unit_type,
            index,
            Arc::clone(&node.unit),
        )
    };

    (0..nodes.len())
        .filter(|&index| placement.is_root(index))
        .map(|root| {
            let mut members: Vec<usize> = (0..nodes.len())
                .filter(|&i| i != root && placement.roots[i].contains(&root))
                .collect();
            members.sort_by_key(|&i| (placement.depth[i], i));

            CompositionLayer::new(entry(root), members.into_iter().map(entry).collect())
        })
        .collect()
}
