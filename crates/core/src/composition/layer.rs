use crate::units::{ConfigUnit, UnitTypeId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A materialized unit together with where it came from
#[derive(Clone)]
pub struct LayerEntry {
    provider: String,
    unit_type: UnitTypeId,
    registration_index: usize,
    unit: Arc<dyn ConfigUnit>,
}

impl LayerEntry {
    pub(crate) fn new(
        provider: String,
        unit_type: UnitTypeId,
        registration_index: usize,
        unit: Arc<dyn ConfigUnit>,
    ) -> Self {
        Self {
            provider,
            unit_type,
            registration_index,
            unit,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn unit_type(&self) -> UnitTypeId {
        self.unit_type
    }

    /// Position of the provider in the frozen registration list
    pub fn registration_index(&self) -> usize {
        self.registration_index
    }

    pub fn unit(&self) -> &Arc<dyn ConfigUnit> {
        &self.unit
    }
}

impl std::fmt::Debug for LayerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerEntry")
            .field("provider", &self.provider)
            .field("unit_type", &self.unit_type.name())
            .field("registration_index", &self.registration_index)
            .finish()
    }
}

/// A base unit plus the units overriding it, in application order
#[derive(Debug, Clone)]
pub struct CompositionLayer {
    base: LayerEntry,
    override_chain: Vec<LayerEntry>,
}

impl CompositionLayer {
    pub(crate) fn new(base: LayerEntry, override_chain: Vec<LayerEntry>) -> Self {
        Self {
            base,
            override_chain,
        }
    }

    pub fn base(&self) -> &LayerEntry {
        &self.base
    }

    pub fn override_chain(&self) -> &[LayerEntry] {
        &self.override_chain
    }

    pub fn is_standalone(&self) -> bool {
        self.override_chain.is_empty()
    }
}

/// Ordered layers handed to the construction container
#[derive(Debug, Clone, Default)]
pub struct ResolvedComposition {
    layers: Vec<CompositionLayer>,
}

impl ResolvedComposition {
    pub(crate) fn new(layers: Vec<CompositionLayer>) -> Self {
        Self { layers }
    }

    pub fn layers(&self) -> &[CompositionLayer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer whose base unit has the given type
    pub fn layer_for(&self, unit_type: UnitTypeId) -> Option<&CompositionLayer> {
        self.layers
            .iter()
            .find(|layer| layer.base.unit_type == unit_type)
    }

    /// Unit types per layer (base first, then the chain), for structural comparison
    pub fn structure(&self) -> Vec<Vec<UnitTypeId>> {
        self.layers
            .iter()
            .map(|layer| {
                std::iter::once(layer.base.unit_type)
                    .chain(layer.override_chain.iter().map(|e| e.unit_type))
                    .collect()
            })
            .collect()
    }
}

/// An override edge that was applied to a layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedOverride {
    pub overriding: String,
    pub base: String,
    pub unit_type: UnitTypeId,
}

impl std::fmt::Display for AppliedOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} overrides {}'s {}",
            self.overriding, self.base, self.unit_type
        )
    }
}

/// Why a declared override edge had no effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotRegistered,
    SelfOverride,
}

/// An override edge that was declared but not applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedOverride {
    pub provider: String,
    pub target: UnitTypeId,
    pub reason: SkipReason,
}

impl std::fmt::Display for SkippedOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reason {
            SkipReason::NotRegistered => write!(
                f,
                "{} declares override of {}, which is not registered; ignoring",
                self.provider, self.target
            ),
            SkipReason::SelfOverride => write!(
                f,
                "{} declares a self-override of {}; ignoring",
                self.provider, self.target
            ),
        }
    }
}

/// Result of one resolution: the composition plus its provenance
#[derive(Debug, Clone)]
pub struct Resolution {
    composition: ResolvedComposition,
    applied: Vec<AppliedOverride>,
    skipped: Vec<SkippedOverride>,
}

impl Resolution {
    pub(crate) fn new(
        composition: ResolvedComposition,
        applied: Vec<AppliedOverride>,
        skipped: Vec<SkippedOverride>,
    ) -> Self {
        Self {
            composition,
            applied,
            skipped,
        }
    }

    pub fn composition(&self) -> &ResolvedComposition {
        &self.composition
    }

    pub fn into_composition(self) -> ResolvedComposition {
        self.composition
    }

    pub fn applied(&self) -> &[AppliedOverride] {
        &self.applied
    }

    pub fn skipped(&self) -> &[SkippedOverride] {
        &self.skipped
    }

    /// One line per applied override
    pub fn diagnostics(&self) -> Vec<String> {
        self.applied.iter().map(|a| a.to_string()).collect()
    }

    pub fn report(&self) -> CompositionReport {
        CompositionReport {
            layers: self
                .composition
                .layers
                .iter()
                .map(|layer| LayerReport {
                    base: UnitReport::from(&layer.base),
                    overrides: layer.override_chain.iter().map(UnitReport::from).collect(),
                })
                .collect(),
            applied: self.diagnostics(),
            skipped: self.skipped.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Serializable summary of a resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionReport {
    pub layers: Vec<LayerReport>,
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerReport {
    pub base: UnitReport,
    pub overrides: Vec<UnitReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitReport {
    pub provider: String,
    pub unit_type: String,
}

impl From<&LayerEntry> for UnitReport {
    fn from(entry: &LayerEntry) -> Self {
        Self {
            provider: entry.provider.clone(),
            unit_type: entry.unit_type.short_name().to_string(),
        }
    }
}
