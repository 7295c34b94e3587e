use crate::error::ModelError;
use crate::profiles::ComponentKind;

use itertools::Itertools;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Number of instances of every component kind
///
/// This is static shape information: it fixes the length of the parameter vector and is never
/// inferred from parameter values.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct ComponentCounts {
    pub isobeta: usize,
    pub gnfw: usize,
    pub a10: usize,
    pub gaussian: usize,
    pub egaussian: usize,
    pub uniform: usize,
    pub exponential: usize,
    pub powerlaw: usize,
    pub powerlaw_cos: usize,
}

impl ComponentCounts {
    pub fn count(&self, kind: ComponentKind) -> usize {
        match kind {
            ComponentKind::Isobeta => self.isobeta,
            ComponentKind::Gnfw => self.gnfw,
            ComponentKind::A10 => self.a10,
            ComponentKind::Gaussian => self.gaussian,
            ComponentKind::Egaussian => self.egaussian,
            ComponentKind::Uniform => self.uniform,
            ComponentKind::Exponential => self.exponential,
            ComponentKind::Powerlaw => self.powerlaw,
            ComponentKind::PowerlawCos => self.powerlaw_cos,
        }
    }

    /// Copy with the count of `kind` replaced
    pub fn with(mut self, kind: ComponentKind, count: usize) -> Self {
        let slot = match kind {
            ComponentKind::Isobeta => &mut self.isobeta,
            ComponentKind::Gnfw => &mut self.gnfw,
            ComponentKind::A10 => &mut self.a10,
            ComponentKind::Gaussian => &mut self.gaussian,
            ComponentKind::Egaussian => &mut self.egaussian,
            ComponentKind::Uniform => &mut self.uniform,
            ComponentKind::Exponential => &mut self.exponential,
            ComponentKind::Powerlaw => &mut self.powerlaw,
            ComponentKind::PowerlawCos => &mut self.powerlaw_cos,
        };
        *slot = count;
        self
    }

    /// Total number of instances
    pub fn total(&self) -> usize {
        ComponentKind::ORDER.iter().map(|&k| self.count(k)).sum()
    }
}

/// Contiguous block of a single kind in the flat parameter vector
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParameterBlock {
    pub kind: ComponentKind,
    pub count: usize,
    pub arity: usize,
    pub offset: usize,
}

impl ParameterBlock {
    pub fn len(&self) -> usize {
        self.count * self.arity
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Index range of instance `instance` within the flat parameter vector
    pub fn instance_range(&self, instance: usize) -> Range<usize> {
        let start = self.offset + instance * self.arity;
        start..start + self.arity
    }
}

/// Layout of the flat parameter vector
///
/// Blocks are ordered by [`ComponentKind::ORDER`], instances are contiguous within a block and
/// every instance takes exactly `kind.arity()` entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterLayout {
    counts: ComponentCounts,
    blocks: Vec<ParameterBlock>,
    len: usize,
}

impl ParameterLayout {
    pub fn new(counts: ComponentCounts) -> Self {
        let mut offset = 0;
        let blocks = ComponentKind::ORDER
            .iter()
            .map(|&kind| {
                let block = ParameterBlock {
                    kind,
                    count: counts.count(kind),
                    arity: kind.arity(),
                    offset,
                };
                offset += block.len();
                block
            })
            .collect();
        Self {
            counts,
            blocks,
            len: offset,
        }
    }

    #[inline]
    pub fn counts(&self) -> &ComponentCounts {
        &self.counts
    }

    /// Total number of parameters
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn blocks(&self) -> &[ParameterBlock] {
        &self.blocks
    }

    pub fn block(&self, kind: ComponentKind) -> &ParameterBlock {
        // blocks follow ComponentKind::ORDER, which follows declaration order
        &self.blocks[kind as usize]
    }

    /// Iterate over `(kind, parameters)` of every instance in application order
    pub fn instances<'a, T>(
        &'a self,
        params: &'a [T],
    ) -> impl Iterator<Item = (ComponentKind, &'a [T])> + 'a {
        self.blocks.iter().flat_map(move |block| {
            (0..block.count).map(move |i| (block.kind, &params[block.instance_range(i)]))
        })
    }

    /// Error unless `len` equals the number of parameters
    pub fn check_len(&self, len: usize) -> Result<(), ModelError> {
        if len == self.len {
            Ok(())
        } else {
            Err(ModelError::ParameterCount {
                expected: self.len,
                actual: len,
            })
        }
    }

    /// Human-readable parameter labels, `"<kind><instance>-<name>"`
    pub fn labels(&self) -> Vec<String> {
        self.blocks
            .iter()
            .flat_map(|block| {
                (0..block.count)
                    .cartesian_product(block.kind.param_names())
                    .map(move |(i, name)| format!("{}{}-{}", block.kind, i, name))
            })
            .collect()
    }

    /// Flat index of parameter `name` of instance `instance` of `kind`
    pub fn index_of(&self, kind: ComponentKind, instance: usize, name: &str) -> Option<usize> {
        let block = self.block(kind);
        if instance >= block.count {
            return None;
        }
        let position = kind.param_names().iter().position(|&n| n == name)?;
        Some(block.instance_range(instance).start + position)
    }
}
