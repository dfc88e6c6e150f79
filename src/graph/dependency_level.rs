//! Batches of passes without dependencies between them.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;

use crate::core::device::Device;
use crate::core::error::Error;
use crate::graph::id::{BufferId, TextureId};
use crate::graph::pass::PassNode;
use crate::graph::resource::ResourceRegistry;
use crate::resource::state::ResourceState;

/// All passes at the same distance from the roots of the pass graph, together with the union of what they create,
/// destroy and require. Only passes that survived culling contribute to the unions.
#[derive(Debug, Default)]
pub(crate) struct DependencyLevel {
    pub(crate) index: usize,
    /// Pass indices in registration order, culled passes included.
    pub(crate) passes: Vec<usize>,
    pub(crate) texture_creates: BTreeSet<TextureId>,
    pub(crate) texture_destroys: BTreeSet<TextureId>,
    pub(crate) texture_states: BTreeMap<TextureId, ResourceState>,
    pub(crate) buffer_creates: BTreeSet<BufferId>,
    pub(crate) buffer_destroys: BTreeSet<BufferId>,
    pub(crate) buffer_states: BTreeMap<BufferId, ResourceState>,
}

impl DependencyLevel {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    pub(crate) fn add_pass(&mut self, pass: usize) {
        self.passes.push(pass);
    }

    pub(crate) fn size(&self) -> usize {
        self.passes.len()
    }

    pub(crate) fn non_culled_passes<'p>(&'p self, passes: &'p [PassNode]) -> impl Iterator<Item = usize> + 'p {
        self.passes.iter().copied().filter(move |&pass| !passes[pass].culled)
    }

    pub(crate) fn non_culled_size(&self, passes: &[PassNode]) -> usize {
        self.non_culled_passes(passes).count()
    }

    /// Union the create and destroy sets and combine the required states of all live passes in this level.
    /// # Errors
    /// - Fails if two passes require states of the same resource that cannot be held at the same time.
    pub(crate) fn setup<D: Device>(&mut self, passes: &[PassNode], resources: &ResourceRegistry<D>) -> Result<()> {
        for pass in self.passes.iter().map(|&pass| &passes[pass]).filter(|pass| !pass.culled) {
            self.texture_creates.extend(pass.texture_creates.iter().copied());
            self.texture_destroys.extend(pass.texture_destroys.iter().copied());
            self.buffer_creates.extend(pass.buffer_creates.iter().copied());
            self.buffer_destroys.extend(pass.buffer_destroys.iter().copied());
            for (&id, &state) in &pass.texture_states {
                *self.texture_states.entry(id).or_insert(ResourceState::COMMON) |= state;
            }
            for (&id, &state) in &pass.buffer_states {
                *self.buffer_states.entry(id).or_insert(ResourceState::COMMON) |= state;
            }
        }

        for (&id, &state) in &self.texture_states {
            if !state.is_valid_combination() {
                return Err(Error::InvalidStateCombination {
                    name: resources.texture(id).name.clone(),
                    state,
                    level: self.index,
                }
                .into());
            }
        }
        for (&id, &state) in &self.buffer_states {
            if !state.is_valid_combination() {
                return Err(Error::InvalidStateCombination {
                    name: resources.buffer(id).name.clone(),
                    state,
                    level: self.index,
                }
                .into());
            }
        }
        Ok(())
    }
}
