//! Determines where resources stop being used.

use crate::core::device::Device;
use crate::graph::id::{BufferId, TextureId};
use crate::graph::pass::PassNode;
use crate::graph::resource::ResourceRegistry;

/// Find the last live pass using every resource and add the resource to that pass's destroy set.
///
/// `order` must be the order passes execute in. Creating a resource counts as using it, so a resource nobody touches
/// after its creator is destroyed right after the creator's level.
pub(crate) fn compute_lifetimes<D: Device>(passes: &mut [PassNode], resources: &mut ResourceRegistry<D>, order: &[usize]) {
    for texture in &mut resources.textures {
        texture.last_used_by = None;
    }
    for buffer in &mut resources.buffers {
        buffer.last_used_by = None;
    }

    for &index in order {
        let pass = &passes[index];
        if pass.culled {
            continue;
        }
        for id in pass.texture_creates.iter().chain(&pass.texture_reads).chain(&pass.texture_writes) {
            resources.texture_mut(*id).last_used_by = Some(index);
        }
        for id in pass.buffer_creates.iter().chain(&pass.buffer_reads).chain(&pass.buffer_writes) {
            resources.buffer_mut(*id).last_used_by = Some(index);
        }
    }

    for pass in passes.iter_mut() {
        pass.texture_destroys.clear();
        pass.buffer_destroys.clear();
    }
    for (index, texture) in resources.textures.iter().enumerate() {
        if let Some(pass) = texture.last_used_by {
            passes[pass].texture_destroys.insert(TextureId(index));
        }
    }
    for (index, buffer) in resources.buffers.iter().enumerate() {
        if let Some(pass) = buffer.last_used_by {
            passes[pass].buffer_destroys.insert(BufferId(index));
        }
    }
}
