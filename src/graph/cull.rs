//! Removes passes whose outputs are never consumed.
//!
//! Every resource counts the passes reading it and every pass counts the resources it produces. Resources nobody reads
//! release their producer, and a cullable pass that no longer produces anything useful releases everything it reads.
//! This is dead code elimination over the pass graph, driven by a work stack.
//!
//! Two cases need care:
//! - A pass writing a resource it did not create also reads it. That read consumes the previous contents, so it keeps
//!   the creator alive instead of counting as a consumer of the pass's own output.
//! - Imported resources are observed outside the graph, so they always count one extra reader.

use crate::core::device::Device;
use crate::graph::pass::PassNode;
use crate::graph::resource::ResourceRegistry;

#[derive(Debug)]
struct CullNode {
    ref_count: usize,
    creator: Option<usize>,
    writer: Option<usize>,
}

impl CullNode {
    fn producer(&self) -> Option<usize> {
        self.writer.or(self.creator)
    }
}

#[derive(Debug, Copy, Clone)]
enum Work {
    Resource(usize),
    Pass(usize),
}

fn release_pass(passes: &mut [PassNode], pass: usize, work: &mut Vec<Work>) {
    let node = &mut passes[pass];
    if node.ref_count == 0 {
        return;
    }
    node.ref_count -= 1;
    if node.ref_count == 0 && node.is_cullable() {
        work.push(Work::Pass(pass));
    }
}

/// Compute reference counts of all passes and resources and mark unreferenced cullable passes as culled.
/// Culled passes keep their dependency level, but are never executed and do not keep resources alive.
pub(crate) fn cull_passes<D: Device>(passes: &mut [PassNode], resources: &mut ResourceRegistry<D>) {
    // Textures and buffers share one index space, buffers start after the last texture.
    let buffer_offset = resources.textures.len();
    let mut nodes = resources
        .textures
        .iter()
        .map(|texture| (texture.imported, texture.creator, texture.writer))
        .chain(
            resources
                .buffers
                .iter()
                .map(|buffer| (buffer.imported, buffer.creator, buffer.writer)),
        )
        .map(|(imported, creator, writer)| CullNode {
            ref_count: usize::from(imported),
            creator,
            writer,
        })
        .collect::<Vec<_>>();
    let reads = passes
        .iter()
        .map(|pass| {
            pass.texture_reads
                .iter()
                .map(|id| id.index())
                .chain(pass.buffer_reads.iter().map(|id| buffer_offset + id.index()))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    for (pass, reads) in reads.iter().enumerate() {
        for &resource in reads {
            if nodes[resource].writer != Some(pass) {
                nodes[resource].ref_count += 1;
            }
        }
    }

    let mut work = Vec::new();
    for (index, pass) in passes.iter_mut().enumerate() {
        pass.ref_count = pass.texture_outputs().count() + pass.buffer_outputs().count();
        if pass.ref_count == 0 && pass.is_cullable() {
            work.push(Work::Pass(index));
        }
    }
    work.extend(
        nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.ref_count == 0)
            .map(|(index, _)| Work::Resource(index)),
    );

    while let Some(item) = work.pop() {
        match item {
            Work::Resource(resource) => {
                if let Some(producer) = nodes[resource].producer() {
                    release_pass(passes, producer, &mut work);
                }
            }
            Work::Pass(pass) => {
                for &resource in &reads[pass] {
                    let node = &mut nodes[resource];
                    if node.writer == Some(pass) {
                        if let Some(creator) = node.creator.filter(|&creator| creator != pass) {
                            release_pass(passes, creator, &mut work);
                        }
                    } else if node.ref_count > 0 {
                        node.ref_count -= 1;
                        if node.ref_count == 0 {
                            work.push(Work::Resource(resource));
                        }
                    }
                }
            }
        }
    }

    for pass in passes.iter_mut() {
        pass.culled = pass.is_cullable() && pass.ref_count == 0;
    }
    let (textures, buffers) = nodes.split_at(buffer_offset);
    for (texture, node) in resources.textures.iter_mut().zip(textures) {
        texture.ref_count = node.ref_count;
    }
    for (buffer, node) in resources.buffers.iter_mut().zip(buffers) {
        buffer.ref_count = node.ref_count;
    }
}
