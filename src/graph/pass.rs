//! Passes and the ways to define them.
//!
//! A pass declares the resources it uses in a setup callback that runs once, immediately when it is added to the graph.
//! Its execute callback runs during [`BuiltRenderGraph::execute()`](crate::BuiltRenderGraph::execute), with a
//! [`RenderGraphContext`] that resolves the ids obtained during setup.
//!
//! There are two ways to define a pass.
//!
//! # Closures over pass data
//!
//! [`RenderGraph::add_pass()`](crate::RenderGraph::add_pass) takes a pass data type, a setup closure filling it in
//! and an execute closure reading it. A copy of the data is returned so later passes can use the ids it holds.
//! ```ignore
//! use framegraph::prelude::*;
//!
//! #[derive(Default, Clone)]
//! struct GBufferData {
//!     albedo: Option<RenderTargetId>,
//! }
//!
//! let data = graph.add_pass::<GBufferData, _, _>(
//!     "gbuffer",
//!     PassType::Graphics,
//!     PassFlags::empty(),
//!     |data, builder| {
//!         builder.declare_texture("albedo", TextureDesc::new_2d(1920, 1080, Format::R8G8B8A8Unorm))?;
//!         data.albedo = Some(builder.write_render_target("albedo", AttachmentOps::CLEAR_PRESERVE, Default::default())?);
//!         builder.set_viewport(1920, 1080);
//!         Ok(())
//!     },
//!     |data, ctx, cmd| {
//!         // Record draw calls into `cmd`.
//!         Ok(())
//!     },
//! )?;
//! ```
//!
//! # Implementing [`RenderPass`]
//!
//! Passes that own state across frames can implement [`RenderPass`] and be added using
//! [`RenderGraph::add_render_pass()`](crate::RenderGraph::add_render_pass).

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use bitflags::bitflags;

use crate::core::device::Device;
use crate::core::render_pass::AttachmentOps;
use crate::graph::builder::RenderGraphBuilder;
use crate::graph::context::RenderGraphContext;
use crate::graph::id::{BufferId, DepthStencilId, RenderTargetId, TextureId};
use crate::resource::state::ResourceState;

/// The kind of GPU work a pass records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PassType {
    /// Rasterization work. Unless [`PassFlags::SKIP_AUTO_RENDER_PASS`] is set, the graph begins and ends a render pass
    /// around the execute callback, using the attachments declared in setup.
    Graphics,
    Compute,
    Copy,
}

bitflags! {
    /// Flags that change how the graph treats a pass.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct PassFlags: u32 {
        /// Never cull this pass, even if nothing reads its outputs. Use this for passes with side effects
        /// the graph cannot see, like readbacks.
        const FORCE_NO_CULL = 1 << 0;
        /// Do not begin and end a render pass around a graphics pass.
        const SKIP_AUTO_RENDER_PASS = 1 << 1;
        /// Allow unordered access writes inside the render pass.
        const ALLOW_UAV_WRITES = 1 << 2;
        /// Ask the backend to bind attachments without native render passes.
        const LEGACY_RENDER_PASS = 1 << 3;
    }
}

/// Defines a pass executor that can be called when the graph is executed.
pub(crate) trait PassExecutor<D: Device> {
    /// Record this pass to a command list.
    fn execute(&mut self, ctx: &mut RenderGraphContext<'_, D>, cmd: &mut D::CommandList) -> Result<()>;
}

pub(crate) type BoxedPassFn<'cb, D> = Box<dyn PassExecutor<D> + 'cb>;

/// A pass with its own state, as an alternative to the closure based [`RenderGraph::add_pass()`](crate::RenderGraph::add_pass).
pub trait RenderPass<D: Device> {
    /// Declare resource usage. Called once, when the pass is added to the graph.
    fn setup(&mut self, builder: &mut RenderGraphBuilder<'_, D>) -> Result<()>;

    /// Record commands for this pass. Called once during graph execution unless the pass is culled.
    fn execute(&mut self, ctx: &mut RenderGraphContext<'_, D>, cmd: &mut D::CommandList) -> Result<()>;
}

/// Executor that owns the pass data filled in during setup and hands it to the execute closure.
pub(crate) struct DataPassExecutor<P, F> {
    pub(crate) data: P,
    pub(crate) execute: F,
}

impl<D, P, F> PassExecutor<D> for DataPassExecutor<P, F>
where
    D: Device,
    F: FnMut(&P, &mut RenderGraphContext<'_, D>, &mut D::CommandList) -> Result<()>,
{
    fn execute(&mut self, ctx: &mut RenderGraphContext<'_, D>, cmd: &mut D::CommandList) -> Result<()> {
        (self.execute)(&self.data, ctx, cmd)
    }
}

/// Executor wrapping a [`RenderPass`] implementation.
pub(crate) struct RenderPassExecutor<T>(pub(crate) T);

impl<D: Device, T: RenderPass<D>> PassExecutor<D> for RenderPassExecutor<T> {
    fn execute(&mut self, ctx: &mut RenderGraphContext<'_, D>, cmd: &mut D::CommandList) -> Result<()> {
        self.0.execute(ctx, cmd)
    }
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct RenderTargetInfo {
    pub(crate) id: RenderTargetId,
    pub(crate) ops: AttachmentOps,
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct DepthStencilInfo {
    pub(crate) id: DepthStencilId,
    pub(crate) depth_ops: AttachmentOps,
    pub(crate) stencil_ops: AttachmentOps,
    pub(crate) read_only: bool,
}

/// Everything the graph knows about a pass, apart from its executor.
#[derive(Debug)]
pub(crate) struct PassNode {
    pub(crate) name: String,
    pub(crate) pass_type: PassType,
    pub(crate) flags: PassFlags,
    pub(crate) color: Option<[f32; 4]>,
    pub(crate) viewport: (u32, u32),

    pub(crate) texture_creates: BTreeSet<TextureId>,
    pub(crate) texture_reads: BTreeSet<TextureId>,
    pub(crate) texture_writes: BTreeSet<TextureId>,
    pub(crate) texture_destroys: BTreeSet<TextureId>,
    pub(crate) texture_states: BTreeMap<TextureId, ResourceState>,

    pub(crate) buffer_creates: BTreeSet<BufferId>,
    pub(crate) buffer_reads: BTreeSet<BufferId>,
    pub(crate) buffer_writes: BTreeSet<BufferId>,
    pub(crate) buffer_destroys: BTreeSet<BufferId>,
    pub(crate) buffer_states: BTreeMap<BufferId, ResourceState>,

    /// Views requested during setup, as (resource, view index) pairs.
    pub(crate) texture_views: BTreeSet<(TextureId, usize)>,
    pub(crate) buffer_views: BTreeSet<(BufferId, usize)>,

    pub(crate) render_targets: Vec<RenderTargetInfo>,
    pub(crate) depth_stencil: Option<DepthStencilInfo>,

    pub(crate) ref_count: usize,
    pub(crate) culled: bool,
}

impl PassNode {
    pub(crate) fn new(name: String, pass_type: PassType, flags: PassFlags) -> Self {
        Self {
            name,
            pass_type,
            flags,
            color: None,
            viewport: (0, 0),
            texture_creates: BTreeSet::new(),
            texture_reads: BTreeSet::new(),
            texture_writes: BTreeSet::new(),
            texture_destroys: BTreeSet::new(),
            texture_states: BTreeMap::new(),
            buffer_creates: BTreeSet::new(),
            buffer_reads: BTreeSet::new(),
            buffer_writes: BTreeSet::new(),
            buffer_destroys: BTreeSet::new(),
            buffer_states: BTreeMap::new(),
            texture_views: BTreeSet::new(),
            buffer_views: BTreeSet::new(),
            render_targets: Vec::new(),
            depth_stencil: None,
            ref_count: 0,
            culled: false,
        }
    }

    pub(crate) fn is_cullable(&self) -> bool {
        !self.flags.contains(PassFlags::FORCE_NO_CULL)
    }

    /// Textures this pass produces, either by declaring or by writing them.
    pub(crate) fn texture_outputs(&self) -> impl Iterator<Item = TextureId> + '_ {
        self.texture_creates.union(&self.texture_writes).copied()
    }

    pub(crate) fn buffer_outputs(&self) -> impl Iterator<Item = BufferId> + '_ {
        self.buffer_creates.union(&self.buffer_writes).copied()
    }

    pub(crate) fn uses_texture(&self, id: TextureId) -> bool {
        self.texture_creates.contains(&id) || self.texture_reads.contains(&id) || self.texture_writes.contains(&id)
    }

    pub(crate) fn uses_buffer(&self, id: BufferId) -> bool {
        self.buffer_creates.contains(&id) || self.buffer_reads.contains(&id) || self.buffer_writes.contains(&id)
    }

    pub(crate) fn has_texture_view(&self, id: TextureId, view: usize) -> bool {
        self.texture_views.contains(&(id, view))
    }

    pub(crate) fn has_buffer_view(&self, id: BufferId, view: usize) -> bool {
        self.buffer_views.contains(&(id, view))
    }

    /// True if any resource this pass reads is produced by `producer`.
    pub(crate) fn depends_on(&self, producer: &PassNode) -> bool {
        producer.texture_outputs().any(|id| self.texture_reads.contains(&id))
            || producer.buffer_outputs().any(|id| self.buffer_reads.contains(&id))
    }

    pub(crate) fn require_texture_state(&mut self, id: TextureId, state: ResourceState) {
        *self.texture_states.entry(id).or_insert(ResourceState::COMMON) |= state;
    }

    pub(crate) fn require_buffer_state(&mut self, id: BufferId, state: ResourceState) {
        *self.buffer_states.entry(id).or_insert(ResourceState::COMMON) |= state;
    }
}
