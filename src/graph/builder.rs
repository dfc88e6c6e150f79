//! The builder handed to pass setup callbacks.
//!
//! Every call records how the pass uses a resource: whether it creates, reads or writes it, which state the resource
//! must be in while the pass executes and which views the pass needs. The returned ids are the only way to get to the
//! physical resources later, through the [`RenderGraphContext`](crate::RenderGraphContext).

use anyhow::Result;

use crate::core::device::{Device, ViewType};
use crate::core::error::Error;
use crate::core::render_pass::AttachmentOps;
use crate::graph::id::*;
use crate::graph::pass::{DepthStencilInfo, PassNode, RenderTargetInfo};
use crate::graph::resource::ResourceRegistry;
use crate::resource::desc::{BufferDesc, BufferSubresourceDesc, TextureDesc, TextureSubresourceDesc};
use crate::resource::state::{BindFlags, ResourceState};

/// Shader stages a read-only view is accessed from.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum ReadAccess {
    #[default]
    PixelShader,
    NonPixelShader,
    AllShader,
}

impl ReadAccess {
    fn state(&self) -> ResourceState {
        match self {
            ReadAccess::PixelShader => ResourceState::PIXEL_SHADER_RESOURCE,
            ReadAccess::NonPixelShader => ResourceState::NON_PIXEL_SHADER_RESOURCE,
            ReadAccess::AllShader => ResourceState::ALL_SHADER_RESOURCE,
        }
    }
}

/// Records resource usage of a single pass during its setup callback.
pub struct RenderGraphBuilder<'a, D: Device> {
    pub(crate) resources: &'a mut ResourceRegistry<D>,
    pub(crate) passes: &'a [PassNode],
    pub(crate) pass: &'a mut PassNode,
    pub(crate) index: usize,
}

impl<'a, D: Device> RenderGraphBuilder<'a, D> {
    /// Declare a new texture created by this pass. The physical texture is allocated right before the dependency level of this
    /// pass executes.
    /// # Errors
    /// - Fails if a texture with the same name is already known to the graph.
    pub fn declare_texture(&mut self, name: &str, desc: TextureDesc) -> Result<TextureId> {
        let id = self.resources.declare_texture(name, desc)?;
        self.resources.texture_mut(id).creator = Some(self.index);
        self.pass.texture_creates.insert(id);
        Ok(id)
    }

    /// Declare a new buffer created by this pass.
    /// # Errors
    /// - Fails if a buffer with the same name is already known to the graph.
    pub fn declare_buffer(&mut self, name: &str, desc: BufferDesc) -> Result<BufferId> {
        let id = self.resources.declare_buffer(name, desc)?;
        self.resources.buffer_mut(id).creator = Some(self.index);
        self.pass.buffer_creates.insert(id);
        Ok(id)
    }

    /// Returns true if a texture with this name was declared or imported.
    pub fn is_texture_declared(&self, name: &str) -> bool {
        self.resources.is_texture_declared(name)
    }

    /// Returns true if a buffer with this name was declared or imported.
    pub fn is_buffer_declared(&self, name: &str) -> bool {
        self.resources.is_buffer_declared(name)
    }

    /// Name of the pass being set up.
    pub fn pass_name(&self) -> &str {
        &self.pass.name
    }

    /// Set the render area of this pass. Required for graphics passes that use automatic render pass setup.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.pass.viewport = (width, height);
    }

    /// Set the color of the debug label around this pass.
    pub fn set_color(&mut self, color: [f32; 4]) {
        self.pass.color = Some(color);
    }

    fn read_texture_id(&mut self, name: &str) -> Result<TextureId> {
        let id = self.resources.texture_id(name)?;
        self.pass.texture_reads.insert(id);
        Ok(id)
    }

    fn write_texture_id(&mut self, name: &str) -> Result<TextureId> {
        let id = self.resources.texture_id(name)?;
        let texture = self.resources.texture_mut(id);
        match texture.writer {
            Some(writer) if writer != self.index => {
                return Err(Error::MultipleWriters {
                    resource: texture.name.clone(),
                    first: self.passes[writer].name.clone(),
                    second: self.pass.name.clone(),
                }
                .into());
            }
            _ => texture.writer = Some(self.index),
        }
        // Writing to a resource produced elsewhere reads its previous contents.
        if !self.pass.texture_creates.contains(&id) {
            self.pass.texture_reads.insert(id);
        }
        self.pass.texture_writes.insert(id);
        Ok(id)
    }

    fn read_buffer_id(&mut self, name: &str) -> Result<BufferId> {
        let id = self.resources.buffer_id(name)?;
        self.pass.buffer_reads.insert(id);
        Ok(id)
    }

    fn write_buffer_id(&mut self, name: &str) -> Result<BufferId> {
        let id = self.resources.buffer_id(name)?;
        let buffer = self.resources.buffer_mut(id);
        match buffer.writer {
            Some(writer) if writer != self.index => {
                return Err(Error::MultipleWriters {
                    resource: buffer.name.clone(),
                    first: self.passes[writer].name.clone(),
                    second: self.pass.name.clone(),
                }
                .into());
            }
            _ => buffer.writer = Some(self.index),
        }
        if !self.pass.buffer_creates.contains(&id) {
            self.pass.buffer_reads.insert(id);
        }
        self.pass.buffer_writes.insert(id);
        Ok(id)
    }

    /// Record the state and bind flags this pass needs. The first state ever required of a declared texture becomes the
    /// state it is created in.
    fn use_texture(&mut self, id: TextureId, state: ResourceState, bind_flags: BindFlags) {
        self.pass.require_texture_state(id, state);
        let texture = self.resources.texture_mut(id);
        texture.desc.bind_flags |= bind_flags;
        if !texture.imported && texture.desc.initial_state == ResourceState::COMMON {
            texture.desc.initial_state = state;
        }
    }

    fn use_buffer(&mut self, id: BufferId, state: ResourceState, bind_flags: BindFlags) {
        self.pass.require_buffer_state(id, state);
        self.resources.buffer_mut(id).desc.bind_flags |= bind_flags;
    }

    /// Add a read dependency on a texture without requiring any state or view.
    pub fn dummy_read_texture(&mut self, name: &str) -> Result<TextureId> {
        self.read_texture_id(name)
    }

    /// Add a write dependency on a texture without requiring any state or view.
    pub fn dummy_write_texture(&mut self, name: &str) -> Result<TextureId> {
        self.write_texture_id(name)
    }

    /// Add a read dependency on a buffer without requiring any state or view.
    pub fn dummy_read_buffer(&mut self, name: &str) -> Result<BufferId> {
        self.read_buffer_id(name)
    }

    /// Add a write dependency on a buffer without requiring any state or view.
    pub fn dummy_write_buffer(&mut self, name: &str) -> Result<BufferId> {
        self.write_buffer_id(name)
    }

    /// Use a texture as the source of copy commands.
    pub fn read_copy_src_texture(&mut self, name: &str) -> Result<TextureCopySrcId> {
        let id = self.read_texture_id(name)?;
        self.use_texture(id, ResourceState::COPY_SOURCE, BindFlags::empty());
        Ok(TextureCopySrcId(id))
    }

    /// Use a texture as the destination of copy commands.
    pub fn write_copy_dst_texture(&mut self, name: &str) -> Result<TextureCopyDstId> {
        let id = self.write_texture_id(name)?;
        self.use_texture(id, ResourceState::COPY_DEST, BindFlags::empty());
        Ok(TextureCopyDstId(id))
    }

    /// Read a texture through a shader resource view.
    pub fn read_texture(&mut self, name: &str, access: ReadAccess, desc: TextureSubresourceDesc) -> Result<TextureReadOnlyId> {
        let id = self.read_texture_id(name)?;
        self.use_texture(id, access.state(), BindFlags::SHADER_RESOURCE);
        let view = self.resources.request_texture_view(id, desc, ViewType::ShaderResource);
        self.pass.texture_views.insert((id, view));
        Ok(TextureReadOnlyId::new(id, view))
    }

    /// Write a texture through an unordered access view.
    pub fn write_texture(&mut self, name: &str, desc: TextureSubresourceDesc) -> Result<TextureReadWriteId> {
        let id = self.write_texture_id(name)?;
        self.use_texture(id, ResourceState::UNORDERED_ACCESS, BindFlags::UNORDERED_ACCESS);
        let view = self.resources.request_texture_view(id, desc, ViewType::UnorderedAccess);
        self.pass.texture_views.insert((id, view));
        Ok(TextureReadWriteId::new(id, view))
    }

    /// Render to a texture. Attachments are bound in the order they are declared.
    pub fn write_render_target(&mut self, name: &str, ops: AttachmentOps, desc: TextureSubresourceDesc) -> Result<RenderTargetId> {
        let id = self.write_texture_id(name)?;
        self.use_texture(id, ResourceState::RENDER_TARGET, BindFlags::RENDER_TARGET);
        let view = self.resources.request_texture_view(id, desc, ViewType::RenderTarget);
        self.pass.texture_views.insert((id, view));
        let rtv = RenderTargetId::new(id, view);
        if !self.pass.render_targets.iter().any(|rt| rt.id == rtv) {
            self.pass.render_targets.push(RenderTargetInfo {
                id: rtv,
                ops,
            });
        }
        Ok(rtv)
    }

    /// Use a texture as the depth stencil attachment, with depth writes enabled.
    pub fn write_depth_stencil(
        &mut self,
        name: &str,
        depth_ops: AttachmentOps,
        stencil_ops: AttachmentOps,
        desc: TextureSubresourceDesc,
    ) -> Result<DepthStencilId> {
        let id = self.write_texture_id(name)?;
        self.use_texture(id, ResourceState::DEPTH_WRITE, BindFlags::DEPTH_STENCIL);
        self.set_depth_stencil(id, depth_ops, stencil_ops, desc, false)
    }

    /// Use a texture as a read-only depth stencil attachment.
    pub fn read_depth_stencil(
        &mut self,
        name: &str,
        depth_ops: AttachmentOps,
        stencil_ops: AttachmentOps,
        desc: TextureSubresourceDesc,
    ) -> Result<DepthStencilId> {
        let id = self.read_texture_id(name)?;
        self.use_texture(id, ResourceState::DEPTH_READ, BindFlags::DEPTH_STENCIL);
        self.set_depth_stencil(id, depth_ops, stencil_ops, desc, true)
    }

    fn set_depth_stencil(
        &mut self,
        id: TextureId,
        depth_ops: AttachmentOps,
        stencil_ops: AttachmentOps,
        desc: TextureSubresourceDesc,
        read_only: bool,
    ) -> Result<DepthStencilId> {
        let view = self.resources.request_texture_view(id, desc, ViewType::DepthStencil);
        self.pass.texture_views.insert((id, view));
        let dsv = DepthStencilId::new(id, view);
        if let Some(previous) = self.pass.depth_stencil.replace(DepthStencilInfo {
            id: dsv,
            depth_ops,
            stencil_ops,
            read_only,
        }) {
            if previous.id != dsv {
                warn!("Pass `{}` declared a second depth stencil attachment, replacing the first one", self.pass.name);
            }
        }
        Ok(dsv)
    }

    /// Use a buffer as the source of copy commands.
    pub fn read_copy_src_buffer(&mut self, name: &str) -> Result<BufferCopySrcId> {
        let id = self.read_buffer_id(name)?;
        self.use_buffer(id, ResourceState::COPY_SOURCE, BindFlags::empty());
        Ok(BufferCopySrcId(id))
    }

    /// Use a buffer as the destination of copy commands.
    pub fn write_copy_dst_buffer(&mut self, name: &str) -> Result<BufferCopyDstId> {
        let id = self.write_buffer_id(name)?;
        self.use_buffer(id, ResourceState::COPY_DEST, BindFlags::empty());
        Ok(BufferCopyDstId(id))
    }

    /// Read indirect draw or dispatch arguments from a buffer.
    pub fn read_indirect_args_buffer(&mut self, name: &str) -> Result<BufferIndirectArgsId> {
        let id = self.read_buffer_id(name)?;
        self.use_buffer(id, ResourceState::INDIRECT_ARGUMENT, BindFlags::empty());
        Ok(BufferIndirectArgsId(id))
    }

    /// Bind a buffer as a vertex buffer.
    pub fn read_vertex_buffer(&mut self, name: &str) -> Result<BufferVertexId> {
        let id = self.read_buffer_id(name)?;
        self.use_buffer(id, ResourceState::VERTEX_AND_CONSTANT_BUFFER, BindFlags::empty());
        Ok(BufferVertexId(id))
    }

    /// Bind a buffer as an index buffer.
    pub fn read_index_buffer(&mut self, name: &str) -> Result<BufferIndexId> {
        let id = self.read_buffer_id(name)?;
        self.use_buffer(id, ResourceState::INDEX_BUFFER, BindFlags::empty());
        Ok(BufferIndexId(id))
    }

    /// Bind a buffer as a constant buffer.
    pub fn read_constant_buffer(&mut self, name: &str) -> Result<BufferConstantId> {
        let id = self.read_buffer_id(name)?;
        self.use_buffer(id, ResourceState::VERTEX_AND_CONSTANT_BUFFER, BindFlags::empty());
        Ok(BufferConstantId(id))
    }

    /// Read a buffer through a shader resource view.
    pub fn read_buffer(&mut self, name: &str, access: ReadAccess, desc: BufferSubresourceDesc) -> Result<BufferReadOnlyId> {
        let id = self.read_buffer_id(name)?;
        self.use_buffer(id, access.state(), BindFlags::SHADER_RESOURCE);
        let view = self.resources.request_buffer_view(id, desc, ViewType::ShaderResource, None)?;
        self.pass.buffer_views.insert((id, view));
        Ok(BufferReadOnlyId::new(id, view))
    }

    /// Write a buffer through an unordered access view.
    pub fn write_buffer(&mut self, name: &str, desc: BufferSubresourceDesc) -> Result<BufferReadWriteId> {
        let id = self.write_buffer_id(name)?;
        self.use_buffer(id, ResourceState::UNORDERED_ACCESS, BindFlags::UNORDERED_ACCESS);
        let view = self.resources.request_buffer_view(id, desc, ViewType::UnorderedAccess, None)?;
        self.pass.buffer_views.insert((id, view));
        Ok(BufferReadWriteId::new(id, view))
    }

    /// Write a buffer through an unordered access view with an append/consume counter stored in `counter`.
    /// The counter buffer is written as well.
    pub fn write_buffer_with_counter(&mut self, name: &str, counter: &str, desc: BufferSubresourceDesc) -> Result<BufferReadWriteId> {
        let id = self.write_buffer_id(name)?;
        self.use_buffer(id, ResourceState::UNORDERED_ACCESS, BindFlags::UNORDERED_ACCESS);
        let counter_id = self.write_buffer_id(counter)?;
        self.use_buffer(counter_id, ResourceState::UNORDERED_ACCESS, BindFlags::UNORDERED_ACCESS);
        let view = self
            .resources
            .request_buffer_view(id, desc, ViewType::UnorderedAccess, Some(counter_id))?;
        self.pass.buffer_views.insert((id, view));
        Ok(BufferReadWriteId::new(id, view))
    }
}
