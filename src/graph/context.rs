//! Access to physical resources from inside a pass execute callback.

use anyhow::Result;

use crate::core::device::Device;
use crate::core::error::Error;
use crate::graph::blackboard::Blackboard;
use crate::graph::id::*;
use crate::graph::pass::PassNode;
use crate::graph::resource::ResourceRegistry;

/// Resolves the ids a pass obtained during setup to this frame's physical resources and views.
///
/// Only resources and views the executing pass declared can be resolved, anything else is an [`Error::UndeclaredAccess`].
/// Ids from another graph fail with [`Error::InvalidResourceId`] when they are out of range for this one.
pub struct RenderGraphContext<'a, D: Device> {
    pub(crate) resources: &'a ResourceRegistry<D>,
    pub(crate) pass: &'a PassNode,
    pub(crate) blackboard: &'a mut Blackboard,
}

impl<'a, D: Device> RenderGraphContext<'a, D> {
    /// Name of the executing pass.
    pub fn pass_name(&self) -> &str {
        &self.pass.name
    }

    /// Render area set during setup.
    pub fn viewport(&self) -> (u32, u32) {
        self.pass.viewport
    }

    pub fn blackboard(&self) -> &Blackboard {
        &*self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut *self.blackboard
    }

    fn undeclared(&self, resource: &str) -> anyhow::Error {
        Error::UndeclaredAccess {
            pass: self.pass.name.clone(),
            resource: resource.to_owned(),
        }
        .into()
    }

    fn check_texture(&self, id: TextureId) -> Result<()> {
        if self.pass.uses_texture(id) {
            return Ok(());
        }
        let texture = self.resources.get_texture(id)?;
        Err(self.undeclared(&texture.name))
    }

    fn check_buffer(&self, id: BufferId) -> Result<()> {
        if self.pass.uses_buffer(id) {
            return Ok(());
        }
        let buffer = self.resources.get_buffer(id)?;
        Err(self.undeclared(&buffer.name))
    }

    // Views are granted one by one, using a resource does not grant every view of it.
    fn texture_view(&self, id: TextureId, view: usize) -> Result<D::View> {
        self.check_texture(id)?;
        if !self.pass.has_texture_view(id, view) {
            return Err(self.undeclared(&self.resources.texture(id).name));
        }
        self.resources.texture_view(id, view)
    }

    fn buffer_view(&self, id: BufferId, view: usize) -> Result<D::View> {
        self.check_buffer(id)?;
        if !self.pass.has_buffer_view(id, view) {
            return Err(self.undeclared(&self.resources.buffer(id).name));
        }
        self.resources.buffer_view(id, view)
    }

    /// Get the physical texture behind any texture id, like a [`TextureCopySrcId`] for copy commands.
    /// # Errors
    /// - Fails if this pass did not declare the texture.
    /// - Fails if no physical texture is bound, for example because its producer was culled.
    pub fn texture(&self, id: impl Into<TextureId>) -> Result<D::Texture> {
        let id = id.into();
        self.check_texture(id)?;
        let texture = self.resources.texture(id);
        texture
            .resource
            .clone()
            .ok_or_else(|| Error::NoResourceBound(texture.name.clone()).into())
    }

    /// Get the physical buffer behind any buffer id, like a [`BufferVertexId`] or [`BufferIndirectArgsId`].
    /// # Errors
    /// - Fails if this pass did not declare the buffer.
    /// - Fails if no physical buffer is bound.
    pub fn buffer(&self, id: impl Into<BufferId>) -> Result<D::Buffer> {
        let id = id.into();
        self.check_buffer(id)?;
        let buffer = self.resources.buffer(id);
        buffer
            .resource
            .clone()
            .ok_or_else(|| Error::NoResourceBound(buffer.name.clone()).into())
    }

    pub fn render_target(&self, id: RenderTargetId) -> Result<D::View> {
        self.texture_view(id.resource, id.view)
    }

    pub fn depth_stencil(&self, id: DepthStencilId) -> Result<D::View> {
        self.texture_view(id.resource, id.view)
    }

    /// Shader resource view of a texture.
    pub fn read_only_texture(&self, id: TextureReadOnlyId) -> Result<D::View> {
        self.texture_view(id.resource, id.view)
    }

    /// Unordered access view of a texture.
    pub fn read_write_texture(&self, id: TextureReadWriteId) -> Result<D::View> {
        self.texture_view(id.resource, id.view)
    }

    /// Shader resource view of a buffer.
    pub fn read_only_buffer(&self, id: BufferReadOnlyId) -> Result<D::View> {
        self.buffer_view(id.resource, id.view)
    }

    /// Unordered access view of a buffer.
    pub fn read_write_buffer(&self, id: BufferReadWriteId) -> Result<D::View> {
        self.buffer_view(id.resource, id.view)
    }
}
