//! Traits that connect the render graph to a graphics backend.
//!
//! The graph never talks to a graphics API directly. Physical resources, views and barriers are requested through
//! a [`Device`] and recorded into its [`CommandList`]. Handles returned by the device are treated as opaque values
//! that are cheap to clone, similar to reference-counted or index-based GPU handles.

use std::fmt::Debug;

use anyhow::Result;

use crate::core::render_pass::RenderPassDesc;
use crate::resource::desc::{BufferDesc, BufferSubresourceDesc, TextureDesc, TextureSubresourceDesc};
use crate::resource::state::ResourceState;

/// The type of a resource view (descriptor) the graph can request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ViewType {
    /// Read-only shader view (SRV).
    ShaderResource,
    /// Read-write shader view (UAV).
    UnorderedAccess,
    /// Render target view (RTV). Textures only.
    RenderTarget,
    /// Depth stencil view (DSV). Textures only.
    DepthStencil,
}

/// The graphics device the render graph allocates physical resources and views from.
pub trait Device: Sized {
    /// Handle to a physical texture.
    type Texture: Clone + PartialEq + Debug;
    /// Handle to a physical buffer.
    type Buffer: Clone + PartialEq + Debug;
    /// Handle to a resource view (descriptor).
    type View: Clone + Debug;
    /// Command recording context passes record into.
    type CommandList: CommandList<Self>;

    /// Create a new physical texture. Errors are propagated to the caller unchanged.
    fn create_texture(&self, desc: &TextureDesc) -> Result<Self::Texture>;
    /// Create a new physical buffer. Errors are propagated to the caller unchanged.
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Self::Buffer>;
    /// Destroy a texture previously created by this device.
    fn destroy_texture(&self, texture: Self::Texture);
    /// Destroy a buffer previously created by this device.
    fn destroy_buffer(&self, buffer: Self::Buffer);

    /// Create a view of (part of) a texture.
    fn create_texture_view(
        &self,
        texture: &Self::Texture,
        desc: &TextureSubresourceDesc,
        view_type: ViewType,
    ) -> Result<Self::View>;

    /// Create a view of (part of) a buffer. Read-write views may carry an append/consume counter buffer.
    fn create_buffer_view(
        &self,
        buffer: &Self::Buffer,
        desc: &BufferSubresourceDesc,
        view_type: ViewType,
        counter: Option<&Self::Buffer>,
    ) -> Result<Self::View>;

    /// Free a view created by this device.
    fn free_view(&self, view: Self::View, view_type: ViewType);

    /// Attach a debug name to a texture.
    fn set_texture_name(&self, _texture: &Self::Texture, _name: &str) {}

    /// Attach a debug name to a buffer.
    fn set_buffer_name(&self, _buffer: &Self::Buffer, _name: &str) {}
}

/// Command recording interface used by the graph to insert barriers and render passes.
/// Pass callbacks receive the concrete command list type and can use anything else it exposes.
pub trait CommandList<D: Device> {
    /// Queue a state transition for a texture. Queued barriers are submitted on [`CommandList::flush_barriers`].
    fn texture_barrier(&mut self, texture: &D::Texture, before: ResourceState, after: ResourceState);
    /// Queue a state transition for a buffer.
    fn buffer_barrier(&mut self, buffer: &D::Buffer, before: ResourceState, after: ResourceState);
    /// Submit all queued barriers.
    fn flush_barriers(&mut self);
    /// Begin a render pass.
    fn begin_render_pass(&mut self, desc: &RenderPassDesc<D>);
    /// End the current render pass.
    fn end_render_pass(&mut self);

    /// Open a debug label region. Only called with the `debug-markers` feature.
    fn begin_label(&mut self, _name: &str, _color: Option<[f32; 4]>) {}

    /// Close the last opened debug label region.
    fn end_label(&mut self) {}
}
