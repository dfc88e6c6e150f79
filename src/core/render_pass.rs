//! Render pass descriptions handed to [`CommandList::begin_render_pass`](crate::core::device::CommandList::begin_render_pass).

use crate::core::device::Device;
use crate::resource::desc::Format;

/// What happens to the contents of an attachment when the render pass begins.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum LoadOp {
    /// Clear to the clear value stored in the texture description.
    Clear,
    /// Contents are undefined.
    Discard,
    /// Keep the previous contents.
    Preserve,
    /// The attachment is not accessed.
    #[default]
    NoAccess,
}

/// What happens to the contents of an attachment when the render pass ends.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// Write the results back to the resource.
    Preserve,
    /// Results may be thrown away.
    Discard,
    /// Resolve multisampled contents.
    Resolve,
    /// The attachment is not accessed.
    #[default]
    NoAccess,
}

/// Combined load and store operation for one attachment aspect.
///
/// # Example
/// ```
/// # use framegraph::prelude::*;
/// let ops = AttachmentOps::CLEAR_PRESERVE;
/// assert_eq!(ops.load, LoadOp::Clear);
/// assert_eq!(ops.store, StoreOp::Preserve);
/// ```
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct AttachmentOps {
    pub load: LoadOp,
    pub store: StoreOp,
}

impl AttachmentOps {
    pub const CLEAR_PRESERVE: Self = Self::new(LoadOp::Clear, StoreOp::Preserve);
    pub const CLEAR_DISCARD: Self = Self::new(LoadOp::Clear, StoreOp::Discard);
    pub const PRESERVE_PRESERVE: Self = Self::new(LoadOp::Preserve, StoreOp::Preserve);
    pub const PRESERVE_DISCARD: Self = Self::new(LoadOp::Preserve, StoreOp::Discard);
    pub const DISCARD_PRESERVE: Self = Self::new(LoadOp::Discard, StoreOp::Preserve);
    pub const CLEAR_RESOLVE: Self = Self::new(LoadOp::Clear, StoreOp::Resolve);
    pub const NO_ACCESS: Self = Self::new(LoadOp::NoAccess, StoreOp::NoAccess);

    pub const fn new(load: LoadOp, store: StoreOp) -> Self {
        Self {
            load,
            store,
        }
    }
}

/// A color attachment of a render pass.
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""))]
pub struct ColorAttachment<D: Device> {
    pub view: D::View,
    pub format: Format,
    pub ops: AttachmentOps,
    /// Clear color, taken from the texture description.
    pub clear_color: Option<[f32; 4]>,
}

/// The depth stencil attachment of a render pass.
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""))]
pub struct DepthAttachment<D: Device> {
    pub view: D::View,
    pub format: Format,
    pub depth_ops: AttachmentOps,
    pub stencil_ops: AttachmentOps,
    /// Clear depth and stencil, taken from the texture description.
    pub clear_depth_stencil: Option<(f32, u8)>,
    /// The depth attachment is only read, never written.
    pub read_only: bool,
}

/// Full description of a render pass, built by the graph for every graphics pass that did not opt out
/// of automatic render pass setup.
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""))]
pub struct RenderPassDesc<D: Device> {
    pub name: String,
    pub color_attachments: Vec<ColorAttachment<D>>,
    pub depth_attachment: Option<DepthAttachment<D>>,
    pub width: u32,
    pub height: u32,
    /// Shaders in this render pass may write to unordered access views.
    pub allow_uav_writes: bool,
    /// Use the backend's legacy (non render pass) path for binding attachments.
    pub legacy: bool,
}
