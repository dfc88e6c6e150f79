//! Typed handles to graph resources and their views.
//!
//! Ids are dense indices into the graph that created them. They are only meaningful for that graph instance and
//! become invalid once it is executed and dropped.

/// Handle to a texture registered in a render graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub(crate) usize);

/// Handle to a buffer registered in a render graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub(crate) usize);

impl TextureId {
    /// Dense index of this texture in its graph.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl BufferId {
    /// Dense index of this buffer in its graph.
    pub fn index(&self) -> usize {
        self.0
    }
}

// Handles that only grant access to the physical resource.
macro_rules! resource_usage_ids {
    ($($(#[$meta:meta])* $name:ident => $resource:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
            pub struct $name(pub(crate) $resource);

            impl $name {
                /// The resource this handle refers to.
                pub fn resource(&self) -> $resource {
                    self.0
                }
            }

            impl From<$name> for $resource {
                fn from(value: $name) -> Self {
                    value.0
                }
            }
        )*
    };
}

// Handles to a view of a resource.
macro_rules! resource_view_ids {
    ($($(#[$meta:meta])* $name:ident => $resource:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
            pub struct $name {
                pub(crate) resource: $resource,
                pub(crate) view: usize,
            }

            impl $name {
                pub(crate) fn new(resource: $resource, view: usize) -> Self {
                    Self {
                        resource,
                        view,
                    }
                }

                /// The resource this view belongs to.
                pub fn resource(&self) -> $resource {
                    self.resource
                }

                /// Index of the view among all views requested for the resource.
                pub fn view_index(&self) -> usize {
                    self.view
                }
            }

            impl From<$name> for $resource {
                fn from(value: $name) -> Self {
                    value.resource
                }
            }
        )*
    };
}

resource_usage_ids! {
    /// Texture used as the source of a copy.
    TextureCopySrcId => TextureId,
    /// Texture used as the destination of a copy.
    TextureCopyDstId => TextureId,
    /// Buffer used as the source of a copy.
    BufferCopySrcId => BufferId,
    /// Buffer used as the destination of a copy.
    BufferCopyDstId => BufferId,
    /// Buffer holding indirect draw or dispatch arguments.
    BufferIndirectArgsId => BufferId,
    /// Buffer bound as a vertex buffer.
    BufferVertexId => BufferId,
    /// Buffer bound as an index buffer.
    BufferIndexId => BufferId,
    /// Buffer bound as a constant buffer.
    BufferConstantId => BufferId,
}

resource_view_ids! {
    /// Render target view of a texture.
    RenderTargetId => TextureId,
    /// Depth stencil view of a texture.
    DepthStencilId => TextureId,
    /// Shader resource view of a texture.
    TextureReadOnlyId => TextureId,
    /// Unordered access view of a texture.
    TextureReadWriteId => TextureId,
    /// Shader resource view of a buffer.
    BufferReadOnlyId => BufferId,
    /// Unordered access view of a buffer.
    BufferReadWriteId => BufferId,
}

static_assertions::assert_impl_all!(TextureId: Send, Sync, Copy);
static_assertions::assert_impl_all!(BufferId: Send, Sync, Copy);
static_assertions::assert_impl_all!(RenderTargetId: Send, Sync, Copy);
