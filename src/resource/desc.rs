//! Descriptions of physical textures, buffers and the subresource ranges views are created for.
//!
//! Descriptions are compared for equality when the [`ResourcePool`](crate::ResourcePool) looks for a reusable resource,
//! so every field, including accumulated bind flags and the initial state, is part of the pool key.

use crate::resource::state::{BindFlags, ResourceState};

/// Dimensionality of a texture.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum TextureType {
    Texture1D,
    #[default]
    Texture2D,
    Texture3D,
}

/// Texel and element formats.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Format {
    #[default]
    Unknown,
    R8G8B8A8Unorm,
    R8G8B8A8Srgb,
    B8G8R8A8Unorm,
    B8G8R8A8Srgb,
    R10G10B10A2Unorm,
    R11G11B10Float,
    R16G16B16A16Float,
    R32G32B32A32Float,
    R16G16Float,
    R32G32Float,
    R8Unorm,
    R16Float,
    R32Float,
    R32Uint,
    D16Unorm,
    D24UnormS8Uint,
    D32Float,
    D32FloatS8X24Uint,
}

impl Format {
    /// Returns true if this is a depth or depth stencil format.
    pub fn is_depth(&self) -> bool {
        matches!(self, Format::D16Unorm | Format::D24UnormS8Uint | Format::D32Float | Format::D32FloatS8X24Uint)
    }
}

/// Optimized clear value of a texture.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub enum ClearValue {
    #[default]
    None,
    Color([f32; 4]),
    DepthStencil {
        depth: f32,
        stencil: u8,
    },
}

/// Description of a physical texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub texture_type: TextureType,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub array_size: u32,
    pub mip_levels: u32,
    pub sample_count: u32,
    pub format: Format,
    pub clear_value: ClearValue,
    pub bind_flags: BindFlags,
    /// State the texture is in right after creation. For declared textures this is filled in by the first
    /// pass that uses it, for imported textures it is the state the caller guarantees at import time.
    pub initial_state: ResourceState,
}

impl Default for TextureDesc {
    fn default() -> Self {
        Self {
            texture_type: TextureType::Texture2D,
            width: 0,
            height: 0,
            depth: 1,
            array_size: 1,
            mip_levels: 1,
            sample_count: 1,
            format: Format::Unknown,
            clear_value: ClearValue::None,
            bind_flags: BindFlags::empty(),
            initial_state: ResourceState::COMMON,
        }
    }
}

impl TextureDesc {
    /// Shorthand for a single-mip 2D texture.
    pub fn new_2d(width: u32, height: u32, format: Format) -> Self {
        Self {
            width,
            height,
            format,
            ..Default::default()
        }
    }

    /// Set the optimized clear value.
    pub fn with_clear_value(mut self, clear_value: ClearValue) -> Self {
        self.clear_value = clear_value;
        self
    }
}

/// Description of a physical buffer. Buffers are always created in [`ResourceState::COMMON`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BufferDesc {
    pub size: u64,
    /// Element stride for structured buffers, 0 for raw or typed buffers.
    pub stride: u32,
    pub format: Format,
    pub bind_flags: BindFlags,
}

impl BufferDesc {
    /// A plain buffer of `size` bytes.
    pub fn new(size: u64) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    /// A structured buffer holding `count` elements of `stride` bytes.
    ///
    /// The size saturates at `u64::MAX` instead of overflowing. No device can allocate that, so creating the buffer fails.
    pub fn structured(count: u64, stride: u32) -> Self {
        Self {
            size: count.saturating_mul(u64::from(stride)),
            stride,
            ..Default::default()
        }
    }
}

/// Range of mips and array slices a texture view covers. The default covers the whole texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureSubresourceDesc {
    pub first_mip: u32,
    /// Number of mips, or `u32::MAX` for all remaining mips.
    pub mip_count: u32,
    pub first_slice: u32,
    /// Number of array slices, or `u32::MAX` for all remaining slices.
    pub slice_count: u32,
}

impl Default for TextureSubresourceDesc {
    fn default() -> Self {
        Self {
            first_mip: 0,
            mip_count: u32::MAX,
            first_slice: 0,
            slice_count: u32::MAX,
        }
    }
}

impl TextureSubresourceDesc {
    /// A view of a single mip level, all slices.
    pub fn mip(level: u32) -> Self {
        Self {
            first_mip: level,
            mip_count: 1,
            ..Default::default()
        }
    }
}

/// Byte range a buffer view covers. The default covers the whole buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BufferSubresourceDesc {
    pub offset: u64,
    /// Size in bytes, or `u64::MAX` for the rest of the buffer.
    pub size: u64,
}

impl Default for BufferSubresourceDesc {
    fn default() -> Self {
        Self {
            offset: 0,
            size: u64::MAX,
        }
    }
}

static_assertions::assert_impl_all!(TextureDesc: Send, Sync);
static_assertions::assert_impl_all!(BufferDesc: Send, Sync);
