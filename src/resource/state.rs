//! GPU resource states and bind flags.

use bitflags::bitflags;

bitflags! {
    /// Describes how a resource is used by the GPU in a region of the frame. Read states may be combined,
    /// write states must appear alone. See [`ResourceState::is_valid_combination`].
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ResourceState: u32 {
        const COMMON = 0;
        const VERTEX_AND_CONSTANT_BUFFER = 1 << 0;
        const INDEX_BUFFER = 1 << 1;
        const RENDER_TARGET = 1 << 2;
        const UNORDERED_ACCESS = 1 << 3;
        const DEPTH_WRITE = 1 << 4;
        const DEPTH_READ = 1 << 5;
        const NON_PIXEL_SHADER_RESOURCE = 1 << 6;
        const PIXEL_SHADER_RESOURCE = 1 << 7;
        const INDIRECT_ARGUMENT = 1 << 8;
        const COPY_DEST = 1 << 9;
        const COPY_SOURCE = 1 << 10;
        const PRESENT = 1 << 11;
        const ALL_SHADER_RESOURCE = Self::NON_PIXEL_SHADER_RESOURCE.bits() | Self::PIXEL_SHADER_RESOURCE.bits();
        const GENERIC_READ = Self::VERTEX_AND_CONSTANT_BUFFER.bits()
            | Self::INDEX_BUFFER.bits()
            | Self::ALL_SHADER_RESOURCE.bits()
            | Self::INDIRECT_ARGUMENT.bits()
            | Self::COPY_SOURCE.bits();
    }
}

bitflags! {
    /// Ways a resource can be bound to the pipeline. Accumulated on the resource description while passes declare usage.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct BindFlags: u32 {
        const SHADER_RESOURCE = 1 << 0;
        const RENDER_TARGET = 1 << 1;
        const DEPTH_STENCIL = 1 << 2;
        const UNORDERED_ACCESS = 1 << 3;
    }
}

const WRITE_STATES: ResourceState = ResourceState::RENDER_TARGET
    .union(ResourceState::UNORDERED_ACCESS)
    .union(ResourceState::DEPTH_WRITE)
    .union(ResourceState::COPY_DEST);

impl ResourceState {
    /// Returns true if this state includes a state the GPU writes in.
    pub fn is_write(&self) -> bool {
        self.intersects(WRITE_STATES)
    }

    /// Returns true if a resource can be in all states of this mask at once.
    /// Any number of read states can be combined, a write state can only be used on its own.
    ///
    /// # Example
    /// ```
    /// # use framegraph::prelude::*;
    /// assert!((ResourceState::PIXEL_SHADER_RESOURCE | ResourceState::COPY_SOURCE).is_valid_combination());
    /// assert!(!(ResourceState::RENDER_TARGET | ResourceState::PIXEL_SHADER_RESOURCE).is_valid_combination());
    /// ```
    pub fn is_valid_combination(&self) -> bool {
        !self.is_write() || self.bits().count_ones() == 1
    }
}

impl Default for ResourceState {
    fn default() -> Self {
        ResourceState::COMMON
    }
}

impl Default for BindFlags {
    fn default() -> Self {
        BindFlags::empty()
    }
}
