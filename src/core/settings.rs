//! Exposes the structs holding graph and pool configuration.

/// Number of frames a released pooled resource is kept alive before it is destroyed.
pub const DEFAULT_GRACE_FRAMES: u64 = 3;

/// Settings for a single render graph instance. Create one using a [`GraphSettingsBuilder`].
#[derive(Debug, Clone)]
pub struct GraphSettings {
    /// Whether unreferenced passes are removed before execution. Disabling this never changes what non-culled passes
    /// observe, it only costs GPU time.
    pub cull_passes: bool,
    /// Whether physical resources are labelled with their graph name through [`Device::set_texture_name`](crate::Device::set_texture_name)
    /// and [`Device::set_buffer_name`](crate::Device::set_buffer_name) when allocated.
    pub name_resources: bool,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            cull_passes: true,
            name_resources: true,
        }
    }
}

/// Settings for a [`ResourcePool`](crate::ResourcePool).
///
/// # Example
/// ```
/// # use framegraph::prelude::*;
/// let settings = PoolSettings {
///     grace_frames: 5,
/// };
/// ```
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// A released resource is destroyed in [`ResourcePool::tick()`](crate::ResourcePool::tick) once it has been inactive for more than this many frames.
    pub grace_frames: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            grace_frames: DEFAULT_GRACE_FRAMES,
        }
    }
}

/// Builder for [`GraphSettings`].
///
/// # Example
/// ```
/// # use framegraph::prelude::*;
/// let settings = GraphSettingsBuilder::new()
///     .cull_passes(false)
///     .name_resources(true)
///     .build();
/// assert!(!settings.cull_passes);
/// ```
#[derive(Debug, Default)]
pub struct GraphSettingsBuilder {
    inner: GraphSettings,
}

impl GraphSettingsBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable pass culling.
    pub fn cull_passes(mut self, cull: bool) -> Self {
        self.inner.cull_passes = cull;
        self
    }

    /// Enable or disable naming pooled resources after their graph name.
    pub fn name_resources(mut self, name: bool) -> Self {
        self.inner.name_resources = name;
        self
    }

    /// Obtain the built settings.
    pub fn build(self) -> GraphSettings {
        self.inner
    }
}
