//! Logical resources tracked by a render graph.

use crate::core::device::Device;
use crate::resource::desc::{BufferDesc, TextureDesc};
use crate::resource::state::ResourceState;

/// Exposes the state a resource is in while it is not used by the graph.
pub(crate) trait ResourceDescription {
    /// State the physical resource is in right after creation, and the state it is returned in.
    fn resting_state(&self) -> ResourceState;
}

impl ResourceDescription for TextureDesc {
    fn resting_state(&self) -> ResourceState {
        self.initial_state
    }
}

impl ResourceDescription for BufferDesc {
    fn resting_state(&self) -> ResourceState {
        ResourceState::COMMON
    }
}

/// A texture or buffer registered in a graph. Either declared by a pass, in which case the physical
/// resource is borrowed from the pool while the resource is alive, or imported with a physical resource
/// owned by the caller.
#[derive(Debug)]
pub(crate) struct VirtualResource<R, Desc> {
    pub(crate) name: String,
    pub(crate) desc: Desc,
    pub(crate) imported: bool,
    pub(crate) resource: Option<R>,
    /// Pass that declared this resource.
    pub(crate) creator: Option<usize>,
    /// Pass that writes this resource. There is at most one.
    pub(crate) writer: Option<usize>,
    /// Number of non-culled passes reading this resource, plus one for imported resources. Filled in by culling.
    pub(crate) ref_count: usize,
    pub(crate) last_used_by: Option<usize>,
}

pub(crate) type VirtualTexture<D> = VirtualResource<<D as Device>::Texture, TextureDesc>;
pub(crate) type VirtualBuffer<D> = VirtualResource<<D as Device>::Buffer, BufferDesc>;

impl<R, Desc: ResourceDescription> VirtualResource<R, Desc> {
    pub(crate) fn declared(name: impl Into<String>, desc: Desc) -> Self {
        Self {
            name: name.into(),
            desc,
            imported: false,
            resource: None,
            creator: None,
            writer: None,
            ref_count: 0,
            last_used_by: None,
        }
    }

    pub(crate) fn imported(name: impl Into<String>, resource: R, desc: Desc) -> Self {
        Self {
            resource: Some(resource),
            imported: true,
            ..Self::declared(name, desc)
        }
    }

    pub(crate) fn resting_state(&self) -> ResourceState {
        self.desc.resting_state()
    }
}
