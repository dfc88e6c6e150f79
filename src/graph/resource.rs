//! Registry of all textures and buffers known to a render graph, together with the views requested for them.

use std::collections::HashMap;

use anyhow::Result;
use multimap::MultiMap;

use crate::core::device::{Device, ViewType};
use crate::core::error::Error;
use crate::graph::id::{BufferId, BufferReadWriteId, TextureId};
use crate::graph::virtual_resource::{VirtualBuffer, VirtualResource, VirtualTexture};
use crate::resource::desc::{BufferDesc, BufferSubresourceDesc, TextureDesc, TextureSubresourceDesc};

#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub(crate) struct ResourceRegistry<D: Device> {
    pub(crate) textures: Vec<VirtualTexture<D>>,
    pub(crate) buffers: Vec<VirtualBuffer<D>>,
    texture_names: HashMap<String, TextureId>,
    buffer_names: HashMap<String, BufferId>,
    texture_view_descs: MultiMap<TextureId, (TextureSubresourceDesc, ViewType)>,
    buffer_view_descs: MultiMap<BufferId, (BufferSubresourceDesc, ViewType)>,
    buffer_uav_counters: HashMap<BufferReadWriteId, BufferId>,
    texture_views: MultiMap<TextureId, (D::View, ViewType)>,
    buffer_views: MultiMap<BufferId, (D::View, ViewType)>,
}

impl<D: Device> ResourceRegistry<D> {
    pub(crate) fn new() -> Self {
        Self {
            textures: Vec::new(),
            buffers: Vec::new(),
            texture_names: HashMap::new(),
            buffer_names: HashMap::new(),
            texture_view_descs: MultiMap::new(),
            buffer_view_descs: MultiMap::new(),
            buffer_uav_counters: HashMap::new(),
            texture_views: MultiMap::new(),
            buffer_views: MultiMap::new(),
        }
    }

    fn add_texture(&mut self, texture: VirtualTexture<D>) -> Result<TextureId> {
        if self.texture_names.contains_key(&texture.name) {
            return Err(Error::DuplicateResource(texture.name).into());
        }
        let id = TextureId(self.textures.len());
        self.texture_names.insert(texture.name.clone(), id);
        self.textures.push(texture);
        Ok(id)
    }

    fn add_buffer(&mut self, buffer: VirtualBuffer<D>) -> Result<BufferId> {
        if self.buffer_names.contains_key(&buffer.name) {
            return Err(Error::DuplicateResource(buffer.name).into());
        }
        let id = BufferId(self.buffers.len());
        self.buffer_names.insert(buffer.name.clone(), id);
        self.buffers.push(buffer);
        Ok(id)
    }

    pub(crate) fn declare_texture(&mut self, name: &str, desc: TextureDesc) -> Result<TextureId> {
        self.add_texture(VirtualResource::declared(name, desc))
    }

    pub(crate) fn declare_buffer(&mut self, name: &str, desc: BufferDesc) -> Result<BufferId> {
        self.add_buffer(VirtualResource::declared(name, desc))
    }

    pub(crate) fn import_texture(&mut self, name: &str, texture: D::Texture, desc: TextureDesc) -> Result<TextureId> {
        self.add_texture(VirtualResource::imported(name, texture, desc))
    }

    pub(crate) fn import_buffer(&mut self, name: &str, buffer: D::Buffer, desc: BufferDesc) -> Result<BufferId> {
        self.add_buffer(VirtualResource::imported(name, buffer, desc))
    }

    pub(crate) fn is_texture_declared(&self, name: &str) -> bool {
        self.texture_names.contains_key(name)
    }

    pub(crate) fn is_buffer_declared(&self, name: &str) -> bool {
        self.buffer_names.contains_key(name)
    }

    pub(crate) fn texture_id(&self, name: &str) -> Result<TextureId> {
        self.texture_names
            .get(name)
            .copied()
            .ok_or_else(|| Error::UndeclaredResource(name.to_owned()).into())
    }

    pub(crate) fn buffer_id(&self, name: &str) -> Result<BufferId> {
        self.buffer_names
            .get(name)
            .copied()
            .ok_or_else(|| Error::UndeclaredResource(name.to_owned()).into())
    }

    /// Like [`Self::texture`], but fails for ids this graph never handed out.
    pub(crate) fn get_texture(&self, id: TextureId) -> Result<&VirtualTexture<D>> {
        self.textures.get(id.0).ok_or_else(|| {
            Error::InvalidResourceId {
                kind: "texture",
                index: id.0,
            }
            .into()
        })
    }

    pub(crate) fn get_buffer(&self, id: BufferId) -> Result<&VirtualBuffer<D>> {
        self.buffers.get(id.0).ok_or_else(|| {
            Error::InvalidResourceId {
                kind: "buffer",
                index: id.0,
            }
            .into()
        })
    }

    pub(crate) fn texture(&self, id: TextureId) -> &VirtualTexture<D> {
        &self.textures[id.0]
    }

    pub(crate) fn texture_mut(&mut self, id: TextureId) -> &mut VirtualTexture<D> {
        &mut self.textures[id.0]
    }

    pub(crate) fn buffer(&self, id: BufferId) -> &VirtualBuffer<D> {
        &self.buffers[id.0]
    }

    pub(crate) fn buffer_mut(&mut self, id: BufferId) -> &mut VirtualBuffer<D> {
        &mut self.buffers[id.0]
    }

    /// Request a view of a texture, returning the index of an identical earlier request if there is one.
    pub(crate) fn request_texture_view(&mut self, id: TextureId, desc: TextureSubresourceDesc, view_type: ViewType) -> usize {
        if let Some(views) = self.texture_view_descs.get_vec(&id) {
            if let Some(index) = views.iter().position(|view| *view == (desc, view_type)) {
                return index;
            }
        }
        let index = self.texture_view_descs.get_vec(&id).map_or(0, |views| views.len());
        self.texture_view_descs.insert(id, (desc, view_type));
        index
    }

    /// Request a view of a buffer. Read-write views with a counter only match requests with the same counter.
    /// # Errors
    /// - Fails if `view_type` is a render target or depth stencil view.
    pub(crate) fn request_buffer_view(
        &mut self,
        id: BufferId,
        desc: BufferSubresourceDesc,
        view_type: ViewType,
        counter: Option<BufferId>,
    ) -> Result<usize> {
        if matches!(view_type, ViewType::RenderTarget | ViewType::DepthStencil) {
            return Err(Error::InvalidViewType {
                name: self.buffer(id).name.clone(),
                kind: "buffer",
                view: view_type,
            }
            .into());
        }
        if let Some(views) = self.buffer_view_descs.get_vec(&id) {
            let existing = views.iter().enumerate().position(|(index, view)| {
                *view == (desc, view_type) && self.buffer_uav_counters.get(&BufferReadWriteId::new(id, index)).copied() == counter
            });
            if let Some(index) = existing {
                return Ok(index);
            }
        }
        let index = self.buffer_view_descs.get_vec(&id).map_or(0, |views| views.len());
        self.buffer_view_descs.insert(id, (desc, view_type));
        if let Some(counter) = counter {
            self.buffer_uav_counters.insert(BufferReadWriteId::new(id, index), counter);
        }
        Ok(index)
    }

    /// Create all requested views of a texture that has a physical resource bound.
    pub(crate) fn create_texture_views(&mut self, device: &D, id: TextureId) -> Result<()> {
        let Some(descs) = self.texture_view_descs.get_vec(&id) else {
            return Ok(());
        };
        let texture = self.textures[id.0]
            .resource
            .as_ref()
            .ok_or_else(|| Error::NoResourceBound(self.textures[id.0].name.clone()))?;
        for (desc, view_type) in descs {
            let view = device.create_texture_view(texture, desc, *view_type)?;
            trace!("Created {view_type:?} view {view:?} for texture `{}`", self.textures[id.0].name);
            self.texture_views.insert(id, (view, *view_type));
        }
        Ok(())
    }

    /// Create all requested views of a buffer that has a physical resource bound.
    pub(crate) fn create_buffer_views(&mut self, device: &D, id: BufferId) -> Result<()> {
        let Some(descs) = self.buffer_view_descs.get_vec(&id) else {
            return Ok(());
        };
        let buffer = self.buffers[id.0]
            .resource
            .as_ref()
            .ok_or_else(|| Error::NoResourceBound(self.buffers[id.0].name.clone()))?;
        for (index, (desc, view_type)) in descs.iter().enumerate() {
            let counter = match self.buffer_uav_counters.get(&BufferReadWriteId::new(id, index)) {
                Some(counter) => {
                    let counter = &self.buffers[counter.0];
                    Some(counter.resource.as_ref().ok_or_else(|| Error::NoResourceBound(counter.name.clone()))?)
                }
                None => None,
            };
            let view = device.create_buffer_view(buffer, desc, *view_type, counter)?;
            trace!("Created {view_type:?} view {view:?} for buffer `{}`", self.buffers[id.0].name);
            self.buffer_views.insert(id, (view, *view_type));
        }
        Ok(())
    }

    pub(crate) fn texture_view(&self, id: TextureId, view: usize) -> Result<D::View> {
        let texture = self.get_texture(id)?;
        if texture.resource.is_none() {
            return Err(Error::NoResourceBound(texture.name.clone()).into());
        }
        self.texture_views
            .get_vec(&id)
            .and_then(|views| views.get(view))
            .map(|(view, _)| view.clone())
            .ok_or_else(|| Error::NoResourceBound(texture.name.clone()).into())
    }

    pub(crate) fn buffer_view(&self, id: BufferId, view: usize) -> Result<D::View> {
        let buffer = self.get_buffer(id)?;
        if buffer.resource.is_none() {
            return Err(Error::NoResourceBound(buffer.name.clone()).into());
        }
        self.buffer_views
            .get_vec(&id)
            .and_then(|views| views.get(view))
            .map(|(view, _)| view.clone())
            .ok_or_else(|| Error::NoResourceBound(buffer.name.clone()).into())
    }

    /// Return every created view to the device.
    pub(crate) fn free_views(&mut self, device: &D) {
        let texture_views = std::mem::replace(&mut self.texture_views, MultiMap::new());
        let buffer_views = std::mem::replace(&mut self.buffer_views, MultiMap::new());
        let texture_views = texture_views.into_iter().flat_map(|(_, views)| views);
        let buffer_views = buffer_views.into_iter().flat_map(|(_, views)| views);
        for (view, view_type) in texture_views.chain(buffer_views) {
            device.free_view(view, view_type);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::device::CommandList;
    use crate::core::render_pass::RenderPassDesc;
    use crate::graph::blackboard::Blackboard;
    use crate::graph::context::RenderGraphContext;
    use crate::graph::id::TextureReadOnlyId;
    use crate::graph::pass::{PassFlags, PassNode, PassType};
    use crate::resource::state::ResourceState;

    struct NullDevice;

    struct NullCommandList;

    impl CommandList<NullDevice> for NullCommandList {
        fn texture_barrier(&mut self, _: &u32, _: ResourceState, _: ResourceState) {}
        fn buffer_barrier(&mut self, _: &u32, _: ResourceState, _: ResourceState) {}
        fn flush_barriers(&mut self) {}
        fn begin_render_pass(&mut self, _: &RenderPassDesc<NullDevice>) {}
        fn end_render_pass(&mut self) {}
    }

    impl Device for NullDevice {
        type Texture = u32;
        type Buffer = u32;
        type View = u32;
        type CommandList = NullCommandList;

        fn create_texture(&self, _: &TextureDesc) -> Result<u32> {
            Ok(0)
        }

        fn create_buffer(&self, _: &BufferDesc) -> Result<u32> {
            Ok(0)
        }

        fn destroy_texture(&self, _: u32) {}

        fn destroy_buffer(&self, _: u32) {}

        fn create_texture_view(&self, _: &u32, _: &TextureSubresourceDesc, _: ViewType) -> Result<u32> {
            Ok(0)
        }

        fn create_buffer_view(&self, _: &u32, _: &BufferSubresourceDesc, _: ViewType, _: Option<&u32>) -> Result<u32> {
            Ok(0)
        }

        fn free_view(&self, _: u32, _: ViewType) {}
    }

    #[test]
    fn buffer_render_target_view_is_rejected() -> Result<()> {
        let mut registry = ResourceRegistry::<NullDevice>::new();
        let id = registry.declare_buffer("particles", BufferDesc::new(256))?;
        for view_type in [ViewType::RenderTarget, ViewType::DepthStencil] {
            let err = registry
                .request_buffer_view(id, BufferSubresourceDesc::default(), view_type, None)
                .unwrap_err();
            assert!(matches!(
                err.downcast_ref::<Error>(),
                Some(Error::InvalidViewType {
                    kind: "buffer",
                    ..
                })
            ));
        }
        Ok(())
    }

    #[test]
    fn identical_view_requests_are_shared() -> Result<()> {
        let mut registry = ResourceRegistry::<NullDevice>::new();
        let id = registry.declare_texture("hdr", TextureDesc::default())?;
        let srv = registry.request_texture_view(id, TextureSubresourceDesc::default(), ViewType::ShaderResource);
        let mip = registry.request_texture_view(id, TextureSubresourceDesc::mip(1), ViewType::ShaderResource);
        let uav = registry.request_texture_view(id, TextureSubresourceDesc::default(), ViewType::UnorderedAccess);
        assert_eq!(srv, registry.request_texture_view(id, TextureSubresourceDesc::default(), ViewType::ShaderResource));
        assert_ne!(srv, mip);
        assert_ne!(srv, uav);
        Ok(())
    }

    #[test]
    fn counter_is_part_of_buffer_view_identity() -> Result<()> {
        let mut registry = ResourceRegistry::<NullDevice>::new();
        let id = registry.declare_buffer("list", BufferDesc::new(1024))?;
        let counter = registry.declare_buffer("list_counter", BufferDesc::new(4))?;
        let plain = registry.request_buffer_view(id, BufferSubresourceDesc::default(), ViewType::UnorderedAccess, None)?;
        let counted = registry.request_buffer_view(id, BufferSubresourceDesc::default(), ViewType::UnorderedAccess, Some(counter))?;
        assert_ne!(plain, counted);
        assert_eq!(
            counted,
            registry.request_buffer_view(id, BufferSubresourceDesc::default(), ViewType::UnorderedAccess, Some(counter))?
        );
        Ok(())
    }

    #[test]
    fn duplicate_names_are_rejected() -> Result<()> {
        let mut registry = ResourceRegistry::<NullDevice>::new();
        registry.declare_texture("depth", TextureDesc::default())?;
        let err = registry.import_texture("depth", 7, TextureDesc::default()).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::DuplicateResource(name)) if name == "depth"));
        // Textures and buffers live in separate namespaces.
        registry.declare_buffer("depth", BufferDesc::new(4))?;
        Ok(())
    }

    #[test]
    fn released_texture_no_longer_resolves() -> Result<()> {
        let mut registry = ResourceRegistry::<NullDevice>::new();
        let id = registry.declare_texture("history", TextureDesc::default())?;
        let view = registry.request_texture_view(id, TextureSubresourceDesc::default(), ViewType::ShaderResource);
        registry.texture_mut(id).resource = Some(3);
        registry.create_texture_views(&NullDevice, id)?;

        let mut pass = PassNode::new("late".to_owned(), PassType::Compute, PassFlags::FORCE_NO_CULL);
        pass.texture_reads.insert(id);
        pass.texture_views.insert((id, view));
        let srv = TextureReadOnlyId::new(id, view);
        let mut blackboard = Blackboard::new();
        {
            let ctx = RenderGraphContext {
                resources: &registry,
                pass: &pass,
                blackboard: &mut blackboard,
            };
            assert_eq!(ctx.texture(id)?, 3);
            ctx.read_only_texture(srv)?;
        }

        // Handed back to the pool after its last use.
        registry.texture_mut(id).resource = None;
        let ctx = RenderGraphContext {
            resources: &registry,
            pass: &pass,
            blackboard: &mut blackboard,
        };
        for err in [ctx.texture(id).unwrap_err(), ctx.read_only_texture(srv).unwrap_err()] {
            assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NoResourceBound(name)) if name == "history"));
        }
        Ok(())
    }

    #[test]
    fn out_of_range_ids_are_errors() -> Result<()> {
        let mut registry = ResourceRegistry::<NullDevice>::new();
        registry.declare_texture("hdr", TextureDesc::default())?;
        let err = registry.texture_view(TextureId(5), 0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InvalidResourceId {
                kind: "texture",
                index: 5
            })
        ));
        let err = registry.buffer_view(BufferId(0), 0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InvalidResourceId {
                kind: "buffer",
                index: 0
            })
        ));
        Ok(())
    }
}
