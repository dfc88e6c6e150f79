//! Cross-frame pool of physical textures and buffers.
//!
//! Render graphs are rebuilt every frame, but the physical resources behind them rarely change. The pool keeps
//! released resources around for a few frames so the next graph can reuse them instead of allocating again.
//! A pool is cheap to clone and all clones share the same storage, so it can be handed to every frame's graph.

use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::core::device::Device;
use crate::core::error::Error;
use crate::core::settings::PoolSettings;
use crate::resource::desc::{BufferDesc, TextureDesc};

#[derive(Debug)]
struct PoolEntry<R, Desc> {
    resource: R,
    desc: Desc,
    last_used_frame: u64,
    active: bool,
}

type PooledTextures<D> = Vec<PoolEntry<<D as Device>::Texture, TextureDesc>>;
type PooledBuffers<D> = Vec<PoolEntry<<D as Device>::Buffer, BufferDesc>>;

struct PoolInner<D: Device> {
    device: Arc<D>,
    textures: PooledTextures<D>,
    buffers: PooledBuffers<D>,
    frame_index: u64,
    grace_frames: u64,
}

/// Pool of physical GPU resources, keyed by description equality.
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub struct ResourcePool<D: Device> {
    #[derivative(Debug = "ignore")]
    device: Arc<D>,
    #[derivative(Debug = "ignore")]
    inner: Arc<Mutex<PoolInner<D>>>,
}

fn acquire<R: Clone, Desc: PartialEq + Clone>(
    entries: &mut Vec<PoolEntry<R, Desc>>,
    desc: &Desc,
    frame: u64,
    create: impl FnOnce(&Desc) -> Result<R>,
) -> Result<(R, bool)> {
    if let Some(entry) = entries.iter_mut().find(|entry| !entry.active && entry.desc == *desc) {
        entry.active = true;
        entry.last_used_frame = frame;
        return Ok((entry.resource.clone(), false));
    }

    let resource = create(desc)?;
    entries.push(PoolEntry {
        resource: resource.clone(),
        desc: desc.clone(),
        last_used_frame: frame,
        active: true,
    });
    Ok((resource, true))
}

fn release<R: PartialEq, Desc>(entries: &mut [PoolEntry<R, Desc>], resource: &R, frame: u64) -> bool {
    match entries.iter_mut().find(|entry| entry.active && entry.resource == *resource) {
        Some(entry) => {
            entry.active = false;
            entry.last_used_frame = frame;
            true
        }
        None => false,
    }
}

fn age_out<R, Desc>(entries: &mut Vec<PoolEntry<R, Desc>>, frame: u64, grace: u64, mut destroy: impl FnMut(R)) {
    let mut i = 0;
    while i < entries.len() {
        let entry = &entries[i];
        if !entry.active && entry.last_used_frame + grace < frame {
            destroy(entries.swap_remove(i).resource);
        } else {
            i += 1;
        }
    }
}

impl<D: Device> ResourcePool<D> {
    /// Create a new pool allocating from `device`, using the default grace period.
    pub fn new(device: D) -> Self {
        Self::with_settings(device, PoolSettings::default())
    }

    /// Create a new pool with custom settings.
    pub fn with_settings(device: D, settings: PoolSettings) -> Self {
        let device = Arc::new(device);
        Self {
            device: device.clone(),
            inner: Arc::new(Mutex::new(PoolInner {
                device,
                textures: Vec::new(),
                buffers: Vec::new(),
                frame_index: 0,
                grace_frames: settings.grace_frames,
            })),
        }
    }

    /// The device this pool allocates from.
    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    fn with<F: FnOnce(&mut PoolInner<D>) -> R, R>(&self, f: F) -> Result<R> {
        let mut inner = self.inner.lock().map_err(Error::from)?;
        Ok(f(&mut inner))
    }

    /// Get a texture matching `desc` exactly. An inactive pooled texture is reused if one exists, otherwise a new one
    /// is created.
    /// # Errors
    /// - Fails if the device fails to create the texture.
    pub fn allocate_texture(&self, desc: &TextureDesc) -> Result<D::Texture> {
        let device = &self.device;
        let (texture, created) = self.with(|inner| {
            let frame = inner.frame_index;
            acquire(&mut inner.textures, desc, frame, |desc| device.create_texture(desc))
        })??;
        if created {
            #[cfg(feature = "log-objects")]
            trace!("Created new pooled texture {texture:?} ({}x{} {:?})", desc.width, desc.height, desc.format);
        }
        Ok(texture)
    }

    /// Get a buffer matching `desc` exactly, reusing an inactive pooled buffer if possible.
    /// # Errors
    /// - Fails if the device fails to create the buffer.
    pub fn allocate_buffer(&self, desc: &BufferDesc) -> Result<D::Buffer> {
        let device = &self.device;
        let (buffer, created) = self.with(|inner| {
            let frame = inner.frame_index;
            acquire(&mut inner.buffers, desc, frame, |desc| device.create_buffer(desc))
        })??;
        if created {
            #[cfg(feature = "log-objects")]
            trace!("Created new pooled buffer {buffer:?} ({} bytes)", desc.size);
        }
        Ok(buffer)
    }

    /// Mark a texture as inactive so it can be reused. Memory is not freed until it ages out in [`ResourcePool::tick()`].
    /// Textures not owned by this pool are ignored.
    pub fn release_texture(&self, texture: &D::Texture) -> Result<()> {
        let released = self.with(|inner| release(&mut inner.textures, texture, inner.frame_index))?;
        if !released {
            warn!("Released texture {texture:?} that is not an active pooled texture");
        }
        Ok(())
    }

    /// Mark a buffer as inactive so it can be reused.
    pub fn release_buffer(&self, buffer: &D::Buffer) -> Result<()> {
        let released = self.with(|inner| release(&mut inner.buffers, buffer, inner.frame_index))?;
        if !released {
            warn!("Released buffer {buffer:?} that is not an active pooled buffer");
        }
        Ok(())
    }

    /// Destroy resources that have been inactive for longer than the grace period, then advance to the next frame.
    /// Call this once per frame. [`BuiltRenderGraph::execute()`](crate::BuiltRenderGraph::execute) does this for you.
    pub fn tick(&self) -> Result<()> {
        let device = &self.device;
        self.with(|inner| {
            let frame = inner.frame_index;
            let grace = inner.grace_frames;
            age_out(&mut inner.textures, frame, grace, |texture| {
                #[cfg(feature = "log-objects")]
                trace!("Destroying pooled texture {texture:?}");
                device.destroy_texture(texture);
            });
            age_out(&mut inner.buffers, frame, grace, |buffer| {
                #[cfg(feature = "log-objects")]
                trace!("Destroying pooled buffer {buffer:?}");
                device.destroy_buffer(buffer);
            });
            inner.frame_index += 1;
        })
    }

    /// Index of the current frame, incremented on every [`ResourcePool::tick()`].
    pub fn frame_index(&self) -> Result<u64> {
        self.with(|inner| inner.frame_index)
    }

    /// Number of textures owned by the pool, active or not.
    pub fn texture_count(&self) -> Result<usize> {
        self.with(|inner| inner.textures.len())
    }

    /// Number of buffers owned by the pool, active or not.
    pub fn buffer_count(&self) -> Result<usize> {
        self.with(|inner| inner.buffers.len())
    }

    /// Number of textures currently handed out.
    pub fn active_texture_count(&self) -> Result<usize> {
        self.with(|inner| inner.textures.iter().filter(|entry| entry.active).count())
    }

    /// Number of buffers currently handed out.
    pub fn active_buffer_count(&self) -> Result<usize> {
        self.with(|inner| inner.buffers.iter().filter(|entry| entry.active).count())
    }
}

impl<D: Device> Drop for PoolInner<D> {
    fn drop(&mut self) {
        let active = self.textures.iter().filter(|entry| entry.active).count() + self.buffers.iter().filter(|entry| entry.active).count();
        if active != 0 {
            warn!("Dropping resource pool while {active} resources are still in use");
        }
        for entry in self.textures.drain(..) {
            self.device.destroy_texture(entry.resource);
        }
        for entry in self.buffers.drain(..) {
            self.device.destroy_buffer(entry.resource);
        }
    }
}
