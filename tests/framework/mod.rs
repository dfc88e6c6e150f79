#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};

use framegraph::prelude::*;

/// Everything the graph asked the device or command list to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CreateTexture(u64),
    DestroyTexture(u64),
    CreateBuffer(u64),
    DestroyBuffer(u64),
    CreateView {
        resource: u64,
        view: u64,
        view_type: ViewType,
    },
    FreeView(u64),
    Name {
        resource: u64,
        name: String,
    },
    TextureBarrier {
        texture: u64,
        before: ResourceState,
        after: ResourceState,
    },
    BufferBarrier {
        buffer: u64,
        before: ResourceState,
        after: ResourceState,
    },
    FlushBarriers,
    BeginRenderPass {
        name: String,
        color_attachments: usize,
        depth_attachment: bool,
        width: u32,
        height: u32,
    },
    EndRenderPass,
    BeginLabel(String),
    EndLabel,
    /// Pushed by pass execute callbacks.
    Pass(String),
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

/// Device handing out increasing integer handles and recording every call.
#[derive(Debug)]
pub struct MockDevice {
    events: EventLog,
    next_handle: AtomicU64,
    fail_allocations: AtomicBool,
}

impl MockDevice {
    pub fn new(events: EventLog) -> Self {
        Self {
            events,
            next_handle: AtomicU64::new(1),
            fail_allocations: AtomicBool::new(false),
        }
    }

    /// Make every following texture and buffer creation fail.
    pub fn fail_allocations(&self, fail: bool) {
        self.fail_allocations.store(fail, Ordering::SeqCst);
    }

    fn handle(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::SeqCst)
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Device for MockDevice {
    type Texture = u64;
    type Buffer = u64;
    type View = u64;
    type CommandList = MockCommandList;

    fn create_texture(&self, _desc: &TextureDesc) -> Result<u64> {
        if self.fail_allocations.load(Ordering::SeqCst) {
            bail!("out of device memory");
        }
        let handle = self.handle();
        self.push(Event::CreateTexture(handle));
        Ok(handle)
    }

    fn create_buffer(&self, _desc: &BufferDesc) -> Result<u64> {
        if self.fail_allocations.load(Ordering::SeqCst) {
            bail!("out of device memory");
        }
        let handle = self.handle();
        self.push(Event::CreateBuffer(handle));
        Ok(handle)
    }

    fn destroy_texture(&self, texture: u64) {
        self.push(Event::DestroyTexture(texture));
    }

    fn destroy_buffer(&self, buffer: u64) {
        self.push(Event::DestroyBuffer(buffer));
    }

    fn create_texture_view(&self, texture: &u64, _desc: &TextureSubresourceDesc, view_type: ViewType) -> Result<u64> {
        let view = self.handle();
        self.push(Event::CreateView {
            resource: *texture,
            view,
            view_type,
        });
        Ok(view)
    }

    fn create_buffer_view(
        &self,
        buffer: &u64,
        _desc: &BufferSubresourceDesc,
        view_type: ViewType,
        _counter: Option<&u64>,
    ) -> Result<u64> {
        let view = self.handle();
        self.push(Event::CreateView {
            resource: *buffer,
            view,
            view_type,
        });
        Ok(view)
    }

    fn free_view(&self, view: u64, _view_type: ViewType) {
        self.push(Event::FreeView(view));
    }

    fn set_texture_name(&self, texture: &u64, name: &str) {
        self.push(Event::Name {
            resource: *texture,
            name: name.to_owned(),
        });
    }

    fn set_buffer_name(&self, buffer: &u64, name: &str) {
        self.push(Event::Name {
            resource: *buffer,
            name: name.to_owned(),
        });
    }
}

#[derive(Debug)]
pub struct MockCommandList {
    events: EventLog,
}

impl MockCommandList {
    /// Record that a pass executed.
    pub fn mark(&mut self, pass: &str) {
        self.events.lock().unwrap().push(Event::Pass(pass.to_owned()));
    }
}

impl CommandList<MockDevice> for MockCommandList {
    fn texture_barrier(&mut self, texture: &u64, before: ResourceState, after: ResourceState) {
        self.events.lock().unwrap().push(Event::TextureBarrier {
            texture: *texture,
            before,
            after,
        });
    }

    fn buffer_barrier(&mut self, buffer: &u64, before: ResourceState, after: ResourceState) {
        self.events.lock().unwrap().push(Event::BufferBarrier {
            buffer: *buffer,
            before,
            after,
        });
    }

    fn flush_barriers(&mut self) {
        self.events.lock().unwrap().push(Event::FlushBarriers);
    }

    fn begin_render_pass(&mut self, desc: &RenderPassDesc<MockDevice>) {
        self.events.lock().unwrap().push(Event::BeginRenderPass {
            name: desc.name.clone(),
            color_attachments: desc.color_attachments.len(),
            depth_attachment: desc.depth_attachment.is_some(),
            width: desc.width,
            height: desc.height,
        });
    }

    fn end_render_pass(&mut self) {
        self.events.lock().unwrap().push(Event::EndRenderPass);
    }

    fn begin_label(&mut self, name: &str, _color: Option<[f32; 4]>) {
        self.events.lock().unwrap().push(Event::BeginLabel(name.to_owned()));
    }

    fn end_label(&mut self) {
        self.events.lock().unwrap().push(Event::EndLabel);
    }
}

pub struct Context {
    pub pool: ResourcePool<MockDevice>,
    pub events: EventLog,
}

impl Context {
    pub fn command_list(&self) -> MockCommandList {
        MockCommandList {
            events: self.events.clone(),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Names of the passes that executed, in order.
    pub fn executed_passes(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Pass(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    /// Physical handle most recently labelled with `name`.
    pub fn handle_named(&self, name: &str) -> Option<u64> {
        self.events().into_iter().rev().find_map(|event| match event {
            Event::Name {
                resource,
                name: label,
            } if label == name => Some(resource),
            _ => None,
        })
    }

    /// All barriers recorded for a texture, as (before, after) pairs.
    pub fn texture_barriers(&self, texture: u64) -> Vec<(ResourceState, ResourceState)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::TextureBarrier {
                    texture: handle,
                    before,
                    after,
                } if handle == texture => Some((before, after)),
                _ => None,
            })
            .collect()
    }

    pub fn buffer_barriers(&self, buffer: u64) -> Vec<(ResourceState, ResourceState)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::BufferBarrier {
                    buffer: handle,
                    before,
                    after,
                } if handle == buffer => Some((before, after)),
                _ => None,
            })
            .collect()
    }

    /// Index of the first event matching `predicate`.
    pub fn position(&self, predicate: impl Fn(&Event) -> bool) -> Option<usize> {
        self.events().iter().position(predicate)
    }
}

pub fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

/// Create a pool over a recording mock device.
pub fn make_context() -> Context {
    make_context_with_settings(PoolSettings::default())
}

pub fn make_context_with_settings(settings: PoolSettings) -> Context {
    init_logging();
    let events = EventLog::default();
    let device = MockDevice::new(events.clone());
    Context {
        pool: ResourcePool::with_settings(device, settings),
        events,
    }
}

/// Description of a small color target.
pub fn color_desc() -> TextureDesc {
    TextureDesc::new_2d(64, 64, Format::R8G8B8A8Unorm)
}

/// Description of the imported backbuffer, which rests in the present state.
pub fn backbuffer_desc() -> TextureDesc {
    TextureDesc {
        initial_state: ResourceState::PRESENT,
        ..TextureDesc::new_2d(64, 64, Format::B8G8R8A8Unorm)
    }
}

/// Handle used for the imported backbuffer. Far away from anything the mock device hands out.
pub const BACKBUFFER: u64 = 1 << 32;
