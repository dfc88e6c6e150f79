//! The render graph is a frame-scoped scheduler for GPU passes. Each pass declares, by name, which textures and buffers
//! it creates, reads and writes. The graph then works out everything the passes would otherwise have to coordinate by hand:
//! - the order passes execute in, and which passes do not depend on each other (dependency levels),
//! - which passes can be skipped because nobody consumes their outputs (culling),
//! - when physical resources are needed, so they can be borrowed from a [`ResourcePool`](crate::ResourcePool) and returned as early as possible,
//! - every state transition barrier.
//!
//! A graph is single use. Build a new one every frame, add passes, [`build`](RenderGraph::build) it and
//! [`execute`](BuiltRenderGraph::execute) it. Resource names and ids only have meaning within that one graph.
//!
//! Through the [`GraphViz`] trait, it's possible to export a graphviz-compatible dot file to display the pass graph.
//!
//! # Example
//!
//! ```ignore
//! use framegraph::prelude::*;
//!
//! let pool = ResourcePool::new(device);
//! let mut graph = RenderGraph::new(&pool);
//! graph.import_texture("backbuffer", backbuffer, TextureDesc {
//!     initial_state: ResourceState::PRESENT,
//!     ..TextureDesc::new_2d(1920, 1080, Format::B8G8R8A8Unorm)
//! })?;
//!
//! #[derive(Default, Clone)]
//! struct LightingData {
//!     output: Option<RenderTargetId>,
//! }
//!
//! graph.add_pass::<LightingData, _, _>(
//!     "lighting",
//!     PassType::Graphics,
//!     PassFlags::empty(),
//!     |data, builder| {
//!         data.output = Some(builder.write_render_target("backbuffer", AttachmentOps::CLEAR_PRESERVE, Default::default())?);
//!         builder.set_viewport(1920, 1080);
//!         Ok(())
//!     },
//!     |data, ctx, cmd| {
//!         // The render pass is already bound, record draws into `cmd`.
//!         Ok(())
//!     },
//! )?;
//!
//! let graph = graph.build()?;
//! graph.execute(&mut cmd)?;
//! ```
//!
//! For the different ways to define passes, see the [`pass`] module documentation.

pub mod blackboard;
pub mod builder;
pub mod context;
pub mod id;
pub mod pass;
pub mod pass_graph;
pub mod record;

pub(crate) mod cull;
pub(crate) mod dependency_level;
pub(crate) mod lifetime;
pub(crate) mod resource;
pub(crate) mod virtual_resource;
