//! Frame-scoped render graph for explicit graphics APIs.
//!
//! Framegraph lets rendering passes declare which textures and buffers they create, read and write, by name, without
//! knowing about each other. From those declarations it derives the pass execution order, culls passes whose results are
//! never used, borrows physical resources from a cross-frame pool only for as long as they are needed and inserts every
//! state transition barrier.
//!
//! The crate does not talk to a graphics API itself. Implement the [`Device`] and [`CommandList`] traits for your backend
//! and the graph will request resources, views, barriers and render passes through them.
//!
//! To get started, the easiest way is to simply
//! ```
//! use framegraph::prelude::*;
//! ```
//!
//! # Example
//!
//! A pool lives as long as the device. Every frame, a new graph is created from it.
//! ```ignore
//! use framegraph::prelude::*;
//!
//! let pool = ResourcePool::new(device);
//! loop {
//!     let mut graph = RenderGraph::new(&pool);
//!     graph.import_texture("backbuffer", swapchain_image, backbuffer_desc)?;
//!     shadows::add_passes(&mut graph)?;
//!     lighting::add_passes(&mut graph)?;
//!     let graph = graph.build()?;
//!     graph.execute(&mut cmd)?;
//! }
//! ```
//! For further example code, check out the following modules
//! - [`graph`] for adding passes and executing graphs.
//! - [`graph::pass`] for the different ways to define passes.
//! - [`resource::pool`] for the cross-frame resource pool.
//! - [`core::device`] for the traits a backend implements.

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate log;

pub mod prelude;
pub use crate::prelude::*;

pub mod core;
pub mod graph;
pub mod resource;
