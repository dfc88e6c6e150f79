pub use crate::core::device::{CommandList, Device, ViewType};
pub use crate::core::error::Error;
pub use crate::core::render_pass::*;
pub use crate::core::settings::*;

pub use crate::graph::blackboard::Blackboard;
pub use crate::graph::builder::{ReadAccess, RenderGraphBuilder};
pub use crate::graph::context::RenderGraphContext;
pub use crate::graph::id::*;
pub use crate::graph::pass::{PassFlags, PassType, RenderPass};
pub use crate::graph::pass_graph::{BuiltRenderGraph, GraphViz, RenderGraph, VizPass};

pub use crate::resource::desc::*;
pub use crate::resource::pool::ResourcePool;
pub use crate::resource::state::{BindFlags, ResourceState};
