//! The pass graph module holds the render graph and its static analysis.

use std::fmt::{Display, Formatter};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use anyhow::Result;
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};
use petgraph::visit::DfsPostOrder;
use petgraph::Outgoing;

use crate::core::device::Device;
use crate::core::error::Error;
use crate::core::settings::GraphSettings;
use crate::graph::blackboard::Blackboard;
use crate::graph::builder::RenderGraphBuilder;
use crate::graph::context::RenderGraphContext;
use crate::graph::cull::cull_passes;
use crate::graph::dependency_level::DependencyLevel;
use crate::graph::id::{BufferId, TextureId};
use crate::graph::lifetime::compute_lifetimes;
use crate::graph::pass::{BoxedPassFn, DataPassExecutor, PassFlags, PassNode, PassType, RenderPass, RenderPassExecutor};
use crate::graph::resource::ResourceRegistry;
use crate::resource::desc::{BufferDesc, TextureDesc};
use crate::resource::pool::ResourcePool;

/// A frame-scoped render graph that is still recording passes.
///
/// Passes are added in the order they would naturally execute in. A pass can only depend on passes added before it,
/// which keeps the graph acyclic. Once every pass is added, [`RenderGraph::build()`] analyses the graph and produces a
/// [`BuiltRenderGraph`] that can be executed exactly once.
pub struct RenderGraph<'cb, D: Device> {
    pub(crate) pool: ResourcePool<D>,
    pub(crate) device: Arc<D>,
    pub(crate) settings: GraphSettings,
    pub(crate) resources: ResourceRegistry<D>,
    pub(crate) passes: Vec<PassNode>,
    pub(crate) executors: Vec<BoxedPassFn<'cb, D>>,
    pub(crate) blackboard: Blackboard,
    /// Pass graph with an edge from every producer to each consumer. Node `i` is pass `i`.
    pub(crate) adjacency: DiGraph<usize, ()>,
    pub(crate) topological_order: Vec<usize>,
    pub(crate) execution_order: Vec<usize>,
    pub(crate) levels: Vec<DependencyLevel>,
    pub(crate) pass_levels: Vec<usize>,
    poisoned: bool,
}

/// A completely built render graph, ready for execution.
pub struct BuiltRenderGraph<'cb, D: Device> {
    pub(crate) graph: RenderGraph<'cb, D>,
}

impl<'cb, D: Device> Deref for BuiltRenderGraph<'cb, D> {
    /// The stored render graph type.
    type Target = RenderGraph<'cb, D>;

    /// Get the stored render graph.
    fn deref(&self) -> &Self::Target {
        &self.graph
    }
}

impl<'cb, D: Device> DerefMut for BuiltRenderGraph<'cb, D> {
    /// Get the stored render graph.
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.graph
    }
}

impl<'cb, D: Device> RenderGraph<'cb, D> {
    /// Create a new render graph allocating from `pool`, with default settings.
    pub fn new(pool: &ResourcePool<D>) -> Self {
        Self::with_settings(pool, GraphSettings::default())
    }

    /// Create a new render graph with custom settings.
    pub fn with_settings(pool: &ResourcePool<D>, settings: GraphSettings) -> Self {
        Self {
            pool: pool.clone(),
            device: pool.device().clone(),
            settings,
            resources: ResourceRegistry::new(),
            passes: Vec::new(),
            executors: Vec::new(),
            blackboard: Blackboard::new(),
            adjacency: DiGraph::new(),
            topological_order: Vec::new(),
            execution_order: Vec::new(),
            levels: Vec::new(),
            pass_levels: Vec::new(),
            poisoned: false,
        }
    }

    fn check_poisoned(&self) -> Result<()> {
        if self.poisoned {
            Err(Error::GraphPoisoned.into())
        } else {
            Ok(())
        }
    }

    /// Make a texture owned by the caller available to passes. `desc.initial_state` must be the state the texture is in
    /// right now. The texture is returned to that state after its last use and is never handed to the pool.
    /// # Errors
    /// - Fails if a texture with the same name is already known to the graph.
    pub fn import_texture(&mut self, name: &str, texture: D::Texture, desc: TextureDesc) -> Result<TextureId> {
        self.check_poisoned()?;
        self.resources.import_texture(name, texture, desc)
    }

    /// Make a buffer owned by the caller available to passes. Imported buffers are expected in the common state.
    /// # Errors
    /// - Fails if a buffer with the same name is already known to the graph.
    pub fn import_buffer(&mut self, name: &str, buffer: D::Buffer, desc: BufferDesc) -> Result<BufferId> {
        self.check_poisoned()?;
        self.resources.import_buffer(name, buffer, desc)
    }

    /// Returns true if a texture with this name was declared or imported.
    pub fn is_texture_declared(&self, name: &str) -> bool {
        self.resources.is_texture_declared(name)
    }

    /// Returns true if a buffer with this name was declared or imported.
    pub fn is_buffer_declared(&self, name: &str) -> bool {
        self.resources.is_buffer_declared(name)
    }

    /// Shared per-frame data, also reachable from pass execute callbacks.
    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    /// Number of passes added so far.
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    fn register_pass<S>(&mut self, name: &str, pass_type: PassType, flags: PassFlags, setup: S) -> Result<()>
    where
        S: FnOnce(&mut RenderGraphBuilder<'_, D>) -> Result<()>, {
        self.check_poisoned()?;
        let index = self.passes.len();
        let mut pass = PassNode::new(name.to_owned(), pass_type, flags);
        let mut builder = RenderGraphBuilder {
            resources: &mut self.resources,
            passes: &self.passes,
            pass: &mut pass,
            index,
        };
        // A failed setup may have declared resources already, there is no way back from that.
        if let Err(err) = setup(&mut builder) {
            self.poisoned = true;
            return Err(err);
        }
        self.passes.push(pass);
        Ok(())
    }

    /// Add a pass defined by two closures. `setup` runs immediately and fills in the pass data, `execute` runs during
    /// [`BuiltRenderGraph::execute()`] unless the pass is culled. Returns a copy of the pass data after setup.
    /// # Errors
    /// - Fails if `setup` fails. The graph cannot be used anymore after this.
    pub fn add_pass<P, S, E>(&mut self, name: &str, pass_type: PassType, flags: PassFlags, setup: S, execute: E) -> Result<P>
    where
        P: Default + Clone + 'cb,
        S: FnOnce(&mut P, &mut RenderGraphBuilder<'_, D>) -> Result<()>,
        E: FnMut(&P, &mut RenderGraphContext<'_, D>, &mut D::CommandList) -> Result<()> + 'cb, {
        let mut data = P::default();
        self.register_pass(name, pass_type, flags, |builder| setup(&mut data, builder))?;
        self.executors.push(Box::new(DataPassExecutor {
            data: data.clone(),
            execute,
        }));
        Ok(data)
    }

    /// Add a pass implementing [`RenderPass`]. Its setup method runs immediately.
    /// # Errors
    /// - Fails if setup fails. The graph cannot be used anymore after this.
    pub fn add_render_pass<T>(&mut self, name: &str, pass_type: PassType, flags: PassFlags, mut pass: T) -> Result<()>
    where
        T: RenderPass<D> + 'cb, {
        self.register_pass(name, pass_type, flags, |builder| pass.setup(builder))?;
        self.executors.push(Box::new(RenderPassExecutor(pass)));
        Ok(())
    }

    /// Analyse the graph: order passes, group them into dependency levels, cull unused passes and compute resource lifetimes.
    /// # Errors
    /// - Fails if passes in the same dependency level require incompatible states of the same resource.
    /// - Fails if views of imported resources cannot be created.
    pub fn build(mut self) -> Result<BuiltRenderGraph<'cb, D>> {
        self.check_poisoned()?;
        self.build_adjacency();
        self.sort_topologically();
        self.build_dependency_levels();
        if self.settings.cull_passes {
            cull_passes(&mut self.passes, &mut self.resources);
            for texture in self.resources.textures.iter().filter(|texture| texture.ref_count == 0) {
                trace!("Texture `{}` is never read", texture.name);
            }
            for buffer in self.resources.buffers.iter().filter(|buffer| buffer.ref_count == 0) {
                trace!("Buffer `{}` is never read", buffer.name);
            }
        }

        let mut execution_order = self.topological_order.clone();
        execution_order.sort_by_key(|&pass| (self.pass_levels[pass], pass));
        self.execution_order = execution_order;
        compute_lifetimes(&mut self.passes, &mut self.resources, &self.execution_order);

        for level in &mut self.levels {
            level.setup(&self.passes, &self.resources)?;
        }

        for index in 0..self.resources.textures.len() {
            if self.resources.textures[index].imported {
                self.resources.create_texture_views(&self.device, TextureId(index))?;
            }
        }
        for index in 0..self.resources.buffers.len() {
            if self.resources.buffers[index].imported {
                self.resources.create_buffer_views(&self.device, BufferId(index))?;
            }
        }

        debug!(
            "Built render graph with {} passes in {} dependency levels, {} culled",
            self.passes.len(),
            self.levels.len(),
            self.passes.iter().filter(|pass| pass.culled).count()
        );
        for pass in self.passes.iter().filter(|pass| pass.culled) {
            debug!("Culled pass `{}`", pass.name);
        }

        Ok(BuiltRenderGraph {
            graph: self,
        })
    }

    // Edge i -> j for every later pass j reading something i creates or writes.
    fn build_adjacency(&mut self) {
        let mut graph = DiGraph::with_capacity(self.passes.len(), self.passes.len());
        for index in 0..self.passes.len() {
            graph.add_node(index);
        }
        for (i, producer) in self.passes.iter().enumerate() {
            for (j, consumer) in self.passes.iter().enumerate().skip(i + 1) {
                if consumer.depends_on(producer) {
                    graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), ());
                }
            }
        }
        self.adjacency = graph;
    }

    fn sort_topologically(&mut self) {
        let mut dfs = DfsPostOrder::empty(&self.adjacency);
        let mut order = Vec::with_capacity(self.passes.len());
        for start in self.adjacency.node_indices() {
            dfs.move_to(start);
            while let Some(node) = dfs.next(&self.adjacency) {
                order.push(node.index());
            }
        }
        order.reverse();
        self.topological_order = order;
    }

    // Longest path from any root. Levels hold their passes in registration order.
    fn build_dependency_levels(&mut self) {
        let mut distances = vec![0; self.passes.len()];
        for &pass in &self.topological_order {
            for next in self.adjacency.neighbors_directed(NodeIndex::new(pass), Outgoing) {
                distances[next.index()] = distances[next.index()].max(distances[pass] + 1);
            }
        }
        let level_count = distances.iter().max().map_or(0, |max| max + 1);
        let mut levels = (0..level_count).map(DependencyLevel::new).collect::<Vec<_>>();
        for (pass, &level) in distances.iter().enumerate() {
            levels[level].add_pass(pass);
        }
        self.levels = levels;
        self.pass_levels = distances;
    }
}

impl<'cb, D: Device> BuiltRenderGraph<'cb, D> {
    fn pass_index(&self, name: &str) -> Option<usize> {
        self.passes.iter().position(|pass| pass.name == name)
    }

    /// Names of all passes in topological order, culled passes included.
    pub fn topological_order(&self) -> Vec<&str> {
        self.topological_order
            .iter()
            .map(|&pass| self.passes[pass].name.as_str())
            .collect()
    }

    /// Names of the passes that will execute, in execution order.
    pub fn execution_order(&self) -> Vec<&str> {
        self.execution_order
            .iter()
            .filter(|&&pass| !self.passes[pass].culled)
            .map(|&pass| self.passes[pass].name.as_str())
            .collect()
    }

    pub fn dependency_level_count(&self) -> usize {
        self.levels.len()
    }

    /// Dependency level of a pass, or `None` if there is no pass with this name.
    pub fn level_of(&self, pass: &str) -> Option<usize> {
        self.pass_index(pass).map(|index| self.pass_levels[index])
    }

    /// Whether a pass was culled, or `None` if there is no pass with this name.
    pub fn is_culled(&self, pass: &str) -> Option<bool> {
        self.pass_index(pass).map(|index| self.passes[index].culled)
    }

    /// Number of passes in a dependency level, culled passes included.
    pub fn level_size(&self, level: usize) -> usize {
        self.levels.get(level).map_or(0, |level| level.size())
    }

    /// Number of passes in a dependency level that will execute.
    pub fn level_non_culled_size(&self, level: usize) -> usize {
        self.levels
            .get(level)
            .map_or(0, |level| level.non_culled_size(&self.passes))
    }
}

impl<D: Device> Drop for RenderGraph<'_, D> {
    fn drop(&mut self) {
        // Normally empty, unless execution was abandoned halfway.
        for texture in self.resources.textures.iter_mut().filter(|texture| !texture.imported) {
            if let Some(resource) = texture.resource.take() {
                if let Err(err) = self.pool.release_texture(&resource) {
                    error!("Failed to return texture `{}` to the pool: {err}", texture.name);
                }
            }
        }
        for buffer in self.resources.buffers.iter_mut().filter(|buffer| !buffer.imported) {
            if let Some(resource) = buffer.resource.take() {
                if let Err(err) = self.pool.release_buffer(&resource) {
                    error!("Failed to return buffer `{}` to the pool: {err}", buffer.name);
                }
            }
        }
        self.resources.free_views(&self.device);
    }
}

/// A pass as shown in a graph visualization.
#[derive(Debug, Clone)]
pub struct VizPass {
    pub name: String,
    pub culled: bool,
}

impl Display for VizPass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

type VizGraph = DiGraph<VizPass, String>;

fn node_attributes(_: &VizGraph, (_, pass): (NodeIndex, &VizPass)) -> String {
    if pass.culled {
        String::from("style=dashed, color=gray, fontcolor=gray")
    } else {
        String::from("shape=box")
    }
}

fn edge_attributes(_: &VizGraph, _: EdgeReference<String>) -> String {
    String::new()
}

/// Trait that is implemented for the render graph to help with debugging and visualizing the graph.
pub trait GraphViz {
    /// Get the string representation of this graph in `dot` format.
    fn dot(&self) -> Result<String>;
}

impl<D: Device> GraphViz for BuiltRenderGraph<'_, D> {
    fn dot(&self) -> Result<String> {
        let graph: VizGraph = self.adjacency.map(
            |_, &pass| VizPass {
                name: self.passes[pass].name.clone(),
                culled: self.passes[pass].culled,
            },
            |edge, _| {
                let (producer, consumer) = match self.adjacency.edge_endpoints(edge) {
                    Some((producer, consumer)) => (&self.passes[producer.index()], &self.passes[consumer.index()]),
                    None => return String::new(),
                };
                let textures = producer
                    .texture_outputs()
                    .filter(|id| consumer.texture_reads.contains(id))
                    .map(|id| self.resources.texture(id).name.as_str());
                let buffers = producer
                    .buffer_outputs()
                    .filter(|id| consumer.buffer_reads.contains(id))
                    .map(|id| self.resources.buffer(id).name.as_str());
                textures.chain(buffers).collect::<Vec<_>>().join(", ")
            },
        );
        Ok(format!("{}", Dot::with_attr_getters(&graph, &[], &edge_attributes, &node_attributes)))
    }
}
