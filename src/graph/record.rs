//! Executes a built render graph into a command list.
//!
//! Dependency levels are executed in order. For every level:
//! - Create: physical resources are taken from the pool for every resource first used in this level, and their views are created.
//! - Transition: every resource the level uses gets exactly one barrier if its state differs from the state it was left in.
//! - Dispatch: barriers are flushed and the execute callbacks of live passes are called in registration order.
//! - Destroy: resources whose last use is in this level are returned to their resting state and handed back to the pool.

use anyhow::Result;

use crate::core::device::{CommandList, Device};
use crate::core::error::Error;
use crate::core::render_pass::{ColorAttachment, DepthAttachment, RenderPassDesc};
use crate::graph::context::RenderGraphContext;
use crate::graph::dependency_level::DependencyLevel;
use crate::graph::id::{BufferId, TextureId};
use crate::graph::pass::{BoxedPassFn, PassFlags, PassNode, PassType};
use crate::graph::pass_graph::{BuiltRenderGraph, RenderGraph};
use crate::graph::resource::ResourceRegistry;
use crate::resource::desc::ClearValue;
use crate::resource::state::ResourceState;

// Latest state of a resource in the given levels, scanning backwards.
fn last_texture_state(levels: &[DependencyLevel], id: TextureId) -> Option<ResourceState> {
    levels.iter().rev().find_map(|level| level.texture_states.get(&id).copied())
}

fn last_buffer_state(levels: &[DependencyLevel], id: BufferId) -> Option<ResourceState> {
    levels.iter().rev().find_map(|level| level.buffer_states.get(&id).copied())
}

fn render_pass_desc<D: Device>(pass: &PassNode, resources: &ResourceRegistry<D>) -> Result<RenderPassDesc<D>> {
    let (width, height) = pass.viewport;
    if width == 0 || height == 0 {
        return Err(Error::MissingViewport(pass.name.clone()).into());
    }

    let color_attachments = pass
        .render_targets
        .iter()
        .map(|target| -> Result<ColorAttachment<D>> {
            let texture = resources.texture(target.id.resource);
            let clear_color = match texture.desc.clear_value {
                ClearValue::None => None,
                ClearValue::Color(color) => Some(color),
                ClearValue::DepthStencil {
                    ..
                } => return Err(Error::InvalidClearValue(texture.name.clone()).into()),
            };
            Ok(ColorAttachment {
                view: resources.texture_view(target.id.resource, target.id.view)?,
                format: texture.desc.format,
                ops: target.ops,
                clear_color,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let depth_attachment = match &pass.depth_stencil {
        Some(depth) => {
            let texture = resources.texture(depth.id.resource);
            let clear_depth_stencil = match texture.desc.clear_value {
                ClearValue::None => None,
                ClearValue::DepthStencil {
                    depth,
                    stencil,
                } => Some((depth, stencil)),
                ClearValue::Color(_) => return Err(Error::InvalidClearValue(texture.name.clone()).into()),
            };
            Some(DepthAttachment {
                view: resources.texture_view(depth.id.resource, depth.id.view)?,
                format: texture.desc.format,
                depth_ops: depth.depth_ops,
                stencil_ops: depth.stencil_ops,
                clear_depth_stencil,
                read_only: depth.read_only,
            })
        }
        None => None,
    };

    if color_attachments.is_empty() && depth_attachment.is_none() {
        warn!("Graphics pass `{}` has no attachments", pass.name);
    }

    Ok(RenderPassDesc {
        name: pass.name.clone(),
        color_attachments,
        depth_attachment,
        width,
        height,
        allow_uav_writes: pass.flags.contains(PassFlags::ALLOW_UAV_WRITES),
        legacy: pass.flags.contains(PassFlags::LEGACY_RENDER_PASS),
    })
}

// Runs one pass, wrapped in a render pass if it wants one. A begun render pass is always ended.
fn record_pass<D: Device>(
    executor: &mut BoxedPassFn<'_, D>,
    ctx: &mut RenderGraphContext<'_, D>,
    cmd: &mut D::CommandList,
) -> Result<()> {
    let pass = ctx.pass;
    if pass.pass_type != PassType::Graphics || pass.flags.contains(PassFlags::SKIP_AUTO_RENDER_PASS) {
        return executor.execute(ctx, cmd);
    }
    let desc = render_pass_desc(pass, ctx.resources)?;
    cmd.begin_render_pass(&desc);
    let result = executor.execute(ctx, cmd);
    cmd.end_render_pass();
    result
}

impl<'cb, D: Device> RenderGraph<'cb, D> {
    fn create_resources(&mut self, level: usize) -> Result<()> {
        let creates = self.levels[level].texture_creates.iter().copied().collect::<Vec<_>>();
        for id in creates {
            let texture = self.resources.texture(id);
            let physical = self.pool.allocate_texture(&texture.desc)?;
            if self.settings.name_resources {
                self.device.set_texture_name(&physical, &texture.name);
            }
            trace!("Allocated texture `{}` as {physical:?}", texture.name);
            self.resources.texture_mut(id).resource = Some(physical);
            self.resources.create_texture_views(&self.device, id)?;
        }

        let creates = self.levels[level].buffer_creates.iter().copied().collect::<Vec<_>>();
        for id in creates {
            let buffer = self.resources.buffer(id);
            let physical = self.pool.allocate_buffer(&buffer.desc)?;
            if self.settings.name_resources {
                self.device.set_buffer_name(&physical, &buffer.name);
            }
            trace!("Allocated buffer `{}` as {physical:?}", buffer.name);
            self.resources.buffer_mut(id).resource = Some(physical);
            self.resources.create_buffer_views(&self.device, id)?;
        }
        Ok(())
    }

    fn transition_resources(&self, level: usize, cmd: &mut D::CommandList) -> Result<()> {
        let (previous, current) = self.levels.split_at(level);
        let current = &current[0];

        for (&id, &state) in &current.texture_states {
            let texture = self.resources.texture(id);
            let resting = texture.resting_state();
            let before = if current.texture_creates.contains(&id) {
                // Created in the resting state, which often is the state this level needs.
                if resting.contains(state) {
                    continue;
                }
                resting
            } else {
                last_texture_state(previous, id).unwrap_or(resting)
            };
            if before != state {
                let physical = texture
                    .resource
                    .as_ref()
                    .ok_or_else(|| Error::NoResourceBound(texture.name.clone()))?;
                trace!("Barrier for texture `{}`: {before:?} -> {state:?}", texture.name);
                cmd.texture_barrier(physical, before, state);
            }
        }

        for (&id, &state) in &current.buffer_states {
            let buffer = self.resources.buffer(id);
            let resting = buffer.resting_state();
            let before = if current.buffer_creates.contains(&id) {
                if resting.contains(state) {
                    continue;
                }
                resting
            } else {
                last_buffer_state(previous, id).unwrap_or(resting)
            };
            if before != state {
                let physical = buffer
                    .resource
                    .as_ref()
                    .ok_or_else(|| Error::NoResourceBound(buffer.name.clone()))?;
                trace!("Barrier for buffer `{}`: {before:?} -> {state:?}", buffer.name);
                cmd.buffer_barrier(physical, before, state);
            }
        }
        Ok(())
    }

    fn dispatch_passes(&mut self, level: usize, cmd: &mut D::CommandList) -> Result<()> {
        for &index in &self.levels[level].passes {
            let pass = &self.passes[index];
            if pass.culled {
                continue;
            }

            #[cfg(feature = "debug-markers")]
            cmd.begin_label(&pass.name, pass.color);

            let mut ctx = RenderGraphContext {
                resources: &self.resources,
                pass,
                blackboard: &mut self.blackboard,
            };
            let result = record_pass(&mut self.executors[index], &mut ctx, cmd);

            #[cfg(feature = "debug-markers")]
            cmd.end_label();

            result?;
        }
        Ok(())
    }

    fn destroy_resources(&mut self, level: usize, cmd: &mut D::CommandList) -> Result<()> {
        let visible = &self.levels[..=level];

        for &id in &self.levels[level].texture_destroys {
            let texture = self.resources.texture_mut(id);
            let resting = texture.resting_state();
            let current = last_texture_state(visible, id).unwrap_or(resting);
            let Some(physical) = texture.resource.as_ref() else {
                continue;
            };
            if current != resting {
                trace!("Barrier for texture `{}`: {current:?} -> {resting:?}", texture.name);
                cmd.texture_barrier(physical, current, resting);
            }
            if !texture.imported {
                self.pool.release_texture(physical)?;
                trace!("Released texture `{}`", texture.name);
                texture.resource = None;
            }
        }

        for &id in &self.levels[level].buffer_destroys {
            let buffer = self.resources.buffer_mut(id);
            let resting = buffer.resting_state();
            let current = last_buffer_state(visible, id).unwrap_or(resting);
            let Some(physical) = buffer.resource.as_ref() else {
                continue;
            };
            if current != resting {
                trace!("Barrier for buffer `{}`: {current:?} -> {resting:?}", buffer.name);
                cmd.buffer_barrier(physical, current, resting);
            }
            if !buffer.imported {
                self.pool.release_buffer(physical)?;
                trace!("Released buffer `{}`", buffer.name);
                buffer.resource = None;
            }
        }
        Ok(())
    }
}

impl<'cb, D: Device> BuiltRenderGraph<'cb, D> {
    /// Execute the graph, recording every live pass into `cmd`. This also advances the resource pool by one frame.
    /// The graph is consumed, ids obtained from it are invalid afterwards.
    /// # Errors
    /// - Fails if the device fails to create a resource or view.
    /// - Fails if a graphics pass with automatic render pass setup has no viewport.
    /// - Fails if a pass execute callback fails.
    pub fn execute(mut self, cmd: &mut D::CommandList) -> Result<()> {
        self.pool.tick()?;
        for level in 0..self.levels.len() {
            trace!("Executing dependency level {level}");
            self.create_resources(level)?;
            self.transition_resources(level, cmd)?;
            cmd.flush_barriers();
            self.dispatch_passes(level, cmd)?;
            self.destroy_resources(level, cmd)?;
            cmd.flush_barriers();
        }
        Ok(())
    }
}
