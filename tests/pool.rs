use anyhow::Result;

use framegraph::prelude::*;

use crate::framework::{color_desc, Event};

mod framework;

#[test]
pub fn released_texture_is_reused() -> Result<()> {
    let context = framework::make_context();
    let pool = &context.pool;
    let first = pool.allocate_texture(&color_desc())?;
    let second = pool.allocate_texture(&color_desc())?;
    // Both are active, they cannot alias.
    assert_ne!(first, second);

    pool.release_texture(&first)?;
    let third = pool.allocate_texture(&color_desc())?;
    assert_eq!(third, first);
    assert_eq!(pool.texture_count()?, 2);
    assert_eq!(pool.active_texture_count()?, 2);
    Ok(())
}

#[test]
pub fn descriptions_must_match_exactly() -> Result<()> {
    let context = framework::make_context();
    let pool = &context.pool;
    let texture = pool.allocate_texture(&color_desc())?;
    pool.release_texture(&texture)?;

    let larger = TextureDesc::new_2d(128, 128, Format::R8G8B8A8Unorm);
    assert_ne!(pool.allocate_texture(&larger)?, texture);
    let render_target = TextureDesc {
        bind_flags: BindFlags::RENDER_TARGET,
        ..color_desc()
    };
    assert_ne!(pool.allocate_texture(&render_target)?, texture);
    assert_eq!(pool.texture_count()?, 3);
    Ok(())
}

#[test]
pub fn unused_textures_age_out() -> Result<()> {
    let context = framework::make_context();
    let pool = &context.pool;
    let texture = pool.allocate_texture(&color_desc())?;
    pool.release_texture(&texture)?;

    // Released in frame 0, kept while `0 + grace >= frame`.
    for frame in 0..=DEFAULT_GRACE_FRAMES {
        assert_eq!(pool.frame_index()?, frame);
        pool.tick()?;
        assert_eq!(pool.texture_count()?, 1);
    }
    pool.tick()?;
    assert_eq!(pool.texture_count()?, 0);
    assert!(context.events().contains(&Event::DestroyTexture(texture)));
    Ok(())
}

#[test]
pub fn reuse_refreshes_age() -> Result<()> {
    let context = framework::make_context_with_settings(PoolSettings {
        grace_frames: 1,
    });
    let pool = &context.pool;
    let texture = pool.allocate_texture(&color_desc())?;
    pool.release_texture(&texture)?;
    pool.tick()?;
    pool.tick()?;

    assert_eq!(pool.allocate_texture(&color_desc())?, texture);
    pool.release_texture(&texture)?;
    pool.tick()?;
    pool.tick()?;
    assert_eq!(pool.texture_count()?, 1);
    pool.tick()?;
    assert_eq!(pool.texture_count()?, 0);
    Ok(())
}

#[test]
pub fn active_resources_never_age_out() -> Result<()> {
    let context = framework::make_context_with_settings(PoolSettings {
        grace_frames: 0,
    });
    let pool = &context.pool;
    let texture = pool.allocate_texture(&color_desc())?;
    let buffer = pool.allocate_buffer(&BufferDesc::new(256))?;
    for _ in 0..10 {
        pool.tick()?;
    }
    assert_eq!(pool.texture_count()?, 1);
    assert_eq!(pool.buffer_count()?, 1);

    pool.release_texture(&texture)?;
    pool.release_buffer(&buffer)?;
    // Age counts from the release, not from the allocation.
    pool.tick()?;
    assert_eq!(pool.texture_count()?, 1);
    pool.tick()?;
    assert_eq!(pool.texture_count()?, 0);
    assert_eq!(pool.buffer_count()?, 0);
    Ok(())
}

#[test]
pub fn buffers_are_pooled() -> Result<()> {
    let context = framework::make_context();
    let pool = &context.pool;
    let desc = BufferDesc::structured(64, 16);
    let buffer = pool.allocate_buffer(&desc)?;
    pool.release_buffer(&buffer)?;
    assert_eq!(pool.allocate_buffer(&desc)?, buffer);
    assert_ne!(pool.allocate_buffer(&desc)?, buffer);
    assert_eq!(pool.buffer_count()?, 2);
    assert_eq!(pool.active_buffer_count()?, 2);
    Ok(())
}

#[test]
pub fn oversized_structured_buffer_saturates() {
    let desc = BufferDesc::structured(u64::MAX / 2, 64);
    assert_eq!(desc.size, u64::MAX);
    assert_eq!(desc.stride, 64);
    assert_eq!(BufferDesc::structured(1024, 32).size, 32 * 1024);
}

#[test]
pub fn releasing_foreign_resource_is_ignored() -> Result<()> {
    let context = framework::make_context();
    let pool = &context.pool;
    let texture = pool.allocate_texture(&color_desc())?;
    pool.release_texture(&12345)?;
    pool.release_buffer(&texture)?;
    assert_eq!(pool.active_texture_count()?, 1);

    // Releasing twice is just as harmless.
    pool.release_texture(&texture)?;
    pool.release_texture(&texture)?;
    assert_eq!(pool.active_texture_count()?, 0);
    Ok(())
}

#[test]
pub fn allocation_failure_is_propagated() -> Result<()> {
    let context = framework::make_context();
    let pool = &context.pool;
    pool.device().fail_allocations(true);
    assert!(pool.allocate_texture(&color_desc()).is_err());
    assert!(pool.allocate_buffer(&BufferDesc::new(16)).is_err());
    assert_eq!(pool.texture_count()?, 0);

    pool.device().fail_allocations(false);
    pool.allocate_texture(&color_desc())?;
    assert_eq!(pool.texture_count()?, 1);
    Ok(())
}

#[test]
pub fn dropping_pool_destroys_everything() -> Result<()> {
    let framework::Context {
        pool,
        events,
    } = framework::make_context();
    let texture = pool.allocate_texture(&color_desc())?;
    let buffer = pool.allocate_buffer(&BufferDesc::new(16))?;
    pool.release_buffer(&buffer)?;
    drop(pool);

    let events = events.lock().unwrap();
    assert!(events.contains(&Event::DestroyTexture(texture)));
    assert!(events.contains(&Event::DestroyBuffer(buffer)));
    Ok(())
}

#[test]
pub fn clones_share_one_pool() -> Result<()> {
    let context = framework::make_context();
    let clone = context.pool.clone();
    let texture = clone.allocate_texture(&color_desc())?;
    assert_eq!(context.pool.active_texture_count()?, 1);
    context.pool.release_texture(&texture)?;
    clone.tick()?;
    assert_eq!(context.pool.frame_index()?, 1);
    assert_eq!(clone.active_texture_count()?, 0);
    Ok(())
}
