//! Exposes resource descriptions, states and the cross-frame resource pool.

pub mod desc;
pub mod pool;
pub mod state;
