//! Exposes the framegraph error type

use std::sync::PoisonError;

use thiserror::Error;

use crate::core::device::ViewType;
use crate::resource::state::ResourceState;

/// Error type that framegraph can return.
///
/// Apart from [`Error::PoisonError`], every variant describes a mistake in pass authoring. These are static and
/// reproduce every frame, so nothing in this crate attempts to recover from them. Propagate them and abandon the frame.
#[derive(Error, Debug)]
pub enum Error {
    /// A texture or buffer with this name was already declared or imported in this graph.
    #[error("Resource `{0}` has already been declared in this graph.")]
    DuplicateResource(String),
    /// Tried to use a resource name that was never declared or imported.
    #[error("Resource `{0}` has not been declared.")]
    UndeclaredResource(String),
    /// A pass tried to resolve a resource it did not declare in its setup callback.
    #[error("Pass `{pass}` did not declare access to resource `{resource}`.")]
    UndeclaredAccess {
        /// Name of the offending pass.
        pass: String,
        /// Name of the resource it tried to access.
        resource: String,
    },
    /// An id that was not handed out by this graph, usually one kept from an earlier frame.
    #[error("{kind} id {index} does not belong to this graph.")]
    InvalidResourceId {
        /// Either `"texture"` or `"buffer"`.
        kind: &'static str,
        /// Index stored in the id.
        index: usize,
    },
    /// Requested a view type that does not exist for this kind of resource, such as a render target view of a buffer.
    #[error("View type {view:?} is not valid for {kind} `{name}`.")]
    InvalidViewType {
        /// Name of the resource.
        name: String,
        /// Either `"texture"` or `"buffer"`.
        kind: &'static str,
        /// The requested view type.
        view: ViewType,
    },
    /// Passes in the same dependency level require states for a resource that cannot be held simultaneously.
    #[error("Invalid resource state combination {state:?} required for `{name}` in dependency level {level}.")]
    InvalidStateCombination {
        /// Name of the resource.
        name: String,
        /// The combined state.
        state: ResourceState,
        /// The dependency level requiring this state.
        level: usize,
    },
    /// A graphics pass with automatic render pass setup was executed without a viewport.
    #[error("Viewport of graphics pass `{0}` is 0. The call to set_viewport() is probably missing.")]
    MissingViewport(String),
    /// Two different passes declared a write to the same resource.
    #[error("Resource `{resource}` is written by both `{first}` and `{second}`.")]
    MultipleWriters {
        /// Name of the resource.
        resource: String,
        /// Pass that declared the first write.
        first: String,
        /// Pass that declared the second write.
        second: String,
    },
    /// The clear value of an attachment does not match its attachment type.
    #[error("Invalid clear value for attachment `{0}`.")]
    InvalidClearValue(String),
    /// No physical resource was bound to a graph resource at the time it was resolved.
    #[error("No resource bound to graph resource `{0}`")]
    NoResourceBound(String),
    /// A previous call on this graph failed and left it in an inconsistent state.
    #[error("Render graph is unusable after an earlier error.")]
    GraphPoisoned,
    /// Poisoned mutex
    #[error("Poisoned mutex")]
    PoisonError,
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Self {
        Error::PoisonError
    }
}
