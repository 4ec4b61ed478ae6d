use thiserror::Error;

/// Errors reported by a [`MapSurface`](super::MapSurface).
///
/// The presenter logs these and carries on; they never reach the view.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MapError {
    /// The camera or renderer handle has been released.
    #[error("Map surface released")]
    Released,

    /// The presenter task has shut down.
    #[error("Map presenter has shut down")]
    PresenterClosed,

    /// The provider rejected an operation.
    #[error("Map provider error: {0}")]
    Provider(String),
}
