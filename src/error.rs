//! Error kinds for the physics core.

use thiserror::Error;

/// Errors raised by the physics core.
///
/// Most of the engine's degenerate cases (capped box/plane contact count,
/// a zero-length normal, an unrecognized shape pair during narrowphase) are
/// handled gracefully in place and only logged — see the module docs on
/// `narrowphase` and `broadphase`. The variants here are the ones that
/// actually propagate to a caller.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PhysicsError {
    /// The impulse handler's 3x3 collision matrix was singular (or produced
    /// a non-finite solve), so no impulse could be computed.
    #[error("impulse solve encountered a singular collision matrix")]
    SolverSingular,

    /// A shape-pair with no narrowphase handler reached dispatch.
    #[error("no narrowphase handler for this shape pair")]
    UnsupportedShape,

    /// `collision_pairs` was called on a broadphase with no implementation.
    #[error("broadphase has no collision_pairs implementation")]
    UnknownBroadphase,

    /// A setter/getter requiring world access was called on a detached body.
    ///
    /// Never actually returned as an `Err` by this crate: per the data
    /// model, a detached body's getters/setters operate on its in-record
    /// state instead of raising. The variant exists so callers who want to
    /// distinguish "detached" from "attached" programmatically have a
    /// matching arm to write against.
    #[error("body is not attached to a world")]
    DetachedBody,
}
