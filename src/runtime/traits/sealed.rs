// ABOUTME: Sealed trait pattern for runtime traits.
// ABOUTME: Only runtimes defined in this crate may implement the exec traits.

/// Supertrait of every runtime capability trait.
///
/// Kept crate-private so new methods can be added to the exec traits
/// without breaking downstream code. Test doubles inside the crate implement
/// it directly.
pub trait Sealed {}
