// ABOUTME: Type-safe identifiers shared by the runtime and session layers.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod id;

pub use id::{ContainerId, ExecId};
