pub mod schema;
pub mod traits;

pub use schema::{MethodSchema, ParamKind, ParamSpec, ReturnSpec};
pub use traits::{Plugin, PluginCapability};
