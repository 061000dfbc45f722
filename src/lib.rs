#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::doc_markdown,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::uninlined_format_args
)]

pub mod error;
pub mod gateway;
pub mod plugins;

pub use error::GatewayError;
pub use gateway::{
    BatchEntry, CallMetadata, CallOptions, CallResult, Gateway, PluginInfo, PluginMetadata,
    RateLimitConfig,
};
pub use plugins::{MethodSchema, ParamKind, ParamSpec, Plugin, PluginCapability, ReturnSpec};
