//! Use-case services — batch dispatch, polling loops, and button resolution.

pub mod dispatch;
pub mod processor;
pub mod resolver;

pub use dispatch::{BatchReport, CommandOutcome, DispatchService};
pub use processor::{CommandProcessor, ProcessorConfig};
pub use resolver::{ButtonResolver, ResolveReport, ResolverConfig};
