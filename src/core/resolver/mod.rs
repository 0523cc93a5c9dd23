mod service;
mod task;
#[cfg(test)]
pub(crate) mod test_support;

pub use service::{ResolveOptions, ResolveResult, Resolver};
pub use task::ResolveTask;
