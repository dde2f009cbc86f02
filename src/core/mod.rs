pub mod output;
pub mod pass;
#[cfg(feature = "devel")]
pub(crate) mod reload;
pub mod render;
pub mod service;
pub mod template;
