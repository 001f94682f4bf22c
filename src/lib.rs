#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod bundle;
pub mod config;
pub mod loader;
pub mod models;
pub mod session;
pub mod stylesheet;
pub mod uri;

pub use config::LoaderConfig;
pub use loader::{Completion, CssLoader, LoadError, PendingLoad, TransportError};
pub use session::{LoadSession, load_stylesheets};
pub use stylesheet::{Stylesheet, rewrite};
pub use uri::convert_base;
