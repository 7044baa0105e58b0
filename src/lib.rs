// Core modules
pub mod catalog;
pub mod codegen;
pub mod composer;
pub mod config;
pub mod db;
pub mod models;
pub mod persistence;
pub mod runtime;
pub mod session;
pub mod validation;

// Re-export commonly used types
pub use catalog::{BlockCatalog, BlockKind, Family, KindId, ParamValue};
pub use codegen::{emit, EmitTarget};
pub use composer::{ComposerError, StrategyComposer};
pub use models::*;
pub use persistence::{StoreError, TemplateStore};
pub use session::{EditingSession, SaveError};
pub use validation::{validate, Violation, ViolationCode};
