//! Language adapters.
//!
//! One module per supported grammar, each implementing
//! [`LanguageAdapter`](crate::adapter::LanguageAdapter), plus the
//! global registry that maps names and file extensions to adapters.

pub mod registry;

pub mod c;
pub mod go;
pub mod java;
pub mod python;
pub mod rust_lang;
pub mod typescript;

pub use c::C;
pub use go::Go;
pub use java::Java;
pub use python::Python;
pub use registry::{global, AdapterRegistry};
pub use rust_lang::RustLang;
pub use typescript::TypeScript;
