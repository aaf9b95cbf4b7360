//! Resource schema compiler.
//!
//! Reads `.schema` declarations of resources, flat data types and enums,
//! validates them into a closed [`Schema`] and generates Rust builders,
//! views and loaders that target the `rcs-runtime` wire format.

pub mod codegen;
pub mod config;
pub mod driver;
pub mod error;
pub mod model;
pub mod reader;

pub use codegen::Generator;
pub use config::GeneratorConfig;
pub use driver::{compile_file, compile_files, CompileReport};
pub use error::{ModelError, Result, SchemaError};
pub use model::{Schema, SchemaBuilder};
pub use reader::{read_file, read_str};
