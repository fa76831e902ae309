#![deny(unsafe_code)]

//! Type model for rpcgen.
//!
//! Everything downstream of the front end reads these types and nothing else:
//!
//! ```text
//! source file  →  rpcgen-parse  →  Program  →  rpcgen-codegen  →  client stubs, models, runtime
//! ```
//!
//! A [`Program`] is built once per source file and is immutable afterwards.
//! Every target language renders from the same `Program`, so all types here
//! are plain data: `Clone`, `Send`, `Sync`, no interior mutability.

mod error;
mod exposure;
mod node;
mod program;

pub use error::{Error, Result};
pub use exposure::{ClassExposure, ExposureConfig, ExposureKind, ExposureResolver};
pub use node::{Node, PropertyDefinition, RefKind, TypeRef};
pub use program::{
    ClassDefinition, Declaration, DeclarationShape, EnumCase, EnumValueKind, Literal,
    MethodDefinition, ParameterDefinition, Program, SourceLanguage,
};
