//! Shader reflection for vertex/fragment pairs
//!
//! A [backend::ShaderBackend] exposes one compiled stage. [build_tasks] runs
//! each stage through [binding_slots], [validation] and [reflection], then
//! hands the [model::ProgramReflection] to the [json] or [sbs] serializer.

pub mod backend;
pub mod binding_slots;
pub mod build_tasks;
pub mod error;
pub mod json;
pub mod model;
pub mod reflection;
pub mod sbs;
pub mod validation;

pub use error::{ShaderError, ShaderResult};
