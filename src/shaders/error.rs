use std::path::PathBuf;

use thiserror::Error;

use super::model::Stage;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{file}: unsupported execution model '{model}', expected vertex or fragment")]
    UnsupportedExecutionModel { file: String, model: String },

    #[error("{file}: no entry point for the {stage:?} stage")]
    MissingEntryPoint { file: String, stage: Stage },

    #[error("{file}: resource '{resource}' refers to unknown type id {type_id}")]
    UnknownType {
        file: String,
        resource: String,
        type_id: u32,
    },

    #[error("{file}: resource '{resource}' has an unmapped type: {reason}")]
    UnmappedResourceType {
        file: String,
        resource: String,
        reason: String,
    },

    #[error("{file}: vertex input '{name}' uses location {location}, outside the vertex semantic table")]
    LocationOutOfRange {
        file: String,
        name: String,
        location: u32,
    },

    #[error("{file}: attributes '{first}' and '{second}' share location {location}")]
    DuplicateLocation {
        file: String,
        first: String,
        second: String,
        location: u32,
    },
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{file}: uniform block '{block}' has a mixed base type, all members must be float or all int ('{member}' differs)")]
    MixedBaseType {
        file: String,
        block: String,
        member: String,
    },

    #[error("{file}: uniform block '{block}' member '{member}' has an unsupported base type, only float and int are allowed")]
    UnsupportedBaseType {
        file: String,
        block: String,
        member: String,
    },

    #[error("{file}: uniform block '{block}' member '{member}' is a {dimensions}-dimensional array, only 1-dimensional arrays are allowed")]
    ArrayDimensions {
        file: String,
        block: String,
        member: String,
        dimensions: usize,
    },

    #[error("{file}: uniform block '{block}' member '{member}' is an array of width {width}, arrays must be vec4, ivec4 or mat4")]
    ArrayVectorWidth {
        file: String,
        block: String,
        member: String,
        width: u32,
    },

    #[error("{file}: combined image sampler '{name}' is not supported by {lang}, use separate textures and samplers")]
    CombinedImageSampler {
        file: String,
        name: String,
        lang: String,
    },

    #[error("missing {0:?} stage, vertex and fragment shaders are validated as a pair")]
    MissingStage(Stage),

    #[error("more than one {0:?} stage given")]
    DuplicateStage(Stage),

    #[error("vertex output '{name}' ({vertex_file}) has no matching fragment input in {fragment_file}")]
    MissingFragmentInput {
        name: String,
        vertex_file: String,
        fragment_file: String,
    },

    #[error("fragment input '{name}' ({fragment_file}) has no matching vertex output in {vertex_file}")]
    MissingVertexOutput {
        name: String,
        vertex_file: String,
        fragment_file: String,
    },

    #[error("attribute '{name}' is {vertex_type} in {vertex_file} but {fragment_type} in {fragment_file}")]
    InterfaceTypeMismatch {
        name: String,
        vertex_file: String,
        vertex_type: String,
        fragment_file: String,
        fragment_type: String,
    },
}

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode reflection json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{chunk} chunk of {size} bytes does not fit a 32-bit size field")]
    ChunkTooLarge { chunk: String, size: usize },
}

/// malformed or truncated SBS containers
#[derive(Debug, Error)]
pub enum SbsReadError {
    #[error("unexpected end of data at offset {offset}, {needed} more bytes needed")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("expected a '{expected}' chunk at offset {offset}, found '{found}'")]
    UnexpectedChunk {
        offset: usize,
        expected: String,
        found: String,
    },

    #[error("unsupported sbs version {0}")]
    UnsupportedVersion(u32),

    #[error("unknown {field} tag '{tag}'")]
    UnknownTag { field: &'static str, tag: String },

    #[error("{chunk} chunk declares {declared} bytes but holds {actual}")]
    SizeMismatch {
        chunk: String,
        declared: u32,
        actual: usize,
    },

    #[error("negative binding {binding} for '{name}'")]
    NegativeBinding { name: String, binding: i32 },
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{file}: code generation failed: {message}")]
    Compile { file: String, message: String },

    #[error("cannot read stage tables {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse stage tables {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type ShaderResult<T> = Result<T, ShaderError>;
