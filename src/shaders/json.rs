use std::path::{Path, PathBuf};

use log::*;
use serde::Serialize;

use super::error::SerializationError;
use super::model::*;

#[derive(Debug, Serialize)]
pub struct ReflectionJson {
    pub language: String,
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vs: Option<StageJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fs: Option<StageJson>,
}

#[derive(Debug, Serialize)]
pub struct StageJson {
    /// the companion source file, relative to the json file
    pub file: String,
    pub entry_point: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<InputJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<OutputJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub textures: Vec<TextureJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub samplers: Vec<SamplerJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub texture_samplers: Vec<TextureSamplerJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub uniform_blocks: Vec<UniformBlockJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub storage_buffers: Vec<StorageBufferJson>,
}

#[derive(Debug, Serialize)]
pub struct InputJson {
    pub name: String,
    pub location: u32,
    pub semantic_name: String,
    pub semantic_index: u32,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
}

#[derive(Debug, Serialize)]
pub struct OutputJson {
    pub name: String,
    pub location: u32,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
}

#[derive(Debug, Serialize)]
pub struct TextureJson {
    pub name: String,
    pub set: u32,
    pub binding: u32,
    #[serde(rename = "type")]
    pub texture_type: TextureType,
    pub sampler_type: TextureSampleType,
}

#[derive(Debug, Serialize)]
pub struct SamplerJson {
    pub name: String,
    pub binding: u32,
    #[serde(rename = "type")]
    pub sampler_type: SamplerType,
}

#[derive(Debug, Serialize)]
pub struct TextureSamplerJson {
    pub name: String,
    pub texture_name: String,
    pub sampler_name: String,
    pub binding: u32,
}

#[derive(Debug, Serialize)]
pub struct UniformBlockJson {
    pub name: String,
    pub inst_name: String,
    pub set: u32,
    pub binding: u32,
    pub size_bytes: u32,
    pub flattened: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub uniforms: Vec<UniformJson>,
}

#[derive(Debug, Serialize)]
pub struct UniformJson {
    pub name: String,
    pub array_count: u32,
    pub offset: u32,
    #[serde(rename = "type")]
    pub uniform_type: UniformType,
}

#[derive(Debug, Serialize)]
pub struct StorageBufferJson {
    pub name: String,
    pub inst_name: String,
    pub set: u32,
    pub binding: u32,
    pub size_bytes: u32,
    pub readonly: bool,
    #[serde(rename = "type")]
    pub buffer_type: StorageBufferType,
}

/// `<basename>_<stage>.<lang>`
pub fn stage_file_name(basename: &str, stage: Stage, lang: Lang) -> String {
    format!("{basename}_{}.{}", stage.tag(), lang.tag())
}

/// `<dir>/<basename>_<lang>.json`
pub fn json_path(output_dir: &Path, basename: &str, lang: Lang) -> PathBuf {
    output_dir.join(format!("{basename}_{}.json", lang.tag()))
}

pub fn reflection_json(program: &ProgramReflection, basename: &str) -> ReflectionJson {
    let lang = program.profile.lang;
    let stage_json = |stage| {
        program
            .stage(stage)
            .map(|refl| StageJson::new(refl, stage_file_name(basename, stage, lang)))
    };

    ReflectionJson {
        language: lang.tag().to_string(),
        version: program.profile.version,
        vs: stage_json(Stage::Vertex),
        fs: stage_json(Stage::Fragment),
    }
}

impl StageJson {
    fn new(refl: &StageReflection, file: String) -> Self {
        let inputs = refl
            .inputs
            .iter()
            .map(|attr| InputJson {
                name: attr.name.clone(),
                location: attr.location,
                semantic_name: attr.semantic_name.clone(),
                semantic_index: attr.semantic_index,
                attribute_type: attr.attribute_type,
            })
            .collect();

        let outputs = refl
            .outputs
            .iter()
            .map(|attr| OutputJson {
                name: attr.name.clone(),
                location: attr.location,
                attribute_type: attr.attribute_type,
            })
            .collect();

        let textures = refl
            .textures
            .iter()
            .map(|tex| TextureJson {
                name: tex.name.clone(),
                set: tex.set,
                binding: tex.binding,
                texture_type: tex.texture_type,
                sampler_type: tex.sampler_type,
            })
            .collect();

        let samplers = refl
            .samplers
            .iter()
            .map(|smp| SamplerJson {
                name: smp.name.clone(),
                binding: smp.binding,
                sampler_type: smp.sampler_type,
            })
            .collect();

        let texture_samplers = refl
            .texture_samplers
            .iter()
            .map(|pair| TextureSamplerJson {
                name: pair.name.clone(),
                texture_name: pair.texture_name.clone(),
                sampler_name: pair.sampler_name.clone(),
                binding: pair.binding,
            })
            .collect();

        let uniform_blocks = refl
            .uniform_blocks
            .iter()
            .map(|ub| UniformBlockJson {
                name: ub.name.clone(),
                inst_name: ub.inst_name.clone(),
                set: ub.set,
                binding: ub.binding,
                size_bytes: ub.size_bytes,
                flattened: ub.flattened,
                uniforms: ub
                    .uniforms
                    .iter()
                    .map(|u| UniformJson {
                        name: u.name.clone(),
                        array_count: u.array_count,
                        offset: u.offset,
                        uniform_type: u.uniform_type,
                    })
                    .collect(),
            })
            .collect();

        let storage_buffers = refl
            .storage_buffers
            .iter()
            .map(|sb| StorageBufferJson {
                name: sb.name.clone(),
                inst_name: sb.inst_name.clone(),
                set: sb.set,
                binding: sb.binding,
                size_bytes: sb.size_bytes,
                readonly: sb.readonly,
                buffer_type: sb.buffer_type,
            })
            .collect();

        Self {
            file,
            entry_point: refl.entry_point.clone(),
            inputs,
            outputs,
            textures,
            samplers,
            texture_samplers,
            uniform_blocks,
            storage_buffers,
        }
    }
}

/// pretty printed with 4-space indentation and a trailing newline
pub fn to_json_string(reflection_json: &ReflectionJson) -> Result<String, SerializationError> {
    let mut bytes = vec![];
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
    reflection_json.serialize(&mut serializer)?;

    // serde_json only ever emits utf-8
    let mut json = String::from_utf8_lossy(&bytes).into_owned();
    json.push('\n');

    Ok(json)
}

/// Writes one source file per stage and the reflection json beside them
///
/// Returns the path of the json file.
pub fn write_json(
    program: &ProgramReflection,
    output_dir: &Path,
    basename: &str,
) -> Result<PathBuf, SerializationError> {
    let lang = program.profile.lang;

    for refl in &program.stages {
        let source_path = output_dir.join(stage_file_name(basename, refl.stage, lang));
        write_file(&source_path, format!("{}\n", refl.source).as_bytes())?;
        info!("wrote {}", source_path.display());
    }

    let json = to_json_string(&reflection_json(program, basename))?;
    let json_path = json_path(output_dir, basename, lang);
    write_file(&json_path, json.as_bytes())?;
    info!("wrote {}", json_path.display());

    Ok(json_path)
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), SerializationError> {
    std::fs::write(path, contents).map_err(|source| SerializationError::Io {
        path: path.to_path_buf(),
        source,
    })
}
