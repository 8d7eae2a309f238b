use std::path::{Path, PathBuf};

use log::*;

use super::backend::{BackendOptions, Id, ShaderBackend};
use super::binding_slots::{ResourceCategory, fix_bind_slots, slot_base};
use super::error::{SerializationError, ShaderResult, ValidationError};
use super::model::*;
use super::reflection::{combine_image_samplers, reflect_stage, reflect_stage_type};
use super::validation::{validate_interface, validate_stage_resources};
use super::{json, sbs};

/// basename used when no output template is given
pub const DEFAULT_OUTPUT_BASENAME: &str = "output";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// one binary container holding sources and reflection
    #[default]
    Sbs,
    /// a reflection json plus one source file per stage
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub profile: TargetProfile,
    /// the directory to write artifacts into, empty for the working directory
    pub output_dir: PathBuf,
    /// artifact file names are derived from this
    pub output_basename: String,
    pub format: OutputFormat,
}

impl Config {
    /// Splits an output template such as `out/lit.sbs` into directory and basename
    ///
    /// The extension is ignored, the format decides it.
    pub fn new(profile: TargetProfile, output: Option<&Path>, format: OutputFormat) -> Self {
        let (output_dir, output_basename) = match output {
            Some(output) => {
                let output_dir = output.parent().map(Path::to_path_buf).unwrap_or_default();
                let output_basename = output
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_else(|| DEFAULT_OUTPUT_BASENAME.to_string());
                (output_dir, output_basename)
            }
            None => (PathBuf::new(), DEFAULT_OUTPUT_BASENAME.to_string()),
        };

        Self {
            profile,
            output_dir,
            output_basename,
            format,
        }
    }
}

/// Runs one stage through option setup, slot allocation, validation, code
/// generation and reflection, in that order
pub fn compile_stage(
    backend: &mut dyn ShaderBackend,
    profile: &TargetProfile,
) -> ShaderResult<StageReflection> {
    let stage = reflect_stage_type(backend)?;
    let lang = profile.lang;

    debug!("{}: compiling {stage:?} stage for {profile:?}", backend.file_name());

    backend.set_options(&BackendOptions::for_profile(*profile));

    let texture_samplers = if lang.uses_combined_image_samplers() {
        let first_binding =
            slot_base(lang, ResourceCategory::CombinedImageSampler, stage).first_binding();
        combine_image_samplers(backend, first_binding)
    } else {
        vec![]
    };

    fix_bind_slots(backend, lang, stage, texture_samplers.len() as u32);
    validate_stage_resources(backend, lang)?;

    if lang.flattens_uniform_blocks() {
        let block_ids: Vec<Id> = backend
            .resources()
            .uniform_buffers
            .iter()
            .map(|ub_res| ub_res.id)
            .collect();

        for id in block_ids {
            backend.flatten_buffer_block(id);
        }
    }

    let source = backend.compile()?;
    let reflection = reflect_stage(backend, profile, texture_samplers, source)?;

    Ok(reflection)
}

/// Compiles every given stage and checks the pair interface
///
/// The interface is only validated when both stages are present.
pub fn compile_program(
    config: &Config,
    backends: Vec<Box<dyn ShaderBackend>>,
) -> ShaderResult<ProgramReflection> {
    let mut stages: Vec<StageReflection> = vec![];

    for mut backend in backends {
        let reflection = compile_stage(backend.as_mut(), &config.profile)?;

        if stages.iter().any(|s| s.stage == reflection.stage) {
            return Err(ValidationError::DuplicateStage(reflection.stage).into());
        }

        stages.push(reflection);
    }

    if stages.is_empty() {
        return Err(ValidationError::MissingStage(Stage::Vertex).into());
    }

    stages.sort_by_key(|s| s.stage != Stage::Vertex);

    let program = ProgramReflection {
        name: config.output_basename.clone(),
        profile: config.profile,
        stages,
    };

    if program.stages.len() == 2 {
        validate_interface(&program)?;
    }

    Ok(program)
}

/// Writes the program with the configured serializer, returning the primary artifact
pub fn write_program(config: &Config, program: &ProgramReflection) -> ShaderResult<PathBuf> {
    if !config.output_dir.as_os_str().is_empty() {
        std::fs::create_dir_all(&config.output_dir).map_err(|source| SerializationError::Io {
            path: config.output_dir.clone(),
            source,
        })?;
    }

    let path = match config.format {
        OutputFormat::Sbs => sbs::write_sbs(program, &config.output_dir, &config.output_basename)?,
        OutputFormat::Json => {
            json::write_json(program, &config.output_dir, &config.output_basename)?
        }
    };

    Ok(path)
}

/// compiles and writes, nothing is written if any stage fails
pub fn build_program(
    config: &Config,
    backends: Vec<Box<dyn ShaderBackend>>,
) -> ShaderResult<PathBuf> {
    let program = compile_program(config, backends)?;
    write_program(config, &program)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::shaders::backend::{Decoration, TableBackend};
    use crate::shaders::reflection::tests::*;

    /// a declared `sampler2D` (70) next to a pair fused from image 50 and sampler 51
    fn mixed_sampler_tables(execution_model: &str) -> serde_json::Value {
        let mut tables = lit_vertex_tables();
        tables["executionModel"] = json!(execution_model);
        tables["types"]["10"] = json!({
            "baseType": "image",
            "image": { "dim": "2d", "sampledType": 3 }
        });
        tables["types"]["13"] = json!({ "baseType": "sampler" });
        tables["types"]["15"] = json!({
            "baseType": "sampledImage",
            "image": { "dim": "2d", "sampledType": 3 }
        });

        let resources = &mut tables["resources"];
        resources["separateImages"] = json!([{ "id": 50, "typeId": 10, "name": "albedo" }]);
        resources["separateSamplers"] = json!([{ "id": 51, "typeId": 13, "name": "smp" }]);
        resources["sampledImages"] = json!([{ "id": 70, "typeId": 15, "name": "lut" }]);

        tables["combinedSamplers"] = json!([{ "combinedId": 60, "imageId": 50, "samplerId": 51 }]);
        tables["source"] = json!("{{set:60}}/{{binding:60}} {{set:70}}/{{binding:70}}");
        tables
    }

    #[test]
    fn pairs_and_declared_combined_samplers_never_share_a_slot() {
        let profile = TargetProfile::default();

        let mut vertex = backend_from(mixed_sampler_tables("vertex"));
        let reflection = compile_stage(&mut vertex, &profile).unwrap();
        assert_eq!(reflection.source, "0/0 0/1");
        assert_eq!(reflection.texture_samplers[0].binding, 0);
        assert_eq!(vertex.decoration(70, Decoration::Binding), 1);

        let lut = reflection.textures.iter().find(|tex| tex.name == "lut").unwrap();
        assert_eq!((lut.set, lut.binding), (0, 1));

        let mut fragment = backend_from(mixed_sampler_tables("fragment"));
        let reflection = compile_stage(&mut fragment, &profile).unwrap();
        assert_eq!(reflection.source, "0/16 0/17");
        assert_eq!(reflection.texture_samplers[0].binding, 16);
    }

    #[test]
    fn only_gl_targets_flatten_uniform_blocks() {
        let mut glsl = backend_from(lit_vertex_tables());
        compile_stage(&mut glsl, &TargetProfile::default()).unwrap();
        assert_eq!(glsl.flattened_blocks().iter().copied().collect::<Vec<_>>(), vec![40]);

        for name in ["hlsl5", "msl21"] {
            let profile = TargetProfile::from_name(name).unwrap();
            let mut backend = backend_from(lit_vertex_tables());
            compile_stage(&mut backend, &profile).unwrap();
            assert!(backend.flattened_blocks().is_empty(), "{name}");
        }
    }

    #[test]
    fn profile_reaches_the_back_end() {
        let mut profile = TargetProfile::from_name("msl21").unwrap();
        profile.platform = Platform::Ios;

        let mut backend = TableBackend::new(serde_json::from_value(lit_vertex_tables()).unwrap());
        assert!(backend.options().is_none());

        compile_stage(&mut backend, &profile).unwrap();
        let options = backend.options().unwrap();
        assert_eq!(options.profile.platform, Platform::Ios);
        assert_eq!(options.profile.version, 20100);
        assert!(options.enable_decoration_binding);
    }

    #[test]
    fn output_template_splits_into_dir_and_basename() {
        let profile = TargetProfile::default();

        let config = Config::new(
            profile,
            Some(Path::new("out/shaders/lit.sbs")),
            OutputFormat::Sbs,
        );
        assert_eq!(config.output_dir, PathBuf::from("out/shaders"));
        assert_eq!(config.output_basename, "lit");

        let config = Config::new(profile, Some(Path::new("lit")), OutputFormat::Json);
        assert_eq!(config.output_dir, PathBuf::new());
        assert_eq!(config.output_basename, "lit");

        let config = Config::new(profile, None, OutputFormat::Sbs);
        assert_eq!(config.output_basename, "output");
    }
}
