use std::path::PathBuf;

use shader_sbs::build_tasks::*;
use shader_sbs::shaders::ShaderError;
use shader_sbs::shaders::backend::{ShaderBackend, TableBackend};
use shader_sbs::shaders::error::ValidationError;
use shader_sbs::shaders::model::*;
use shader_sbs::shaders::sbs;
use shader_sbs::util::manifest_path;

fn fixture(file_name: &str) -> Box<dyn ShaderBackend> {
    let path = manifest_path(["tests", "fixtures", file_name]);
    Box::new(TableBackend::from_path(&path).unwrap())
}

fn quad_pair() -> Vec<Box<dyn ShaderBackend>> {
    vec![fixture("quad.frag.json"), fixture("quad.vert.json")]
}

fn tmp_dir() -> PathBuf {
    let tmp_prefix = format!("shader-sbs-test-{}", uuid::Uuid::new_v4());
    std::env::temp_dir().join(tmp_prefix)
}

#[test]
fn glsl_pair_to_sbs() {
    let tmp_dir_path = tmp_dir();
    let config = Config::new(
        TargetProfile::default(),
        Some(tmp_dir_path.join("quad.ext").as_path()),
        OutputFormat::Sbs,
    );

    let path = build_program(&config, quad_pair()).unwrap();
    assert_eq!(path, tmp_dir_path.join("quad.sbs"));

    let program = sbs::read_program(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(program.name, "quad");
    assert_eq!(program.stages.len(), 2);

    let vertex = &program.stages[0];
    assert_eq!(vertex.stage, Stage::Vertex);
    assert!(vertex.source.starts_with("#version 330\n"));
    assert!(vertex.source.contains("uniform vec4 vs_params[4]; // binding 0"));
    assert_eq!(vertex.inputs[1].semantic_name, "TEXCOORD");
    assert_eq!(vertex.uniform_blocks[0].binding, 0);
    assert!(vertex.uniform_blocks[0].flattened);

    let fragment = &program.stages[1];
    assert_eq!(fragment.stage, Stage::Fragment);
    assert!(fragment.inputs.is_empty());
    assert_eq!(fragment.uniform_blocks[0].binding, 4);
    assert_eq!(fragment.uniform_blocks[0].inst_name, "params");
    assert_eq!(fragment.texture_samplers[0].name, "albedo_smp");
    assert_eq!(fragment.texture_samplers[0].binding, 16);
    assert!(fragment.source.contains("uniform sampler2D albedo_smp; // binding 16"));

    std::fs::remove_dir_all(&tmp_dir_path).unwrap();
}

#[test]
fn glsl_pair_to_json() {
    let tmp_dir_path = tmp_dir();
    let config = Config::new(
        TargetProfile::default(),
        Some(tmp_dir_path.join("quad").as_path()),
        OutputFormat::Json,
    );

    let path = build_program(&config, quad_pair()).unwrap();
    assert_eq!(path, tmp_dir_path.join("quad_glsl.json"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["language"], "glsl");
    assert_eq!(json["version"], 330);
    assert_eq!(json["vs"]["file"], "quad_vs.glsl");
    assert_eq!(json["vs"]["inputs"][0]["semantic_name"], "POSITION");
    assert_eq!(json["vs"]["uniform_blocks"][0]["uniforms"][0]["type"], "mat4");
    assert_eq!(json["fs"]["uniform_blocks"][0]["binding"], 4);
    assert_eq!(json["fs"]["textures"][0]["set"], 1);
    assert_eq!(json["fs"]["samplers"][0]["type"], "filtering");
    assert_eq!(json["fs"]["texture_samplers"][0]["texture_name"], "albedo");

    let fragment_source = std::fs::read_to_string(tmp_dir_path.join("quad_fs.glsl")).unwrap();
    assert!(fragment_source.ends_with("void main() {}\n"));

    std::fs::remove_dir_all(&tmp_dir_path).unwrap();
}

#[test]
fn hlsl_pair_keeps_separate_samplers() {
    let profile = TargetProfile::from_name("hlsl5").unwrap();
    let config = Config::new(profile, None, OutputFormat::Sbs);

    let program = compile_program(&config, quad_pair()).unwrap();

    let vertex = program.stage(Stage::Vertex).unwrap();
    assert!(vertex.source.starts_with("#version 50\n"));
    assert!(!vertex.uniform_blocks[0].flattened);
    assert!(vertex.texture_samplers.is_empty());

    let fragment = program.stage(Stage::Fragment).unwrap();
    assert!(fragment.texture_samplers.is_empty());
    assert_eq!((fragment.textures[0].set, fragment.textures[0].binding), (1, 0));
    assert_eq!((fragment.samplers[0].set, fragment.samplers[0].binding), (1, 0));
    assert_eq!(fragment.uniform_blocks[0].binding, 4);
}

#[test]
fn single_stage_skips_interface_validation() {
    let config = Config::new(TargetProfile::default(), None, OutputFormat::Sbs);

    let program = compile_program(&config, vec![fixture("quad.frag.json")]).unwrap();
    assert_eq!(program.stages.len(), 1);
    assert_eq!(program.stages[0].stage, Stage::Fragment);
}

#[test]
fn mixed_block_fails_without_output() {
    let tmp_dir_path = tmp_dir();
    let config = Config::new(
        TargetProfile::default(),
        Some(tmp_dir_path.join("mixed.sbs").as_path()),
        OutputFormat::Sbs,
    );

    let err = build_program(&config, vec![fixture("mixed_block.vert.json")]).unwrap_err();
    assert!(matches!(
        err,
        ShaderError::Validation(ValidationError::MixedBaseType { .. })
    ));
    assert!(err.to_string().contains("mixed base type"));

    assert!(!tmp_dir_path.join("mixed.sbs").exists());
}

#[test]
fn duplicate_stages_are_rejected() {
    let config = Config::new(TargetProfile::default(), None, OutputFormat::Sbs);

    let backends = vec![fixture("quad.vert.json"), fixture("quad.vert.json")];
    let err = compile_program(&config, backends).unwrap_err();
    assert!(matches!(
        err,
        ShaderError::Validation(ValidationError::DuplicateStage(Stage::Vertex))
    ));
}
