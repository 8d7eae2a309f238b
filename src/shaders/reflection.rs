use log::*;

use super::backend::{ExecutionModel, ShaderBackend, TypeInfo};
use super::error::ExtractionError;
use super::model::*;

mod attributes;
use attributes::*;

mod images;
pub use images::combine_image_samplers;
use images::*;

mod uniform_blocks;
use uniform_blocks::*;

/// the stage a compiled module belongs to, from its execution model
pub fn reflect_stage_type(backend: &dyn ShaderBackend) -> Result<Stage, ExtractionError> {
    match backend.execution_model() {
        ExecutionModel::Vertex => Ok(Stage::Vertex),
        ExecutionModel::Fragment => Ok(Stage::Fragment),
        model => Err(ExtractionError::UnsupportedExecutionModel {
            file: backend.file_name().to_string(),
            model: format!("{model:?}"),
        }),
    }
}

/// Builds the reflection record for one compiled stage
///
/// Bindings are read back from the back end's decorations, so this runs after
/// slot allocation. `texture_samplers` are the pairs named by
/// [combine_image_samplers], empty for targets with separate samplers.
pub fn reflect_stage(
    backend: &dyn ShaderBackend,
    profile: &TargetProfile,
    texture_samplers: Vec<TextureSamplerPair>,
    source: String,
) -> Result<StageReflection, ExtractionError> {
    let stage = reflect_stage_type(backend)?;
    let entry_point = reflect_entry_point(backend, stage)?;

    let resources = backend.resources();
    let inputs = reflect_attributes(backend, &resources.stage_inputs, stage == Stage::Vertex)?;
    let outputs = reflect_attributes(backend, &resources.stage_outputs, false)?;

    let uniform_blocks = reflect_uniform_blocks(backend, profile)?;
    let storage_buffers = reflect_storage_buffers(backend)?;
    let textures = reflect_textures(backend)?;
    let samplers = reflect_samplers(backend)?;

    debug!(
        "{}: reflected {stage:?} stage '{entry_point}': {} inputs, {} outputs, {} uniform blocks, {} textures, {} samplers",
        backend.file_name(),
        inputs.len(),
        outputs.len(),
        uniform_blocks.len(),
        textures.len(),
        samplers.len(),
    );

    Ok(StageReflection {
        stage,
        source_file: backend.file_name().to_string(),
        entry_point,
        source,
        inputs,
        outputs,
        uniform_blocks,
        storage_buffers,
        textures,
        samplers,
        texture_samplers,
    })
}

fn reflect_entry_point(
    backend: &dyn ShaderBackend,
    stage: Stage,
) -> Result<String, ExtractionError> {
    let execution_model = backend.execution_model();

    backend
        .entry_points()
        .iter()
        .find(|entry_point| entry_point.execution_model == execution_model)
        .map(|entry_point| entry_point.name.clone())
        .ok_or_else(|| ExtractionError::MissingEntryPoint {
            file: backend.file_name().to_string(),
            stage,
        })
}

fn type_info_for<'a>(
    backend: &'a dyn ShaderBackend,
    resource_name: &str,
    type_id: u32,
) -> Result<&'a TypeInfo, ExtractionError> {
    backend
        .type_info(type_id)
        .ok_or_else(|| ExtractionError::UnknownType {
            file: backend.file_name().to_string(),
            resource: resource_name.to_string(),
            type_id,
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use serde_json::json;

    use super::*;
    use crate::shaders::backend::{BackendOptions, StageTables, TableBackend};

    pub(crate) fn backend_from(value: serde_json::Value) -> TableBackend {
        let tables: StageTables = serde_json::from_value(value).unwrap();
        let mut backend = TableBackend::new(tables);
        backend.set_options(&BackendOptions::for_profile(TargetProfile::default()));
        backend
    }

    pub(crate) fn lit_vertex_tables() -> serde_json::Value {
        json!({
            "file": "lit.vert",
            "executionModel": "vertex",
            "entryPoints": [
                { "name": "frag_main", "executionModel": "fragment" },
                { "name": "main", "executionModel": "vertex" }
            ],
            "types": {
                "1": { "baseType": "float", "vecsize": 3 },
                "2": { "baseType": "float", "vecsize": 2 },
                "3": { "baseType": "float", "vecsize": 4 },
                "4": { "baseType": "float", "vecsize": 4, "columns": 4 },
                "5": { "baseType": "float", "vecsize": 4, "array": [4] },
                "6": { "baseType": "struct", "declaredSize": 128, "members": [
                    { "name": "mvp", "typeId": 4, "offset": 0 },
                    { "name": "lights", "typeId": 5, "offset": 64 }
                ] },
                "7": { "baseType": "boolean" }
            },
            "resources": {
                "stageInputs": [
                    { "id": 20, "typeId": 1, "name": "a_position" },
                    { "id": 21, "typeId": 2, "name": "a_texcoord0" }
                ],
                "stageOutputs": [
                    { "id": 30, "typeId": 3, "name": "v_color" },
                    { "id": 31, "typeId": 2, "name": "v_uv" }
                ],
                "uniformBuffers": [
                    { "id": 40, "typeId": 6, "name": "u_vs_params" }
                ]
            },
            "decorations": {
                "20": { "location": 0 },
                "21": { "location": 2 },
                "30": { "location": 0 },
                "31": { "location": 1 },
                "40": { "set": 0, "binding": 0 }
            },
            "source": "void main() {}"
        })
    }

    pub(crate) fn shadow_fragment_tables() -> serde_json::Value {
        json!({
            "file": "shadow.frag",
            "executionModel": "fragment",
            "entryPoints": [{ "name": "main", "executionModel": "fragment" }],
            "types": {
                "1": { "baseType": "float", "vecsize": 4 },
                "2": { "baseType": "float" },
                "3": { "baseType": "int" },
                "10": { "baseType": "image", "image": { "dim": "2d", "sampledType": 2 } },
                "11": { "baseType": "image", "image": { "dim": "2d", "arrayed": true, "sampledType": 3 } },
                "12": { "baseType": "image", "image": { "dim": "cube", "arrayed": true, "sampledType": 2 } },
                "13": { "baseType": "sampler" }
            },
            "resources": {
                "stageInputs": [{ "id": 20, "typeId": 1, "name": "v_color" }],
                "stageOutputs": [{ "id": 21, "typeId": 1, "name": "frag_color" }],
                "separateImages": [
                    { "id": 30, "typeId": 10, "name": "shadow_map" },
                    { "id": 31, "typeId": 11, "name": "layers" },
                    { "id": 32, "typeId": 12, "name": "probes" }
                ],
                "separateSamplers": [
                    { "id": 40, "typeId": 13, "name": "shadow_smp" },
                    { "id": 41, "typeId": 13, "name": "linear_smp" }
                ]
            },
            "comparisonIds": [30, 40],
            "combinedSamplers": [
                { "combinedId": 60, "imageId": 30, "samplerId": 40 },
                { "combinedId": 61, "imageId": 31, "samplerId": 41 }
            ],
            "source": "uniform sampler2DShadow {{name:60}}; // binding {{binding:60}}"
        })
    }

    #[test]
    fn reflects_vertex_stage() {
        let backend = backend_from(lit_vertex_tables());
        let reflection =
            reflect_stage(&backend, &TargetProfile::default(), vec![], "src".to_string()).unwrap();

        assert_eq!(reflection.stage, Stage::Vertex);
        assert_eq!(reflection.entry_point, "main");
        assert_eq!(reflection.source_file, "lit.vert");

        let texcoord = &reflection.inputs[1];
        assert_eq!(texcoord.name, "a_texcoord0");
        assert_eq!(texcoord.location, 2);
        assert_eq!(texcoord.semantic_name, "TEXCOORD");
        assert_eq!(texcoord.semantic_index, 0);
        assert_eq!(texcoord.attribute_type, AttributeType::Float2);

        assert_eq!(reflection.outputs[0].attribute_type, AttributeType::Float4);

        let block = &reflection.uniform_blocks[0];
        assert_eq!(block.name, "u_vs_params");
        assert_eq!(block.inst_name, "_40");
        assert_eq!(block.size_bytes, 128);
        assert!(block.flattened);
        assert_eq!(block.uniforms[0].uniform_type, UniformType::Mat4);
        assert_eq!(block.uniforms[1].array_count, 4);
        assert_eq!(block.uniforms[1].offset, 64);
    }

    #[test]
    fn rejects_other_execution_models() {
        let mut tables = lit_vertex_tables();
        tables["executionModel"] = json!("compute");
        let backend = backend_from(tables);

        let err = reflect_stage_type(&backend).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::UnsupportedExecutionModel { .. }
        ));
    }

    #[test]
    fn missing_entry_point_is_an_error() {
        let mut tables = lit_vertex_tables();
        tables["entryPoints"] = json!([{ "name": "frag_main", "executionModel": "fragment" }]);
        let backend = backend_from(tables);

        let err =
            reflect_stage(&backend, &TargetProfile::default(), vec![], String::new()).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingEntryPoint { .. }));
    }

    #[test]
    fn unmapped_attribute_types_are_kept_as_invalid() {
        let mut tables = lit_vertex_tables();
        tables["resources"]["stageOutputs"][1]["typeId"] = json!(7);
        let backend = backend_from(tables);

        let reflection =
            reflect_stage(&backend, &TargetProfile::default(), vec![], String::new()).unwrap();
        assert_eq!(reflection.outputs[1].attribute_type, AttributeType::Invalid);
    }
}
