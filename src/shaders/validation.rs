use super::backend::{BaseType, ShaderBackend};
use super::error::ValidationError;
use super::model::*;

/// checks run on one stage's resources before its source is generated
pub fn validate_stage_resources(
    backend: &dyn ShaderBackend,
    lang: Lang,
) -> Result<(), ValidationError> {
    validate_uniform_blocks(backend)?;
    validate_combined_image_samplers(backend, lang)?;

    Ok(())
}

/// Uniform blocks must be uploadable as a single vec4 array
///
/// All members share one base type (float or int) and arrays are
/// 1-dimensional with a vector width of 4.
pub fn validate_uniform_blocks(backend: &dyn ShaderBackend) -> Result<(), ValidationError> {
    let file = backend.file_name();

    for ub_res in &backend.resources().uniform_buffers {
        let Some(block_type) = backend.type_info(ub_res.base_type_id()) else {
            // reported by the extractor
            continue;
        };

        let mut block_base_type: Option<BaseType> = None;
        for member in &block_type.members {
            let Some(member_type) = backend.type_info(member.type_id) else {
                continue;
            };

            if !matches!(member_type.base_type, BaseType::Float | BaseType::Int) {
                return Err(ValidationError::UnsupportedBaseType {
                    file: file.to_string(),
                    block: ub_res.name.clone(),
                    member: member.name.clone(),
                });
            }

            match block_base_type {
                None => block_base_type = Some(member_type.base_type),
                Some(base_type) if base_type != member_type.base_type => {
                    return Err(ValidationError::MixedBaseType {
                        file: file.to_string(),
                        block: ub_res.name.clone(),
                        member: member.name.clone(),
                    });
                }
                Some(_) => {}
            }

            if member_type.array.len() > 1 {
                return Err(ValidationError::ArrayDimensions {
                    file: file.to_string(),
                    block: ub_res.name.clone(),
                    member: member.name.clone(),
                    dimensions: member_type.array.len(),
                });
            }

            if member_type.array.len() == 1 && member_type.vecsize != 4 {
                return Err(ValidationError::ArrayVectorWidth {
                    file: file.to_string(),
                    block: ub_res.name.clone(),
                    member: member.name.clone(),
                    width: member_type.vecsize,
                });
            }
        }
    }

    Ok(())
}

pub fn validate_combined_image_samplers(
    backend: &dyn ShaderBackend,
    lang: Lang,
) -> Result<(), ValidationError> {
    if lang.uses_combined_image_samplers() {
        return Ok(());
    }

    match backend.resources().sampled_images.first() {
        Some(img_res) => Err(ValidationError::CombinedImageSampler {
            file: backend.file_name().to_string(),
            name: img_res.name.clone(),
            lang: lang.tag().to_string(),
        }),
        None => Ok(()),
    }
}

/// Every vertex output must be read by the fragment stage and every fragment
/// input must be written by the vertex stage, with identical names and types.
pub fn validate_interface(program: &ProgramReflection) -> Result<(), ValidationError> {
    let vertex = program
        .stage(Stage::Vertex)
        .ok_or(ValidationError::MissingStage(Stage::Vertex))?;
    let fragment = program
        .stage(Stage::Fragment)
        .ok_or(ValidationError::MissingStage(Stage::Fragment))?;

    for output in &vertex.outputs {
        let Some(input) = fragment.inputs.iter().find(|input| input.name == output.name) else {
            return Err(ValidationError::MissingFragmentInput {
                name: output.name.clone(),
                vertex_file: vertex.source_file.clone(),
                fragment_file: fragment.source_file.clone(),
            });
        };

        if input.attribute_type != output.attribute_type {
            return Err(ValidationError::InterfaceTypeMismatch {
                name: output.name.clone(),
                vertex_file: vertex.source_file.clone(),
                vertex_type: format!("{:?}", output.attribute_type),
                fragment_file: fragment.source_file.clone(),
                fragment_type: format!("{:?}", input.attribute_type),
            });
        }
    }

    for input in &fragment.inputs {
        if !vertex.outputs.iter().any(|output| output.name == input.name) {
            return Err(ValidationError::MissingVertexOutput {
                name: input.name.clone(),
                vertex_file: vertex.source_file.clone(),
                fragment_file: fragment.source_file.clone(),
            });
        }
    }

    Ok(())
}
