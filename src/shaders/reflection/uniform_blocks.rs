use log::*;

use super::type_info_for;
use crate::shaders::backend::{BaseType, Decoration, Resource, ShaderBackend, TypeInfo};
use crate::shaders::error::ExtractionError;
use crate::shaders::model::*;

pub(super) fn reflect_uniform_blocks(
    backend: &dyn ShaderBackend,
    profile: &TargetProfile,
) -> Result<Vec<UniformBlock>, ExtractionError> {
    let mut uniform_blocks = vec![];

    for ub_res in &backend.resources().uniform_buffers {
        let block_type = block_type_info(backend, ub_res)?;

        let mut uniforms = vec![];
        let mut member_base_types = vec![];
        for member in &block_type.members {
            let member_type = type_info_for(backend, &member.name, member.type_id)?;
            member_base_types.push(member_type.base_type);

            let uniform_type = uniform_type(member_type);
            if uniform_type == UniformType::Invalid {
                warn!(
                    "{}: uniform '{}.{}' has an unsupported type {:?}{}x{}",
                    backend.file_name(),
                    ub_res.name,
                    member.name,
                    member_type.base_type,
                    member_type.vecsize,
                    member_type.columns
                );
            }

            uniforms.push(Uniform {
                name: member.name.clone(),
                uniform_type,
                array_count: member_type.array.first().copied().unwrap_or(1).max(1),
                offset: member.offset,
            });
        }

        let homogeneous = match member_base_types.split_first() {
            Some((first, rest)) => {
                matches!(first, BaseType::Float | BaseType::Int)
                    && rest.iter().all(|base_type| base_type == first)
            }
            None => false,
        };

        uniform_blocks.push(UniformBlock {
            name: ub_res.name.clone(),
            inst_name: instance_name(backend, ub_res),
            set: backend.decoration(ub_res.id, Decoration::DescriptorSet),
            binding: backend.decoration(ub_res.id, Decoration::Binding),
            size_bytes: block_type.declared_size,
            flattened: profile.lang.flattens_uniform_blocks() && homogeneous,
            uniforms,
        });
    }

    Ok(uniform_blocks)
}

pub(super) fn reflect_storage_buffers(
    backend: &dyn ShaderBackend,
) -> Result<Vec<StorageBuffer>, ExtractionError> {
    let mut storage_buffers = vec![];

    for sb_res in &backend.resources().storage_buffers {
        let block_type = block_type_info(backend, sb_res)?;

        storage_buffers.push(StorageBuffer {
            name: sb_res.name.clone(),
            inst_name: instance_name(backend, sb_res),
            set: backend.decoration(sb_res.id, Decoration::DescriptorSet),
            binding: backend.decoration(sb_res.id, Decoration::Binding),
            size_bytes: block_type.declared_size,
            readonly: backend.is_non_writable(sb_res.id),
            buffer_type: StorageBufferType::Struct,
        });
    }

    Ok(storage_buffers)
}

fn block_type_info<'a>(
    backend: &'a dyn ShaderBackend,
    res: &Resource,
) -> Result<&'a TypeInfo, ExtractionError> {
    let block_type = type_info_for(backend, &res.name, res.base_type_id())?;

    if block_type.base_type != BaseType::Struct {
        return Err(ExtractionError::UnmappedResourceType {
            file: backend.file_name().to_string(),
            resource: res.name.clone(),
            reason: format!("buffer block of {:?}, expected a struct", block_type.base_type),
        });
    }

    Ok(block_type)
}

fn instance_name(backend: &dyn ShaderBackend, res: &Resource) -> String {
    match &res.instance_name {
        Some(name) if !name.is_empty() => name.clone(),
        _ => backend.fallback_name(res.id),
    }
}

pub(super) fn uniform_type(type_info: &TypeInfo) -> UniformType {
    match (type_info.base_type, type_info.vecsize, type_info.columns) {
        (BaseType::Float, 1, 1) => UniformType::Float,
        (BaseType::Float, 2, 1) => UniformType::Float2,
        (BaseType::Float, 3, 1) => UniformType::Float3,
        (BaseType::Float, 4, 1) => UniformType::Float4,
        (BaseType::Float, 3, 3) => UniformType::Mat3,
        (BaseType::Float, 4, 4) => UniformType::Mat4,
        (BaseType::Int, 1, 1) => UniformType::Int,
        (BaseType::Int, 2, 1) => UniformType::Int2,
        (BaseType::Int, 3, 1) => UniformType::Int3,
        (BaseType::Int, 4, 1) => UniformType::Int4,
        _ => UniformType::Invalid,
    }
}
