use std::collections::HashMap;

use log::*;

use super::type_info_for;
use crate::shaders::backend::{BaseType, Decoration, Resource, ShaderBackend, TypeInfo};
use crate::shaders::error::ExtractionError;
use crate::shaders::model::*;

/// stage inputs or outputs, in the back end's order
///
/// vertex inputs must sit inside the vertex semantic table; other attributes
/// pick up a semantic when their location happens to fall inside it
pub(super) fn reflect_attributes(
    backend: &dyn ShaderBackend,
    resources: &[Resource],
    vertex_inputs: bool,
) -> Result<Vec<Attribute>, ExtractionError> {
    let mut attributes = vec![];
    let mut names_by_location: HashMap<u32, &str> = HashMap::new();

    for res in resources {
        let location = backend.decoration(res.id, Decoration::Location);

        if let Some(first) = names_by_location.insert(location, &res.name) {
            return Err(ExtractionError::DuplicateLocation {
                file: backend.file_name().to_string(),
                first: first.to_string(),
                second: res.name.clone(),
                location,
            });
        }

        let (semantic_name, semantic_index) = match vertex_semantic(location) {
            Some(semantic) => (semantic.semantic_name.to_string(), semantic.semantic_index),
            None if vertex_inputs => {
                return Err(ExtractionError::LocationOutOfRange {
                    file: backend.file_name().to_string(),
                    name: res.name.clone(),
                    location,
                });
            }
            None => (String::new(), 0),
        };

        let type_info = type_info_for(backend, &res.name, res.type_id)?;
        let attribute_type = attribute_type(type_info);
        if attribute_type == AttributeType::Invalid {
            warn!(
                "{}: attribute '{}' has an unsupported type {:?}{}x{}",
                backend.file_name(),
                res.name,
                type_info.base_type,
                type_info.vecsize,
                type_info.columns
            );
        }

        attributes.push(Attribute {
            name: res.name.clone(),
            location,
            semantic_name,
            semantic_index,
            attribute_type,
        });
    }

    Ok(attributes)
}

pub(super) fn attribute_type(type_info: &TypeInfo) -> AttributeType {
    if type_info.columns != 1 {
        return AttributeType::Invalid;
    }

    match (type_info.base_type, type_info.vecsize) {
        (BaseType::Float, 1) => AttributeType::Float,
        (BaseType::Float, 2) => AttributeType::Float2,
        (BaseType::Float, 3) => AttributeType::Float3,
        (BaseType::Float, 4) => AttributeType::Float4,
        (BaseType::Int, 1) => AttributeType::Int,
        (BaseType::Int, 2) => AttributeType::Int2,
        (BaseType::Int, 3) => AttributeType::Int3,
        (BaseType::Int, 4) => AttributeType::Int4,
        _ => AttributeType::Invalid,
    }
}
