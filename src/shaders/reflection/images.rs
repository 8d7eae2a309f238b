use log::*;

use super::type_info_for;
use crate::shaders::backend::{BaseType, Decoration, Id, ImageDim, ShaderBackend, TypeInfo};
use crate::shaders::error::ExtractionError;
use crate::shaders::model::*;

/// Fuses separate images and samplers for targets that need sampler objects
///
/// Each pair is named `<image>_<sampler>` and bound sequentially from
/// `first_binding` in the order the back end reports them, so this runs before
/// code generation. Declared combined samplers continue after the pairs.
pub fn combine_image_samplers(
    backend: &mut dyn ShaderBackend,
    first_binding: u32,
) -> Vec<TextureSamplerPair> {
    let combined_samplers = backend.build_combined_image_samplers();

    let mut texture_samplers = vec![];
    for (binding, combined) in (first_binding..).zip(&combined_samplers) {
        let texture_name = resource_name(&*backend, combined.image_id);
        let sampler_name = resource_name(&*backend, combined.sampler_id);
        let name = format!("{texture_name}_{sampler_name}");

        backend.set_name(combined.combined_id, &name);
        backend.set_decoration(combined.combined_id, Decoration::DescriptorSet, 0);
        backend.set_decoration(combined.combined_id, Decoration::Binding, binding);

        debug!("{}: combined sampler '{name}' at binding {binding}", backend.file_name());

        texture_samplers.push(TextureSamplerPair {
            name,
            texture_name,
            sampler_name,
            binding,
        });
    }

    texture_samplers
}

fn resource_name(backend: &dyn ShaderBackend, id: Id) -> String {
    match backend.name(id) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => backend.fallback_name(id),
    }
}

/// separate images followed by combined image samplers
pub(super) fn reflect_textures(
    backend: &dyn ShaderBackend,
) -> Result<Vec<Texture>, ExtractionError> {
    let resources = backend.resources();
    let mut textures = vec![];

    for img_res in resources.separate_images.iter().chain(&resources.sampled_images) {
        let img_type = type_info_for(backend, &img_res.name, img_res.type_id)?;
        let Some(image) = &img_type.image else {
            return Err(ExtractionError::UnmappedResourceType {
                file: backend.file_name().to_string(),
                resource: img_res.name.clone(),
                reason: format!("{:?} without image information", img_type.base_type),
            });
        };

        let texture_type = texture_type(image.dim, image.arrayed);
        let sampled_type = type_info_for(backend, &img_res.name, image.sampled_type)?;
        let sampler_type = if backend.is_comparison_resource(img_res.id) {
            TextureSampleType::Depth
        } else {
            texture_sample_type(sampled_type)
        };

        if texture_type == TextureType::Invalid || sampler_type == TextureSampleType::Invalid {
            warn!(
                "{}: texture '{}' has an unsupported shape {:?} (arrayed: {}) or sample type {:?}",
                backend.file_name(),
                img_res.name,
                image.dim,
                image.arrayed,
                sampled_type.base_type
            );
        }

        textures.push(Texture {
            name: img_res.name.clone(),
            set: backend.decoration(img_res.id, Decoration::DescriptorSet),
            binding: backend.decoration(img_res.id, Decoration::Binding),
            texture_type,
            sampler_type,
        });
    }

    Ok(textures)
}

pub(super) fn reflect_samplers(
    backend: &dyn ShaderBackend,
) -> Result<Vec<Sampler>, ExtractionError> {
    let mut samplers = vec![];

    for smp_res in &backend.resources().separate_samplers {
        let smp_type = type_info_for(backend, &smp_res.name, smp_res.type_id)?;

        let sampler_type = match smp_type.base_type {
            BaseType::Sampler if backend.is_comparison_resource(smp_res.id) => {
                SamplerType::Comparison
            }
            BaseType::Sampler => SamplerType::Filtering,
            base_type => {
                warn!(
                    "{}: sampler '{}' has base type {base_type:?}",
                    backend.file_name(),
                    smp_res.name
                );
                SamplerType::Invalid
            }
        };

        samplers.push(Sampler {
            name: smp_res.name.clone(),
            set: backend.decoration(smp_res.id, Decoration::DescriptorSet),
            binding: backend.decoration(smp_res.id, Decoration::Binding),
            sampler_type,
        });
    }

    Ok(samplers)
}

pub(super) fn texture_type(dim: ImageDim, arrayed: bool) -> TextureType {
    match (dim, arrayed) {
        (ImageDim::Dim2D, true) => TextureType::TextureArray,
        (ImageDim::Dim2D, false) => TextureType::Texture2D,
        (ImageDim::Dim3D, false) => TextureType::Texture3D,
        (ImageDim::Cube, false) => TextureType::TextureCube,
        _ => TextureType::Invalid,
    }
}

fn texture_sample_type(sampled_type: &TypeInfo) -> TextureSampleType {
    match sampled_type.base_type {
        BaseType::Float | BaseType::Half | BaseType::Double => TextureSampleType::Float,
        BaseType::Int | BaseType::Short | BaseType::SByte => TextureSampleType::Sint,
        BaseType::UInt | BaseType::UShort | BaseType::UByte => TextureSampleType::Uint,
        _ => TextureSampleType::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaders::reflection::tests::*;

    #[test]
    fn comparison_usage_marks_depth_and_comparison() {
        let backend = backend_from(shadow_fragment_tables());

        let textures = reflect_textures(&backend).unwrap();
        assert_eq!(textures[0].sampler_type, TextureSampleType::Depth);
        assert_eq!(textures[0].texture_type, TextureType::Texture2D);
        assert_eq!(textures[1].sampler_type, TextureSampleType::Sint);
        assert_eq!(textures[1].texture_type, TextureType::TextureArray);
        assert_eq!(textures[2].texture_type, TextureType::Invalid);

        let samplers = reflect_samplers(&backend).unwrap();
        assert_eq!(samplers[0].sampler_type, SamplerType::Comparison);
        assert_eq!(samplers[1].sampler_type, SamplerType::Filtering);
    }

    #[test]
    fn combined_samplers_are_named_and_bound_in_order() {
        let mut backend = backend_from(shadow_fragment_tables());

        let pairs = combine_image_samplers(&mut backend, 0);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].name, "shadow_map_shadow_smp");
        assert_eq!(pairs[0].binding, 0);
        assert_eq!(pairs[1].name, "layers_linear_smp");
        assert_eq!(pairs[1].texture_name, "layers");
        assert_eq!(pairs[1].sampler_name, "linear_smp");
        assert_eq!(pairs[1].binding, 1);

        let source = backend.compile().unwrap();
        assert_eq!(
            source,
            "uniform sampler2DShadow shadow_map_shadow_smp; // binding 0"
        );
    }

    #[test]
    fn combined_samplers_start_at_the_given_binding() {
        let mut backend = backend_from(shadow_fragment_tables());

        let pairs = combine_image_samplers(&mut backend, 16);
        assert_eq!(pairs[0].binding, 16);
        assert_eq!(pairs[1].binding, 17);
        assert_eq!(backend.decoration(61, Decoration::DescriptorSet), 0);
        assert_eq!(backend.decoration(61, Decoration::Binding), 17);
    }

    #[test]
    fn texture_shapes() {
        assert_eq!(texture_type(ImageDim::Dim3D, false), TextureType::Texture3D);
        assert_eq!(texture_type(ImageDim::Cube, false), TextureType::TextureCube);
        assert_eq!(texture_type(ImageDim::Dim1D, false), TextureType::Invalid);
        assert_eq!(texture_type(ImageDim::Dim3D, true), TextureType::Invalid);
    }
}
