use log::*;

use super::backend::{Decoration, Resource, ShaderBackend};
use super::model::{Lang, Stage};

/// fragment uniform blocks share set 0 with the vertex ones, offset by this
pub const FRAGMENT_UNIFORM_BLOCK_OFFSET: u32 = 4;

/// size of the per-stage combined sampler range
pub const MAX_SAMPLERS_PER_STAGE: u32 = 16;

/// image registers HLSL hands out before read-only storage buffers
pub const HLSL_IMAGE_SLOTS: u32 = 16;

/// buffer indices MSL hands out to uniform blocks before storage buffers
pub const MSL_UNIFORM_BLOCK_SLOTS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceCategory {
    UniformBlock,
    CombinedImageSampler,
    SeparateImage,
    SeparateSampler,
    StorageBuffer,
}

impl ResourceCategory {
    pub fn descriptor_set(self) -> u32 {
        match self {
            ResourceCategory::UniformBlock
            | ResourceCategory::CombinedImageSampler
            | ResourceCategory::StorageBuffer => 0,
            ResourceCategory::SeparateImage | ResourceCategory::SeparateSampler => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotBase {
    Fixed(u32),
    /// the back end has no convention for this category
    Reserved,
}

impl SlotBase {
    pub fn first_binding(self) -> u32 {
        match self {
            SlotBase::Fixed(base) => base,
            SlotBase::Reserved => 0,
        }
    }
}

/// where a category's sequential bindings start for a target and stage
pub fn slot_base(lang: Lang, category: ResourceCategory, stage: Stage) -> SlotBase {
    use ResourceCategory::*;
    use SlotBase::*;

    match (lang, category, stage) {
        (_, UniformBlock, Stage::Vertex) => Fixed(0),
        (_, UniformBlock, Stage::Fragment) => Fixed(FRAGMENT_UNIFORM_BLOCK_OFFSET),

        (Lang::Glsl, CombinedImageSampler, Stage::Vertex) => Fixed(0),
        (Lang::Glsl, CombinedImageSampler, Stage::Fragment) => Fixed(MAX_SAMPLERS_PER_STAGE),
        (Lang::Hlsl | Lang::Msl, CombinedImageSampler, _) => Reserved,

        (Lang::Glsl, SeparateImage | SeparateSampler, _) => Reserved,
        (Lang::Hlsl | Lang::Msl, SeparateImage | SeparateSampler, _) => Fixed(0),

        (Lang::Glsl, StorageBuffer, _) => Reserved,
        (Lang::Hlsl, StorageBuffer, _) => Fixed(HLSL_IMAGE_SLOTS),
        (Lang::Msl, StorageBuffer, _) => Fixed(MSL_UNIFORM_BLOCK_SLOTS),
    }
}

/// Overwrites the set and binding of every resource for the target's convention
///
/// Existing decorations are always replaced. This has to run before the back
/// end generates source, which embeds the bindings. The first `combined_pairs`
/// combined sampler slots belong to the pairs from `combine_image_samplers`,
/// declared combined samplers are bound after them.
pub fn fix_bind_slots(
    backend: &mut dyn ShaderBackend,
    lang: Lang,
    stage: Stage,
    combined_pairs: u32,
) {
    let resources = backend.resources();
    let categories: [(ResourceCategory, Vec<Resource>); 5] = [
        (ResourceCategory::UniformBlock, resources.uniform_buffers.clone()),
        (ResourceCategory::CombinedImageSampler, resources.sampled_images.clone()),
        (ResourceCategory::SeparateImage, resources.separate_images.clone()),
        (ResourceCategory::SeparateSampler, resources.separate_samplers.clone()),
        (ResourceCategory::StorageBuffer, resources.storage_buffers.clone()),
    ];

    for (category, category_resources) in categories {
        let set = category.descriptor_set();
        let mut binding = slot_base(lang, category, stage).first_binding();
        if category == ResourceCategory::CombinedImageSampler {
            binding += combined_pairs;
        }

        for res in &category_resources {
            backend.set_decoration(res.id, Decoration::DescriptorSet, set);
            backend.set_decoration(res.id, Decoration::Binding, binding);

            debug!(
                "{}: {category:?} '{}' -> set {set}, binding {binding}",
                backend.file_name(),
                res.name
            );

            binding += 1;
        }
    }
}
