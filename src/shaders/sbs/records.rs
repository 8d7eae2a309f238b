//! Fixed-layout records of the SBS container
//!
//! Every field is a byte array or a little-endian integer with an alignment
//! of 1, so `#[repr(C)]` lays the records out packed.

use zerocopy::byteorder::{I32, LittleEndian, U16, U32};
use zerocopy::{AsBytes, FromBytes, FromZeroes};

use crate::shaders::model::*;

pub type FourCc = [u8; 4];
pub type Le32 = U32<LittleEndian>;
pub type LeI32 = I32<LittleEndian>;
pub type Le16 = U16<LittleEndian>;

pub const SBS_VERSION: u32 = 100;

pub const CHUNK_SBS: FourCc = *b"SBS ";
pub const CHUNK_STAG: FourCc = *b"STAG";
pub const CHUNK_CODE: FourCc = *b"CODE";
pub const CHUNK_REFL: FourCc = *b"REFL";

/// the tag written for INVALID enum values
pub const NO_TAG: FourCc = [0; 4];

/// width of every name field, including the NUL terminator
pub const NAME_LEN: usize = 64;

pub type Name = [u8; NAME_LEN];

#[repr(C)]
#[derive(AsBytes, FromBytes, FromZeroes, Debug, Clone, Copy)]
pub struct ChunkHeader {
    pub fourcc: FourCc,
    pub size: Le32,
}

#[repr(C)]
#[derive(AsBytes, FromBytes, FromZeroes, Debug, Clone, Copy)]
pub struct ProgramHeader {
    pub sbs_version: Le32,
    pub lang: FourCc,
    pub version: Le32,
    pub es: Le16,
}

#[repr(C)]
#[derive(AsBytes, FromBytes, FromZeroes, Debug, Clone, Copy)]
pub struct ReflHeader {
    pub name: Name,
    pub num_inputs: Le32,
    pub num_textures: Le32,
    pub num_samplers: Le32,
    pub num_texture_samplers: Le32,
    pub num_uniform_blocks: Le32,
    /// uniforms across all blocks of the stage
    pub num_uniforms: Le32,
}

#[repr(C)]
#[derive(AsBytes, FromBytes, FromZeroes, Debug, Clone, Copy)]
pub struct InputRecord {
    pub name: Name,
    pub location: LeI32,
    pub semantic_name: Name,
    pub semantic_index: Le32,
    pub attribute_type: FourCc,
}

#[repr(C)]
#[derive(AsBytes, FromBytes, FromZeroes, Debug, Clone, Copy)]
pub struct TextureRecord {
    pub name: Name,
    pub set: Le32,
    pub binding: LeI32,
    pub texture_type: FourCc,
    pub sampler_type: FourCc,
}

#[repr(C)]
#[derive(AsBytes, FromBytes, FromZeroes, Debug, Clone, Copy)]
pub struct SamplerRecord {
    pub name: Name,
    pub set: Le32,
    pub binding: LeI32,
    pub sampler_type: FourCc,
}

#[repr(C)]
#[derive(AsBytes, FromBytes, FromZeroes, Debug, Clone, Copy)]
pub struct TextureSamplerRecord {
    pub name: Name,
    pub texture_name: Name,
    pub sampler_name: Name,
    pub binding: LeI32,
}

/// followed by `num_uniforms` [UniformRecord]s
#[repr(C)]
#[derive(AsBytes, FromBytes, FromZeroes, Debug, Clone, Copy)]
pub struct UniformBlockRecord {
    pub num_uniforms: Le32,
    pub name: Name,
    pub inst_name: Name,
    pub set: Le32,
    pub binding: LeI32,
    pub size_bytes: Le32,
    pub flattened: u8,
}

#[repr(C)]
#[derive(AsBytes, FromBytes, FromZeroes, Debug, Clone, Copy)]
pub struct UniformRecord {
    pub name: Name,
    pub uniform_type: FourCc,
    pub array_count: Le32,
    pub offset: Le32,
}

/// Copies a name into a fixed field, truncating to leave room for the NUL
pub fn name_field(name: &str) -> Name {
    let mut field = [0; NAME_LEN];
    let bytes = name.as_bytes();
    let len = bytes.len().min(NAME_LEN - 1);
    field[..len].copy_from_slice(&bytes[..len]);
    field
}

pub fn name_from_field(field: &Name) -> String {
    let len = field.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
    String::from_utf8_lossy(&field[..len]).into_owned()
}

pub fn stage_tag(stage: Stage) -> FourCc {
    match stage {
        Stage::Vertex => *b"VERT",
        Stage::Fragment => *b"FRAG",
    }
}

pub fn stage_from_tag(tag: FourCc) -> Option<Stage> {
    match &tag {
        b"VERT" => Some(Stage::Vertex),
        b"FRAG" => Some(Stage::Fragment),
        _ => None,
    }
}

pub fn lang_tag(lang: Lang) -> FourCc {
    match lang {
        Lang::Glsl => *b"GLSL",
        Lang::Hlsl => *b"HLSL",
        Lang::Msl => *b"MSL ",
    }
}

pub fn lang_from_tag(tag: FourCc) -> Option<Lang> {
    match &tag {
        b"GLSL" => Some(Lang::Glsl),
        b"HLSL" => Some(Lang::Hlsl),
        b"MSL " => Some(Lang::Msl),
        _ => None,
    }
}

pub fn attribute_tag(attribute_type: AttributeType) -> FourCc {
    match attribute_type {
        AttributeType::Float => *b"FLT1",
        AttributeType::Float2 => *b"FLT2",
        AttributeType::Float3 => *b"FLT3",
        AttributeType::Float4 => *b"FLT4",
        AttributeType::Int => *b"INT1",
        AttributeType::Int2 => *b"INT2",
        AttributeType::Int3 => *b"INT3",
        AttributeType::Int4 => *b"INT4",
        AttributeType::Invalid => NO_TAG,
    }
}

pub fn attribute_from_tag(tag: FourCc) -> Option<AttributeType> {
    let attribute_type = match &tag {
        b"FLT1" => AttributeType::Float,
        b"FLT2" => AttributeType::Float2,
        b"FLT3" => AttributeType::Float3,
        b"FLT4" => AttributeType::Float4,
        b"INT1" => AttributeType::Int,
        b"INT2" => AttributeType::Int2,
        b"INT3" => AttributeType::Int3,
        b"INT4" => AttributeType::Int4,
        &NO_TAG => AttributeType::Invalid,
        _ => return None,
    };

    Some(attribute_type)
}

pub fn uniform_tag(uniform_type: UniformType) -> FourCc {
    match uniform_type {
        UniformType::Float => *b"FLT1",
        UniformType::Float2 => *b"FLT2",
        UniformType::Float3 => *b"FLT3",
        UniformType::Float4 => *b"FLT4",
        UniformType::Int => *b"INT1",
        UniformType::Int2 => *b"INT2",
        UniformType::Int3 => *b"INT3",
        UniformType::Int4 => *b"INT4",
        UniformType::Mat3 => *b"MAT3",
        UniformType::Mat4 => *b"MAT4",
        UniformType::Invalid => NO_TAG,
    }
}

pub fn uniform_from_tag(tag: FourCc) -> Option<UniformType> {
    let uniform_type = match &tag {
        b"FLT1" => UniformType::Float,
        b"FLT2" => UniformType::Float2,
        b"FLT3" => UniformType::Float3,
        b"FLT4" => UniformType::Float4,
        b"INT1" => UniformType::Int,
        b"INT2" => UniformType::Int2,
        b"INT3" => UniformType::Int3,
        b"INT4" => UniformType::Int4,
        b"MAT3" => UniformType::Mat3,
        b"MAT4" => UniformType::Mat4,
        &NO_TAG => UniformType::Invalid,
        _ => return None,
    };

    Some(uniform_type)
}

pub fn texture_tag(texture_type: TextureType) -> FourCc {
    match texture_type {
        TextureType::Texture2D => *b"2D  ",
        TextureType::Texture3D => *b"3D  ",
        TextureType::TextureCube => *b"CUBE",
        TextureType::TextureArray => *b"ARRA",
        TextureType::Invalid => NO_TAG,
    }
}

pub fn texture_from_tag(tag: FourCc) -> Option<TextureType> {
    let texture_type = match &tag {
        b"2D  " => TextureType::Texture2D,
        b"3D  " => TextureType::Texture3D,
        b"CUBE" => TextureType::TextureCube,
        b"ARRA" => TextureType::TextureArray,
        &NO_TAG => TextureType::Invalid,
        _ => return None,
    };

    Some(texture_type)
}

pub fn texture_sample_tag(sample_type: TextureSampleType) -> FourCc {
    match sample_type {
        TextureSampleType::Float => *b"TFLT",
        TextureSampleType::Sint => *b"TINT",
        TextureSampleType::Uint => *b"TUIT",
        TextureSampleType::Depth => *b"TDPT",
        TextureSampleType::Invalid => NO_TAG,
    }
}

pub fn texture_sample_from_tag(tag: FourCc) -> Option<TextureSampleType> {
    let sample_type = match &tag {
        b"TFLT" => TextureSampleType::Float,
        b"TINT" => TextureSampleType::Sint,
        b"TUIT" => TextureSampleType::Uint,
        b"TDPT" => TextureSampleType::Depth,
        &NO_TAG => TextureSampleType::Invalid,
        _ => return None,
    };

    Some(sample_type)
}

pub fn sampler_tag(sampler_type: SamplerType) -> FourCc {
    match sampler_type {
        SamplerType::Filtering => *b"SFIL",
        SamplerType::Comparison => *b"SCOM",
        SamplerType::Invalid => NO_TAG,
    }
}

pub fn sampler_from_tag(tag: FourCc) -> Option<SamplerType> {
    let sampler_type = match &tag {
        b"SFIL" => SamplerType::Filtering,
        b"SCOM" => SamplerType::Comparison,
        &NO_TAG => SamplerType::Invalid,
        _ => return None,
    };

    Some(sampler_type)
}

/// printable form of a tag for diagnostics
pub fn tag_display(tag: FourCc) -> String {
    if tag == NO_TAG {
        return "0".to_string();
    }

    tag.iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
        .collect()
}
