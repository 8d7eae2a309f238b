use std::mem::size_of;
use std::path::{Path, PathBuf};

use log::*;
use zerocopy::AsBytes;

use super::error::SerializationError;
use super::model::*;

mod reader;
pub use reader::read_program;

pub mod records;
use records::*;

/// `<dir>/<basename>.sbs`
pub fn sbs_path(output_dir: &Path, basename: &str) -> PathBuf {
    output_dir.join(format!("{basename}.sbs"))
}

/// Assembles the whole container in memory
///
/// Chunk layout:
/// `SBS ` + program header, then per stage `STAG` { stage tag, `CODE`, `REFL` }.
pub fn encode_program(program: &ProgramReflection) -> Result<Vec<u8>, SerializationError> {
    let profile = &program.profile;
    let mut bytes = vec![];

    // the top-level size is reserved and always 0
    push_chunk_header(&mut bytes, CHUNK_SBS, 0)?;
    let header = ProgramHeader {
        sbs_version: Le32::new(SBS_VERSION),
        lang: lang_tag(profile.lang),
        version: Le32::new(profile.version),
        es: Le16::new(profile.es as u16),
    };
    bytes.extend_from_slice(header.as_bytes());

    for refl in &program.stages {
        let code = refl.source.as_bytes();
        let refl_bytes = encode_reflection(&program.name, refl);

        let stage_size = size_of::<FourCc>()
            + size_of::<ChunkHeader>()
            + code.len()
            + size_of::<ChunkHeader>()
            + refl_bytes.len();

        push_chunk_header(&mut bytes, CHUNK_STAG, stage_size)?;
        bytes.extend_from_slice(&stage_tag(refl.stage));

        push_chunk_header(&mut bytes, CHUNK_CODE, code.len())?;
        bytes.extend_from_slice(code);

        push_chunk_header(&mut bytes, CHUNK_REFL, refl_bytes.len())?;
        bytes.extend_from_slice(&refl_bytes);
    }

    Ok(bytes)
}

fn push_chunk_header(
    bytes: &mut Vec<u8>,
    fourcc: FourCc,
    size: usize,
) -> Result<(), SerializationError> {
    let size = u32::try_from(size).map_err(|_| SerializationError::ChunkTooLarge {
        chunk: tag_display(fourcc),
        size,
    })?;

    let header = ChunkHeader {
        fourcc,
        size: Le32::new(size),
    };
    bytes.extend_from_slice(header.as_bytes());

    Ok(())
}

fn encode_reflection(program_name: &str, refl: &StageReflection) -> Vec<u8> {
    // fragment inputs are varyings and only described by the vertex outputs
    let inputs: &[Attribute] = match refl.stage {
        Stage::Vertex => &refl.inputs,
        Stage::Fragment => &[],
    };

    let mut bytes = vec![];

    let header = ReflHeader {
        name: name_field(program_name),
        num_inputs: Le32::new(inputs.len() as u32),
        num_textures: Le32::new(refl.textures.len() as u32),
        num_samplers: Le32::new(refl.samplers.len() as u32),
        num_texture_samplers: Le32::new(refl.texture_samplers.len() as u32),
        num_uniform_blocks: Le32::new(refl.uniform_blocks.len() as u32),
        num_uniforms: Le32::new(refl.uniform_count() as u32),
    };
    bytes.extend_from_slice(header.as_bytes());

    for input in inputs {
        let record = InputRecord {
            name: name_field(&input.name),
            location: LeI32::new(input.location as i32),
            semantic_name: name_field(&input.semantic_name),
            semantic_index: Le32::new(input.semantic_index),
            attribute_type: attribute_tag(input.attribute_type),
        };
        bytes.extend_from_slice(record.as_bytes());
    }

    for texture in &refl.textures {
        let record = TextureRecord {
            name: name_field(&texture.name),
            set: Le32::new(texture.set),
            binding: LeI32::new(texture.binding as i32),
            texture_type: texture_tag(texture.texture_type),
            sampler_type: texture_sample_tag(texture.sampler_type),
        };
        bytes.extend_from_slice(record.as_bytes());
    }

    for sampler in &refl.samplers {
        let record = SamplerRecord {
            name: name_field(&sampler.name),
            set: Le32::new(sampler.set),
            binding: LeI32::new(sampler.binding as i32),
            sampler_type: sampler_tag(sampler.sampler_type),
        };
        bytes.extend_from_slice(record.as_bytes());
    }

    for pair in &refl.texture_samplers {
        let record = TextureSamplerRecord {
            name: name_field(&pair.name),
            texture_name: name_field(&pair.texture_name),
            sampler_name: name_field(&pair.sampler_name),
            binding: LeI32::new(pair.binding as i32),
        };
        bytes.extend_from_slice(record.as_bytes());
    }

    for block in &refl.uniform_blocks {
        let record = UniformBlockRecord {
            num_uniforms: Le32::new(block.uniforms.len() as u32),
            name: name_field(&block.name),
            inst_name: name_field(&block.inst_name),
            set: Le32::new(block.set),
            binding: LeI32::new(block.binding as i32),
            size_bytes: Le32::new(block.size_bytes),
            flattened: block.flattened as u8,
        };
        bytes.extend_from_slice(record.as_bytes());

        for uniform in &block.uniforms {
            let record = UniformRecord {
                name: name_field(&uniform.name),
                uniform_type: uniform_tag(uniform.uniform_type),
                array_count: Le32::new(uniform.array_count),
                offset: Le32::new(uniform.offset),
            };
            bytes.extend_from_slice(record.as_bytes());
        }
    }

    bytes
}

/// Encodes the program and moves it into place at `<dir>/<basename>.sbs`
///
/// The container is written to a temporary sibling first, so a failed write
/// never leaves a complete-looking file behind.
pub fn write_sbs(
    program: &ProgramReflection,
    output_dir: &Path,
    basename: &str,
) -> Result<PathBuf, SerializationError> {
    let bytes = encode_program(program)?;

    let path = sbs_path(output_dir, basename);
    let tmp_path = output_dir.join(format!(".{basename}.sbs.tmp"));

    std::fs::write(&tmp_path, &bytes).map_err(|source| {
        let _ = std::fs::remove_file(&tmp_path);
        SerializationError::Io {
            path: tmp_path.clone(),
            source,
        }
    })?;
    std::fs::rename(&tmp_path, &path).map_err(|source| SerializationError::Io {
        path: path.clone(),
        source,
    })?;

    info!("wrote {} ({} bytes)", path.display(), bytes.len());

    Ok(path)
}
