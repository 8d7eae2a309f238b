use std::mem::size_of;

use zerocopy::FromBytes;

use super::records::*;
use crate::shaders::error::SbsReadError;
use crate::shaders::model::*;

struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn is_empty(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], SbsReadError> {
        let remaining = self.bytes.len() - self.offset;
        if remaining < len {
            return Err(SbsReadError::UnexpectedEof {
                offset: self.offset,
                needed: len - remaining,
            });
        }

        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;

        Ok(slice)
    }

    fn record<T: FromBytes>(&mut self) -> Result<T, SbsReadError> {
        let offset = self.offset;
        let bytes = self.take(size_of::<T>())?;

        T::read_from(bytes).ok_or(SbsReadError::UnexpectedEof {
            offset,
            needed: size_of::<T>(),
        })
    }

    /// reads a chunk header and returns its declared size
    fn chunk(&mut self, expected: FourCc) -> Result<u32, SbsReadError> {
        let offset = self.offset;
        let header: ChunkHeader = self.record()?;

        if header.fourcc != expected {
            return Err(SbsReadError::UnexpectedChunk {
                offset,
                expected: tag_display(expected),
                found: tag_display(header.fourcc),
            });
        }

        Ok(header.size.get())
    }
}

fn unknown_tag(field: &'static str, tag: FourCc) -> SbsReadError {
    SbsReadError::UnknownTag {
        field,
        tag: tag_display(tag),
    }
}

fn binding(name: &str, binding: LeI32) -> Result<u32, SbsReadError> {
    let binding = binding.get();

    u32::try_from(binding).map_err(|_| SbsReadError::NegativeBinding {
        name: name.to_string(),
        binding,
    })
}

fn check_size(chunk: FourCc, declared: u32, actual: usize) -> Result<(), SbsReadError> {
    if declared as usize != actual {
        return Err(SbsReadError::SizeMismatch {
            chunk: tag_display(chunk),
            declared,
            actual,
        });
    }

    Ok(())
}

/// Parses an SBS container back into reflection records
///
/// Only what the container stores is recovered: source files, entry points,
/// outputs, storage buffers and fragment inputs come back empty.
pub fn read_program(bytes: &[u8]) -> Result<ProgramReflection, SbsReadError> {
    let mut reader = ByteReader { bytes, offset: 0 };

    reader.chunk(CHUNK_SBS)?;
    let header: ProgramHeader = reader.record()?;

    let sbs_version = header.sbs_version.get();
    if sbs_version != SBS_VERSION {
        return Err(SbsReadError::UnsupportedVersion(sbs_version));
    }

    let lang = lang_from_tag(header.lang).ok_or_else(|| unknown_tag("language", header.lang))?;
    let profile = TargetProfile {
        lang,
        version: header.version.get(),
        es: header.es.get() != 0,
        platform: Platform::Default,
    };

    let mut name = String::new();
    let mut stages = vec![];
    while !reader.is_empty() {
        let (stage_name, stage) = read_stage(&mut reader)?;
        name = stage_name;
        stages.push(stage);
    }

    Ok(ProgramReflection {
        name,
        profile,
        stages,
    })
}

fn read_stage(reader: &mut ByteReader) -> Result<(String, StageReflection), SbsReadError> {
    let stage_size = reader.chunk(CHUNK_STAG)?;
    let stage_start = reader.offset;

    let tag: FourCc = reader.record()?;
    let stage = stage_from_tag(tag).ok_or_else(|| unknown_tag("stage", tag))?;

    let code_size = reader.chunk(CHUNK_CODE)?;
    let source = String::from_utf8_lossy(reader.take(code_size as usize)?).into_owned();

    let refl_size = reader.chunk(CHUNK_REFL)?;
    let refl_start = reader.offset;

    let header: ReflHeader = reader.record()?;

    let mut inputs = vec![];
    for _ in 0..header.num_inputs.get() {
        let record: InputRecord = reader.record()?;
        let name = name_from_field(&record.name);
        let location = binding(&name, record.location)?;

        inputs.push(Attribute {
            name,
            location,
            semantic_name: name_from_field(&record.semantic_name),
            semantic_index: record.semantic_index.get(),
            attribute_type: attribute_from_tag(record.attribute_type)
                .ok_or_else(|| unknown_tag("attribute type", record.attribute_type))?,
        });
    }

    let mut textures = vec![];
    for _ in 0..header.num_textures.get() {
        let record: TextureRecord = reader.record()?;
        let name = name_from_field(&record.name);

        textures.push(Texture {
            set: record.set.get(),
            binding: binding(&name, record.binding)?,
            texture_type: texture_from_tag(record.texture_type)
                .ok_or_else(|| unknown_tag("texture type", record.texture_type))?,
            sampler_type: texture_sample_from_tag(record.sampler_type)
                .ok_or_else(|| unknown_tag("texture sample type", record.sampler_type))?,
            name,
        });
    }

    let mut samplers = vec![];
    for _ in 0..header.num_samplers.get() {
        let record: SamplerRecord = reader.record()?;
        let name = name_from_field(&record.name);

        samplers.push(Sampler {
            set: record.set.get(),
            binding: binding(&name, record.binding)?,
            sampler_type: sampler_from_tag(record.sampler_type)
                .ok_or_else(|| unknown_tag("sampler type", record.sampler_type))?,
            name,
        });
    }

    let mut texture_samplers = vec![];
    for _ in 0..header.num_texture_samplers.get() {
        let record: TextureSamplerRecord = reader.record()?;
        let name = name_from_field(&record.name);

        texture_samplers.push(TextureSamplerPair {
            binding: binding(&name, record.binding)?,
            texture_name: name_from_field(&record.texture_name),
            sampler_name: name_from_field(&record.sampler_name),
            name,
        });
    }

    let mut uniform_blocks = vec![];
    for _ in 0..header.num_uniform_blocks.get() {
        let record: UniformBlockRecord = reader.record()?;
        let name = name_from_field(&record.name);

        let mut uniforms = vec![];
        for _ in 0..record.num_uniforms.get() {
            let uniform: UniformRecord = reader.record()?;

            uniforms.push(Uniform {
                name: name_from_field(&uniform.name),
                uniform_type: uniform_from_tag(uniform.uniform_type)
                    .ok_or_else(|| unknown_tag("uniform type", uniform.uniform_type))?,
                array_count: uniform.array_count.get(),
                offset: uniform.offset.get(),
            });
        }

        uniform_blocks.push(UniformBlock {
            inst_name: name_from_field(&record.inst_name),
            set: record.set.get(),
            binding: binding(&name, record.binding)?,
            size_bytes: record.size_bytes.get(),
            flattened: record.flattened != 0,
            uniforms,
            name,
        });
    }

    check_size(CHUNK_REFL, refl_size, reader.offset - refl_start)?;
    check_size(CHUNK_STAG, stage_size, reader.offset - stage_start)?;

    let stage_reflection = StageReflection {
        stage,
        source_file: String::new(),
        entry_point: String::new(),
        source,
        inputs,
        outputs: vec![],
        uniform_blocks,
        storage_buffers: vec![],
        textures,
        samplers,
        texture_samplers,
    };

    let total_uniforms = stage_reflection.uniform_count();
    if total_uniforms != header.num_uniforms.get() as usize {
        return Err(SbsReadError::SizeMismatch {
            chunk: "uniform count".to_string(),
            declared: header.num_uniforms.get(),
            actual: total_uniforms,
        });
    }

    Ok((name_from_field(&header.name), stage_reflection))
}
