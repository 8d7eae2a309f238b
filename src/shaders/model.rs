use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    /// the short tag used for json keys and companion file names
    pub fn tag(self) -> &'static str {
        match self {
            Stage::Vertex => "vs",
            Stage::Fragment => "fs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    Glsl,
    Hlsl,
    Msl,
}

impl Lang {
    pub fn tag(self) -> &'static str {
        match self {
            Lang::Glsl => "glsl",
            Lang::Hlsl => "hlsl",
            Lang::Msl => "msl",
        }
    }

    /// GL targets see textures and samplers only as fused sampler objects
    pub fn uses_combined_image_samplers(self) -> bool {
        matches!(self, Lang::Glsl)
    }

    /// GL targets upload every uniform block with a single vec4 array call
    pub fn flattens_uniform_blocks(self) -> bool {
        matches!(self, Lang::Glsl)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Platform {
    #[default]
    Default,
    MacOs,
    Ios,
}

/// language, numeric profile and flavour of the generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetProfile {
    pub lang: Lang,
    pub version: u32,
    pub es: bool,
    pub platform: Platform,
}

impl Default for TargetProfile {
    fn default() -> Self {
        Self {
            lang: Lang::Glsl,
            version: 330,
            es: false,
            platform: Platform::Default,
        }
    }
}

impl TargetProfile {
    /// resolves the profile names accepted on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        let (lang, version, es) = match name {
            "glsl330" => (Lang::Glsl, 330, false),
            "glsl100" => (Lang::Glsl, 100, true),
            "glsl300es" => (Lang::Glsl, 300, true),
            "hlsl4" => (Lang::Hlsl, 40, false),
            "hlsl5" => (Lang::Hlsl, 50, false),
            "msl12" => (Lang::Msl, 10200, false),
            "msl21" => (Lang::Msl, 20100, false),
            _ => return None,
        };

        Some(Self {
            lang,
            version,
            es,
            platform: Platform::Default,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeType {
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "float2")]
    Float2,
    #[serde(rename = "float3")]
    Float3,
    #[serde(rename = "float4")]
    Float4,
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "int2")]
    Int2,
    #[serde(rename = "int3")]
    Int3,
    #[serde(rename = "int4")]
    Int4,
    #[serde(rename = "INVALID")]
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UniformType {
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "float2")]
    Float2,
    #[serde(rename = "float3")]
    Float3,
    #[serde(rename = "float4")]
    Float4,
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "int2")]
    Int2,
    #[serde(rename = "int3")]
    Int3,
    #[serde(rename = "int4")]
    Int4,
    #[serde(rename = "mat3")]
    Mat3,
    #[serde(rename = "mat4")]
    Mat4,
    #[serde(rename = "INVALID")]
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureType {
    #[serde(rename = "texture_2d")]
    Texture2D,
    #[serde(rename = "texture_3d")]
    Texture3D,
    #[serde(rename = "texture_cube")]
    TextureCube,
    #[serde(rename = "texture_array")]
    TextureArray,
    #[serde(rename = "INVALID")]
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureSampleType {
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "sint")]
    Sint,
    #[serde(rename = "uint")]
    Uint,
    #[serde(rename = "depth")]
    Depth,
    #[serde(rename = "INVALID")]
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SamplerType {
    #[serde(rename = "filtering")]
    Filtering,
    #[serde(rename = "comparison")]
    Comparison,
    #[serde(rename = "INVALID")]
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageBufferType {
    #[serde(rename = "struct")]
    Struct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub location: u32,
    pub semantic_name: String,
    pub semantic_index: u32,
    pub attribute_type: AttributeType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uniform {
    pub name: String,
    pub uniform_type: UniformType,
    pub array_count: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlock {
    pub name: String,
    pub inst_name: String,
    pub set: u32,
    pub binding: u32,
    pub size_bytes: u32,
    pub flattened: bool,
    pub uniforms: Vec<Uniform>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageBuffer {
    pub name: String,
    pub inst_name: String,
    pub set: u32,
    pub binding: u32,
    pub size_bytes: u32,
    pub readonly: bool,
    pub buffer_type: StorageBufferType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub name: String,
    pub set: u32,
    pub binding: u32,
    pub texture_type: TextureType,
    pub sampler_type: TextureSampleType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sampler {
    pub name: String,
    pub set: u32,
    pub binding: u32,
    pub sampler_type: SamplerType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSamplerPair {
    pub name: String,
    pub texture_name: String,
    pub sampler_name: String,
    pub binding: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReflection {
    pub stage: Stage,
    /// the shader source file this stage was compiled from, used in diagnostics
    pub source_file: String,
    pub entry_point: String,
    pub source: String,
    pub inputs: Vec<Attribute>,
    pub outputs: Vec<Attribute>,
    pub uniform_blocks: Vec<UniformBlock>,
    pub storage_buffers: Vec<StorageBuffer>,
    pub textures: Vec<Texture>,
    pub samplers: Vec<Sampler>,
    pub texture_samplers: Vec<TextureSamplerPair>,
}

impl StageReflection {
    pub fn uniform_count(&self) -> usize {
        self.uniform_blocks.iter().map(|ub| ub.uniforms.len()).sum()
    }
}

/// the reflected stages of one invocation, in vertex-then-fragment order
///
/// a pair run always holds both stages, single-stage runs hold one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramReflection {
    pub name: String,
    pub profile: TargetProfile,
    pub stages: Vec<StageReflection>,
}

impl ProgramReflection {
    pub fn stage(&self, stage: Stage) -> Option<&StageReflection> {
        self.stages.iter().find(|s| s.stage == stage)
    }
}

pub struct VertexSemantic {
    /// the attribute name the HLSL vertex attribute remap uses
    pub attribute_name: &'static str,
    pub semantic_name: &'static str,
    pub semantic_index: u32,
}

const fn semantic(
    attribute_name: &'static str,
    semantic_name: &'static str,
    semantic_index: u32,
) -> VertexSemantic {
    VertexSemantic {
        attribute_name,
        semantic_name,
        semantic_index,
    }
}

/// well-known vertex attributes, indexed by attribute location
pub static VERTEX_SEMANTICS: [VertexSemantic; 18] = [
    semantic("POSITION", "POSITION", 0),
    semantic("NORMAL", "NORMAL", 0),
    semantic("TEXCOORD0", "TEXCOORD", 0),
    semantic("TEXCOORD1", "TEXCOORD", 1),
    semantic("TEXCOORD2", "TEXCOORD", 2),
    semantic("TEXCOORD3", "TEXCOORD", 3),
    semantic("TEXCOORD4", "TEXCOORD", 4),
    semantic("TEXCOORD5", "TEXCOORD", 5),
    semantic("TEXCOORD6", "TEXCOORD", 6),
    semantic("TEXCOORD7", "TEXCOORD", 7),
    semantic("COLOR0", "COLOR", 0),
    semantic("COLOR1", "COLOR", 1),
    semantic("COLOR2", "COLOR", 2),
    semantic("COLOR3", "COLOR", 3),
    semantic("TANGENT", "TANGENT", 0),
    semantic("BINORMAL", "BINORMAL", 0),
    semantic("BLENDINDICES", "BLENDINDICES", 0),
    semantic("BLENDWEIGHT", "BLENDWEIGHT", 0),
];

pub fn vertex_semantic(location: u32) -> Option<&'static VertexSemantic> {
    VERTEX_SEMANTICS.get(location as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_table_follows_location() {
        let texcoord3 = vertex_semantic(5).unwrap();
        assert_eq!(texcoord3.semantic_name, "TEXCOORD");
        assert_eq!(texcoord3.semantic_index, 3);

        let color1 = vertex_semantic(11).unwrap();
        assert_eq!(color1.attribute_name, "COLOR1");
        assert_eq!(color1.semantic_index, 1);

        assert_eq!(vertex_semantic(17).unwrap().semantic_name, "BLENDWEIGHT");
        assert!(vertex_semantic(18).is_none());
    }

    #[test]
    fn profile_names() {
        let gles2 = TargetProfile::from_name("glsl100").unwrap();
        assert_eq!(gles2.lang, Lang::Glsl);
        assert_eq!(gles2.version, 100);
        assert!(gles2.es);

        let hlsl5 = TargetProfile::from_name("hlsl5").unwrap();
        assert_eq!(hlsl5.lang, Lang::Hlsl);
        assert_eq!(hlsl5.version, 50);

        assert!(TargetProfile::from_name("spirv").is_none());
    }
}
