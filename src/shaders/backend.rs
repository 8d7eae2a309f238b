use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use log::*;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::error::BackendError;
use super::model::{Lang, TargetProfile, VERTEX_SEMANTICS};

/// an id in the compiled intermediate module (variables, types, combined samplers)
pub type Id = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionModel {
    Vertex,
    TessellationControl,
    TessellationEvaluation,
    Geometry,
    Fragment,
    Compute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BaseType {
    Unknown,
    Void,
    Boolean,
    #[serde(rename = "sbyte")]
    SByte,
    #[serde(rename = "ubyte")]
    UByte,
    Short,
    #[serde(rename = "ushort")]
    UShort,
    Int,
    #[serde(rename = "uint")]
    UInt,
    Int64,
    #[serde(rename = "uint64")]
    UInt64,
    Half,
    Float,
    Double,
    Struct,
    Image,
    SampledImage,
    Sampler,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageDim {
    #[serde(rename = "1d")]
    Dim1D,
    #[serde(rename = "2d")]
    Dim2D,
    #[serde(rename = "3d")]
    Dim3D,
    #[serde(rename = "cube")]
    Cube,
    #[serde(rename = "rect")]
    Rect,
    #[serde(rename = "buffer")]
    Buffer,
    #[serde(rename = "subpassData")]
    SubpassData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub dim: ImageDim,
    #[serde(default)]
    pub arrayed: bool,
    /// type id of the sampled component type
    pub sampled_type: Id,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    pub name: String,
    pub type_id: Id,
    pub offset: u32,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeInfo {
    pub base_type: BaseType,
    #[serde(default = "one")]
    pub vecsize: u32,
    #[serde(default = "one")]
    pub columns: u32,
    /// array dimensions, outermost first; empty for non-arrays
    #[serde(default)]
    pub array: Vec<u32>,
    #[serde(default)]
    pub members: Vec<MemberInfo>,
    /// declared struct size in bytes, only meaningful for structs
    #[serde(default)]
    pub declared_size: u32,
    #[serde(default)]
    pub image: Option<ImageInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: Id,
    pub type_id: Id,
    /// the underlying struct type for blocks, defaults to type_id
    #[serde(default)]
    pub base_type_id: Option<Id>,
    pub name: String,
    /// the block instance name, empty or missing for anonymous instances
    #[serde(default)]
    pub instance_name: Option<String>,
}

impl Resource {
    pub fn base_type_id(&self) -> Id {
        self.base_type_id.unwrap_or(self.type_id)
    }
}

/// resource lists in the order the compiler reports them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShaderResources {
    #[serde(default)]
    pub stage_inputs: Vec<Resource>,
    #[serde(default)]
    pub stage_outputs: Vec<Resource>,
    #[serde(default)]
    pub uniform_buffers: Vec<Resource>,
    #[serde(default)]
    pub storage_buffers: Vec<Resource>,
    #[serde(default)]
    pub sampled_images: Vec<Resource>,
    #[serde(default)]
    pub separate_images: Vec<Resource>,
    #[serde(default)]
    pub separate_samplers: Vec<Resource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPointInfo {
    pub name: String,
    pub execution_model: ExecutionModel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    Location,
    DescriptorSet,
    Binding,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decorations {
    #[serde(default)]
    pub location: Option<u32>,
    #[serde(default)]
    pub set: Option<u32>,
    #[serde(default)]
    pub binding: Option<u32>,
    #[serde(default)]
    pub non_writable: bool,
}

/// a sampler object the back end synthesized from one image and one sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedImageSampler {
    pub combined_id: Id,
    pub image_id: Id,
    pub sampler_id: Id,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttributeRemap {
    pub location: u32,
    pub semantic: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendOptions {
    pub profile: TargetProfile,
    pub flatten_multidimensional_arrays: bool,
    pub emit_line_directives: bool,
    /// GL only, explicit binding layout qualifiers need GL 4.2
    pub enable_420pack_extension: bool,
    /// HLSL only, emulate `gl_PointSize` and `gl_PointCoord`
    pub point_size_compat: bool,
    pub point_coord_compat: bool,
    /// MSL only, use the binding decorations as Metal buffer/texture/sampler indices
    pub enable_decoration_binding: bool,
    pub vertex_attribute_remaps: Vec<VertexAttributeRemap>,
}

impl BackendOptions {
    pub fn for_profile(profile: TargetProfile) -> Self {
        let vertex_attribute_remaps = match profile.lang {
            Lang::Hlsl => VERTEX_SEMANTICS
                .iter()
                .enumerate()
                .map(|(location, semantic)| VertexAttributeRemap {
                    location: location as u32,
                    semantic: semantic.attribute_name.to_string(),
                })
                .collect(),
            Lang::Glsl | Lang::Msl => vec![],
        };

        Self {
            profile,
            flatten_multidimensional_arrays: true,
            emit_line_directives: profile.lang != Lang::Glsl,
            enable_420pack_extension: false,
            point_size_compat: profile.lang == Lang::Hlsl,
            point_coord_compat: profile.lang == Lang::Hlsl,
            enable_decoration_binding: profile.lang == Lang::Msl,
            vertex_attribute_remaps,
        }
    }
}

/// The code generation back end for one compiled stage
///
/// Exposes the compiler's resource tables and decorations, accepts rewritten
/// bindings, and produces the final target-language source text.
pub trait ShaderBackend {
    /// the shader source file the module was compiled from
    fn file_name(&self) -> &str;

    fn execution_model(&self) -> ExecutionModel;
    fn entry_points(&self) -> &[EntryPointInfo];
    fn resources(&self) -> &ShaderResources;
    fn type_info(&self, type_id: Id) -> Option<&TypeInfo>;

    /// the current name of any id, including synthesized combined samplers
    fn name(&self, id: Id) -> Option<&str>;
    fn set_name(&mut self, id: Id, name: &str);

    /// the compiler-generated name for an id with no debug name
    fn fallback_name(&self, id: Id) -> String {
        format!("_{id}")
    }

    /// missing decorations read as 0
    fn decoration(&self, id: Id, decoration: Decoration) -> u32;
    fn set_decoration(&mut self, id: Id, decoration: Decoration, value: u32);
    fn is_non_writable(&self, id: Id) -> bool;

    fn set_options(&mut self, options: &BackendOptions);

    /// fuses every separate image/sampler pair the shader samples with,
    /// returned in the back end's iteration order
    fn build_combined_image_samplers(&mut self) -> Vec<CombinedImageSampler>;

    fn flatten_buffer_block(&mut self, id: Id);

    /// Whether an image or sampler is used for depth comparison
    ///
    /// This is back-end-internal usage metadata, not part of the public
    /// reflection tables. It is the only way to tell depth textures and
    /// comparison samplers apart from regular ones.
    fn is_comparison_resource(&self, id: Id) -> bool;

    /// generates the final source, embedding the current bindings
    fn compile(&mut self) -> Result<String, BackendError>;
}

/// the resource table dump an external compiler writes for one stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTables {
    pub file: String,
    pub execution_model: ExecutionModel,
    pub entry_points: Vec<EntryPointInfo>,
    pub types: BTreeMap<Id, TypeInfo>,
    pub resources: ShaderResources,
    #[serde(default)]
    pub decorations: BTreeMap<Id, Decorations>,
    #[serde(default)]
    pub comparison_ids: BTreeSet<Id>,
    #[serde(default)]
    pub combined_samplers: Vec<CombinedImageSampler>,
    /// source template, see [TableBackend::compile]
    pub source: String,
}

/// A back end driven by pre-generated tables and a source template
///
/// `compile` expands `{{version}}`, `{{set:ID}}`, `{{binding:ID}}`,
/// `{{location:ID}}` and `{{name:ID}}` placeholders in the template
/// from the current decorations and names.
#[derive(Debug, Clone)]
pub struct TableBackend {
    tables: StageTables,
    names: HashMap<Id, String>,
    options: Option<BackendOptions>,
    flattened_blocks: BTreeSet<Id>,
}

impl TableBackend {
    pub fn new(tables: StageTables) -> Self {
        let resources = &tables.resources;
        let names = [
            &resources.stage_inputs,
            &resources.stage_outputs,
            &resources.uniform_buffers,
            &resources.storage_buffers,
            &resources.sampled_images,
            &resources.separate_images,
            &resources.separate_samplers,
        ]
        .into_iter()
        .flatten()
        .map(|res| (res.id, res.name.clone()))
        .collect();

        Self {
            tables,
            names,
            options: None,
            flattened_blocks: BTreeSet::new(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, BackendError> {
        let json = std::fs::read_to_string(path).map_err(|source| BackendError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let tables: StageTables =
            serde_json::from_str(&json).map_err(|source| BackendError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self::new(tables))
    }

    pub fn options(&self) -> Option<&BackendOptions> {
        self.options.as_ref()
    }

    pub fn flattened_blocks(&self) -> &BTreeSet<Id> {
        &self.flattened_blocks
    }

    fn compile_error(&self, message: String) -> BackendError {
        BackendError::Compile {
            file: self.tables.file.clone(),
            message,
        }
    }
}

impl ShaderBackend for TableBackend {
    fn file_name(&self) -> &str {
        &self.tables.file
    }

    fn execution_model(&self) -> ExecutionModel {
        self.tables.execution_model
    }

    fn entry_points(&self) -> &[EntryPointInfo] {
        &self.tables.entry_points
    }

    fn resources(&self) -> &ShaderResources {
        &self.tables.resources
    }

    fn type_info(&self, type_id: Id) -> Option<&TypeInfo> {
        self.tables.types.get(&type_id)
    }

    fn name(&self, id: Id) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    fn set_name(&mut self, id: Id, name: &str) {
        self.names.insert(id, name.to_string());
    }

    fn decoration(&self, id: Id, decoration: Decoration) -> u32 {
        let Some(decorations) = self.tables.decorations.get(&id) else {
            return 0;
        };

        let value = match decoration {
            Decoration::Location => decorations.location,
            Decoration::DescriptorSet => decorations.set,
            Decoration::Binding => decorations.binding,
        };

        value.unwrap_or(0)
    }

    fn set_decoration(&mut self, id: Id, decoration: Decoration, value: u32) {
        let decorations = self.tables.decorations.entry(id).or_default();
        match decoration {
            Decoration::Location => decorations.location = Some(value),
            Decoration::DescriptorSet => decorations.set = Some(value),
            Decoration::Binding => decorations.binding = Some(value),
        }
    }

    fn is_non_writable(&self, id: Id) -> bool {
        self.tables
            .decorations
            .get(&id)
            .is_some_and(|decorations| decorations.non_writable)
    }

    fn set_options(&mut self, options: &BackendOptions) {
        self.options = Some(options.clone());
    }

    fn build_combined_image_samplers(&mut self) -> Vec<CombinedImageSampler> {
        self.tables.combined_samplers.clone()
    }

    fn flatten_buffer_block(&mut self, id: Id) {
        self.flattened_blocks.insert(id);
    }

    fn is_comparison_resource(&self, id: Id) -> bool {
        self.tables.comparison_ids.contains(&id)
    }

    fn compile(&mut self) -> Result<String, BackendError> {
        let Some(options) = &self.options else {
            return Err(self.compile_error("back end options were never set".to_string()));
        };
        let version = options.profile.version.to_string();

        let placeholder = Regex::new(r"\{\{(version|set|binding|location|name)(?::(\d+))?\}\}")
            .map_err(|err| self.compile_error(err.to_string()))?;

        let mut unresolved = vec![];
        let source = placeholder.replace_all(&self.tables.source, |caps: &Captures| {
            let key = &caps[1];
            let id = caps.get(2).and_then(|m| m.as_str().parse::<Id>().ok());

            let decorated = |id, decoration| Some(self.decoration(id, decoration).to_string());
            let expanded = match (key, id) {
                ("version", None) => Some(version.clone()),
                ("set", Some(id)) => decorated(id, Decoration::DescriptorSet),
                ("binding", Some(id)) => decorated(id, Decoration::Binding),
                ("location", Some(id)) => decorated(id, Decoration::Location),
                ("name", Some(id)) => self.name(id).map(str::to_string),
                _ => None,
            };

            expanded.unwrap_or_else(|| {
                unresolved.push(caps[0].to_string());
                String::new()
            })
        });

        if !unresolved.is_empty() {
            return Err(self.compile_error(format!(
                "unresolved placeholders: {}",
                unresolved.join(", ")
            )));
        }

        debug!(
            "{}: generated {} bytes of {} source",
            self.tables.file,
            source.len(),
            options.profile.lang.tag()
        );

        Ok(source.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::manifest_path;

    fn tables(source: &str) -> StageTables {
        let json = serde_json::json!({
            "file": "quad.frag",
            "executionModel": "fragment",
            "entryPoints": [{ "name": "main", "executionModel": "fragment" }],
            "types": {
                "1": { "baseType": "float", "vecsize": 4 },
                "2": { "baseType": "struct", "members": [
                    { "name": "tint", "typeId": 1, "offset": 0 }
                ], "declaredSize": 16 }
            },
            "resources": {
                "uniformBuffers": [{ "id": 10, "typeId": 2, "name": "Params" }]
            },
            "decorations": { "10": { "set": 3, "binding": 7 } },
            "source": source
        });

        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn compile_embeds_current_bindings() {
        let mut backend = TableBackend::new(tables(
            "#version {{version}}\nlayout(binding = {{binding:10}}) uniform {{name:10}} {};",
        ));
        backend.set_options(&BackendOptions::for_profile(TargetProfile::default()));

        assert_eq!(backend.decoration(10, Decoration::Binding), 7);
        backend.set_decoration(10, Decoration::Binding, 4);

        let source = backend.compile().unwrap();
        assert_eq!(source, "#version 330\nlayout(binding = 4) uniform Params {};");
    }

    #[test]
    fn compile_rejects_unknown_placeholders() {
        let mut backend = TableBackend::new(tables("uniform {{name:99}};"));
        backend.set_options(&BackendOptions::for_profile(TargetProfile::default()));

        let err = backend.compile().unwrap_err();
        assert!(err.to_string().contains("{{name:99}}"));
    }

    #[test]
    fn compile_requires_options() {
        let mut backend = TableBackend::new(tables(""));
        assert!(backend.compile().is_err());
    }

    #[test]
    fn loads_stage_tables_from_disk() {
        let backend =
            TableBackend::from_path(&manifest_path(["tests", "fixtures", "quad.vert.json"])).unwrap();
        assert_eq!(backend.file_name(), "quad.vert");
        assert_eq!(backend.resources().stage_inputs.len(), 2);

        let missing = manifest_path(["tests", "fixtures", "missing.json"]);
        let err = TableBackend::from_path(&missing).unwrap_err();
        assert!(matches!(err, BackendError::Read { .. }));
    }

    #[test]
    fn hlsl_options_remap_vertex_attributes() {
        let profile = TargetProfile::from_name("hlsl5").unwrap();
        let options = BackendOptions::for_profile(profile);

        assert_eq!(options.vertex_attribute_remaps.len(), 18);
        assert_eq!(options.vertex_attribute_remaps[2].semantic, "TEXCOORD0");
        assert!(options.emit_line_directives);
        assert!(options.point_size_compat && options.point_coord_compat);
        assert!(!options.enable_decoration_binding);

        let glsl = BackendOptions::for_profile(TargetProfile::default());
        assert!(glsl.vertex_attribute_remaps.is_empty());
        assert!(!glsl.emit_line_directives);
        assert!(!glsl.enable_420pack_extension);
        assert!(!glsl.point_size_compat);
    }

    #[test]
    fn msl_options_bind_by_decoration() {
        let profile = TargetProfile::from_name("msl21").unwrap();
        let options = BackendOptions::for_profile(profile);

        assert!(options.enable_decoration_binding);
        assert!(options.emit_line_directives);
        assert!(!options.point_coord_compat);
        assert!(options.vertex_attribute_remaps.is_empty());
    }
}
