use std::path::PathBuf;

/// a path under the crate root, for locating checked-in stage tables
pub fn manifest_path<'a>(segments: impl IntoIterator<Item = &'a str>) -> PathBuf {
    [env!("CARGO_MANIFEST_DIR")].into_iter().chain(segments).collect()
}
