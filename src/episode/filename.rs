use std::path::{Path, PathBuf};

/// Make a title usable as a single path component by replacing path
/// separators with underscores
pub fn sanitize_component(title: &str) -> String {
    title.replace('/', "_")
}

/// Destination filename for an episode title
pub fn episode_filename(title: &str) -> String {
    format!("{}.mp3", sanitize_component(title))
}

/// Staging path a download is streamed to before being renamed into place
pub fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    dest.with_file_name(name)
}
