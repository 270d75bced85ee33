//! Output path helpers and static asset copying.

use std::ffi::OsStr;
use std::io;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

/// Join a `/`-separated output path onto the output directory.
///
/// Empty, `.` and `..` segments are dropped so the result stays inside
/// `output_dir`.
///
/// # Examples
/// ```ignore
/// output_file(Path::new("dist"), "blog/first-post.html") => dist/blog/first-post.html
/// output_file(Path::new("dist"), "/index.html") => dist/index.html
/// ```
pub fn output_file(output_dir: &Path, relative: &str) -> PathBuf {
    relative
        .split(['/', '\\'])
        .filter(|segment| !matches!(*segment, "" | "." | ".."))
        .fold(output_dir.to_path_buf(), |path, segment| path.join(segment))
}

/// File name of section listing pages and of the published root page.
pub const SECTION_INDEX: &str = "index.html";

/// Listing page location for a section directory: `<section>/index.html`.
pub fn section_index(output_dir: &Path, section: &str) -> PathBuf {
    output_dir.join(section).join(SECTION_INDEX)
}

/// Write a file, creating its parent directories first.
pub fn write_file(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}

/// Recursively copy `from` into `to`, returning the number of files copied.
///
/// Hidden files and directories are skipped.
pub fn copy_dir(from: &Path, to: &Path) -> io::Result<usize> {
    let mut copied = 0;
    let walker = WalkDir::new(from)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

    for entry in walker {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Dotfiles and dot-directories are never part of the site.
pub fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Lexically normalize a path: drop `.` and resolve `..` against earlier
/// components. Does not touch the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Whether deleting `dir` would also delete `other`.
pub fn contains(dir: &Path, other: &Path) -> bool {
    let absolute = |path: &Path| match std::path::absolute(path) {
        Ok(path) => normalize(&path),
        Err(_) => normalize(path),
    };
    absolute(other).starts_with(absolute(dir))
}
