use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::paths::{SECTION_INDEX, is_hidden};

use super::document::{ContentCategory, ContentItem, FrontMatterError, parse_front_matter};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("content path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to walk content directory {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("failed to read document {path}: {source}")]
    ReadDocument {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{first} and {second} both render to {output_path}")]
    DuplicateOutput {
        output_path: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("{path} renders to {output_path}, which is reserved for a generated page")]
    ReservedOutput { output_path: String, path: PathBuf },
}

/// A document left out of the build because its front matter is malformed.
#[derive(Debug)]
pub struct SkippedDocument {
    /// Path relative to the content root
    pub path: PathBuf,
    pub error: FrontMatterError,
}

// =============================================================================
// Content source
// =============================================================================

/// The content root: one subdirectory per section, markdown documents inside.
#[derive(Debug, Clone)]
pub struct ContentSource {
    root: PathBuf,
    extension: String,
}

impl ContentSource {
    /// `extension` is the output page extension used for default output paths.
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Discover every document under the content root.
    ///
    /// Entries are visited in file-name order so repeated builds see the same
    /// sequence. A missing root yields an empty corpus.
    pub fn discover(&self) -> Result<Corpus, SourceError> {
        let mut corpus = Corpus::default();

        if !self.root.exists() {
            tracing::warn!(path = %self.root.display(), "content directory not found, nothing to build");
            return Ok(corpus);
        }
        if !self.root.is_dir() {
            return Err(SourceError::NotADirectory(self.root.clone()));
        }

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_hidden(entry.file_name()));

        for entry in walker {
            let entry = entry.map_err(|e| SourceError::Walk {
                path: self.root.clone(),
                source: e,
            })?;

            if !entry.file_type().is_file() || !is_document(entry.path()) {
                continue;
            }

            let relative_path = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path())
                .to_path_buf();

            match self.load_document(entry.path(), &relative_path)? {
                Ok(item) => {
                    tracing::debug!(path = %relative_path.display(), category = %item.category, "loaded document");
                    corpus.items.push(item);
                }
                Err(error) => {
                    tracing::warn!(path = %relative_path.display(), %error, "skipping document with malformed front matter");
                    corpus.skipped.push(SkippedDocument {
                        path: relative_path,
                        error,
                    });
                }
            }
        }

        corpus.check_unique_outputs()?;
        Ok(corpus)
    }

    /// Read and parse one document.
    ///
    /// The outer error is fatal (I/O); the inner one only skips this document.
    fn load_document(
        &self,
        full_path: &Path,
        relative_path: &Path,
    ) -> Result<Result<ContentItem, FrontMatterError>, SourceError> {
        let raw = std::fs::read_to_string(full_path).map_err(|e| SourceError::ReadDocument {
            path: full_path.to_path_buf(),
            source: e,
        })?;

        Ok(parse_front_matter(&raw)
            .map(|parsed| ContentItem::from_parsed(relative_path, parsed, &self.extension)))
    }
}

fn is_document(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref(),
        Some("md" | "markdown")
    )
}

// =============================================================================
// Corpus
// =============================================================================

/// Everything discovered under the content root.
#[derive(Debug, Default)]
pub struct Corpus {
    /// Loaded documents, in discovery order
    pub items: Vec<ContentItem>,
    /// Documents skipped because of malformed front matter
    pub skipped: Vec<SkippedDocument>,
}

impl Corpus {
    /// Documents sitting directly inside a section's directory, in discovery order.
    pub fn section(&self, category: ContentCategory) -> Vec<ContentItem> {
        self.items
            .iter()
            .filter(|item| item.category == category && item.is_section_entry())
            .cloned()
            .collect()
    }

    /// Two documents writing the same file would silently overwrite each
    /// other, and so would a document landing on a section listing page or
    /// the published root page.
    fn check_unique_outputs(&self) -> Result<(), SourceError> {
        let reserved: HashSet<String> = ContentCategory::SECTIONS
            .iter()
            .filter_map(|category| category.dir_name())
            .map(|section| format!("{section}/{SECTION_INDEX}"))
            .chain(std::iter::once(SECTION_INDEX.to_string()))
            .collect();

        let mut seen: HashMap<String, &Path> = HashMap::new();
        for item in &self.items {
            let output_path = normalize_output(&item.output_path);
            if reserved.contains(&output_path) {
                return Err(SourceError::ReservedOutput {
                    output_path,
                    path: item.source_path.clone(),
                });
            }
            if let Some(first) = seen.insert(output_path, item.source_path.as_path()) {
                return Err(SourceError::DuplicateOutput {
                    output_path: item.output_path.clone(),
                    first: first.to_path_buf(),
                    second: item.source_path.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Output path in the form it lands on disk: "./blog//a.html" -> "blog/a.html"
fn normalize_output(output_path: &str) -> String {
    output_path
        .split(['/', '\\'])
        .filter(|segment| !matches!(*segment, "" | "." | ".."))
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_discover_in_file_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "blog/b.md", "---\ntitle: B\n---\n");
        write(dir.path(), "blog/a.md", "---\ntitle: A\n---\n");
        write(dir.path(), "about/about.md", "# About");
        write(dir.path(), "blog/notes.txt", "not a document");
        write(dir.path(), ".hidden/secret.md", "# hidden");

        let corpus = ContentSource::new(dir.path(), "html").discover().unwrap();
        let paths: Vec<_> = corpus
            .items
            .iter()
            .map(|item| item.output_path.as_str())
            .collect();

        assert_eq!(paths, vec!["about/about.html", "blog/a.html", "blog/b.html"]);
    }

    #[test]
    fn test_missing_content_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = ContentSource::new(dir.path().join("nope"), "html")
            .discover()
            .unwrap();
        assert!(corpus.items.is_empty());
        assert!(corpus.section(ContentCategory::Blog).is_empty());
    }

    #[test]
    fn test_malformed_document_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "projects/good.md", "---\ntitle: Good\n---\n");
        write(dir.path(), "projects/bad.md", "---\ntitle: [oops\n---\n");

        let corpus = ContentSource::new(dir.path(), "html").discover().unwrap();
        assert_eq!(corpus.items.len(), 1);
        assert_eq!(corpus.items[0].title, "Good");
        assert_eq!(corpus.skipped.len(), 1);
        assert_eq!(corpus.skipped[0].path, PathBuf::from("projects/bad.md"));
    }

    #[test]
    fn test_section_only_returns_direct_members() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "blog/post.md", "");
        write(dir.path(), "blog/drafts/wip.md", "");
        write(dir.path(), "projects/tool.md", "");
        write(dir.path(), "talks/keynote.md", "");

        let corpus = ContentSource::new(dir.path(), "html").discover().unwrap();
        let blog = corpus.section(ContentCategory::Blog);
        assert_eq!(blog.len(), 1);
        assert_eq!(blog[0].slug, "post");

        // Nested and unmapped documents are still discovered for detail pages
        assert_eq!(corpus.items.len(), 4);
        assert!(corpus.section(ContentCategory::Research).is_empty());
    }

    #[test]
    fn test_duplicate_output_path_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "blog/one.md", "---\nfilename: blog/same.html\n---\n");
        write(dir.path(), "blog/same.md", "");

        let err = ContentSource::new(dir.path(), "html").discover().unwrap_err();
        assert!(matches!(err, SourceError::DuplicateOutput { .. }));
        assert!(err.to_string().contains("blog/same.html"));
    }

    #[test]
    fn test_document_cannot_replace_a_generated_page() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "blog/index.md", "---\ntitle: Post named index\n---\n");

        let err = ContentSource::new(dir.path(), "html").discover().unwrap_err();
        assert!(matches!(err, SourceError::ReservedOutput { .. }));
        assert!(err.to_string().contains("blog/index.html"));

        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "talks/home.md", "---\nfilename: /index.html\n---\n");

        let err = ContentSource::new(dir.path(), "html").discover().unwrap_err();
        assert!(matches!(
            err,
            SourceError::ReservedOutput { ref output_path, .. } if output_path == "index.html"
        ));
    }

    #[test]
    fn test_index_outside_a_listed_section_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "talks/index.md", "");

        let corpus = ContentSource::new(dir.path(), "html").discover().unwrap();
        assert_eq!(corpus.items[0].output_path, "talks/index.html");
    }
}
