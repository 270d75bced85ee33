use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::RootConfig;

use super::document::ContentCategory;
use super::nav::SectionNav;
use super::paths::{contains, copy_dir, section_index, write_file};
use super::pipeline::{Pipeline, PipelineContext, PipelineError, ProcessingDocument, PublishRootStage};
use super::render::{ListingContext, RenderError, Renderer, SiteContext};
use super::source::{ContentSource, SkippedDocument, SourceError};

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("failed to render {section} index: {source}")]
    SectionIndex {
        section: &'static str,
        source: RenderError,
    },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("refusing to delete output directory {output} because it contains the source directory {source_dir}")]
    UnsafeOutput { output: PathBuf, source_dir: PathBuf },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl BuildError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug)]
pub struct BuildResult {
    pub output_dir: PathBuf,
    /// Document pages written
    pub pages: usize,
    /// Section listing pages written
    pub section_indexes: usize,
    /// Static asset files copied
    pub static_files: usize,
    /// Documents left out because of malformed front matter
    pub skipped: Vec<SkippedDocument>,
}

pub struct Builder {
    config: RootConfig,
    /// Base path for resolving relative paths (typically the config file's directory)
    base_path: PathBuf,
}

impl Builder {
    pub fn new(config: RootConfig, base_path: PathBuf) -> Self {
        Self { config, base_path }
    }

    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        // Build pipeline:
        // 1. Clean the output directory
        // 2. Copy static assets
        // 3. Discover content
        // 4. Group and order each section
        // 5. Render section listing pages
        // 6. Run every document through the pipeline
        // 7. Publish the root page

        let output_dir = self.output_dir();
        self.clean(&output_dir)?;

        let static_files = self.copy_static(&output_dir)?;

        let source = ContentSource::new(self.content_dir(), &self.config.build.extension);
        let corpus = source.discover()?;
        tracing::info!(
            documents = corpus.items.len(),
            skipped = corpus.skipped.len(),
            path = %source.root().display(),
            "discovered content"
        );

        let nav: HashMap<ContentCategory, SectionNav> = ContentCategory::SECTIONS
            .iter()
            .map(|&category| {
                let nav = SectionNav::build(category, corpus.section(category), self.config.dates.missing);
                tracing::debug!(section = %category, items = nav.items.len(), groups = nav.groups.len(), "grouped section");
                (category, nav)
            })
            .collect();

        let renderer = Renderer::new(&self.templates_dir(), &self.include_dirs())?;
        let site = SiteContext {
            name: self.config.site.name.clone(),
            url: self.config.site.url.clone(),
            params: self.config.site.params.clone(),
        };

        let section_indexes = self.render_section_indexes(&output_dir, &renderer, &site, &nav)?;

        let mut docs: Vec<ProcessingDocument> =
            corpus.items.into_iter().map(ProcessingDocument::new).collect();

        let mut pipeline = Pipeline::default_pipeline();
        pipeline.add_finalize_stage(PublishRootStage::new(
            self.config.build.root_page.to_string_lossy(),
        ));

        let mut ctx = PipelineContext::new(
            &output_dir,
            &site,
            &self.config.markdown,
            &nav,
            &renderer,
        );
        pipeline.run(&mut docs, &mut ctx)?;
        let pages = ctx.pages_written;

        tracing::info!(pages, section_indexes, static_files, "build complete");

        Ok(BuildResult {
            output_dir,
            pages,
            section_indexes,
            static_files,
            skipped: corpus.skipped,
        })
    }

    /// Fail when deleting the output directory would delete the sources.
    pub fn check_output_is_safe(&self) -> Result<(), BuildError> {
        let output_dir = self.output_dir();
        let source_dir = self.source_dir();
        if contains(&output_dir, &source_dir) {
            return Err(BuildError::UnsafeOutput {
                output: output_dir,
                source_dir,
            });
        }
        Ok(())
    }

    /// Delete and recreate the output directory.
    fn clean(&self, output_dir: &Path) -> Result<(), BuildError> {
        self.check_output_is_safe()?;

        if output_dir.exists() {
            tracing::debug!(path = %output_dir.display(), "removing previous output");
            std::fs::remove_dir_all(output_dir).map_err(BuildError::io(output_dir))?;
        }
        std::fs::create_dir_all(output_dir).map_err(BuildError::io(output_dir))?;
        Ok(())
    }

    /// Copy each configured asset directory to the same place under the output.
    fn copy_static(&self, output_dir: &Path) -> Result<usize, BuildError> {
        let source_dir = self.source_dir();
        let mut copied = 0;

        for dir in &self.config.build.static_dirs {
            let from = source_dir.join(dir);
            if !from.is_dir() {
                tracing::debug!(path = %from.display(), "static directory not found, skipping");
                continue;
            }
            let count = copy_dir(&from, &output_dir.join(dir)).map_err(BuildError::io(&from))?;
            tracing::info!(path = %dir.display(), files = count, "copied static assets");
            copied += count;
        }

        Ok(copied)
    }

    fn render_section_indexes(
        &self,
        output_dir: &Path,
        renderer: &Renderer,
        site: &SiteContext,
        nav: &HashMap<ContentCategory, SectionNav>,
    ) -> Result<usize, BuildError> {
        let mut written = 0;

        for category in ContentCategory::SECTIONS {
            let (Some(section), Some(template), Some(section_nav)) = (
                category.dir_name(),
                category.index_template(),
                nav.get(&category),
            ) else {
                continue;
            };

            let context = ListingContext {
                site,
                nav: section_nav,
            };
            let html = renderer
                .render_listing(template, &context)
                .map_err(|source| BuildError::SectionIndex { section, source })?;

            let path = section_index(output_dir, section);
            write_file(&path, &html).map_err(BuildError::io(&path))?;
            tracing::debug!(path = %path.display(), items = section_nav.items.len(), "wrote section index");
            written += 1;
        }

        Ok(written)
    }

    /// Resolve a configured path against the config file's directory.
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_relative() {
            self.base_path.join(path)
        } else {
            path.to_path_buf()
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.config.build.output)
    }

    pub fn source_dir(&self) -> PathBuf {
        self.resolve(&self.config.build.source)
    }

    fn content_dir(&self) -> PathBuf {
        self.source_dir().join(&self.config.build.content)
    }

    fn templates_dir(&self) -> PathBuf {
        self.source_dir().join(&self.config.build.templates)
    }

    fn include_dirs(&self) -> Vec<PathBuf> {
        let source_dir = self.source_dir();
        self.config
            .build
            .include
            .iter()
            .map(|dir| source_dir.join(dir))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    /// A small site with every template and one document per section.
    fn fixture_site(root: &Path) {
        let templates = [
            ("base.html", "<html>{{ title }}|{{ content }}</html>"),
            (
                "about.html",
                "<h1>{{ title }}</h1>{{ content }}{% for entry in toc %}<a href=\"#{{ entry.id }}\">{{ entry.text }}</a>{% for child in entry.children %}<a href=\"#{{ child.id }}\">{{ child.text }}</a>{% endfor %}{% endfor %}",
            ),
            ("about-index.html", "{% for item in about %}{{ item.title }}{% endfor %}"),
            (
                "project-detail.html",
                "{{ currentPage }}/{{ currentSlug }}:{% for g in projectGroups %}{{ g.key }}{% endfor %}{{ content }}",
            ),
            (
                "projects.html",
                "{% for g in projectGroups %}<h2>{{ g.key }}</h2>{% for p in g.items %}<a href=\"/{{ p.outputPath }}\">{{ p.title }}</a>{% endfor %}{% endfor %}",
            ),
            ("research-detail.html", "{{ title }}{{ content }}"),
            ("research.html", "{{ research | length }}"),
            (
                "blog-detail.html",
                "{{ title }} {{ date | date(format=\"%d %B %Y\") }}{% for m in blogByMonth %}[{{ m.key }}]{% endfor %}{{ content }}",
            ),
            (
                "blog.html",
                "{% for m in blogByMonth %}<h2>{{ m.key }}</h2>{% for p in m.items %}{{ p.slug }};{% endfor %}{% endfor %}",
            ),
        ];
        for (name, body) in templates {
            write(root, &format!("src/templates/{name}"), body);
        }

        write(
            root,
            "src/content/about/about.md",
            "---\ntitle: About Me\n---\n# Hello\n\n## Work\n\nText $$e^{i\\pi}$$ here.\n",
        );
        write(
            root,
            "src/content/projects/folio.md",
            "---\ntitle: Folio\ngroup: Tools\norder: 1\n---\nA site builder.\n",
        );
        write(
            root,
            "src/content/research/paper.md",
            "---\ntitle: Paper\n---\nAbstract.\n",
        );
        write(
            root,
            "src/content/blog/doc1.md",
            "---\ntitle: One\ndate: 2024-03-01\ngroup: A\n---\nFirst.\n",
        );
        write(
            root,
            "src/content/blog/doc2.md",
            "---\ntitle: Two\ndate: 2024-01-15\ngroup: B\n---\nSecond.\n",
        );
        write(
            root,
            "src/content/blog/doc3.md",
            "---\ntitle: Three\ndate: 2024-03-10\ngroup: A\n---\nThird.\n",
        );
        write(root, "src/content/talks/keynote.md", "No front matter here.\n");
        write(root, "src/content/blog/broken.md", "---\ntitle: [oops\n---\n");
        write(root, "src/css/site.css", "body {}");
        write(root, "src/img/assets/icon.svg", "<svg/>");
    }

    fn builder(root: &Path) -> Builder {
        Builder::new(RootConfig::default(), root.to_path_buf())
    }

    fn read(root: &Path, relative: &str) -> String {
        std::fs::read_to_string(root.join("dist").join(relative)).unwrap()
    }

    #[tokio::test]
    async fn test_full_build() {
        let dir = tempfile::tempdir().unwrap();
        fixture_site(dir.path());

        let result = builder(dir.path()).build().await.unwrap();

        assert_eq!(result.pages, 7);
        assert_eq!(result.section_indexes, 4);
        // css/site.css and img/assets/icon.svg
        assert_eq!(result.static_files, 2);
        assert_eq!(result.skipped.len(), 1);

        let about = read(dir.path(), "about/about.html");
        assert!(about.contains("<h1 id=\"hello\">Hello</h1>"));
        assert!(about.contains("<a href=\"#work\">Work</a>"));
        assert!(about.contains("<div class=\"math\">$$e^{i\\pi}$$</div>"));
        assert_eq!(read(dir.path(), "index.html"), about);

        assert_eq!(
            read(dir.path(), "projects/folio.html"),
            "projects/folio:Tools<p>A site builder.</p>\n"
        );
        assert_eq!(
            read(dir.path(), "projects/index.html"),
            "<h2>Tools</h2><a href=\"/projects/folio.html\">Folio</a>"
        );
        assert_eq!(read(dir.path(), "research/index.html"), "1");
        assert_eq!(read(dir.path(), "about/index.html"), "About Me");

        assert_eq!(
            read(dir.path(), "blog/index.html"),
            "<h2>March 2024</h2>doc3;doc1;<h2>January 2024</h2>doc2;"
        );
        assert!(read(dir.path(), "blog/doc1.html")
            .starts_with("One 01 March 2024[March 2024][January 2024]"));

        // Unmapped section falls back to the base template
        assert_eq!(
            read(dir.path(), "talks/keynote.html"),
            "<html>Untitled|<p>No front matter here.</p>\n</html>"
        );
        assert_eq!(read(dir.path(), "css/site.css"), "body {}");
    }

    #[tokio::test]
    async fn test_build_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        fixture_site(dir.path());
        let builder = builder(dir.path());

        builder.build().await.unwrap();
        let first = snapshot(&dir.path().join("dist"));

        // Stale files from an earlier build disappear
        write(dir.path(), "dist/stale.html", "old");
        builder.build().await.unwrap();
        let second = snapshot(&dir.path().join("dist"));

        assert_eq!(first, second);
    }

    fn snapshot(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        walkdir::WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .map(|entry| entry.unwrap())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| {
                (
                    entry.path().strip_prefix(root).unwrap().to_path_buf(),
                    std::fs::read(entry.path()).unwrap(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_missing_root_page_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fixture_site(dir.path());
        std::fs::remove_file(dir.path().join("src/content/about/about.md")).unwrap();

        let err = builder(dir.path()).build().await.unwrap_err();
        assert!(matches!(
            err,
            BuildError::Pipeline(PipelineError::MissingRootPage(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_template_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fixture_site(dir.path());
        std::fs::remove_file(dir.path().join("src/templates/blog.html")).unwrap();

        let err = builder(dir.path()).build().await.unwrap_err();
        assert!(matches!(
            err,
            BuildError::SectionIndex {
                section: "blog",
                source: RenderError::TemplateNotFound(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_templates_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/content/about/about.md", "# About");

        let err = builder(dir.path()).build().await.unwrap_err();
        assert!(matches!(
            err,
            BuildError::Render(RenderError::TemplatesNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_refuses_to_clean_source_parent() {
        let dir = tempfile::tempdir().unwrap();
        fixture_site(dir.path());
        let mut config = RootConfig::default();
        config.build.output = PathBuf::from(".");

        let err = Builder::new(config, dir.path().to_path_buf())
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::UnsafeOutput { .. }));
        assert!(dir.path().join("src/content/about/about.md").exists());
    }

    #[tokio::test]
    async fn test_document_named_index_cannot_replace_listing() {
        let dir = tempfile::tempdir().unwrap();
        fixture_site(dir.path());
        write(
            dir.path(),
            "src/content/blog/index.md",
            "---\ntitle: Post named index\n---\n",
        );

        let err = builder(dir.path()).build().await.unwrap_err();
        assert!(matches!(
            err,
            BuildError::Source(SourceError::ReservedOutput { ref output_path, .. })
                if output_path == "blog/index.html"
        ));
    }

    #[tokio::test]
    async fn test_binary_files_in_include_dir_are_only_copied() {
        let dir = tempfile::tempdir().unwrap();
        fixture_site(dir.path());
        let photo = dir.path().join("src/img/assets/photo.png");
        std::fs::write(&photo, [0x89, b'P', b'N', b'G', 0xff, 0xfe, 0x00]).unwrap();
        write(dir.path(), "src/img/assets/.DS_Store", "{% broken");

        let result = builder(dir.path()).build().await.unwrap();

        // css/site.css, img/assets/icon.svg and img/assets/photo.png
        assert_eq!(result.static_files, 3);
        assert!(dir.path().join("dist/img/assets/photo.png").is_file());
        assert!(!dir.path().join("dist/img/assets/.DS_Store").exists());
    }
}
