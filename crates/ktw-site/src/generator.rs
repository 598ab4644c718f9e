//! Site generation: render every source file under a directory tree.
//!
//! Sources are found with a sorted directory walk and rendered in parallel on
//! a rayon pool. Each output file is written once, after its page has been
//! fully composed.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use ktw_renderer::Engine;
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::cancel::Cancellation;
use crate::document::{DocumentError, DocumentErrorKind, render_document};
use crate::page::PageError;

/// What to do when a document fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the batch on the first failure.
    ///
    /// Documents after a failed one are skipped once the failure is seen, and
    /// the reported error is the earliest failure in source order. Documents
    /// already in flight when it happens still write their pages.
    #[default]
    FailFast,
    /// Render everything, then report every failure.
    KeepGoing,
}

/// Configuration for [`SiteGenerator`].
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// Root directory containing source documents.
    pub source_dir: PathBuf,
    /// Directory receiving the generated pages (may equal `source_dir`).
    pub output_dir: PathBuf,
    /// Extension of source documents, without the dot.
    pub source_extension: String,
    /// Extension of generated pages, without the dot.
    pub output_extension: String,
    /// Worker threads (`None` uses the global rayon pool).
    pub jobs: Option<usize>,
    pub policy: FailurePolicy,
}

impl GeneratorConfig {
    /// Generate `.html` next to every `.md` file in `dir`.
    #[must_use]
    pub fn in_place(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            output_dir: dir.clone(),
            source_dir: dir,
            source_extension: "md".to_owned(),
            output_extension: "html".to_owned(),
            jobs: None,
            policy: FailurePolicy::default(),
        }
    }
}

/// Error that stops generation as a whole.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("failed to scan sources: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("generation cancelled")]
    Cancelled,
}

/// One generated page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedPage {
    /// Source path relative to the source directory.
    pub source: PathBuf,
    /// Path of the written page.
    pub output: PathBuf,
}

/// Outcome of a generation run.
#[derive(Debug, Default)]
pub struct GenerateReport {
    /// Pages written, in source order.
    pub generated: Vec<GeneratedPage>,
    /// Documents that failed (only with [`FailurePolicy::KeepGoing`]).
    pub failures: Vec<DocumentError>,
}

impl GenerateReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Renders a source tree into HTML pages.
pub struct SiteGenerator<'e> {
    engine: &'e Engine,
    config: GeneratorConfig,
}

impl<'e> SiteGenerator<'e> {
    #[must_use]
    pub fn new(engine: &'e Engine, config: GeneratorConfig) -> Self {
        Self { engine, config }
    }

    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Render every source document and write the pages.
    pub fn generate(&self, cancel: &Cancellation) -> Result<GenerateReport, GenerateError> {
        if !self.config.source_dir.is_dir() {
            return Err(GenerateError::SourceNotFound(self.config.source_dir.clone()));
        }

        let sources = self.collect_sources()?;
        tracing::debug!(count = sources.len(), "Collected sources");

        let report = match self.config.jobs {
            Some(jobs) => rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()?
                .install(|| self.render_all(&sources, cancel))?,
            None => self.render_all(&sources, cancel)?,
        };

        tracing::info!(
            generated = report.generated.len(),
            failed = report.failures.len(),
            "Site generated"
        );
        Ok(report)
    }

    /// Source files relative to the source directory, in sorted order.
    pub fn collect_sources(&self) -> Result<Vec<PathBuf>, GenerateError> {
        let root = &self.config.source_dir;
        let mut sources = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() || !self.is_source(entry.path()) {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(root) {
                sources.push(relative.to_path_buf());
            }
        }
        Ok(sources)
    }

    fn is_source(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext == self.config.source_extension.as_str())
    }

    /// Output path for a source path relative to the source directory.
    #[must_use]
    pub fn output_path(&self, relative: &Path) -> PathBuf {
        self.config
            .output_dir
            .join(relative)
            .with_extension(&self.config.output_extension)
    }

    fn render_all(
        &self,
        sources: &[PathBuf],
        cancel: &Cancellation,
    ) -> Result<GenerateReport, GenerateError> {
        match self.config.policy {
            FailurePolicy::FailFast => {
                let first_failure = AtomicUsize::new(usize::MAX);
                let results: Vec<_> = sources
                    .par_iter()
                    .enumerate()
                    .map(|(index, relative)| {
                        if index > first_failure.load(Ordering::Relaxed) {
                            return None;
                        }
                        let result = self.generate_one(relative, cancel);
                        if result.is_err() {
                            first_failure.fetch_min(index, Ordering::Relaxed);
                        }
                        Some(result)
                    })
                    .collect();

                let mut generated = Vec::with_capacity(results.len());
                for result in results.into_iter().flatten() {
                    match result {
                        Ok(page) => generated.push(page),
                        Err(_) if cancel.is_cancelled() => return Err(GenerateError::Cancelled),
                        Err(e) => return Err(GenerateError::Document(e)),
                    }
                }
                Ok(GenerateReport {
                    generated,
                    failures: Vec::new(),
                })
            }
            FailurePolicy::KeepGoing => {
                let results: Vec<_> = sources
                    .par_iter()
                    .map(|relative| self.generate_one(relative, cancel))
                    .collect();
                if cancel.is_cancelled() {
                    return Err(GenerateError::Cancelled);
                }
                Ok(partition_results(results))
            }
        }
    }

    fn generate_one(
        &self,
        relative: &Path,
        cancel: &Cancellation,
    ) -> Result<GeneratedPage, DocumentError> {
        let source = self.config.source_dir.join(relative);
        let output = self.output_path(relative);
        let fail = |kind| DocumentError {
            path: source.clone(),
            kind,
        };

        if cancel.is_cancelled() {
            return Err(fail(DocumentErrorKind::Page(PageError::Cancelled)));
        }

        let bytes = fs::read(&source).map_err(|e| fail(DocumentErrorKind::Read(e)))?;
        let name = relative
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let html = render_document(self.engine, &name, &bytes, cancel).map_err(fail)?;

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| fail(DocumentErrorKind::Write(e)))?;
        }
        fs::write(&output, html).map_err(|e| fail(DocumentErrorKind::Write(e)))?;

        tracing::debug!(
            source = %relative.display(),
            output = %output.display(),
            "Generated page"
        );
        Ok(GeneratedPage {
            source: relative.to_path_buf(),
            output,
        })
    }
}

/// Split results into written pages and failures, keeping source order.
fn partition_results(results: Vec<Result<GeneratedPage, DocumentError>>) -> GenerateReport {
    let mut report = GenerateReport {
        generated: Vec::with_capacity(results.len()),
        failures: Vec::new(),
    };
    for result in results {
        match result {
            Ok(page) => report.generated.push(page),
            Err(error) => {
                tracing::warn!(%error, "Document failed");
                report.failures.push(error);
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use ktw_renderer::{EngineConfig, PlainHighlighter};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::frontmatter::SplitError;

    fn engine() -> Engine {
        Engine::with_highlighter(EngineConfig::default(), PlainHighlighter)
    }

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.md", "---\ntitle: Home\n---\nNote: welcome\n");
        write(dir.path(), "guide/setup.md", "---\n---\n# Setup\n");
        write(dir.path(), "style.css", "p {}\n");
        dir
    }

    #[test]
    fn test_generate_in_place() {
        let dir = site();
        let engine = engine();
        let generator = SiteGenerator::new(&engine, GeneratorConfig::in_place(dir.path()));

        let report = generator.generate(&Cancellation::new()).unwrap();

        assert!(report.is_success());
        let sources: Vec<_> = report.generated.iter().map(|p| p.source.clone()).collect();
        assert_eq!(
            sources,
            vec![PathBuf::from("guide/setup.md"), PathBuf::from("index.md")]
        );

        let index = fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(index.contains("<title>Home</title>"));
        assert!(index.contains(r#"<p class="note">welcome</p>"#));

        let setup = fs::read_to_string(dir.path().join("guide/setup.html")).unwrap();
        assert!(setup.contains("<title>setup.md</title>"));

        assert!(!dir.path().join("style.html").exists());
    }

    #[test]
    fn test_generate_into_separate_output_dir() {
        let dir = site();
        let out = TempDir::new().unwrap();
        let engine = engine();
        let config = GeneratorConfig {
            output_dir: out.path().join("public"),
            ..GeneratorConfig::in_place(dir.path())
        };

        let report = SiteGenerator::new(&engine, config)
            .generate(&Cancellation::new())
            .unwrap();

        assert_eq!(report.generated.len(), 2);
        assert!(out.path().join("public/index.html").is_file());
        assert!(out.path().join("public/guide/setup.html").is_file());
        assert!(!dir.path().join("index.html").exists());
    }

    #[test]
    fn test_custom_extensions() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.markdown", "---\n---\ntext\n");
        write(dir.path(), "b.md", "---\n---\ntext\n");
        let engine = engine();
        let config = GeneratorConfig {
            source_extension: "markdown".to_owned(),
            output_extension: "htm".to_owned(),
            ..GeneratorConfig::in_place(dir.path())
        };

        let report = SiteGenerator::new(&engine, config)
            .generate(&Cancellation::new())
            .unwrap();

        assert_eq!(report.generated.len(), 1);
        assert!(dir.path().join("a.htm").is_file());
        assert!(!dir.path().join("b.htm").exists());
    }

    #[test]
    fn test_fail_fast_reports_failing_document() {
        let dir = site();
        write(dir.path(), "broken.md", "no frontmatter here\n");
        let engine = engine();
        let generator = SiteGenerator::new(&engine, GeneratorConfig::in_place(dir.path()));

        let err = generator.generate(&Cancellation::new()).unwrap_err();

        match err {
            GenerateError::Document(error) => {
                assert_eq!(error.path, dir.path().join("broken.md"));
                assert!(matches!(
                    error.kind,
                    DocumentErrorKind::Split(SplitError::DelimiterNotFound)
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dir.path().join("broken.html").exists());
    }

    #[test]
    fn test_fail_fast_reports_earliest_failure_in_source_order() {
        let dir = TempDir::new().unwrap();
        for name in ["a.md", "b.md", "c.md", "d.md", "e.md", "f.md"] {
            write(dir.path(), name, "no frontmatter here\n");
        }
        let engine = engine();
        let config = GeneratorConfig {
            jobs: Some(4),
            ..GeneratorConfig::in_place(dir.path())
        };
        let generator = SiteGenerator::new(&engine, config);

        for _ in 0..5 {
            match generator.generate(&Cancellation::new()).unwrap_err() {
                GenerateError::Document(error) => {
                    assert_eq!(error.path, dir.path().join("a.md"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_keep_going_collects_failures() {
        let dir = site();
        write(dir.path(), "broken.md", "no frontmatter here\n");
        write(dir.path(), "bad-yaml.md", "---\nx: [\n---\n");
        let engine = engine();
        let config = GeneratorConfig {
            policy: FailurePolicy::KeepGoing,
            ..GeneratorConfig::in_place(dir.path())
        };

        let report = SiteGenerator::new(&engine, config)
            .generate(&Cancellation::new())
            .unwrap();

        assert!(!report.is_success());
        assert_eq!(report.generated.len(), 2);
        let failed: Vec<_> = report.failures.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            failed,
            vec![dir.path().join("bad-yaml.md"), dir.path().join("broken.md")]
        );
        assert!(dir.path().join("index.html").is_file());
    }

    #[test]
    fn test_cancelled_before_start() {
        let dir = site();
        let engine = engine();
        let cancel = Cancellation::new();
        cancel.cancel();

        let err = SiteGenerator::new(&engine, GeneratorConfig::in_place(dir.path()))
            .generate(&cancel)
            .unwrap_err();

        assert!(matches!(err, GenerateError::Cancelled));
        assert!(!dir.path().join("index.html").exists());
    }

    #[test]
    fn test_dedicated_pool() {
        let dir = site();
        let engine = engine();
        let config = GeneratorConfig {
            jobs: Some(2),
            ..GeneratorConfig::in_place(dir.path())
        };

        let report = SiteGenerator::new(&engine, config)
            .generate(&Cancellation::new())
            .unwrap();
        assert_eq!(report.generated.len(), 2);
    }

    #[test]
    fn test_missing_source_dir() {
        let dir = TempDir::new().unwrap();
        let engine = engine();
        let err = SiteGenerator::new(&engine, GeneratorConfig::in_place(dir.path().join("nope")))
            .generate(&Cancellation::new())
            .unwrap_err();
        assert!(matches!(err, GenerateError::SourceNotFound(_)));
    }

    #[test]
    fn test_output_path() {
        let engine = engine();
        let config = GeneratorConfig {
            output_dir: PathBuf::from("/out"),
            ..GeneratorConfig::in_place("/src")
        };
        let generator = SiteGenerator::new(&engine, config);
        assert_eq!(
            generator.output_path(Path::new("a/b.md")),
            PathBuf::from("/out/a/b.html")
        );
    }
}
