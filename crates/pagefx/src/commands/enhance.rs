//! `pagefx enhance` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use pagefx_config::{CliSettings, Config};
use pagefx_dom::Document;
use pagefx_enhance::EnhanceReport;
use rayon::prelude::*;

use super::PageSteps;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the enhance command.
#[derive(Args)]
pub(crate) struct EnhanceArgs {
    /// HTML files or directories (directories are searched for `**/*.html`).
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Path to configuration file (default: auto-discover pagefx.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write enhanced pages under this directory instead of in place.
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Reader color scheme: light or dark (overrides config).
    #[arg(long)]
    color_scheme: Option<String>,

    /// Enable verbose output (per-file logs).
    #[arg(short, long)]
    pub verbose: bool,
}

/// HTML page to enhance.
#[derive(Debug, PartialEq, Eq)]
struct InputFile {
    /// Path the page is read from.
    source: PathBuf,
    /// Path relative to the input argument, mirrored under the output directory.
    relative: PathBuf,
}

impl InputFile {
    fn destination(&self, out_dir: Option<&Path>) -> PathBuf {
        match out_dir {
            Some(dir) => dir.join(&self.relative),
            None => self.source.clone(),
        }
    }
}

/// Page that could not be enhanced.
#[derive(Debug)]
struct FileFailure {
    path: PathBuf,
    error: CliError,
}

impl EnhanceArgs {
    /// Execute the enhance command.
    ///
    /// Every file is attempted; the command fails afterwards if any file failed.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            color_scheme: self.color_scheme,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            output.detail(&format!("Config: {}", path.display()));
        }

        let steps = PageSteps::from_config(&config)?;
        let inputs = collect_inputs(&self.paths)?;
        if inputs.is_empty() {
            output.warning("No HTML files found");
            return Ok(());
        }

        let out_dir = self.out_dir.as_deref();
        let results: Vec<Result<(PathBuf, EnhanceReport), FileFailure>> = inputs
            .par_iter()
            .map(|input| {
                enhance_file(&steps, input, out_dir)
                    .map(|report| (input.source.clone(), report))
                    .map_err(|error| FileFailure {
                        path: input.source.clone(),
                        error,
                    })
            })
            .collect();
        let (enhanced, failures) = partition_results(results);

        for (path, report) in &enhanced {
            tracing::info!(
                path = %path.display(),
                diagrams = report.diagrams,
                anchors = report.anchors.len(),
                "Enhanced page"
            );
            for warning in &report.warnings {
                output.warning(&format!("{}: {warning}", path.display()));
            }
        }
        for failure in &failures {
            output.error(&format!("{}: {}", failure.path.display(), failure.error));
        }

        let total = inputs.len();
        if !failures.is_empty() {
            return Err(CliError::Failed {
                failed: failures.len(),
                total,
            });
        }

        let diagrams: usize = enhanced.iter().map(|(_, r)| r.diagrams).sum();
        let anchors: usize = enhanced.iter().map(|(_, r)| r.anchors.len()).sum();
        output.success(&format!(
            "Enhanced {total} page(s): {diagrams} diagram(s), {anchors} anchor(s)"
        ));
        Ok(())
    }
}

/// Expand command-line paths into HTML files.
///
/// Files are taken as given; directories are searched recursively.
fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<InputFile>, CliError> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let pattern = format!(
                "{}/**/*.html",
                glob::Pattern::escape(&path.to_string_lossy())
            );
            for entry in glob::glob(&pattern)? {
                let source = entry?;
                if !source.is_file() {
                    continue;
                }
                let relative = source
                    .strip_prefix(path)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| source.clone());
                inputs.push(InputFile { source, relative });
            }
        } else if path.is_file() {
            let relative = path
                .file_name()
                .map_or_else(|| path.clone(), PathBuf::from);
            inputs.push(InputFile {
                source: path.clone(),
                relative,
            });
        } else {
            return Err(CliError::Validation(format!(
                "Path not found: {}",
                path.display()
            )));
        }
    }
    Ok(inputs)
}

/// Enhance a single page and write the result.
fn enhance_file(
    steps: &PageSteps,
    input: &InputFile,
    out_dir: Option<&Path>,
) -> Result<EnhanceReport, CliError> {
    let html = std::fs::read_to_string(&input.source)?;
    let mut document = Document::parse(&html)?;
    let report = steps.enhancer().enhance(&mut document);

    let destination = input.destination(out_dir);
    if let Some(parent) = destination.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&destination, document.to_html())?;

    Ok(report)
}

/// Partition results into successes and failures.
fn partition_results<T>(results: Vec<Result<T, FileFailure>>) -> (Vec<T>, Vec<FileFailure>) {
    let mut succeeded = Vec::with_capacity(results.len());
    let mut failed = Vec::new();

    for result in results {
        match result {
            Ok(item) => succeeded.push(item),
            Err(failure) => failed.push(failure),
        }
    }

    (succeeded, failed)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Guide</title></head>
<body><article><h2>Install</h2><pre class="mermaid">A-->B</pre><h2>Install</h2></article></body>
</html>
"#;

    fn steps() -> PageSteps {
        PageSteps::from_config(&Config::default()).unwrap()
    }

    #[test]
    fn test_collect_inputs_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("guide")).unwrap();
        std::fs::write(dir.path().join("index.html"), "").unwrap();
        std::fs::write(dir.path().join("guide/setup.html"), "").unwrap();
        std::fs::write(dir.path().join("guide/notes.txt"), "").unwrap();

        let mut inputs = collect_inputs(&[dir.path().to_path_buf()]).unwrap();
        inputs.sort_by(|a, b| a.relative.cmp(&b.relative));

        let relative: Vec<PathBuf> = inputs.iter().map(|i| i.relative.clone()).collect();
        assert_eq!(
            relative,
            vec![PathBuf::from("guide/setup.html"), PathBuf::from("index.html")]
        );
    }

    #[test]
    fn test_collect_inputs_file() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("page.html");
        std::fs::write(&page, "").unwrap();

        let inputs = collect_inputs(std::slice::from_ref(&page)).unwrap();

        assert_eq!(
            inputs,
            vec![InputFile {
                source: page,
                relative: PathBuf::from("page.html"),
            }]
        );
    }

    #[test]
    fn test_collect_inputs_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let result = collect_inputs(&[dir.path().join("missing.html")]);

        assert!(matches!(result, Err(CliError::Validation(_))));
    }

    #[test]
    fn test_enhance_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("page.html");
        std::fs::write(&page, PAGE).unwrap();
        let input = InputFile {
            source: page.clone(),
            relative: PathBuf::from("page.html"),
        };

        let report = enhance_file(&steps(), &input, None).unwrap();

        assert_eq!(report.diagrams, 1);
        let slugs: Vec<&str> = report.anchors.iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(slugs, vec!["install-0", "install-1"]);

        let html = std::fs::read_to_string(&page).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>\n<html><head><title>Guide</title></head>"));
        assert!(html.contains(r##"<h2><a class="header-hash" href="#install-0" id="install-0">#</a>Install</h2>"##));
        assert!(html.contains(r#"<div class="mermaid">A--&gt;B</div><details><summary>Diagram source</summary>"#));
        assert!(html.contains("<script>hljs.initHighlightingOnLoad();</script></body>"));
    }

    #[test]
    fn test_enhance_file_twice_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("page.html");
        std::fs::write(&page, PAGE).unwrap();
        let input = InputFile {
            source: page.clone(),
            relative: PathBuf::from("page.html"),
        };

        let first = enhance_file(&steps(), &input, None).unwrap();
        let once = std::fs::read_to_string(&page).unwrap();
        let second = enhance_file(&steps(), &input, None).unwrap();
        let twice = std::fs::read_to_string(&page).unwrap();

        assert_eq!(twice, once);
        assert_eq!(second.diagrams, 0);
        assert_eq!(second.anchors, first.anchors);
        assert_eq!(twice.matches("header-hash").count(), 2);
        assert_eq!(twice.matches("mermaid.initialize(").count(), 1);
        assert_eq!(twice.matches("hljs.initHighlightingOnLoad").count(), 1);
    }

    #[test]
    fn test_enhance_file_mirrors_into_out_dir() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src.path().join("guide")).unwrap();
        std::fs::write(src.path().join("guide/setup.html"), PAGE).unwrap();

        let inputs = collect_inputs(&[src.path().to_path_buf()]).unwrap();
        enhance_file(&steps(), &inputs[0], Some(out.path())).unwrap();

        let written = std::fs::read_to_string(out.path().join("guide/setup.html")).unwrap();
        assert!(written.contains("header-hash"));
        let original = std::fs::read_to_string(src.path().join("guide/setup.html")).unwrap();
        assert_eq!(original, PAGE);
    }

    #[test]
    fn test_enhance_file_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let input = InputFile {
            source: dir.path().join("gone.html"),
            relative: PathBuf::from("gone.html"),
        };

        assert!(matches!(
            enhance_file(&steps(), &input, None),
            Err(CliError::Io(_))
        ));
    }

    #[test]
    fn test_partition_results() {
        let results = vec![
            Ok(1),
            Err(FileFailure {
                path: PathBuf::from("a.html"),
                error: CliError::Validation("bad".to_owned()),
            }),
            Ok(2),
        ];

        let (succeeded, failed) = partition_results(results);

        assert_eq!(succeeded, vec![1, 2]);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].path, PathBuf::from("a.html"));
    }
}
