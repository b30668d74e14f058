//! File-level driver for the two review passes
//!
//! `suggest` reads TEI documents and writes one decision table per document;
//! `revise` reads a document and its reviewed table and writes the revised
//! document. Every output file is written only after the document has been
//! processed completely, and a failure in one document of a batch does not
//! stop the others.

use crate::config::NerConfig;
use crate::detect::{Detector, SkippedMention};
use crate::document::{Document, ProvenanceRecord};
use crate::markup::MarkupError;
use crate::revise::{admit, Policy, PolicyViolation, Reconciler, ReviseError};
use crate::table::{read_rows_from_path, write_rows_to_path, TableError};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

/// A document-level failure, tagged with the file it happened in
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{file}: {source}")]
    Io {
        file: String,
        source: std::io::Error,
    },

    #[error("{file}: not well-formed: {source}")]
    Parse { file: String, source: MarkupError },

    #[error("{file}: {source}")]
    Revise { file: String, source: ReviseError },

    #[error("{file}: {source}")]
    Table { file: String, source: TableError },
}

impl PipelineError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            file: path.display().to_string(),
            source,
        }
    }

    fn parse(path: &Path, source: MarkupError) -> Self {
        Self::Parse {
            file: path.display().to_string(),
            source,
        }
    }
}

/// Result of the suggest pass for one document
#[derive(Debug, Clone, Serialize)]
pub struct SuggestOutcome {
    pub document: String,
    pub table: PathBuf,
    pub suggestions: usize,
    pub already_encoded: usize,
    pub skipped: Vec<SkippedMention>,
}

/// Result of the revise pass for one document
#[derive(Debug, Clone, Serialize)]
pub struct ReviseOutcome {
    pub document: String,
    pub output: PathBuf,
    pub fragments_changed: usize,
    pub applied: usize,
    pub skipped: usize,
    pub violations: Vec<PolicyViolation>,
    /// Rows naming a different file
    pub ignored_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedDocument {
    pub file: String,
    pub error: String,
}

/// Outcome of a suggest run over several documents
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub succeeded: Vec<SuggestOutcome>,
    pub failed: Vec<FailedDocument>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Pipeline {
    config: NerConfig,
    detector: Detector,
    reconciler: Reconciler,
    out_dir: PathBuf,
}

impl Pipeline {
    pub fn new(config: NerConfig, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            detector: Detector::from_config(&config),
            reconciler: Reconciler::new(&config),
            config,
            out_dir: out_dir.into(),
        }
    }

    pub fn with_detector(mut self, detector: Detector) -> Self {
        self.detector = detector;
        self
    }

    pub fn config(&self) -> &NerConfig {
        &self.config
    }

    fn load(&self, path: &Path) -> Result<Document, PipelineError> {
        let source = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        Document::parse(file_name(path), &source, &self.config.container)
            .map_err(|e| PipelineError::parse(path, e))
    }

    fn output_path(&self, name: &str) -> Result<PathBuf, PipelineError> {
        fs::create_dir_all(&self.out_dir).map_err(|e| PipelineError::io(&self.out_dir, e))?;
        Ok(self.out_dir.join(name))
    }

    /// Detect entities in one document and write `{stem}.csv`.
    pub fn suggest_file(&self, path: &Path) -> Result<SuggestOutcome, PipelineError> {
        let document = self.load(path)?;
        let report = self
            .detector
            .detect(&document)
            .map_err(|e| PipelineError::parse(path, e))?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| document.name.clone());
        let table = self.output_path(&format!("{}.csv", stem))?;
        write_rows_to_path(&table, &report.rows).map_err(|source| PipelineError::Table {
            file: table.display().to_string(),
            source,
        })?;
        info!(document = %document.name, table = %table.display(), "suggestions written");

        Ok(SuggestOutcome {
            document: report.document,
            table,
            suggestions: report.rows.len(),
            already_encoded: report.already_encoded,
            skipped: report.skipped,
        })
    }

    /// Run [`Pipeline::suggest_file`] over every path, isolating failures.
    pub fn suggest_batch(&self, paths: &[PathBuf]) -> BatchReport {
        let mut report = BatchReport::default();
        for path in paths {
            match self.suggest_file(path) {
                Ok(outcome) => report.succeeded.push(outcome),
                Err(e) => {
                    error!("{}", e);
                    report.failed.push(FailedDocument {
                        file: path.display().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }

    /// Apply the reviewed table at `csv` to the document at `xml` and write
    /// `revised-{filename}`.
    pub fn revise_file(
        &self,
        xml: &Path,
        csv: &Path,
        record: ProvenanceRecord,
    ) -> Result<ReviseOutcome, PipelineError> {
        let mut document = self.load(xml)?;
        let rows = read_rows_from_path(csv).map_err(|source| PipelineError::Table {
            file: csv.display().to_string(),
            source,
        })?;

        let total = rows.len();
        let decisions: Vec<_> = rows
            .iter()
            .filter(|row| row.file.is_empty() || row.file == document.name)
            .map(|row| row.to_decision())
            .collect();
        let ignored_rows = total - decisions.len();
        if ignored_rows > 0 {
            warn!(
                document = %document.name,
                ignored_rows,
                "rows for other files ignored"
            );
        }

        let (admitted, violations) = admit(decisions, &Policy::from_config(&self.config));
        let revise_error = |source| PipelineError::Revise {
            file: xml.display().to_string(),
            source,
        };
        let revised = self
            .reconciler
            .reconcile(&document.fragments, &admitted)
            .map_err(revise_error)?;
        let output = self
            .reconciler
            .assemble(&mut document, &revised, record)
            .map_err(revise_error)?;

        let path = self.output_path(&format!("revised-{}", document.name))?;
        fs::write(&path, output).map_err(|e| PipelineError::io(&path, e))?;
        info!(document = %document.name, output = %path.display(), "revision written");

        Ok(ReviseOutcome {
            document: document.name.clone(),
            output: path,
            fragments_changed: revised.iter().filter(|r| r.is_changed()).count(),
            applied: revised.iter().map(|r| r.applied).sum(),
            skipped: revised.iter().map(|r| r.skipped).sum(),
            violations,
            ignored_rows,
        })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
