//! Share and conversion-job data types.
//!
//! Share types are what callers of [`crate::share::ShareOrchestrator`] send
//! and receive. Job types mirror the Conversion API's JSON contract; they are
//! read-only snapshots, since the job itself lives in the external service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

// ── Share types ──────────────────────────────────────────────────────────

/// Visibility of a share. Passed through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareMode {
    Public,
    Private,
}

impl fmt::Display for ShareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareMode::Public => f.write_str("public"),
            ShareMode::Private => f.write_str("private"),
        }
    }
}

/// A request to share a file, optionally converting it first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    /// Source file name, including its extension (e.g. `example.docx`).
    pub name: String,
    pub mode: ShareMode,
    /// Target format extension (e.g. `pdf`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convert_to: Option<String>,
}

impl ShareRequest {
    pub fn new(name: impl Into<String>, mode: ShareMode) -> Self {
        Self {
            name: name.into(),
            mode,
            convert_to: None,
        }
    }

    pub fn convert_to(mut self, format: impl Into<String>) -> Self {
        self.convert_to = Some(format.into());
        self
    }

    /// Format implied by the file name's extension.
    pub fn input_format(&self) -> Option<&str> {
        file_extension(&self.name)
    }

    /// The requested target format, normalised.
    ///
    /// A leading dot is dropped and an empty value counts as "no conversion".
    pub fn target_format(&self) -> Option<&str> {
        self.convert_to
            .as_deref()
            .map(|f| f.trim().trim_start_matches('.'))
            .filter(|f| !f.is_empty())
    }
}

/// The pre-conversion file of a converted share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalFile {
    pub name: String,
}

/// A persisted share as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResult {
    pub id: String,
    /// Final file name: the converted name when a conversion happened.
    pub name: String,
    pub mode: ShareMode,
    /// Present only when the file was converted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_file: Option<OriginalFile>,
}

/// A share record before the store assigns it an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShare {
    pub name: String,
    pub mode: ShareMode,
    pub original_file: Option<OriginalFile>,
}

// ── Conversion job types ─────────────────────────────────────────────────

/// A file as known to the Conversion API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    pub format: String,
}

/// Output side of a job. `name` may be missing until the job completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub format: String,
}

/// Lifecycle state of a conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Pending,
    Completed,
    Error,
}

impl JobState {
    /// `COMPLETED` and `ERROR` never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Error)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Pending => f.write_str("PENDING"),
            JobState::Completed => f.write_str("COMPLETED"),
            JobState::Error => f.write_str("ERROR"),
        }
    }
}

/// Snapshot of a conversion job as reported by the Conversion API.
///
/// Deserialises from both the nested shape (`inputFile: {name, format}`)
/// and the flat shape (`inputFileName`, `inputFileFormat`, ...). It always
/// serialises to the nested shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "JobWire")]
pub struct ConversionJob {
    pub id: String,
    pub state: JobState,
    pub input_file: FileDescriptor,
    pub output_file: OutputFile,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ConversionJob {
    /// Log when `completedAt` disagrees with `state`.
    ///
    /// Some API deployments report `ERROR` with `completedAt: null`; the
    /// state still wins.
    pub(crate) fn check_consistency(&self) {
        if self.state.is_terminal() != self.completed_at.is_some() {
            warn!(
                "Conversion job {}: state {} with completedAt {:?}",
                self.id, self.state, self.completed_at
            );
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JobWire {
    #[serde(rename_all = "camelCase")]
    Nested {
        id: String,
        state: JobState,
        input_file: FileDescriptor,
        output_file: OutputFile,
        created_at: DateTime<Utc>,
        #[serde(default)]
        completed_at: Option<DateTime<Utc>>,
    },
    #[serde(rename_all = "camelCase")]
    Flat {
        id: String,
        state: JobState,
        input_file_name: String,
        input_file_format: String,
        #[serde(default)]
        output_file_name: Option<String>,
        output_file_format: String,
        created_at: DateTime<Utc>,
        #[serde(default)]
        completed_at: Option<DateTime<Utc>>,
    },
}

impl From<JobWire> for ConversionJob {
    fn from(wire: JobWire) -> Self {
        match wire {
            JobWire::Nested {
                id,
                state,
                input_file,
                output_file,
                created_at,
                completed_at,
            } => Self {
                id,
                state,
                input_file,
                output_file,
                created_at,
                completed_at,
            },
            JobWire::Flat {
                id,
                state,
                input_file_name,
                input_file_format,
                output_file_name,
                output_file_format,
                created_at,
                completed_at,
            } => Self {
                id,
                state,
                input_file: FileDescriptor {
                    name: input_file_name,
                    format: input_file_format,
                },
                output_file: OutputFile {
                    name: output_file_name,
                    format: output_file_format,
                },
                created_at,
                completed_at,
            },
        }
    }
}

/// Body of `POST /conversions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversionRequest {
    pub input_file: FileDescriptor,
    pub output_file: TargetFormat,
}

/// `outputFile` of a creation request: only the format is chosen by us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFormat {
    pub format: String,
}

/// A successfully converted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedFile {
    pub name: String,
    pub format: String,
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// Extension of a file name, without the dot.
///
/// Returns `None` when there is no extension: `README`, `archive.`, and
/// dot-files such as `.env`.
pub fn file_extension(name: &str) -> Option<&str> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rfind('.') {
        Some(0) | None => None,
        Some(idx) if idx + 1 == base.len() => None,
        Some(idx) => Some(&base[idx + 1..]),
    }
}

/// `report.docx` + `pdf` → `report.pdf`.
pub fn replace_extension(name: &str, format: &str) -> String {
    match file_extension(name) {
        Some(ext) => format!("{}.{}", &name[..name.len() - ext.len() - 1], format),
        None => format!("{}.{}", name, format),
    }
}

/// Case-insensitive format comparison.
pub fn same_format(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extension_detection() {
        assert_eq!(file_extension("example.docx"), Some("docx"));
        assert_eq!(file_extension("archive.tar.gz"), Some("gz"));
        assert_eq!(file_extension("dir.v2/notes.MD"), Some("MD"));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension("trailing."), None);
        assert_eq!(file_extension(".env"), None);
        assert_eq!(file_extension(""), None);
    }

    #[test]
    fn extension_replacement() {
        assert_eq!(replace_extension("example.docx", "pdf"), "example.pdf");
        assert_eq!(replace_extension("a.b.c", "txt"), "a.b.txt");
        assert_eq!(replace_extension("README", "pdf"), "README.pdf");
    }

    #[test]
    fn target_format_normalisation() {
        let req = ShareRequest::new("example.docx", ShareMode::Public);
        assert_eq!(req.target_format(), None);
        assert_eq!(req.clone().convert_to("").target_format(), None);
        assert_eq!(req.clone().convert_to(".pdf").target_format(), Some("pdf"));
        assert_eq!(req.convert_to(" PDF ").target_format(), Some("PDF"));
    }

    #[test]
    fn share_request_from_json() {
        let req: ShareRequest = serde_json::from_value(json!({
            "name": "example.docx",
            "mode": "private",
            "convertTo": "pdf"
        }))
        .unwrap();
        assert_eq!(req.mode, ShareMode::Private);
        assert_eq!(req.convert_to.as_deref(), Some("pdf"));
        assert_eq!(req.input_format(), Some("docx"));
    }

    #[test]
    fn share_result_omits_original_file_when_absent() {
        let direct = ShareResult {
            id: "abc".into(),
            name: "example.docx".into(),
            mode: ShareMode::Public,
            original_file: None,
        };
        assert_eq!(
            serde_json::to_value(&direct).unwrap(),
            json!({ "id": "abc", "name": "example.docx", "mode": "public" })
        );

        let converted = ShareResult {
            original_file: Some(OriginalFile {
                name: "example.docx".into(),
            }),
            name: "example.pdf".into(),
            ..direct
        };
        assert_eq!(
            serde_json::to_value(&converted).unwrap(),
            json!({
                "id": "abc",
                "name": "example.pdf",
                "mode": "public",
                "originalFile": { "name": "example.docx" }
            })
        );
    }

    #[test]
    fn job_from_nested_payload() {
        let job: ConversionJob = serde_json::from_value(json!({
            "id": "job-1",
            "state": "PENDING",
            "inputFile": { "name": "example.docx", "format": "docx" },
            "outputFile": { "format": "pdf" },
            "createdAt": "2024-05-01T10:00:00Z",
            "completedAt": null
        }))
        .unwrap();
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.output_file.name, None);
        assert_eq!(job.input_file.format, "docx");
    }

    #[test]
    fn job_from_flat_payload() {
        let job: ConversionJob = serde_json::from_value(json!({
            "id": "job-2",
            "state": "COMPLETED",
            "inputFileName": "example.docx",
            "inputFileFormat": "docx",
            "outputFileName": "example.pdf",
            "outputFileFormat": "pdf",
            "createdAt": "2024-05-01T10:00:00Z",
            "completedAt": "2024-05-01T10:00:03Z"
        }))
        .unwrap();
        assert!(job.state.is_terminal());
        assert_eq!(job.output_file.name.as_deref(), Some("example.pdf"));
        assert_eq!(job.input_file.name, "example.docx");
    }

    #[test]
    fn job_serialises_nested() {
        let job: ConversionJob = serde_json::from_value(json!({
            "id": "job-3",
            "state": "ERROR",
            "inputFileName": "a.docx",
            "inputFileFormat": "docx",
            "outputFileFormat": "pdf",
            "createdAt": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["inputFile"]["name"], "a.docx");
        assert_eq!(value["outputFile"], json!({ "format": "pdf" }));
        assert_eq!(value["state"], "ERROR");
    }

    #[test]
    fn job_missing_fields_is_rejected() {
        let result = serde_json::from_value::<ConversionJob>(json!({
            "id": "job-4",
            "state": "PENDING"
        }));
        assert!(result.is_err());

        let result = serde_json::from_value::<ConversionJob>(json!({
            "id": "job-5",
            "state": "RUNNING",
            "inputFile": { "name": "a.docx", "format": "docx" },
            "outputFile": { "format": "pdf" },
            "createdAt": "2024-05-01T10:00:00Z"
        }));
        assert!(result.is_err());
    }
}
