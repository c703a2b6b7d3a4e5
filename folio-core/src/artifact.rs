//! Artifacts produced by a job execution

use crate::error::FolioError;
use crate::job::JobId;
use folio_schema::NamedType;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reference to stored content: a scheme selecting the backend and a
/// backend-specific path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Artifact {
    pub scheme: String,
    pub path: String,
}

impl Artifact {
    pub fn new(scheme: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            path: path.into(),
        }
    }

    pub fn uri(&self) -> String {
        format!("{}://{}", self.scheme, self.path)
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.path)
    }
}

impl NamedType for Artifact {
    const NAMESPACE: &'static str = "folio.Artifact";
}

/// The artifacts a completed execution can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// The executed document in raw form
    #[serde(rename = "ipynb")]
    Document,
    #[serde(rename = "html")]
    Html,
    /// HTML rendering without inputs
    #[serde(rename = "html_report")]
    Report,
    /// Structured output emitted by the document
    #[serde(rename = "output")]
    Output,
    /// Failure message of a failed document
    #[serde(rename = "exception")]
    Exception,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 5] = [
        ArtifactKind::Document,
        ArtifactKind::Html,
        ArtifactKind::Report,
        ArtifactKind::Output,
        ArtifactKind::Exception,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Document => "ipynb",
            ArtifactKind::Html => "html",
            ArtifactKind::Report => "html_report",
            ArtifactKind::Output => "output",
            ArtifactKind::Exception => "exception",
        }
    }

    /// MIME type the content is served with
    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactKind::Document | ArtifactKind::Output => "application/json",
            ArtifactKind::Html | ArtifactKind::Report => "text/html; charset=utf-8",
            ArtifactKind::Exception => "text/plain; charset=utf-8",
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            ArtifactKind::Document => "ipynb",
            ArtifactKind::Html => "html",
            ArtifactKind::Report => "report.html",
            ArtifactKind::Output => "output.json",
            ArtifactKind::Exception => "exception.txt",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArtifactKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| FolioError::Internal(format!("Unknown artifact kind: {}", s)))
    }
}

/// Storage path of the `kind` artifact of a job
///
/// The path depends only on the job id and the kind, so names never collide
/// across jobs or kinds.
pub fn artifact_path(job_id: &JobId, kind: ArtifactKind) -> String {
    format!("{}.{}", job_id, kind.suffix())
}
