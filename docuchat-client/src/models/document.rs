use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Extensions the server knows how to ingest.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt"];

/// Server-side upload limit (10 MB).
pub const MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub i64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for DocumentId {
    fn from(id: i64) -> Self {
        DocumentId(id)
    }
}

impl std::str::FromStr for DocumentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(DocumentId)
    }
}

/// Processing status as reported by the server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Accepted but not yet picked up by the processor.
    #[serde(alias = "uploading")]
    Queued,
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, DocumentStatus::Completed | DocumentStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Queued => "queued",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
        }
    }
}

/// Response to `POST /documents/upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub id: DocumentId,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
    #[serde(default)]
    pub uploaded_at: Option<NaiveDateTime>,
}

/// Response to `GET /documents/status/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStatusResponse {
    #[serde(default)]
    pub id: Option<DocumentId>,
    #[serde(default)]
    pub filename: Option<String>,
    pub status: DocumentStatus,
    #[serde(default)]
    pub uploaded_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub processed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Entry of `GET /documents/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub filename: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: u64,
    pub status: DocumentStatus,
    #[serde(default)]
    pub uploaded_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub message: String,
}

/// Client-side view of the readiness of the tracked document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReadinessState {
    /// No document is being tracked.
    #[default]
    Idle,
    Processing,
    Completed,
    Failed { message: String },
}

impl From<&DocumentStatusResponse> for ReadinessState {
    fn from(response: &DocumentStatusResponse) -> Self {
        match response.status {
            DocumentStatus::Queued | DocumentStatus::Processing => ReadinessState::Processing,
            DocumentStatus::Completed => ReadinessState::Completed,
            DocumentStatus::Failed => ReadinessState::Failed {
                message: response.error_message.clone().unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub enum SelectionSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// A locally chosen file waiting to be uploaded.
#[derive(Debug, Clone)]
pub struct UploadSelection {
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
    pub source: SelectionSource,
}

impl UploadSelection {
    /// Select a file on disk. Only existence is checked; type and size are
    /// left for the server to judge (see [`UploadSelection::advisories`]).
    pub async fn from_path(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            ));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());

        Ok(Self {
            mime_type: mime_type_for(&path).to_string(),
            file_name,
            size: metadata.len(),
            source: SelectionSource::Path(path),
        })
    }

    pub fn from_bytes(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        let file_name = file_name.into();
        Self {
            mime_type: mime_type_for(Path::new(&file_name)).to_string(),
            size: data.len() as u64,
            file_name,
            source: SelectionSource::Bytes(data),
        }
    }

    /// The file content, byte for byte.
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        match &self.source {
            SelectionSource::Path(path) => tokio::fs::read(path).await,
            SelectionSource::Bytes(data) => Ok(data.clone()),
        }
    }

    /// Hints about likely server-side rejection. They never block an upload.
    pub fn advisories(&self) -> Vec<String> {
        let mut hints = Vec::new();

        let extension = Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        let supported = extension
            .as_deref()
            .map(|e| SUPPORTED_EXTENSIONS.contains(&e))
            .unwrap_or(false);
        if !supported {
            hints.push("Supported formats are PDF, DOC, DOCX and TXT".to_string());
        }

        if self.size > MAX_UPLOAD_SIZE {
            hints.push(format!(
                "File is {} bytes; the server accepts at most 10MB",
                self.size
            ));
        }

        hints
    }
}

fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
