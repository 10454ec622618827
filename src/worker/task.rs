//! Task descriptions processed by worker nodes.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// The kind of processing a task asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Lexical statistics over a text payload.
    WordMetrics,
    /// Symmetric encryption of the payload with a fresh key.
    Encrypt,
    /// Cryptographic digest of the payload.
    Digest,
    /// Unrecognized request; workers skip it.
    Undefined,
}

impl TaskKind {
    /// Parse the display name back into a kind. Unknown names map to
    /// [TaskKind::Undefined] rather than failing.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Word Metrics" => Self::WordMetrics,
            "Encrypt" => Self::Encrypt,
            "Hash" => Self::Digest,
            _ => Self::Undefined,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::WordMetrics => "Word Metrics",
            Self::Encrypt => "Encrypt",
            Self::Digest => "Hash",
            Self::Undefined => "Undefined",
        };
        write!(f, "{name}")
    }
}

/// One unit of work: a file known to the ring plus the transform to apply.
///
/// The payload to process is expected under [Task::request_key] and the
/// produced record is stored under [Task::result_key], so submitters and
/// result readers never coordinate beyond the file name and kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    file_name: String,
    kind: TaskKind,
}

impl Task {
    /// Describe a task over `file_name`.
    pub fn new(file_name: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            file_name: file_name.into(),
            kind,
        }
    }

    /// The file this task processes.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The transform to apply.
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Ring key the unprocessed payload is stored under.
    pub fn request_key(&self) -> String {
        format!("{}Request{}", self.file_name, self.kind)
    }

    /// Ring key the processed record is stored under.
    pub fn result_key(&self) -> String {
        format!("{}Results{}", self.file_name, self.kind)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.file_name, self.kind)
    }
}
