#![allow(dead_code)]

//! Resume file intake: type/size validation and the bounded upload batch.
//!
//! A `FileRef` can only be constructed from a name/size pair that passes the
//! input contract, so an invalid file never reaches a batch or the network
//! layer. Batch capacity applies across the whole history of add operations:
//! overflowing files are rejected individually, the accepted set is kept.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub const MAX_FILE_BYTES: u64 = 15 * 1024 * 1024;
pub const MAX_BATCH_FILES: usize = 10;

/// Accepted resume document types, matched by extension (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Doc,
    Docx,
    Txt,
}

impl FileKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".pdf") {
            Some(FileKind::Pdf)
        } else if lower.ends_with(".docx") {
            Some(FileKind::Docx)
        } else if lower.ends_with(".doc") {
            Some(FileKind::Doc)
        } else if lower.ends_with(".txt") {
            Some(FileKind::Txt)
        } else {
            None
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            FileKind::Pdf => "application/pdf",
            FileKind::Doc => "application/msword",
            FileKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            FileKind::Txt => "text/plain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("unsupported file type (accepted: pdf, doc, docx, txt)")]
    UnsupportedType,
    #[error("file is {size_bytes} bytes, above the 15 MiB limit")]
    TooLarge { size_bytes: u64 },
    #[error("batch is full ({MAX_BATCH_FILES} files)")]
    CapacityExceeded,
    #[error("file could not be read: {detail}")]
    Unreadable { detail: String },
}

/// One file's itemized rejection, surfaced inline to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}: {reason}")]
pub struct FileRejection {
    pub name: String,
    pub reason: RejectReason,
}

/// A validated reference to a resume document on disk.
#[derive(Debug, Clone)]
pub struct FileRef {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
    pub kind: FileKind,
}

impl FileRef {
    /// Validates name and size against the input contract.
    pub fn new(path: PathBuf, name: String, size_bytes: u64) -> Result<Self, FileRejection> {
        let kind = FileKind::from_name(&name).ok_or_else(|| FileRejection {
            name: name.clone(),
            reason: RejectReason::UnsupportedType,
        })?;
        if size_bytes > MAX_FILE_BYTES {
            return Err(FileRejection {
                name,
                reason: RejectReason::TooLarge { size_bytes },
            });
        }
        Ok(Self {
            path,
            name,
            size_bytes,
            kind,
        })
    }

    /// Inspects a file on disk and validates it.
    pub fn from_path(path: &Path) -> Result<Self, FileRejection> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let metadata = std::fs::metadata(path).map_err(|e| FileRejection {
            name: name.clone(),
            reason: RejectReason::Unreadable {
                detail: e.to_string(),
            },
        })?;
        Self::new(path.to_path_buf(), name, metadata.len())
    }
}

/// Outcome of admitting a list of candidate files.
#[derive(Debug, Default)]
pub struct AddReport {
    pub accepted: usize,
    pub rejections: Vec<FileRejection>,
}

/// Ordered set of accepted resumes, at most `MAX_BATCH_FILES` across all add
/// operations ever performed on the batch.
#[derive(Debug, Default)]
pub struct UploadBatch {
    accepted: Vec<FileRef>,
}

impl UploadBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    pub fn files(&self) -> &[FileRef] {
        &self.accepted
    }

    pub fn add(&mut self, file: FileRef) -> Result<(), FileRejection> {
        if self.accepted.len() >= MAX_BATCH_FILES {
            return Err(FileRejection {
                name: file.name,
                reason: RejectReason::CapacityExceeded,
            });
        }
        self.accepted.push(file);
        Ok(())
    }

    /// Admits each candidate in order, collecting itemized rejections while
    /// keeping every accepted file.
    pub fn add_all<I>(&mut self, candidates: I) -> AddReport
    where
        I: IntoIterator<Item = Result<FileRef, FileRejection>>,
    {
        let mut report = AddReport::default();
        for candidate in candidates {
            match candidate {
                Ok(file) => match self.add(file) {
                    Ok(()) => report.accepted += 1,
                    Err(rejection) => report.rejections.push(rejection),
                },
                Err(rejection) => report.rejections.push(rejection),
            }
        }
        report
    }

    pub fn clear(&mut self) {
        self.accepted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_file(name: &str) -> FileRef {
        FileRef::new(PathBuf::from(name), name.to_string(), 2 * 1024 * 1024).unwrap()
    }

    #[test]
    fn test_kind_from_extension_case_insensitive() {
        assert_eq!(FileKind::from_name("resume.PDF"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_name("cv.docx"), Some(FileKind::Docx));
        assert_eq!(FileKind::from_name("cv.doc"), Some(FileKind::Doc));
        assert_eq!(FileKind::from_name("notes.txt"), Some(FileKind::Txt));
        assert_eq!(FileKind::from_name("archive.zip"), None);
        assert_eq!(FileKind::from_name("no_extension"), None);
    }

    #[test]
    fn test_docx_not_mistaken_for_doc() {
        assert_eq!(FileKind::from_name("cv.docx"), Some(FileKind::Docx));
    }

    #[test]
    fn test_oversized_file_rejected() {
        let err = FileRef::new(
            PathBuf::from("big.pdf"),
            "big.pdf".to_string(),
            MAX_FILE_BYTES + 1,
        )
        .unwrap_err();
        assert!(matches!(err.reason, RejectReason::TooLarge { .. }));
    }

    #[test]
    fn test_limit_is_exactly_15_mib() {
        assert_eq!(MAX_FILE_BYTES, 15_728_640);
        assert!(FileRef::new(
            PathBuf::from("edge.pdf"),
            "edge.pdf".to_string(),
            MAX_FILE_BYTES
        )
        .is_ok());
    }

    #[test]
    fn test_unsupported_type_rejected_before_size() {
        let err = FileRef::new(
            PathBuf::from("huge.exe"),
            "huge.exe".to_string(),
            MAX_FILE_BYTES + 1,
        )
        .unwrap_err();
        assert_eq!(err.reason, RejectReason::UnsupportedType);
    }

    #[test]
    fn test_batch_truncates_at_capacity() {
        let mut batch = UploadBatch::new();
        let candidates = (0..11).map(|i| Ok(valid_file(&format!("resume-{i}.pdf"))));
        let report = batch.add_all(candidates);
        assert_eq!(batch.len(), 10);
        assert_eq!(report.accepted, 10);
        assert_eq!(report.rejections.len(), 1);
        assert_eq!(report.rejections[0].reason, RejectReason::CapacityExceeded);
    }

    #[test]
    fn test_capacity_applies_across_add_history() {
        let mut batch = UploadBatch::new();
        batch.add_all((0..6).map(|i| Ok(valid_file(&format!("a-{i}.pdf")))));
        let report = batch.add_all((0..6).map(|i| Ok(valid_file(&format!("b-{i}.pdf")))));
        assert_eq!(batch.len(), 10);
        assert_eq!(report.accepted, 4);
        assert_eq!(report.rejections.len(), 2);
    }

    #[test]
    fn test_rejection_does_not_mutate_accepted_subset() {
        let mut batch = UploadBatch::new();
        batch.add(valid_file("keep.pdf")).unwrap();
        let report = batch.add_all(vec![
            Err(FileRejection {
                name: "bad.exe".to_string(),
                reason: RejectReason::UnsupportedType,
            }),
            Ok(valid_file("also-keep.docx")),
        ]);
        assert_eq!(batch.len(), 2);
        assert_eq!(report.rejections.len(), 1);
        assert_eq!(batch.files()[0].name, "keep.pdf");
        assert_eq!(batch.files()[1].name, "also-keep.docx");
    }

    #[test]
    fn test_from_path_reads_real_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        std::fs::write(&path, b"plain text resume").unwrap();
        let file = FileRef::from_path(&path).unwrap();
        assert_eq!(file.kind, FileKind::Txt);
        assert_eq!(file.size_bytes, 17);
    }

    #[test]
    fn test_from_path_missing_file_is_itemized() {
        let err = FileRef::from_path(Path::new("/nonexistent/resume.pdf")).unwrap_err();
        assert!(matches!(err.reason, RejectReason::Unreadable { .. }));
        assert_eq!(err.name, "resume.pdf");
    }
}
