//! Well-formedness checks for session archives.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use thiserror::Error;
use tracing::debug;
use zip::ZipArchive;

use crate::data_io::annotation::validate_annotation_stream;
use crate::data_io::format::{ANNOTATIONS_BIN, MANIFEST, METADATA_JSON, METADATA_KEYS};
use crate::error::CodecError;

/// Why an archive is not well formed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationFailure {
    #[error("not a session archive: {0}")]
    NotAnArchive(String),
    #[error("archive is missing members: {}", missing.join(", "))]
    ArchiveStructureInvalid { missing: Vec<String> },
    #[error("metadata is unreadable: {0}")]
    MetadataUnreadable(String),
    #[error("metadata keys {keys:?} do not match the expected key set")]
    MetadataKeyMismatch { keys: Vec<String> },
    #[error("member '{member}' is unreadable: {reason}")]
    MemberUnreadable { member: String, reason: String },
    #[error("annotation stream is truncated: {0}")]
    ArchiveTruncated(#[source] CodecError),
}

/// Every failure found in one archive. Empty means well formed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub failures: Vec<ValidationFailure>,
}

impl ValidationReport {
    pub fn is_well_formed(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(f, "archive is well formed");
        }
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

/// Runs the structural, metadata and annotation checks against an opened archive.
///
/// The checks are independent; an archive is well formed only when all of
/// them pass.
pub struct ArchiveValidator<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl ArchiveValidator<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ValidationFailure> {
        let file = File::open(path.as_ref())
            .map_err(|e| ValidationFailure::NotAnArchive(e.to_string()))?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> ArchiveValidator<R> {
    pub fn new(reader: R) -> Result<Self, ValidationFailure> {
        let archive =
            ZipArchive::new(reader).map_err(|e| ValidationFailure::NotAnArchive(e.to_string()))?;
        Ok(Self { archive })
    }

    fn has_member(&self, name: &str) -> bool {
        self.archive.file_names().any(|n| n == name)
    }

    /// All manifest members are present.
    pub fn check_structure(&self) -> Result<(), ValidationFailure> {
        let missing: Vec<String> = MANIFEST
            .iter()
            .filter(|name| !self.has_member(name))
            .map(|name| name.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure::ArchiveStructureInvalid { missing })
        }
    }

    /// `metadata.json` is a JSON object with exactly the expected keys.
    pub fn check_metadata(&mut self) -> Result<(), ValidationFailure> {
        let bytes = self.read_member(METADATA_JSON)?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| ValidationFailure::MetadataUnreadable(e.to_string()))?;
        let object = value.as_object().ok_or_else(|| {
            ValidationFailure::MetadataUnreadable("top-level value is not an object".to_string())
        })?;

        let found: BTreeSet<&str> = object.keys().map(String::as_str).collect();
        let expected: BTreeSet<&str> = METADATA_KEYS.into_iter().collect();
        if found == expected {
            Ok(())
        } else {
            Err(ValidationFailure::MetadataKeyMismatch {
                keys: found.into_iter().map(str::to_string).collect(),
            })
        }
    }

    /// `annotations.bin` decodes to whole records with nothing left over.
    pub fn check_annotations(&mut self) -> Result<usize, ValidationFailure> {
        let bytes = self.read_member(ANNOTATIONS_BIN)?;
        validate_annotation_stream(&bytes).map_err(ValidationFailure::ArchiveTruncated)
    }

    /// Run every check and collect the failures.
    ///
    /// Content checks are skipped for members the structural check already
    /// reported as missing.
    pub fn report(mut self) -> ValidationReport {
        let mut report = ValidationReport::default();
        if let Err(failure) = self.check_structure() {
            report.failures.push(failure);
        }
        if self.has_member(METADATA_JSON) {
            if let Err(failure) = self.check_metadata() {
                report.failures.push(failure);
            }
        }
        if self.has_member(ANNOTATIONS_BIN) {
            match self.check_annotations() {
                Ok(records) => debug!(records, "annotation stream is complete"),
                Err(failure) => report.failures.push(failure),
            }
        }
        report
    }

    fn read_member(&mut self, name: &str) -> Result<Vec<u8>, ValidationFailure> {
        let unreadable = |reason: String| ValidationFailure::MemberUnreadable {
            member: name.to_string(),
            reason,
        };
        let mut file = self.archive.by_name(name).map_err(|e| unreadable(e.to_string()))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| unreadable(e.to_string()))?;
        Ok(bytes)
    }
}

/// Validate the archive at `path`.
pub fn validate(path: impl AsRef<Path>) -> ValidationReport {
    match ArchiveValidator::open(path) {
        Ok(validator) => validator.report(),
        Err(failure) => ValidationReport {
            failures: vec![failure],
        },
    }
}

/// Validate an archive held by any seekable reader.
pub fn validate_reader<R: Read + Seek>(reader: R) -> ValidationReport {
    match ArchiveValidator::new(reader) {
        Ok(validator) => validator.report(),
        Err(failure) => ValidationReport {
            failures: vec![failure],
        },
    }
}

pub fn is_well_formed(path: impl AsRef<Path>) -> bool {
    validate(path).is_well_formed()
}
