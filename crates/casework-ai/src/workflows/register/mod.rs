//! Case register import. The case-management system exports the document
//! register as CSV; this module turns an export into the documents the
//! analysis service can fetch.

mod parser;

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use super::analysis::CaseDocument;

#[derive(Debug)]
pub enum RegisterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingDocumentRef { row: usize },
}

impl std::fmt::Display for RegisterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegisterImportError::Io(err) => {
                write!(f, "failed to read register export: {}", err)
            }
            RegisterImportError::Csv(err) => write!(f, "invalid register CSV data: {}", err),
            RegisterImportError::MissingDocumentRef { row } => {
                write!(f, "register row {} has no document reference", row)
            }
        }
    }
}

impl std::error::Error for RegisterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegisterImportError::Io(err) => Some(err),
            RegisterImportError::Csv(err) => Some(err),
            RegisterImportError::MissingDocumentRef { .. } => None,
        }
    }
}

impl From<std::io::Error> for RegisterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RegisterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct CaseRegisterImporter;

impl CaseRegisterImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<CaseDocument>, RegisterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Reads an export, keeping the first row for each document reference.
    /// Re-exports routinely repeat earlier rows, so duplicates are skipped
    /// rather than rejected.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<CaseDocument>, RegisterImportError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut documents = Vec::new();

        for (index, record) in parser::parse_records(reader)?.into_iter().enumerate() {
            if record.document_ref.is_empty() {
                return Err(RegisterImportError::MissingDocumentRef { row: index + 1 });
            }
            if !seen.insert(record.document_ref.clone()) {
                continue;
            }

            documents.push(CaseDocument {
                document_ref: record.document_ref,
                title: record.title,
                recorded_on: record.recorded_on,
                body: record.body,
            });
        }

        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Cursor;

    #[test]
    fn recorded_on_supports_iso_and_uk_dates() {
        assert_eq!(
            parser::parse_recorded_on_for_tests("2026-03-12"),
            NaiveDate::from_ymd_opt(2026, 3, 12)
        );
        assert_eq!(
            parser::parse_recorded_on_for_tests("12/03/2026"),
            NaiveDate::from_ymd_opt(2026, 3, 12)
        );
        assert!(parser::parse_recorded_on_for_tests("12 March 2026").is_none());
        assert!(parser::parse_recorded_on_for_tests("  ").is_none());
    }

    #[test]
    fn importer_keeps_first_row_for_duplicate_refs() {
        let csv = "Document Ref,Title,Recorded On,Body\n\
DOC-2026-0141,Annual review record,2026-03-12,Review held.\n\
DOC-2026-0141,Stale duplicate,2026-03-13,Ignored.\n";
        let documents =
            CaseRegisterImporter::from_reader(Cursor::new(csv)).expect("import succeeds");

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].title, "Annual review record");
        assert_eq!(
            documents[0].recorded_on,
            NaiveDate::from_ymd_opt(2026, 3, 12)
        );
    }

    #[test]
    fn importer_rejects_rows_without_a_reference() {
        let csv = "Document Ref,Title,Recorded On,Body\n\
DOC-2026-0141,Annual review record,2026-03-12,Review held.\n\
  ,Orphan row,2026-03-13,No reference.\n";
        let error =
            CaseRegisterImporter::from_reader(Cursor::new(csv)).expect_err("expected failure");

        match error {
            RegisterImportError::MissingDocumentRef { row } => assert_eq!(row, 2),
            other => panic!("expected missing-ref error, got {other:?}"),
        }
    }

    #[test]
    fn importer_preserves_multiline_bodies() {
        let csv = "Document Ref,Title,Recorded On,Body\n\
DOC-2026-0141,Annual review record,2026-03-12,\"Review held on 10 March 2026.\nProgress was discussed with the family.\"\n";
        let documents =
            CaseRegisterImporter::from_reader(Cursor::new(csv)).expect("import succeeds");

        assert!(documents[0].body.contains('\n'));
        assert!(documents[0].body.contains("Progress was discussed"));
    }

    #[test]
    fn importer_from_path_propagates_io_errors() {
        let error = CaseRegisterImporter::from_path("./does-not-exist.csv")
            .expect_err("expected io error");

        match error {
            RegisterImportError::Io(_) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
