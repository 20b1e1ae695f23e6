//! JSONL question input and answer output for batch mode.

use retail_application::BatchRecord;
use retail_domain::Question;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchIoError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}:{line}: {message}")]
    InvalidLine {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

/// Read one question per non-blank line.
///
/// Lines look like `{"id": "q1", "question": "...", "format_hint": "int"}`.
/// A question without an id gets `line<N>`.
pub fn read_questions(path: &Path) -> Result<Vec<Question>, BatchIoError> {
    let io_err = |source| BatchIoError::Io {
        path: path.to_path_buf(),
        source,
    };
    let reader = BufReader::new(File::open(path).map_err(io_err)?);

    let mut questions = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }
        let invalid = |message: String| BatchIoError::InvalidLine {
            path: path.to_path_buf(),
            line: idx + 1,
            message,
        };
        let question: Question =
            serde_json::from_str(&line).map_err(|e| invalid(e.to_string()))?;
        if question.content().trim().is_empty() {
            return Err(invalid("question text is empty".to_string()));
        }
        let question = match question.id() {
            Some(_) => question,
            None => question.with_id(format!("line{}", idx + 1)),
        };
        questions.push(question);
    }
    Ok(questions)
}

/// Write one JSON object per record, in the given order.
pub fn write_records(path: &Path, records: &[BatchRecord]) -> Result<(), BatchIoError> {
    let io_err = |source| BatchIoError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    for record in records {
        serde_json::to_writer(&mut writer, record).map_err(|e| io_err(e.into()))?;
        writer.write_all(b"\n").map_err(io_err)?;
    }
    writer.flush().map_err(io_err)
}
