//! Submission requests and their local validation.

use std::collections::BTreeMap;

use crate::error::{PipelineError, Result};
use crate::files::FileHandle;
use crate::pages::validate_pages;
use crate::tools::{ParamFormat, ToolId};

/// Checks the running total of `files` against `ceiling`.
///
/// Returns the cumulative size on success. The check is all-or-nothing: the
/// first file that pushes the total over the ceiling rejects the whole set.
pub fn check_cumulative_size<'a>(
    files: impl IntoIterator<Item = &'a FileHandle>,
    ceiling: u64,
) -> Result<u64> {
    let mut total: u64 = 0;
    for file in files {
        total = total.saturating_add(file.byte_size());
        if total > ceiling {
            return Err(PipelineError::SizeExceeded { total, ceiling });
        }
    }
    Ok(total)
}

/// A fully validated submission for one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    tool: ToolId,
    files: Vec<FileHandle>,
    parameters: BTreeMap<&'static str, String>,
    total_bytes: u64,
}

impl TransferRequest {
    /// Validates a selection and raw parameter input for `tool`.
    ///
    /// Parameters the tool does not declare are dropped; declared ones are
    /// checked against their format. Single-file tools reject a selection
    /// of more than one file.
    pub fn build(
        tool: ToolId,
        selection: &[FileHandle],
        raw_params: &BTreeMap<String, String>,
    ) -> Result<Self> {
        if selection.is_empty() {
            return Err(PipelineError::NoFile);
        }
        if !tool.accepts_multiple() && selection.len() > 1 {
            return Err(PipelineError::SingleFileOnly {
                selected: selection.len(),
            });
        }
        check_cumulative_size(selection, tool.size_ceiling())?;
        let files = selection.to_vec();

        let mut parameters = BTreeMap::new();
        for spec in tool.parameters() {
            let raw = raw_params.get(spec.name).map(String::as_str).unwrap_or_default();
            let value = raw.trim();

            if value.is_empty() {
                if spec.required {
                    return Err(PipelineError::MissingParameter { name: spec.name });
                }
                if spec.format != ParamFormat::PageList {
                    continue;
                }
            }

            let value = match spec.format {
                ParamFormat::Text => raw.to_string(),
                ParamFormat::Integer => value
                    .parse::<i32>()
                    .map_err(|_| PipelineError::InvalidParameter {
                        name: spec.name,
                        value: value.to_string(),
                    })?
                    .to_string(),
                ParamFormat::PageList => validate_pages(value)?.to_string(),
            };
            parameters.insert(spec.name, value);
        }

        let total_bytes = files.iter().map(FileHandle::byte_size).sum();
        Ok(Self {
            tool,
            files,
            parameters,
            total_bytes,
        })
    }

    pub fn tool(&self) -> ToolId {
        self.tool
    }

    /// Files in upload order.
    pub fn files(&self) -> &[FileHandle] {
        &self.files
    }

    /// Extra form fields, keyed by wire name.
    pub fn parameters(&self) -> &BTreeMap<&'static str, String> {
        &self.parameters
    }

    /// Multipart field name carrying the files.
    pub fn file_field(&self) -> &'static str {
        self.tool.file_field()
    }

    /// Sum of the sizes of the files being sent.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Name of the first input file, used to derive the download name.
    pub fn first_file_name(&self) -> &str {
        self.files.first().map(FileHandle::name).unwrap_or_default()
    }
}
