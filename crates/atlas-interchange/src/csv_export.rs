//! CSV export of a grid view

use std::io::Write;
use std::path::{Path, PathBuf};

use atlas_core::{Value, ValueExt};
use atlas_grid::ExportView;
use thiserror::Error;

/// Byte order mark written ahead of the header so spreadsheet apps detect UTF-8
pub const UTF8_BOM: &str = "\u{feff}";

/// Errors during CSV export
#[derive(Debug, Error)]
pub enum CsvExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("No visible columns to export")]
    NoColumns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordDelimiter {
    #[default]
    CrLf,
    Lf,
}

impl RecordDelimiter {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordDelimiter::CrLf => "\r\n",
            RecordDelimiter::Lf => "\n",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    pub include_bom: bool,
    pub include_headers: bool,
    pub field_delimiter: char,
    pub record_delimiter: RecordDelimiter,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            include_bom: true,
            include_headers: true,
            field_delimiter: ',',
            record_delimiter: RecordDelimiter::CrLf,
        }
    }
}

/// Writes an [`ExportView`] as CSV. Every field is double-quoted.
#[derive(Debug, Clone, Default)]
pub struct CsvExporter {
    options: CsvOptions,
}

impl CsvExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CsvOptions) -> Self {
        Self { options }
    }

    /// Write `view` to `writer`, returning the number of data rows written
    pub fn write<W: Write>(&self, view: &ExportView, mut writer: W) -> Result<usize, CsvExportError> {
        if view.columns.is_empty() {
            return Err(CsvExportError::NoColumns);
        }

        let field_delim = self.options.field_delimiter.to_string();
        let record_delim = self.options.record_delimiter.as_str();

        if self.options.include_bom {
            writer.write_all(UTF8_BOM.as_bytes())?;
        }

        if self.options.include_headers {
            let header_line = view
                .headers()
                .into_iter()
                .map(qualify_value)
                .collect::<Vec<_>>()
                .join(&field_delim);
            writer.write_all(header_line.as_bytes())?;
            writer.write_all(record_delim.as_bytes())?;
        }

        for row in &view.rows {
            let row_line = row
                .iter()
                .map(|value| qualify_value(&field_text(value.as_ref())))
                .collect::<Vec<_>>()
                .join(&field_delim);
            writer.write_all(row_line.as_bytes())?;
            writer.write_all(record_delim.as_bytes())?;
        }

        writer.flush()?;
        tracing::debug!(rows = view.rows.len(), columns = view.columns.len(), "csv written");
        Ok(view.rows.len())
    }

    pub fn to_string(&self, view: &ExportView) -> Result<String, CsvExportError> {
        let mut buffer = Vec::new();
        self.write(view, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Write to a file, creating parent directories as needed
    pub fn export_to_path(&self, view: &ExportView, path: &Path) -> Result<PathBuf, CsvExportError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        let rows = self.write(view, std::io::BufWriter::new(file))?;
        tracing::info!("Exported {} rows to {}", rows, path.display());
        Ok(path.to_path_buf())
    }
}

fn field_text(value: Option<&Value>) -> String {
    value.map(ValueExt::display_string).unwrap_or_default()
}

/// Quote a field, doubling embedded quotes
pub fn qualify_value(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
