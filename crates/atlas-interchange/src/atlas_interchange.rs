//! Atlas data interchange
//!
//! Moves records in and out of the application:
//!
//! ```text
//! GridState ─► ExportView ─► CsvExporter ─► .csv (UTF-8 BOM, quoted, CRLF)
//!
//! RecordStore ─► BackupService::export ─► BackupDocument (.json)
//! file bytes ─► TabularDecoder ─► DecodedTable ─► BackupService::restore ─► RecordStore
//! ```

mod backup;
mod csv_export;
mod decoder;

pub use backup::*;
pub use csv_export::*;
pub use decoder::*;
