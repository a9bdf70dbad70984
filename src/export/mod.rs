//! Output side of a batch: the results workbook and the plain-text error log.

pub mod error_log;
pub mod sheet;
pub mod xlsx;

pub use error_log::*;
pub use sheet::*;
pub use xlsx::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not read workbook: {0}")]
    Read(#[from] calamine::Error),

    #[error("Could not write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
}
