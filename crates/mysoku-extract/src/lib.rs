//! External-collaborator adapters: embedded PDF text (lopdf) and the
//! tesseract OCR fallback invoked when the embedded layer is too thin.

mod error;
pub use error::ExtractError;

pub mod ocr;
pub mod pdf;

pub use ocr::OcrOutcome;
pub use pdf::{PdfText, OCR_THRESHOLD};
