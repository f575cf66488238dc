//! Pure parsing, normalisation, and filename synthesis for mysoku flyers.
//!
//! Everything in this crate is side-effect free: text goes in, a parse or
//! a filename comes out. PDF extraction lives in `mysoku-extract` and the
//! file operations in `mysoku-ledger`.

pub mod analyze;
pub mod classify;
pub mod filename;
pub mod name;
pub mod normalize;
pub mod price;

pub use analyze::ParsedInfo;
pub use classify::TransactionKind;
pub use filename::{ClaimedNames, SuffixesExhausted};
pub use name::NAME_NOT_FOUND;
pub use normalize::NormalizedText;
pub use price::AMOUNT_NOT_FOUND;
