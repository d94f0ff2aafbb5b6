// Library root
// -----------
// The binary (`main.rs`) parses arguments and hands them to `ui`; the
// other modules are usable on their own.
//
// Module responsibilities:
// - `config`: CLI arguments and the plain config structs built from them.
// - `api`: HTTP calls to the package manager servlet.
// - `parser`: classifies the HTML returned by an install command.
// - `upload` / `install`: the two steps; install takes the upload result
//   as an explicit argument.
// - `ui`: spinner, password prompt and printed summaries.
pub mod api;
pub mod config;
pub mod error;
pub mod install;
pub mod logging;
pub mod parser;
pub mod ui;
pub mod upload;

pub use error::{CrxError, Result};
