//! `ps-script` — per-process instruction scripts.
//!
//! # Crate layout
//!
//! | Module       | Contents                                          |
//! |--------------|---------------------------------------------------|
//! | [`script`]   | `Op`, `ActorScript`, `Script`                     |
//! | [`parser`]   | `parse_script`, `load_script_path`, `parse_line`  |
//! | [`error`]    | `ScriptError`, `ScriptResult<T>`                  |

pub mod error;
pub mod parser;
pub mod script;

#[cfg(test)]
mod tests;

pub use error::{ScriptError, ScriptResult};
pub use parser::{load_script_path, parse_line, parse_script};
pub use script::{ActorScript, Op, Script};
