//! # backlinkz
//!
//! Maintains "Links to this note" sections in a directory of plain-text notes that link to each
//! other with `[[...]]` wiki links.
//!
//! ## Overview
//!
//! Every note is identified by an id (by default a 14 digit timestamp such as `20201020093536`,
//! found in the file name or the note body), by its title (the first `# Heading`) and by its file
//! name. A link `[[20201020093536]]`, `[[Some random thoughts]]` or `[[Orphan]]` refers to the note
//! carrying that id, title or name. For every note, backlinkz collects the notes linking to it and
//! writes them as a generated section at the end of the file:
//!
//! ```text
//! # The meaning of life
//!
//! 42.
//!
//! -----------------
//! **Links to this note**
//!
//! - [[20201020093536]] Some random thoughts
//! ```
//!
//! Running again on an unchanged directory changes nothing. Text above the section is never
//! modified.
//!
//! ## Architecture
//!
//! - **[`codec`]**: reading and writing notes: link extraction, identity, the generated section
//!   and the [`NoteCompiler`](codec::NoteCompiler) driving a run
//! - **[`linkbase`]**: the immutable [`NoteIndex`](linkbase::NoteIndex) and the
//!   [`LinkGraph`](linkbase::LinkGraph) built from it
//! - **[`config`]**: [`BacklinkConfig`](config::BacklinkConfig) and its TOML file
//! - **[`idgen`]**: ids for new notes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use backlinkz::{
//!     codec::NoteCompiler,
//!     config::{ConfigProvider, TomlConfigProvider},
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TomlConfigProvider::in_dir("./notes").get_config()?;
//!     let report = NoteCompiler::new("./notes", config)?.run()?;
//!     for diagnostic in report.diagnostics.iter() {
//!         println!("{diagnostic}");
//!     }
//!     println!("Updated backlinks in {} files", report.updated.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - **`bin`**: builds the `backlinkz` command-line tool

pub mod codec;
pub mod config;
pub mod error;
pub mod idgen;
pub mod linkbase;
pub mod note;
#[cfg(test)]
mod tests;

pub use error::*;
