//! Reading notes and writing their backlink sections.
//!
//! - [`links`]: `[[...]]` link extraction
//! - [`identity`]: note ids and titles
//! - [`section`]: the generated "Links to this note" section, and rewriting a note around it
//! - [`diagnostic`]: non-fatal findings of a run
//! - [`compiler`]: the run itself, from directory walk to written files

pub mod compiler;
pub mod diagnostic;
pub mod identity;
pub mod links;
pub mod section;

pub use compiler::{Compilation, NoteCompiler, NoteUpdate, ReportSections, RunReport};
pub use diagnostic::{Diagnostic, Severity};
pub use identity::{IdentityResolver, NoteIdentity};
pub use links::{create_link, extract_links, LinkScanner, LinkToken};
pub use section::{render_section, rewrite, BacklinkEntry, LineEnding};
