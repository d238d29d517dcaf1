use crate::{
    codec::{diagnostic::Diagnostic, identity::IdentityResolver, section::rewrite},
    config::{get_content, set_content, BacklinkConfig},
    error::BacklinkError,
    linkbase::{broken_links, BrokenLink, LinkGraph, NoteIndex, NoteKey},
    note::Note,
};
use serde::{Deserialize, Serialize};
use std::{
    fmt::Write,
    path::{Path, PathBuf},
};
use walkdir::{DirEntry, WalkDir};

/// Drives one backlink run over a directory of notes.
///
/// A run has two phases. The first reads every note, builds the [`NoteIndex`] and the
/// [`LinkGraph`], and computes the new text of each note; nothing is written yet. The second
/// writes the notes whose text changed, each through a temporary file renamed over the original.
///
/// Problems with single files never abort the run: a note that cannot be read is left out of the
/// index, and a note that cannot be written keeps its old text. Both are reported as
/// [`Diagnostic::FileError`]. Only an unusable root directory or configuration is fatal.
///
/// ```no_run
/// use backlinkz::{codec::compiler::NoteCompiler, config::BacklinkConfig};
///
/// let report = NoteCompiler::new("notes", BacklinkConfig::default())?.run()?;
/// println!("Updated backlinks in {} files", report.updated.len());
/// # Ok::<(), backlinkz::BacklinkError>(())
/// ```
#[derive(Debug, Clone)]
pub struct NoteCompiler {
    root: PathBuf,
    config: BacklinkConfig,
    resolver: IdentityResolver,
    dry_run: bool,
}

/// A note whose text must change, with its new text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteUpdate {
    pub key: NoteKey,
    /// Path relative to the notes root.
    pub path: PathBuf,
    pub content: String,
}

/// Everything computed by the first phase of a run.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub index: NoteIndex,
    pub graph: LinkGraph,
    pub updates: Vec<NoteUpdate>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Outcome of a run, printed as the run report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub root: PathBuf,
    pub dry_run: bool,
    pub notes_found: usize,
    /// Notes rewritten, or that would be rewritten in a dry run.
    pub updated: Vec<PathBuf>,
    pub notes_without_id: Vec<PathBuf>,
    pub broken_links: Vec<BrokenLink>,
    /// Links to notes that no other note links to.
    pub orphans: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Optional sections of [`RunReport::to_markdown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSections {
    pub missing: bool,
    pub broken: bool,
    pub orphans: bool,
}

impl RunReport {
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_warning())
    }

    /// Renders the report as Markdown. `time` is printed as the run time.
    pub fn to_markdown(
        &self,
        sections: ReportSections,
        time: &str,
    ) -> Result<String, BacklinkError> {
        let mut out = String::new();
        writeln!(out, "# Backlinkz Report\n")?;
        writeln!(out, "Path:        {}", self.root.display())?;
        writeln!(out, "Time:        {time}")?;
        writeln!(out, "Notes found: {}", self.notes_found)?;
        if self.dry_run {
            writeln!(out, "\nWould update backlinks in {} files", self.updated.len())?;
        } else {
            writeln!(out, "\nUpdated backlinks in {} files", self.updated.len())?;
        }

        if sections.missing && !self.notes_without_id.is_empty() {
            writeln!(out, "\n## Notes Without ID\n")?;
            for path in self.notes_without_id.iter() {
                writeln!(out, "- {}", path.display())?;
            }
        }
        if sections.broken && !self.broken_links.is_empty() {
            writeln!(out, "\n## Broken Links\n")?;
            for link in self.broken_links.iter() {
                writeln!(out, "- [[{}]] in {}", link.token, link.source.display())?;
            }
        }
        if sections.orphans && !self.orphans.is_empty() {
            writeln!(out, "\n## Orphans\n")?;
            for orphan in self.orphans.iter() {
                writeln!(out, "- {orphan}")?;
            }
        }

        let warnings: Vec<&Diagnostic> = self.warnings().collect();
        if !warnings.is_empty() {
            writeln!(out, "\n## Warnings\n")?;
            for warning in warnings {
                writeln!(out, "- {warning}")?;
            }
        }
        Ok(out)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

impl NoteCompiler {
    /// Prepares a run over `root`. Fails when `root` is not a readable directory or `config` is
    /// invalid.
    pub fn new<P: AsRef<Path>>(root: P, config: BacklinkConfig) -> Result<Self, BacklinkError> {
        let root = root.as_ref().canonicalize().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BacklinkError::NotFound(format!(
                "No such directory: '{}'",
                root.as_ref().display()
            )),
            _ => BacklinkError::from(e),
        })?;
        if !root.is_dir() {
            return Err(BacklinkError::NotFound(format!("Not a directory: '{}'", root.display())));
        }
        config.validate()?;
        let resolver = IdentityResolver::from_config(&config)?;
        Ok(NoteCompiler {
            root,
            config,
            resolver,
            dry_run: false,
        })
    }

    /// Computes everything but writes nothing.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &BacklinkConfig {
        &self.config
    }

    /// Note files under the root, relative to it, in sorted order.
    pub fn discover(&self) -> Result<(Vec<PathBuf>, Vec<Diagnostic>), BacklinkError> {
        let extension = self.config.extension();
        let include_hidden = self.config.include_hidden;
        let mut diagnostics = Vec::new();
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| include_hidden || e.depth() == 0 || !is_hidden(e));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    tracing::warn!("[NoteCompiler] Cannot access {:?}: {}", path, e);
                    diagnostics.push(Diagnostic::file_error(self.relative(&path), e));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let matches_extension = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == extension);
            if matches_extension {
                files.push(self.relative(entry.path()));
            }
        }
        files.sort();
        tracing::debug!(
            "[NoteCompiler] Found {} .{} files under {:?}",
            files.len(),
            extension,
            self.root
        );
        Ok((files, diagnostics))
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }

    /// Reads and parses every note, skipping files that cannot be read as UTF-8 text.
    pub fn load(&self) -> Result<(NoteIndex, Vec<Diagnostic>), BacklinkError> {
        let (files, mut diagnostics) = self.discover()?;
        let mut notes = Vec::with_capacity(files.len());
        for path in files {
            match get_content(self.root.join(&path)) {
                Ok(content) => {
                    let note = Note::parse(path, content, &self.resolver);
                    tracing::debug!(
                        "[NoteCompiler] Parsed {:?}: id {:?}, title {:?}, {} links",
                        note.path,
                        note.id(),
                        note.title(),
                        note.links.len()
                    );
                    notes.push(note);
                }
                Err(e) => {
                    tracing::warn!("[NoteCompiler] Skipping {:?}: {}", path, e);
                    diagnostics.push(Diagnostic::file_error(path, e));
                }
            }
        }
        let index = NoteIndex::new(notes, self.config.case_sensitive);
        diagnostics.extend(index.diagnostics());
        Ok((index, diagnostics))
    }

    /// First phase: reads all notes and computes the updates, without writing.
    pub fn compile(&self) -> Result<Compilation, BacklinkError> {
        let (index, mut diagnostics) = self.load()?;
        let (graph, link_diagnostics) = LinkGraph::build(&index, self.config.include_self_links);
        diagnostics.extend(link_diagnostics);

        let mut updates = Vec::new();
        for (key, note) in index.notes() {
            let backlinks = graph.backlinks(&index, key);
            let entries = backlinks.entries(&index);
            if let Some(content) = rewrite(&note.content, &entries, self.config.overwrite) {
                tracing::debug!(
                    "[NoteCompiler] {:?} needs {} backlinks",
                    note.path,
                    entries.len()
                );
                updates.push(NoteUpdate {
                    key,
                    path: note.path.clone(),
                    content,
                });
            }
        }
        Ok(Compilation {
            index,
            graph,
            updates,
            diagnostics,
        })
    }

    /// Runs both phases and reports the outcome.
    pub fn run(&self) -> Result<RunReport, BacklinkError> {
        let Compilation {
            index,
            graph,
            updates,
            mut diagnostics,
        } = self.compile()?;

        let mut updated = Vec::with_capacity(updates.len());
        for update in updates {
            if self.dry_run {
                tracing::info!("[NoteCompiler] Would update {:?}", update.path);
                updated.push(update.path);
                continue;
            }
            match set_content(self.root.join(&update.path), &update.content) {
                Ok(()) => {
                    tracing::debug!("[NoteCompiler] Updated {:?}", update.path);
                    updated.push(update.path);
                }
                Err(e) => {
                    tracing::warn!("[NoteCompiler] Failed to write {:?}: {}", update.path, e);
                    diagnostics.push(Diagnostic::file_error(update.path, e));
                }
            }
        }

        for diagnostic in diagnostics.iter() {
            diagnostic.log();
        }

        let notes_without_id = index
            .notes()
            .filter(|(_, note)| note.id().is_none())
            .map(|(_, note)| note.path.clone())
            .collect();
        let orphans = graph
            .orphans()
            .into_iter()
            .filter_map(|key| index.get(key))
            .map(|note| crate::codec::links::create_link(note.reference()))
            .collect();

        let report = RunReport {
            root: self.root.clone(),
            dry_run: self.dry_run,
            notes_found: index.len(),
            updated,
            notes_without_id,
            broken_links: broken_links(&diagnostics),
            orphans,
            diagnostics,
        };
        tracing::info!(
            "[NoteCompiler] {} notes, {} updated, {} warnings",
            report.notes_found,
            report.updated.len(),
            report.warnings().count()
        );
        Ok(report)
    }
}
