//! End-to-end runs of the compiler over small corpora.

use crate::{
    codec::{compiler::NoteCompiler, diagnostic::Diagnostic},
    config::BacklinkConfig,
    tests::helpers::write_corpus,
};
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use test_log::test;

const THOUGHTS: &str = "20201020093536 Some random thoughts.md";
const MEANING: &str = "20201020113715 The meaning of life.md";
const ORPHAN: &str = "Orphan.md";

fn read(root: &Path, name: &str) -> String {
    std::fs::read_to_string(root.join(name)).unwrap()
}

fn run(root: &Path, config: BacklinkConfig) -> crate::codec::compiler::RunReport {
    NoteCompiler::new(root, config).unwrap().run().unwrap()
}

fn example_corpus(root: &Path) {
    write_corpus(
        root,
        &[
            (
                THOUGHTS,
                "# Some random thoughts\n\nSee [[20201020113715]].\n",
            ),
            (MEANING, "# The meaning of life\n\n42.\n"),
            (ORPHAN, "Points at [[Some random thoughts]].\n"),
        ],
    );
}

#[test]
fn test_example_corpus() {
    let dir = tempdir().unwrap();
    example_corpus(dir.path());

    let report = run(dir.path(), BacklinkConfig::default());
    assert_eq!(report.notes_found, 3);
    assert_eq!(
        report.updated,
        vec![PathBuf::from(THOUGHTS), PathBuf::from(MEANING)]
    );
    assert_eq!(report.notes_without_id, vec![PathBuf::from(ORPHAN)]);
    assert_eq!(report.orphans, vec!["[[Orphan]]".to_string()]);
    assert!(report.broken_links.is_empty());

    assert_eq!(
        read(dir.path(), THOUGHTS),
        "# Some random thoughts\n\nSee [[20201020113715]].\n\n\
         -----------------\n**Links to this note**\n\n- [[Orphan]] Orphan\n"
    );
    assert_eq!(
        read(dir.path(), MEANING),
        "# The meaning of life\n\n42.\n\n\
         -----------------\n**Links to this note**\n\n\
         - [[20201020093536]] Some random thoughts\n"
    );
    assert_eq!(read(dir.path(), ORPHAN), "Points at [[Some random thoughts]].\n");
}

#[test]
fn test_second_run_changes_nothing() {
    let dir = tempdir().unwrap();
    example_corpus(dir.path());
    run(dir.path(), BacklinkConfig::default());
    let first: Vec<String> = [THOUGHTS, MEANING, ORPHAN]
        .iter()
        .map(|n| read(dir.path(), n))
        .collect();

    let report = run(dir.path(), BacklinkConfig::default());
    assert!(report.updated.is_empty());
    let second: Vec<String> = [THOUGHTS, MEANING, ORPHAN]
        .iter()
        .map(|n| read(dir.path(), n))
        .collect();
    assert_eq!(first, second);

    // Overwriting regenerates the same bytes, so nothing is written either.
    let config = BacklinkConfig {
        overwrite: true,
        ..Default::default()
    };
    assert!(run(dir.path(), config).updated.is_empty());
}

#[test]
fn test_stale_entries_are_replaced_not_merged() {
    let dir = tempdir().unwrap();
    write_corpus(
        dir.path(),
        &[
            (
                MEANING,
                "# The meaning of life\n\n42.\n\n-----------------\n**Links to this note**\n\n\
                 - [[20190101000000]] Deleted note\n",
            ),
            (THOUGHTS, "# Some random thoughts\n\n[[The meaning of life]]\n"),
        ],
    );
    run(dir.path(), BacklinkConfig::default());
    assert_eq!(
        read(dir.path(), MEANING),
        "# The meaning of life\n\n42.\n\n-----------------\n**Links to this note**\n\n\
         - [[20201020093536]] Some random thoughts\n"
    );
}

#[test]
fn test_section_removed_when_no_backlinks_remain() {
    let dir = tempdir().unwrap();
    write_corpus(
        dir.path(),
        &[(
            ORPHAN,
            "Points at [[Nowhere]].\n\n-----------------\n**Links to this note**\n\n- [[Gone]]\n",
        )],
    );
    let report = run(dir.path(), BacklinkConfig::default());
    assert_eq!(report.updated, vec![PathBuf::from(ORPHAN)]);
    assert_eq!(read(dir.path(), ORPHAN), "Points at [[Nowhere]].\n");
    assert_eq!(report.broken_links.len(), 1);
    assert_eq!(report.broken_links[0].token, "Nowhere");
}

#[test]
fn test_user_content_is_kept_byte_for_byte() {
    let dir = tempdir().unwrap();
    let meaning = "# The meaning of life\r\n\r\n42.  \r\n  indented [[not a link\r\n```\r\n\
                   [[x]]\r\n```";
    write_corpus(
        dir.path(),
        &[
            (MEANING, meaning),
            (THOUGHTS, "# Some random thoughts\n\n[[20201020113715]]\n"),
        ],
    );
    run(dir.path(), BacklinkConfig::default());
    let updated = read(dir.path(), MEANING);
    assert!(updated.starts_with(meaning));
    assert!(updated.ends_with(
        "\r\n\r\n-----------------\r\n**Links to this note**\r\n\r\n\
         - [[20201020093536]] Some random thoughts\r\n"
    ));
    assert!(run(dir.path(), BacklinkConfig::default()).updated.is_empty());
}

#[test]
fn test_id_link_beats_title_of_other_note() {
    let dir = tempdir().unwrap();
    write_corpus(
        dir.path(),
        &[
            (THOUGHTS, "# Some random thoughts\n"),
            ("20201020000000 Other.md", "# 20201020093536\n"),
            ("Reader.md", "[[20201020093536]]\n"),
        ],
    );
    let report = run(dir.path(), BacklinkConfig::default());
    assert_eq!(report.updated, vec![PathBuf::from(THOUGHTS)]);
    assert!(read(dir.path(), THOUGHTS).ends_with("- [[Reader]] Reader\n"));
}

#[test]
fn test_self_links() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path(), &[("Loop.md", "# Loop\n\nSee [[Loop]].\n")]);
    let report = run(dir.path(), BacklinkConfig::default());
    assert!(report.updated.is_empty());

    let config = BacklinkConfig {
        include_self_links: true,
        ..Default::default()
    };
    let report = run(dir.path(), config);
    assert_eq!(report.updated, vec![PathBuf::from("Loop.md")]);
    assert!(read(dir.path(), "Loop.md").ends_with("**Links to this note**\n\n- [[Loop]] Loop\n"));
}

#[test]
fn test_legacy_section_kept_unless_overwriting() {
    let dir = tempdir().unwrap();
    let legacy = "# The meaning of life\n\n42.\n\n---\n\n\
                  **Backlinks** <!-- generated on 2020-10-20 09:35 -->\n\
                  * [[20201020093536]] Some random thoughts\n";
    write_corpus(
        dir.path(),
        &[
            (MEANING, legacy),
            (THOUGHTS, "# Some random thoughts\n\n[[20201020113715]]\n"),
        ],
    );
    assert!(run(dir.path(), BacklinkConfig::default()).updated.is_empty());
    assert_eq!(read(dir.path(), MEANING), legacy);

    let config = BacklinkConfig {
        overwrite: true,
        ..Default::default()
    };
    assert_eq!(run(dir.path(), config).updated, vec![PathBuf::from(MEANING)]);
    assert_eq!(
        read(dir.path(), MEANING),
        "# The meaning of life\n\n42.\n\n-----------------\n**Links to this note**\n\n\
         - [[20201020093536]] Some random thoughts\n"
    );
}

#[test]
fn test_user_thematic_break_is_not_a_section() {
    let dir = tempdir().unwrap();
    let wiki = "# Wiki notes\n\nIntro.\n\n---\n\n\
                **Backlinks** are why I use a wiki. Keep this paragraph.\n\n\
                Important closing thoughts.\n";
    write_corpus(
        dir.path(),
        &[("Wiki.md", wiki), ("Other.md", "# Other\n\nUnrelated.\n")],
    );
    for overwrite in [false, true] {
        let config = BacklinkConfig {
            overwrite,
            ..Default::default()
        };
        assert!(run(dir.path(), config).updated.is_empty());
        assert_eq!(read(dir.path(), "Wiki.md"), wiki);
    }
}

#[test]
fn test_links_below_user_rule_are_indexed() {
    let dir = tempdir().unwrap();
    write_corpus(
        dir.path(),
        &[
            (
                "Wiki.md",
                "# Wiki notes\n\n---\n\n**Backlinks** explained in [[Other]].\n",
            ),
            ("Other.md", "# Other\n"),
        ],
    );
    let report = run(dir.path(), BacklinkConfig::default());
    assert_eq!(report.updated, vec![PathBuf::from("Other.md")]);
    assert!(read(dir.path(), "Other.md").ends_with("- [[Wiki]] Wiki notes\n"));
}

#[test]
fn test_case_insensitive_names() {
    let dir = tempdir().unwrap();
    write_corpus(
        dir.path(),
        &[("Rust.md", "# Rust\n"), ("Reader.md", "[[rust]]\n")],
    );
    let report = run(dir.path(), BacklinkConfig::default());
    assert!(report.updated.is_empty());
    assert_eq!(report.broken_links.len(), 1);

    let config = BacklinkConfig {
        case_sensitive: false,
        ..Default::default()
    };
    let report = run(dir.path(), config);
    assert_eq!(report.updated, vec![PathBuf::from("Rust.md")]);
    assert!(!report
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::UnresolvedLink { .. })));
}
