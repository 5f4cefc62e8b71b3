//! Integration tests for compositions made from a template set

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use template_fragments::{FailMode, FragmentFactory, InMemorySource, TagBoundaries, TemplateSet};

fn shared_set(files: &[(&str, &str)]) -> (TempDir, Arc<TemplateSet>) {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    let set = Arc::new(TemplateSet::new(dir.path()));
    (dir, set)
}

#[test]
fn test_make_from_holds_fragment() {
    let (_dir, set) = shared_set(&[("page.html", "top{#row}<tr/>{#}")]);

    let composition = set.make_from("page#row");
    assert_eq!(composition.text(), "<tr/>");

    let mut blank = set.make_blank();
    assert_eq!(blank.text(), "");
    blank.append("x");
    assert_eq!(blank.text(), "x");
}

#[test]
fn test_make_from_with_extension() {
    let (_dir, set) = shared_set(&[("feed.xml", "<rss/>")]);
    assert_eq!(set.make_from_with_extension("feed", "xml").text(), "<rss/>");
}

#[test]
fn test_missing_fragment_composition() {
    let (_dir, set) = shared_set(&[]);
    assert!(set.make_from("ghost").text().starts_with("[html template 'ghost' not found]"));

    set.set_fail_mode(FailMode::Silent);
    assert_eq!(set.make_from("ghost").text(), "");
}

#[test]
fn test_sources_routed_by_protocol() {
    let (_dir, set) = shared_set(&[("page.html", "from disk")]);
    set.add_protocol(Arc::new(
        InMemorySource::new("snippet").with_entry("page", "from memory"),
    ));

    let composition = set.make_blank();
    assert_eq!(composition.protocols(), vec!["include", "snippet"]);
    assert_eq!(
        composition.fetch_from("include", "page"),
        Some("from disk".to_string())
    );
    assert_eq!(
        composition.fetch_from("snippet", "page"),
        Some("from memory".to_string())
    );
    assert_eq!(composition.fetch_from("ftp", "page"), None);
}

#[test]
fn test_compositions_keep_their_tag_snapshot() {
    let (_dir, set) = shared_set(&[]);
    let before = set.make_blank();

    set.set_tag_boundaries(TagBoundaries::new("<%", "%>"));
    let after = set.make_blank();

    assert_eq!(before.make_tag("name"), "{~name}");
    assert_eq!(after.make_tag("name"), "<%name%>");
    assert_eq!(after.tag_boundaries(), &TagBoundaries::new("<%", "%>"));
}

#[test]
fn test_protocols_registered_later_reach_new_compositions_only() {
    let (_dir, set) = shared_set(&[]);
    let before = set.make_blank();
    set.add_protocol(Arc::new(InMemorySource::new("snippet")));

    assert_eq!(before.protocols(), vec!["include"]);
    assert_eq!(set.make_blank().protocols(), vec!["include", "snippet"]);
}
