use std::fs;

use folio::{ContentStore, Page, VersionLedger, Wiki, WikiError};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    wiki: Wiki,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().expect("create temp dir");
    let store = ContentStore::new(dir.path().join("content"));
    let ledger = VersionLedger::open(dir.path().join("test.db")).expect("open ledger");
    Fixture {
        wiki: Wiki::new(store, ledger),
        _dir: dir,
    }
}

fn create_page(wiki: &Wiki, url: &str, body: &str, author: &str) -> Page {
    let mut page = wiki.get_bare(url).expect("page should not exist yet");
    page.set_title("Testing");
    page.set_tags("testing");
    page.set_body(body);
    page.save(wiki.ledger(), author, false, true)
        .expect("save page");
    page
}

fn edit_page(wiki: &Wiki, url: &str, body: &str, author: &str) -> Page {
    let mut page = wiki.get(url).expect("load page").expect("page exists");
    page.set_body(body);
    page.save(wiki.ledger(), author, true, true).expect("save edit");
    page
}

#[test]
fn versions_are_contiguous_from_one() {
    let f = fixture();
    create_page(&f.wiki, "testing", "this is content", "alice");
    edit_page(&f.wiki, "testing", "this is new content", "alice");
    edit_page(&f.wiki, "testing", "this is more content", "alice");

    let versions = f.wiki.ledger().versions("testing").unwrap();
    let numbers: Vec<i64> = versions.iter().map(|v| v.version).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[test]
fn first_version_is_always_approved() {
    let f = fixture();
    create_page(&f.wiki, "testing", "content", "alice");
    assert_eq!(f.wiki.ledger().approval("testing", 1).unwrap(), Some(true));
}

#[test]
fn owner_edits_auto_approve() {
    let f = fixture();
    create_page(&f.wiki, "testing", "content", "alice");
    edit_page(&f.wiki, "testing", "more", "alice");
    assert_eq!(f.wiki.ledger().approval("testing", 2).unwrap(), Some(true));
}

#[test]
fn foreign_edits_need_approval() {
    let f = fixture();
    create_page(&f.wiki, "testing", "content", "alice");
    edit_page(&f.wiki, "testing", "vandalism", "bob");
    assert_eq!(f.wiki.ledger().approval("testing", 2).unwrap(), Some(false));
}

#[test]
fn max_approved_version_skips_unapproved_rows() {
    let f = fixture();
    create_page(&f.wiki, "testing", "v1", "alice");
    edit_page(&f.wiki, "testing", "v2", "alice");
    edit_page(&f.wiki, "testing", "v3", "bob");

    let ledger = f.wiki.ledger();
    assert_eq!(ledger.max_version("testing").unwrap(), Some(3));
    assert_eq!(ledger.max_approved_version("testing").unwrap(), Some(2));
}

#[test]
fn pending_versions_are_ascending() {
    let f = fixture();
    create_page(&f.wiki, "testing", "v1", "alice");
    edit_page(&f.wiki, "testing", "v2", "bob");
    edit_page(&f.wiki, "testing", "v3", "carol");

    assert_eq!(f.wiki.ledger().pending_versions("testing").unwrap(), vec![2, 3]);
}

#[test]
fn author_is_the_first_versions_author() {
    let f = fixture();
    create_page(&f.wiki, "testing", "content", "alice");
    edit_page(&f.wiki, "testing", "more", "bob");
    assert_eq!(f.wiki.ledger().author_of("testing").unwrap(), "alice");
}

#[test]
fn author_of_unknown_page_is_not_found() {
    let f = fixture();
    assert!(matches!(
        f.wiki.ledger().author_of("missing"),
        Err(WikiError::NotFound(_))
    ));
}

#[test]
fn set_approval_on_missing_row_is_a_silent_no_op() {
    let f = fixture();
    create_page(&f.wiki, "testing", "content", "alice");
    f.wiki.ledger().set_approval("testing", 9, true).unwrap();
    assert_eq!(f.wiki.ledger().approval("testing", 9).unwrap(), None);
}

#[test]
fn delete_on_missing_rows_is_a_no_op() {
    let f = fixture();
    f.wiki.ledger().delete("missing").unwrap();
    f.wiki.ledger().delete_version("missing", 1).unwrap();
}

#[test]
fn content_at_returns_the_stored_revision() {
    let f = fixture();
    create_page(&f.wiki, "testing", "this is content", "alice");
    edit_page(&f.wiki, "testing", "this is new content", "alice");

    let v1 = f.wiki.ledger().content_at("testing", 1).unwrap();
    assert!(v1.contains("this is content"));
    let v2 = f.wiki.ledger().content_at("testing", 2).unwrap();
    assert!(v2.contains("this is new content"));
    assert!(matches!(
        f.wiki.ledger().content_at("testing", 3),
        Err(WikiError::NotFound(_))
    ));
}

#[test]
fn previous_versions_exclude_the_latest() {
    let f = fixture();
    let page = create_page(&f.wiki, "testing", "v1", "alice");
    edit_page(&f.wiki, "testing", "v2", "alice");
    edit_page(&f.wiki, "testing", "v3", "alice");

    let previous = page.previous_versions(f.wiki.ledger()).unwrap();
    assert_eq!(previous.len(), 2);
    assert_eq!(previous[0].url(), "testing/1");
    assert_eq!(previous[1].url(), "testing/2");
    assert!(previous[0].body().contains("v1"));
    assert!(previous[1].body().contains("v2"));
}

#[test]
fn display_edit_renders_the_requested_version() {
    let f = fixture();
    let page = create_page(&f.wiki, "testing", "# original", "alice");
    edit_page(&f.wiki, "testing", "# revised", "bob");

    let edit = page.display_edit(f.wiki.ledger(), 2).unwrap();
    assert_eq!(edit.url(), "testing/2");
    assert!(edit.html().contains("revised"));
}

#[test]
fn restore_writes_back_without_a_new_ledger_row() {
    let f = fixture();
    create_page(&f.wiki, "testing", "good content", "alice");
    edit_page(&f.wiki, "testing", "bad content", "bob");

    let mut page = f.wiki.get("testing").unwrap().unwrap();
    assert!(page.content().contains("bad content"));

    page.restore_last_version(f.wiki.ledger()).unwrap();

    let on_disk = fs::read_to_string(f.wiki.path("testing")).unwrap();
    assert!(on_disk.contains("good content"));
    assert_eq!(f.wiki.ledger().version_count("testing").unwrap(), 2);
}

#[test]
fn restore_without_an_approved_version_fails() {
    let f = fixture();
    let mut page = Page::new(f.wiki.path("nothing"), "nothing");
    assert!(matches!(
        page.restore_last_version(f.wiki.ledger()),
        Err(WikiError::NotFound(_))
    ));
}

#[test]
fn reject_deletes_the_version_and_restores_approved_content() {
    let f = fixture();
    create_page(&f.wiki, "testing", "good content", "alice");
    edit_page(&f.wiki, "testing", "bad content", "bob");

    f.wiki.reject("testing", 2).unwrap();

    assert_eq!(f.wiki.ledger().version_count("testing").unwrap(), 1);
    let on_disk = fs::read_to_string(f.wiki.path("testing")).unwrap();
    assert!(on_disk.contains("good content"));
}

#[test]
fn approve_makes_an_edit_live() {
    let f = fixture();
    create_page(&f.wiki, "testing", "v1", "alice");
    edit_page(&f.wiki, "testing", "v2", "bob");
    assert_eq!(f.wiki.ledger().max_approved_version("testing").unwrap(), Some(1));

    f.wiki.approve("testing", 2).unwrap();

    assert_eq!(f.wiki.ledger().max_approved_version("testing").unwrap(), Some(2));
    let live = f.wiki.latest_approved("testing").unwrap();
    assert!(live.body().contains("v2"));
}

#[test]
fn rename_carries_every_version() {
    let f = fixture();
    create_page(&f.wiki, "testing", "v1", "alice");
    edit_page(&f.wiki, "testing", "v2", "alice");

    f.wiki.ledger().rename("testing", "renamed").unwrap();

    assert_eq!(f.wiki.ledger().version_count("testing").unwrap(), 0);
    assert_eq!(f.wiki.ledger().version_count("renamed").unwrap(), 2);
}

#[test]
fn saved_files_round_trip_front_matter() {
    let f = fixture();
    create_page(&f.wiki, "testing", "body text", "alice");

    let page = f.wiki.get("testing").unwrap().unwrap();
    assert_eq!(page.title(), "Testing");
    assert_eq!(page.tags(), "testing");
    assert_eq!(page.body().trim(), "body text");
}
