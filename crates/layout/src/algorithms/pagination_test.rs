use super::pagination::*;
use crate::PaginationError;
use drawdom_dom::{Document, ElementSpec, NodeId, SelectorList, el};
use drawdom_sim::SimHost;
use drawdom_traits::LayoutHost;
use drawdom_types::Rect;
use std::error::Error;

type TestResult = Result<(), Box<dyn Error>>;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn setup(spec: ElementSpec) -> (Document, NodeId) {
    let mut doc = Document::new();
    let root = doc.root();
    let body = doc.append_spec(root, &el("div").into());
    let target = doc.append_spec(body, &spec.into());
    (doc, target)
}

fn page_texts(doc: &Document, pages: &PageSet) -> Vec<String> {
    pages.pages().iter().map(|&p| doc.text_content(p)).collect()
}

fn paged(height: f32, width: f32) -> PaginationConfig {
    PaginationConfig {
        page_height: Some(height),
        page_width: Some(width),
        ..PaginationConfig::default()
    }
}

#[test]
fn classify_against_the_budget() {
    let fall = |top: f32, height: f32| Fall::classify(&Rect::new(0.0, top, 10.0, height), 100.0, 50.0);
    assert_eq!(fall(110.0, 20.0), Fall::Fits);
    assert_eq!(fall(140.0, 20.0), Fall::EndsPast);
    assert_eq!(fall(151.0, 20.0), Fall::StartsPast);
    assert_eq!(fall(100.0, 60.0), Fall::Oversized);
    assert_eq!(Fall::classify(&Rect::new(0.0, 500.0, 0.0, 10.0), 0.0, 50.0), Fall::Fits);
}

#[test]
fn forced_breaks_start_new_pages() -> TestResult {
    init_logger();
    let (mut doc, target) = setup(
        el("div")
            .child(el("p").text("one"))
            .child(el("div").class("break").text("two"))
            .child(el("p").text("three")),
    );
    let config = PaginationConfig {
        force_break: Some(SelectorList::parse(".break")?),
        ..PaginationConfig::default()
    };
    let host = SimHost::new();
    let pages = prepare(&mut doc, target, config)?.split(&mut doc, &host)?;

    assert_eq!(page_texts(&doc, &pages), vec!["one", "twothree"]);
    assert_eq!(pages.state(), PaginationState::PageAssembled(2));
    Ok(())
}

#[test]
fn forced_break_on_leading_content_leaves_a_blank_page() -> TestResult {
    let (mut doc, target) = setup(
        el("div")
            .child(el("div").class("break").text("first"))
            .child(el("p").text("second")),
    );
    let config = PaginationConfig {
        force_break: Some(SelectorList::parse(".break")?),
        ..PaginationConfig::default()
    };
    let host = SimHost::new();
    let pages = prepare(&mut doc, target, config)?.split(&mut doc, &host)?;

    assert_eq!(page_texts(&doc, &pages), vec!["", "firstsecond"]);
    Ok(())
}

#[test]
fn blocks_flow_onto_following_pages() -> TestResult {
    init_logger();
    let (mut doc, target) = setup(el("div").children((0..5).map(|_| el("p").text("line"))));
    let host = SimHost::new();
    let pages = prepare(&mut doc, target, paged(50.0, 200.0))?.split(&mut doc, &host)?;

    assert_eq!(page_texts(&doc, &pages), vec!["lineline", "lineline", "line"]);
    Ok(())
}

#[test]
fn text_splits_at_the_last_fitting_line() -> TestResult {
    init_logger();
    let (mut doc, target) = setup(el("div").child(el("p").text("aaaa bbbb cccc dddd eeee ffff gggg hhhh")));
    let host = SimHost::new();
    let pages = prepare(&mut doc, target, paged(50.0, 100.0))?.split(&mut doc, &host)?;

    assert_eq!(
        page_texts(&doc, &pages),
        vec!["aaaa bbbb cccc dddd ", "eeee ffff gggg hhhh"]
    );
    // Both halves keep a paragraph around them.
    for &page in pages.pages() {
        assert_eq!(doc.elements_by_tag(page, "p").len(), 1);
    }
    Ok(())
}

#[test]
fn atomic_elements_move_whole() -> TestResult {
    let (mut doc, target) = setup(el("div").child(el("p").text("one")).child(el("h1").text("Title")));
    let host = SimHost::new();
    let pages = prepare(&mut doc, target, paged(50.0, 200.0))?.split(&mut doc, &host)?;

    assert_eq!(page_texts(&doc, &pages), vec!["one", "Title"]);
    Ok(())
}

#[test]
fn breaks_before_a_first_child_move_the_parent() -> TestResult {
    let (mut doc, target) = setup(
        el("div")
            .child(el("p").text("intro"))
            .child(el("section").child(el("h1").text("Title"))),
    );
    let host = SimHost::new();
    let pages = prepare(&mut doc, target, paged(50.0, 200.0))?.split(&mut doc, &host)?;

    assert_eq!(page_texts(&doc, &pages), vec!["intro", "Title"]);
    assert!(doc.elements_by_tag(pages.pages()[0], "section").is_empty());
    assert_eq!(doc.elements_by_tag(pages.pages()[1], "section").len(), 1);
    Ok(())
}

#[test]
fn split_tables_keep_their_column_groups() -> TestResult {
    let rows = (0..4).map(|i| el("tr").child(el("td").text(&format!("r{i}"))));
    let (mut doc, target) = setup(
        el("div").child(
            el("table")
                .child(el("colgroup").child(el("col").attr("width", "20")))
                .child(el("tbody").children(rows)),
        ),
    );
    let host = SimHost::new();
    let pages = prepare(&mut doc, target, paged(50.0, 200.0))?.split(&mut doc, &host)?;

    assert_eq!(page_texts(&doc, &pages), vec!["r0r1", "r2r3"]);
    for &page in pages.pages() {
        assert_eq!(doc.elements_by_tag(page, "colgroup").len(), 1);
    }
    Ok(())
}

#[test]
fn preparation_reorders_footers_and_numbers_list_items() -> TestResult {
    let (mut doc, target) = setup(
        el("div")
            .child(
                el("table")
                    .child(el("tfoot").child(el("tr").child(el("td").text("sum"))))
                    .child(el("tbody").child(el("tr").child(el("td").text("row")))),
            )
            .child(el("ol").children(["a", "b", "c"].map(|t| el("li").text(t)))),
    );
    let prepared = prepare(&mut doc, target, PaginationConfig::default())?;
    let container = prepared.container();

    assert_eq!(doc.parent(container), doc.parent(target));
    assert_eq!(doc.next_sibling(container), Some(target));
    let table = doc.elements_by_tag(container, "table")[0];
    let sections: Vec<_> = doc
        .element_children(table)
        .into_iter()
        .filter_map(|c| doc.tag_name(c).map(str::to_string))
        .collect();
    assert_eq!(sections, vec!["tbody", "tfoot"]);
    let indexes: Vec<_> = doc
        .elements_by_tag(container, "li")
        .into_iter()
        .map(|li| doc.attr(li, SPLIT_INDEX_ATTR).map(str::to_string))
        .collect();
    assert_eq!(indexes, vec![Some("0".into()), Some("1".into()), Some("2".into())]);
    // The original is untouched.
    assert!(doc.elements_by_tag(target, "li").iter().all(|&li| !doc.has_attr(li, SPLIT_INDEX_ATTR)));
    Ok(())
}

#[test]
fn a_list_exported_directly_numbers_its_own_items() -> TestResult {
    let (mut doc, target) = setup(el("ol").children(["a", "b"].map(|t| el("li").text(t))));
    let prepared = prepare(&mut doc, target, PaginationConfig::default())?;
    let indexes: Vec<_> = doc
        .elements_by_tag(prepared.container(), "li")
        .into_iter()
        .map(|li| doc.attr(li, SPLIT_INDEX_ATTR).map(str::to_string))
        .collect();
    assert_eq!(indexes, vec![Some("0".into()), Some("1".into())]);
    Ok(())
}

#[test]
fn pages_carry_size_and_class() -> TestResult {
    let (mut doc, target) = setup(el("div").child(el("p").text("x")));
    let config = PaginationConfig {
        page_class: Some("sheet".into()),
        ..paged(300.0, 200.0)
    };
    let host = SimHost::new();
    let pages = prepare(&mut doc, target, config)?.split(&mut doc, &host)?;

    assert_eq!(pages.len(), 1);
    let page = pages.pages()[0];
    assert!(doc.has_class(page, "sheet"));
    assert!(doc.is_tag(page, PAGE_TAG));
    assert_eq!(host.bounding_rect(&doc, page).height, 300.0);
    Ok(())
}

#[test]
fn without_limits_everything_lands_on_one_page() -> TestResult {
    let (mut doc, target) = setup(el("div").child(el("p").text("a")).child(el("p").text("b")));
    let host = SimHost::new();
    let pages = prepare(&mut doc, target, PaginationConfig::default())?.split(&mut doc, &host)?;
    assert_eq!(page_texts(&doc, &pages), vec!["ab"]);
    Ok(())
}

#[test]
fn finalize_and_cancel_detach_the_container() -> TestResult {
    let (mut doc, target) = setup(el("div").text("x"));
    let host = SimHost::new();

    let mut pages = prepare(&mut doc, target, PaginationConfig::default())?.split(&mut doc, &host)?;
    let container = pages.container();
    pages.finalize(&mut doc)?;
    assert_eq!(pages.state(), PaginationState::Finalized);
    assert_eq!(doc.parent(container), None);
    assert_eq!(
        pages.finalize(&mut doc),
        Err(PaginationError::InvalidTransition {
            from: PaginationState::Finalized,
            to: PaginationState::Finalized,
        })
    );

    let mut pages = prepare(&mut doc, target, PaginationConfig::default())?.split(&mut doc, &host)?;
    pages.cancel(&mut doc)?;
    assert_eq!(pages.state(), PaginationState::Canceled);
    assert!(pages.finalize(&mut doc).is_err());

    let prepared = prepare(&mut doc, target, PaginationConfig::default())?;
    let container = prepared.container();
    assert_eq!(prepared.discard(&mut doc), PaginationState::Canceled);
    assert_eq!(doc.parent(container), None);
    Ok(())
}

#[test]
fn detached_targets_are_rejected() {
    let mut doc = Document::new();
    let orphan = doc.create_element("div");
    assert_eq!(
        prepare(&mut doc, orphan, PaginationConfig::default()).err(),
        Some(PaginationError::TargetDetached)
    );
}
