mod common;

use common::{TestResult, exporter, init_logger, mount, paragraphs, texts};
use drawdom::dom::{NodeId, el};
use drawdom::{CancelToken, ExportError, ExportOptions, PageSize, PageTemplate};
use drawdom_sim::SimHost;
use drawdom_types::Matrix;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn single_page_exports_start_at_the_origin() -> TestResult {
    init_logger();
    let (doc, _) = mount(
        el("div")
            .id("report")
            .style("padding: 20px")
            .child(el("p").text("hello")),
    );
    let host = SimHost::new();
    let scene = exporter()
        .draw_dom(&doc, "#report", &host, &ExportOptions::new())
        .await?;

    let info = scene.document.as_ref().expect("the root carries document info");
    assert!(!info.multi_page);
    assert_eq!(info.paper_size, None);
    assert_eq!(scene.transform, Some(Matrix::translate(0.0, 0.0)));
    assert_eq!(texts(&scene), vec!["hello"]);
    Ok(())
}

#[tokio::test]
async fn missing_targets_are_reported() {
    init_logger();
    let (doc, target) = mount(el("div").text("only text"));
    let result = exporter()
        .draw_dom(&doc, "#nowhere", &SimHost::new(), &ExportOptions::new())
        .await;
    assert!(matches!(result, Err(ExportError::TargetNotFound)));

    let text: NodeId = doc.children(target)[0];
    let result = exporter()
        .draw_dom(&doc, text, &SimHost::new(), &ExportOptions::new())
        .await;
    assert!(matches!(result, Err(ExportError::TargetNotFound)));
}

#[tokio::test]
async fn hosts_without_computed_styles_are_refused() {
    let (doc, target) = mount(el("div").text("x"));
    let host = SimHost::new().without_computed_style();
    let result = exporter().draw_dom(&doc, target, &host, &ExportOptions::new()).await;
    assert!(matches!(result, Err(ExportError::EnvironmentUnsupported)));
}

#[tokio::test]
async fn forced_breaks_produce_one_group_per_page() -> TestResult {
    init_logger();
    let (doc, target) = mount(
        el("div")
            .child(el("p").text("one"))
            .child(el("div").class("break").text("two"))
            .child(el("p").text("three")),
    );
    let options = ExportOptions::new().with_force_page_break(".break");
    let scene = exporter().draw_dom(&doc, target, &SimHost::new(), &options).await?;

    let info = scene.document.as_ref().expect("the root carries document info");
    assert!(info.multi_page);
    assert_eq!(info.paper_size, None);
    let pages = scene.pages();
    assert_eq!(pages.len(), 2);
    assert_eq!(texts(pages[0]), vec!["one"]);
    assert_eq!(texts(pages[1]), vec!["two", "three"]);
    Ok(())
}

#[tokio::test]
async fn a_dash_keeps_everything_on_one_page() -> TestResult {
    let (doc, target) = mount(paragraphs(3));
    let options = ExportOptions::new().with_force_page_break("-");
    let scene = exporter().draw_dom(&doc, target, &SimHost::new(), &options).await?;

    assert!(scene.document.as_ref().is_some_and(|info| info.multi_page));
    assert_eq!(scene.pages().len(), 1);
    assert_eq!(texts(&scene), vec!["p0", "p1", "p2"]);
    Ok(())
}

#[tokio::test]
async fn content_flows_onto_pages_of_the_paper_size() -> TestResult {
    init_logger();
    let (doc, target) = mount(paragraphs(7));
    let paper = PageSize::Custom {
        width: 200.0,
        height: 100.0,
    };
    let options = ExportOptions::new().with_paper_size(paper);
    let scene = exporter().draw_dom(&doc, target, &SimHost::new(), &options).await?;

    let info = scene.document.as_ref().expect("the root carries document info");
    assert_eq!(info.paper_size, Some(paper));
    let pages = scene.pages();
    assert_eq!(pages.len(), 2);
    let all: Vec<&str> = pages.iter().flat_map(|page| texts(page)).collect();
    assert_eq!(all, vec!["p0", "p1", "p2", "p3", "p4", "p5", "p6"]);
    Ok(())
}

#[tokio::test]
async fn templates_number_the_pages() -> TestResult {
    init_logger();
    let (doc, target) = mount(
        el("div")
            .child(el("p").text("one"))
            .child(el("p").class("break").text("two")),
    );
    let options = ExportOptions::new()
        .with_force_page_break(".break")
        .with_template(PageTemplate::Markup(
            r#"<div class="footer">{{pageNum}} / {{totalPages}}</div>"#.to_string(),
        ));
    let scene = exporter().draw_dom(&doc, target, &SimHost::new(), &options).await?;

    let pages = scene.pages();
    assert_eq!(pages.len(), 2);
    assert!(texts(pages[0]).concat().contains("1 / 2"));
    assert!(texts(pages[1]).concat().contains("2 / 2"));
    Ok(())
}

#[tokio::test]
async fn progress_reports_every_page() -> TestResult {
    let (doc, target) = mount(
        el("div")
            .child(el("p").text("one"))
            .child(el("p").class("break").text("two"))
            .child(el("p").class("break").text("three")),
    );
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let options = ExportOptions::new()
        .with_force_page_break(".break")
        .with_progress(move |progress| {
            if let Ok(mut log) = log.lock() {
                log.push((progress.page_num, progress.total_pages));
            }
        });
    exporter().draw_dom(&doc, target, &SimHost::new(), &options).await?;

    assert_eq!(*seen.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    Ok(())
}

#[tokio::test]
async fn canceling_from_progress_stops_the_export() {
    init_logger();
    let (doc, target) = mount(
        el("div")
            .child(el("p").text("one"))
            .child(el("p").class("break").text("two"))
            .child(el("p").class("break").text("three")),
    );
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let options = ExportOptions::new()
        .with_force_page_break(".break")
        .with_progress(move |progress| {
            counter.fetch_add(1, Ordering::SeqCst);
            progress.cancel();
        });
    let result = exporter().draw_dom(&doc, target, &SimHost::new(), &options).await;

    assert!(matches!(result, Err(ExportError::Canceled)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn an_external_token_cancels_before_the_next_page() {
    let (doc, target) = mount(paragraphs(3));
    let token = CancelToken::new();
    token.cancel();
    let options = ExportOptions::new()
        .with_force_page_break("p")
        .with_cancel_token(token);
    let result = exporter().draw_dom(&doc, target, &SimHost::new(), &options).await;
    assert!(matches!(result, Err(ExportError::Canceled)));
}

#[tokio::test]
async fn the_callers_document_is_not_modified() -> TestResult {
    let (doc, target) = mount(
        el("div")
            .child(el("p").text("one"))
            .child(el("p").class("break").text("two")),
    );
    let before = doc.clone();
    let options = ExportOptions::new()
        .with_force_page_break(".break")
        .with_page_class_name("sheet");
    exporter().draw_dom(&doc, target, &SimHost::new(), &options).await?;

    assert_eq!(doc.text_content(doc.root()), before.text_content(before.root()));
    assert_eq!(doc.element_children(target), before.element_children(target));
    assert!(doc.elements_by_tag(doc.root(), drawdom_layout::PAGE_TAG).is_empty());
    Ok(())
}

#[tokio::test]
async fn the_hook_sees_the_working_container() -> TestResult {
    let (doc, target) = mount(paragraphs(2));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let options = ExportOptions::new()
        .with_force_page_break("-")
        .with_before_page_break(move |doc, container| {
            counter.fetch_add(1, Ordering::SeqCst);
            assert!(doc.is_tag(container, drawdom_layout::DOCUMENT_TAG));
        });
    exporter().draw_dom(&doc, target, &SimHost::new(), &options).await?;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn options_loaded_from_json_drive_the_export() -> TestResult {
    let (doc, target) = mount(
        el("div")
            .child(el("a").attr("href", "https://example.com").text("link"))
            .child(el("p").class("break").text("next")),
    );
    let options: ExportOptions = serde_json::from_str(
        r#"{ "forcePageBreak": ".break", "avoidLinks": true }"#,
    )?;
    let scene = exporter().draw_dom(&doc, target, &SimHost::new(), &options).await?;

    assert_eq!(scene.pages().len(), 2);
    assert!(scene.groups().iter().all(|g| g.link.is_none()));

    let json = serde_json::to_value(&scene)?;
    assert_eq!(json["document"]["multiPage"], serde_json::json!(true));
    assert_eq!(json["children"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["children"][0]["type"], serde_json::json!("group"));
    Ok(())
}

fn numbered_list() -> drawdom::dom::ElementSpec {
    el("ol")
        .style("list-style-type: decimal")
        .children((0..8).map(|i| el("li").text(&format!("item{i}"))))
}

#[tokio::test]
async fn split_lists_keep_counting_on_the_next_page() -> TestResult {
    init_logger();
    let options = ExportOptions::new().with_paper_size(PageSize::Custom {
        width: 200.0,
        height: 100.0,
    });
    let expected = vec!["6.", "item5", "7.", "item6", "8.", "item7"];

    let (doc, target) = mount(el("div").child(numbered_list()));
    let scene = exporter().draw_dom(&doc, target, &SimHost::new(), &options).await?;
    let pages = scene.pages();
    assert_eq!(pages.len(), 2);
    assert_eq!(texts(pages[0])[..2], ["1.", "item0"]);
    assert_eq!(texts(pages[1]), expected);

    let (doc, list) = mount(numbered_list());
    let scene = exporter().draw_dom(&doc, list, &SimHost::new(), &options).await?;
    let pages = scene.pages();
    assert_eq!(pages.len(), 2);
    assert_eq!(texts(pages[1]), expected);
    Ok(())
}
