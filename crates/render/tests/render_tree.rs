mod common;

use common::{TestResult, empty_cache, init_logger, mount, render, render_with, texts};
use drawdom_dom::{Document, SelectorList, el};
use drawdom_render::{EXPORT_CLASS, STAND_IN_TAG};
use drawdom_scene::{Fill, Group, Path};
use drawdom_sim::SimHost;
use drawdom_types::{Color, Matrix, Rect};

#[test]
fn boxes_get_their_background_and_text() {
    init_logger();
    let mut doc = Document::new();
    let div = mount(
        &mut doc,
        el("div").style("padding: 10px; background-color: red").text("hello"),
    );
    let page = render(&mut doc, &SimHost::new(), div);

    let red = Color::rgb(255, 0, 0);
    let background = page
        .paths()
        .into_iter()
        .find(|p| matches!(&p.fill, Some(Fill::Color(c)) if *c == red))
        .expect("the background is painted");
    assert_eq!(background.bbox(None), Rect::new(0.0, 0.0, 800.0, 40.0));

    let text = page.texts();
    assert_eq!(text.len(), 1);
    assert_eq!(text[0].content, "hello");
    assert_eq!(text[0].rect, Rect::new(10.0, 10.0, 40.0, 20.0));
    assert!(text[0].font.contains("16px"));
}

#[test]
fn pages_are_translated_to_the_element_origin() {
    init_logger();
    let mut doc = Document::new();
    let body = mount(&mut doc, el("div").style("padding: 30px").child(el("p").text("x")));
    let p = doc.element_children(body)[0];
    let page = render(&mut doc, &SimHost::new(), p);
    assert_eq!(page.transform, Some(Matrix::translate(-30.0, -30.0)));
}

#[test]
fn export_leaves_the_document_as_it_was() -> TestResult {
    init_logger();
    let mut doc = Document::new();
    let div = mount(
        &mut doc,
        el("ol")
            .child(el("li").text("one"))
            .child(el("li").child(el("input").attr("value", "typed")))
            .child(el("li").style("transform: rotate(10deg)").text("three")),
    );
    let host = SimHost::new().rule("li::after", r#"content: "!""#)?;
    let items = doc.element_children(div);
    let before = doc.inline_style(items[2]).cloned();

    let page = render(&mut doc, &host, div);
    assert!(texts(&page).contains(&"typed"));

    assert!(doc.elements_by_tag(doc.root(), STAND_IN_TAG).is_empty());
    assert!(!doc.has_class(div, EXPORT_CLASS));
    assert_eq!(doc.inline_style(items[2]).cloned(), before);
    assert_eq!(doc.inline_style(items[0]).and_then(|css| css.get("position")), None);
    Ok(())
}

#[test]
fn hidden_elements_are_skipped() {
    init_logger();
    let mut doc = Document::new();
    let div = mount(
        &mut doc,
        el("div")
            .child(el("p").text("shown"))
            .child(el("p").style("display: none").text("gone"))
            .child(el("p").style("visibility: hidden").text("invisible"))
            .child(el("p").style("opacity: 0").text("transparent"))
            .child(el("script").text("var x = 1;")),
    );
    let page = render(&mut doc, &SimHost::new(), div);
    assert_eq!(texts(&page), vec!["shown"]);
}

#[test]
fn positioned_children_follow_their_z_index() {
    init_logger();
    let mut doc = Document::new();
    let div = mount(
        &mut doc,
        el("div")
            .child(el("div").style("position: relative; z-index: 2").text("top"))
            .child(el("div").text("plain"))
            .child(el("div").style("position: relative; z-index: -1").text("below")),
    );
    let page = render(&mut doc, &SimHost::new(), div);
    assert_eq!(texts(&page), vec!["below", "plain", "top"]);
}

#[test]
fn translucent_elements_get_their_own_group() {
    init_logger();
    let mut doc = Document::new();
    let div = mount(
        &mut doc,
        el("div").child(el("p").style("opacity: 0.5").text("faded")),
    );
    let page = render(&mut doc, &SimHost::new(), div);
    let faded = page
        .groups()
        .into_iter()
        .find(|g| g.opacity == 0.5)
        .expect("a group carries the opacity");
    assert_eq!(texts(faded), vec!["faded"]);
}

#[test]
fn transforms_are_applied_around_the_origin() {
    init_logger();
    let mut doc = Document::new();
    let div = mount(
        &mut doc,
        el("div").child(
            el("div")
                .style("width: 100px; height: 50px; transform: translate(10px, 5px)")
                .text("moved"),
        ),
    );
    let page = render(&mut doc, &SimHost::new(), div);
    let moved = page
        .groups()
        .into_iter()
        .find(|g| g.transform == Some(Matrix::translate(10.0, 5.0)))
        .expect("the transformed element has its own group");
    assert_eq!(texts(moved), vec!["moved"]);
}

#[test]
fn overflow_clips_content() {
    init_logger();
    let mut doc = Document::new();
    let div = mount(
        &mut doc,
        el("div")
            .child(el("div").style("overflow: hidden; height: 0px").child(el("p").text("cut")))
            .child(el("div").style("overflow: hidden").text("kept")),
    );
    let page = render(&mut doc, &SimHost::new(), div);
    assert_eq!(texts(&page), vec!["kept"]);
    assert!(page.groups().iter().any(|g| g.clip.is_some()));
}

#[test]
fn anchors_become_links() -> TestResult {
    init_logger();
    let mut doc = Document::new();
    let div = mount(
        &mut doc,
        el("div")
            .child(el("a").attr("href", "https://example.com").text("site"))
            .child(el("a").attr("href", "#").text("top")),
    );
    let host = SimHost::new();
    let page = render(&mut doc, &host, div);
    let links: Vec<_> = page.groups().into_iter().filter_map(|g| g.link.as_ref()).collect();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].url, "https://example.com");
    assert!(links[0].rect.width > 0.0);

    let avoid = SelectorList::parse("a")?;
    let page = render_with(&mut doc, &host, &empty_cache(), Some(&avoid), div);
    assert!(page.groups().iter().all(|g| g.link.is_none()));
    Ok(())
}

#[test]
fn list_items_get_markers() {
    init_logger();
    let mut doc = Document::new();
    let ol = mount(
        &mut doc,
        el("ol").children([el("li").text("one"), el("li").text("two")]),
    );
    let page = render(&mut doc, &SimHost::new(), ol);
    assert_eq!(texts(&page), vec!["1.", "one", "2.", "two"]);

    let ul = mount(&mut doc, el("ul").child(el("li").text("item")));
    let page = render(&mut doc, &SimHost::new(), ul);
    assert_eq!(texts(&page), vec!["\u{25CF}", "item"]);
}

#[test]
fn generated_content_uses_counters() -> TestResult {
    init_logger();
    let mut doc = Document::new();
    let ol = mount(
        &mut doc,
        el("ol").children([el("li").text("a"), el("li").text("b")]),
    );
    let host = SimHost::new()
        .rule("ol", "counter-reset: item")?
        .rule("li", "counter-increment: item; list-style-type: none")?
        .rule("li::before", r#"content: counter(item) ". ""#)?;
    let page = render(&mut doc, &host, ol);
    assert_eq!(texts(&page), vec!["a", "1.", "b", "2."]);
    Ok(())
}

#[test]
fn top_level_counters_continue_across_pages() -> TestResult {
    init_logger();
    let mut doc = Document::new();
    let first = mount(&mut doc, el("div").class("pg").text("A"));
    let second = mount(&mut doc, el("div").class("pg").text("B"));
    let host = SimHost::new()
        .rule(".pg", "counter-increment: pg")?
        .rule(".pg::before", "content: counter(pg)")?;
    let images = empty_cache();
    let backgrounds = drawdom_style::BackgroundParser::new();
    let mut builder = drawdom_render::TreeBuilder::new(&mut doc, &host, &images, &backgrounds);

    let page = builder.render_page(first);
    assert!(texts(&page).contains(&"1"));
    let page = builder.render_page(second);
    assert!(texts(&page).contains(&"2"));
    Ok(())
}

#[test]
fn check_boxes_are_drawn() {
    init_logger();
    let mut doc = Document::new();
    let form = mount(
        &mut doc,
        el("form")
            .child(el("input").attr("type", "checkbox").attr("checked", ""))
            .child(el("input").attr("type", "checkbox")),
    );
    let page = render(&mut doc, &SimHost::new(), form);
    let marks = page
        .paths()
        .into_iter()
        .filter(|p| p.stroke.as_ref().is_some_and(|s| s.width == 1.2))
        .count();
    assert_eq!(marks, 1);
}

#[tokio::test]
async fn images_that_failed_to_load_are_left_out() {
    init_logger();
    let mut doc = Document::new();
    let div = mount(
        &mut doc,
        el("div")
            .child(el("img").attr("src", "missing.png").attr("width", "20").attr("height", "10"))
            .child(el("img").attr("src", "later.png").attr("width", "20").attr("height", "10")),
    );
    let images = empty_cache();
    images.preload(["missing.png".to_string()]).await;
    assert!(images.is_failed("missing.png"));

    let page = render_with(&mut doc, &SimHost::new(), &images, None, div);
    let drawn = page.images();
    assert_eq!(drawn.len(), 1);
    assert_eq!(drawn[0].src, "later.png");
    assert_eq!((drawn[0].rect.width, drawn[0].rect.height), (20.0, 10.0));
}

#[test]
fn canvases_export_their_pixels_unless_tainted() {
    init_logger();
    let mut doc = Document::new();
    let div = mount(
        &mut doc,
        el("div")
            .child(el("canvas").id("plot"))
            .child(el("canvas").id("secret")),
    );
    let host = SimHost::new()
        .with_canvas("plot", "data:image/png;base64,AAAA")
        .with_tainted_canvas("secret");
    let page = render(&mut doc, &host, div);
    let drawn = page.images();
    assert_eq!(drawn.len(), 1);
    assert_eq!(drawn[0].src, "data:image/png;base64,AAAA");
}

#[test]
fn widgets_contribute_their_own_visual() {
    init_logger();
    let mut doc = Document::new();
    let div = mount(
        &mut doc,
        el("div").style("padding: 10px").child(
            el("div")
                .id("chart")
                .attr("data-role", "chart")
                .style("height: 30px")
                .text("fallback"),
        ),
    );
    let mut visual = Group::new();
    visual.append(Path::from_rect(Rect::new(0.0, 0.0, 5.0, 5.0)).with_fill(Color::BLACK));
    let host = SimHost::new().with_widget("chart", visual);

    let page = render(&mut doc, &host, div);
    assert!(texts(&page).is_empty());
    let wrap = page
        .groups()
        .into_iter()
        .find(|g| g.transform == Some(Matrix::translate(10.0, 10.0)))
        .expect("the visual is placed at the widget");
    assert_eq!(wrap.paths().len(), 1);
}

#[test]
fn scenes_serialize_with_tagged_elements() -> TestResult {
    let mut doc = Document::new();
    let div = mount(&mut doc, el("div").text("json"));
    let page = render(&mut doc, &SimHost::new(), div);

    let json = serde_json::to_string(&page)?;
    assert!(json.contains(r#""type":"text","content":"json""#));
    assert!(json.contains(r#""opacity":1.0"#));
    Ok(())
}
