use drawdom_dom::{Document, NodeId, el, text};
use drawdom_scene::Group;
use drawdom_sim::SimHost;
use drawdom_style::Vendor;
use drawdom_traits::{HostError, LayoutHost, PseudoElement, TextRange};
use drawdom_types::Rect;
use std::error::Error;

type TestResult = Result<(), Box<dyn Error>>;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn mount(doc: &mut Document, spec: drawdom_dom::ElementSpec) -> NodeId {
    let root = doc.root();
    doc.append_spec(root, &spec.into())
}

#[test]
fn blocks_stack_inside_padding() {
    init_logger();
    let mut doc = Document::new();
    let div = mount(
        &mut doc,
        el("div")
            .style("width: 200px; padding: 10px")
            .child(el("p").text("Hello"))
            .child(el("p").text("World")),
    );
    let host = SimHost::new();
    let paragraphs = doc.element_children(div);

    assert_eq!(host.bounding_rect(&doc, div), Rect::new(0.0, 0.0, 220.0, 60.0));
    assert_eq!(host.bounding_rect(&doc, paragraphs[0]), Rect::new(10.0, 10.0, 200.0, 20.0));
    assert_eq!(host.bounding_rect(&doc, paragraphs[1]), Rect::new(10.0, 30.0, 200.0, 20.0));

    let hello = doc.children(paragraphs[0])[0];
    let rect = host.range_bounding_rect(&doc, TextRange::new(hello, 0, 5));
    assert_eq!(rect, Rect::new(10.0, 10.0, 40.0, 20.0));
}

#[test]
fn text_wraps_at_spaces() {
    init_logger();
    let mut doc = Document::new();
    let p = mount(&mut doc, el("p").style("width: 100px").text("aaaa bbbb cccc"));
    let host = SimHost::new();
    let node = doc.children(p)[0];

    let lines = host.range_rects(&doc, TextRange::new(node, 0, 14));
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1], Rect::new(0.0, 20.0, 32.0, 20.0));
    assert_eq!(host.bounding_rect(&doc, p).height, 40.0);

    let caret = host.range_rects(&doc, TextRange::new(node, 10, 10));
    assert_eq!(caret, vec![Rect::new(0.0, 20.0, 0.0, 20.0)]);
}

#[test]
fn inline_elements_report_one_rect_per_line() {
    init_logger();
    let mut doc = Document::new();
    let p = mount(
        &mut doc,
        el("p")
            .style("width: 100px")
            .child(text("aaaa "))
            .child(el("span").text("bbbb cccc")),
    );
    let host = SimHost::new();
    let span = doc.element_children(p)[0];

    let rects = host.client_rects(&doc, span);
    assert_eq!(rects, vec![Rect::new(40.0, 0.0, 40.0, 20.0), Rect::new(0.0, 20.0, 32.0, 20.0)]);
}

#[test]
fn inline_blocks_sit_on_the_line() {
    let mut doc = Document::new();
    let p = mount(
        &mut doc,
        el("p")
            .child(text("ab "))
            .child(el("span").style("display: inline-block; width: 50px; height: 10px")),
    );
    let host = SimHost::new();
    let block = doc.element_children(p)[0];
    assert_eq!(host.bounding_rect(&doc, block), Rect::new(24.0, 0.0, 50.0, 10.0));
    assert_eq!(host.bounding_rect(&doc, p).height, 20.0);
}

#[test]
fn table_cells_share_the_row() {
    let mut doc = Document::new();
    let table = mount(
        &mut doc,
        el("table").style("width: 300px").child(
            el("tr")
                .child(el("td").text("a"))
                .child(el("td").text("aaaa bbbb cccc"))
                .child(el("td").text("c")),
        ),
    );
    let host = SimHost::new();
    let row = doc.element_children(table)[0];
    let cells = doc.element_children(row);

    assert_eq!(host.computed_style(&doc, row, None).get("display"), "table-row");
    assert_eq!(host.bounding_rect(&doc, row), Rect::new(0.0, 0.0, 300.0, 40.0));
    assert_eq!(host.bounding_rect(&doc, cells[0]), Rect::new(0.0, 0.0, 100.0, 40.0));
    assert_eq!(host.bounding_rect(&doc, cells[2]).x, 200.0);
}

#[test]
fn positioned_boxes() {
    let mut doc = Document::new();
    let outer = mount(
        &mut doc,
        el("div")
            .style("position: relative; top: 5px; width: 200px; height: 100px")
            .child(el("div").style("position: absolute; left: 10px; top: 20px; width: 50px; height: 30px")),
    );
    let off_screen = mount(&mut doc, el("div").style("position: absolute; left: -10000px; top: -10000px; width: 10px"));
    let host = SimHost::new();
    let inner = doc.element_children(outer)[0];

    assert_eq!(host.bounding_rect(&doc, outer), Rect::new(0.0, 5.0, 200.0, 100.0));
    assert_eq!(host.bounding_rect(&doc, inner), Rect::new(10.0, 25.0, 50.0, 30.0));
    assert_eq!(host.bounding_rect(&doc, off_screen).x, -10000.0);
}

#[test]
fn computed_values_are_normalized() -> TestResult {
    let mut doc = Document::new();
    let div = mount(
        &mut doc,
        el("div")
            .class("box")
            .style("width: 100px; height: 50px; transform: rotate(90deg); border: 1px solid red"),
    );
    let host = SimHost::new()
        .rule(".box", "color: blue")?
        .rule(".box::after", "content: \"!\"; color: green")?;

    let style = host.computed_style(&doc, div, None);
    assert_eq!(style.get("transform"), "matrix(0, 1, -1, 0, 0, 0)");
    assert_eq!(style.get("transform-origin"), "51px 26px");
    assert_eq!(style.get("border-top-color"), "rgb(255, 0, 0)");
    assert_eq!(style.get("color"), "rgb(0, 0, 255)");

    let after = host.computed_style(&doc, div, Some(PseudoElement::After));
    assert_eq!(after.get("content"), "\"!\"");
    assert_eq!(after.get("color"), "rgb(0, 128, 0)");
    let before = host.computed_style(&doc, div, Some(PseudoElement::Before));
    assert_eq!(before.get("content"), "none");
    Ok(())
}

#[test]
fn mutations_invalidate_the_layout() {
    let mut doc = Document::new();
    let p = mount(&mut doc, el("p").text("ab"));
    let host = SimHost::new();
    assert_eq!(host.bounding_rect(&doc, p).height, 20.0);

    doc.set_attr(p, "style", "font-size: 32px");
    assert_eq!(host.bounding_rect(&doc, p).height, 40.0);
    let node = doc.children(p)[0];
    assert_eq!(host.range_bounding_rect(&doc, TextRange::new(node, 0, 2)).width, 32.0);
}

#[test]
fn canvases_widgets_and_vendor() {
    let mut doc = Document::new();
    let root = doc.root();
    let canvas = doc.append_spec(root, &el("canvas").id("plot").into());
    let tainted = doc.append_spec(root, &el("canvas").id("remote").into());
    let widget = doc.append_spec(root, &el("div").id("gauge").attr("data-role", "gauge").into());
    let host = SimHost::new()
        .with_vendor(Vendor::Webkit)
        .with_canvas("plot", "data:image/png;base64,AAAA")
        .with_tainted_canvas("remote")
        .with_widget("gauge", Group::new());

    assert_eq!(host.vendor(), Vendor::Webkit);
    assert_eq!(host.canvas_data_url(&doc, canvas).as_deref(), Ok("data:image/png;base64,AAAA"));
    assert_eq!(host.canvas_data_url(&doc, tainted), Err(HostError::TaintedCanvas));
    assert!(host.export_visual(&doc, widget).is_some());
    assert_eq!(host.bounding_rect(&doc, canvas), Rect::new(0.0, 0.0, 300.0, 150.0));
}
