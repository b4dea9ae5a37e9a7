use metatemplate_dom::remote::{LoopbackBrowser, RemoteElement};
use metatemplate_dom::{Node, NodeAccess, parse_html, read_attribute};
use pretty_assertions::assert_eq;

fn first_element(html: &str) -> metatemplate_dom::Element {
    match parse_html(html).unwrap().into_iter().next() {
        Some(Node::Element(el)) => el,
        other => panic!("expected element, got {other:?}"),
    }
}

#[test_log::test]
fn both_adapters_report_the_same_attributes() {
    let el = first_element(
        r#"<div class="g-alert {{ level: g-alert--info as info | g-alert--error as error }}" role="note"></div>"#,
    );
    let browser = LoopbackBrowser::new();
    browser.insert("node-7", el.clone());
    let remote = RemoteElement::new("node-7", &browser);

    assert_eq!(el.tag_name().unwrap(), remote.tag_name().unwrap());
    assert_eq!(
        el.attribute_names().unwrap(),
        remote.attribute_names().unwrap()
    );
    for name in el.attribute_names().unwrap() {
        assert_eq!(
            read_attribute(&el, &name).unwrap(),
            read_attribute(&remote, &name).unwrap()
        );
    }
}

#[test_log::test]
fn class_mutations_are_reversible_through_both_adapters() {
    let mut el = first_element(r##"<a class="g-link" href="#">x</a>"##);
    let browser = LoopbackBrowser::new();
    browser.insert("a", el.clone());
    let mut remote = RemoteElement::new("a", &browser);

    let local_undo = el.add_class("g-link--muted").unwrap();
    let remote_undo = remote.add_class("g-link--muted").unwrap();
    assert_eq!(local_undo, remote_undo);

    el.apply_undo(local_undo).unwrap();
    remote.apply_undo(remote_undo).unwrap();
    assert_eq!(el.get("class"), Some("g-link"));
    assert_eq!(browser.snapshot("a").unwrap().get("class"), Some("g-link"));
}
