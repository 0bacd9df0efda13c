//! Integration tests for parsing and re-serializing generated documents

use lexdraft_dom::{inner_html, serialize, Dom, Position, Selector};

const AGREEMENT: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Residential Lease</title>
<style>.section-title { font-weight: bold } p > em { color: #333 }</style>
</head>
<body>
<h1>Residential Lease Agreement</h1>
<div class="section">
<div class="section-title">1. Parties</div>
<p>This agreement is made between <em>Landlord</em> &amp; <em>Tenant</em>.</p>
</div>
<div class="section">
<div class="section-title">2. Rent</div>
<p>Rent is due monthly.<br>Late fees apply.</p>
</div>
</body>
</html>
"#;

#[test]
fn test_generated_document_is_stable_after_first_serialization() {
    let first = serialize(&Dom::parse(AGREEMENT));
    let second = serialize(&Dom::parse(&first));
    assert_eq!(first, second);
    assert!(first.starts_with("<!DOCTYPE html>"));
}

#[test]
fn test_headings_are_found_by_exclusion_selector() {
    let dom = Dom::parse(AGREEMENT);
    let selector = Selector::parse(".section-title, h1, h2").unwrap();
    let body = dom.body().unwrap();

    let excluded: Vec<String> = dom
        .descendants(body)
        .filter(|&node| selector.matches(&dom, node))
        .map(|node| dom.text_content(node))
        .collect();

    assert_eq!(
        excluded,
        vec!["Residential Lease Agreement", "1. Parties", "2. Rent"]
    );
}

#[test]
fn test_editing_a_paragraph_only_changes_that_paragraph() {
    let mut dom = Dom::parse(AGREEMENT);
    let body = dom.body().unwrap();
    let before = inner_html(&dom, body);

    let paragraph = dom
        .descendants(body)
        .find(|&node| dom.tag(node) == Some("p") && dom.text_content(node).starts_with("Rent"))
        .unwrap();
    let text = dom.children(paragraph)[0];
    dom.insert_text(Position::new(text, 4), " (EUR)").unwrap();

    let after = inner_html(&dom, body);
    assert_ne!(before, after);
    assert!(after.contains("<p>Rent (EUR) is due monthly.<br>Late fees apply.</p>"));
    assert!(after.contains("<em>Landlord</em> &amp; <em>Tenant</em>"));
}

#[test]
fn test_head_content_is_not_part_of_body_text() {
    let dom = Dom::parse(AGREEMENT);
    let body_text = dom.text_content(dom.body().unwrap());
    assert!(!body_text.contains("font-weight"));
    assert!(body_text.contains("Late fees apply."));
}
