use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lexdraft_dom::{serialize, Dom};

fn sample_document(sections: usize) -> String {
    let mut body = String::new();
    for index in 0..sections {
        body.push_str(&format!(
            r#"<div class="section"><h2 class="section-title">{index}. Obligations</h2><p>The Tenant shall pay the rent of &pound;1,200 on the first day of each month.</p><p>Notices must be given in <b>writing</b> to the address above.</p></div>"#
        ));
    }
    format!(
        "<!DOCTYPE html><html><head><style>body {{ font-family: serif }}</style></head><body>{}</body></html>",
        body
    )
}

fn parse_agreement(c: &mut Criterion) {
    let source = sample_document(40);
    c.bench_function("parse_agreement", |b| b.iter(|| Dom::parse(black_box(&source))));
}

fn serialize_agreement(c: &mut Criterion) {
    let dom = Dom::parse(&sample_document(40));
    c.bench_function("serialize_agreement", |b| b.iter(|| serialize(black_box(&dom))));
}

fn offsets_agreement(c: &mut Criterion) {
    let dom = Dom::parse(&sample_document(40));
    let body = dom.body().expect("body");
    c.bench_function("position_at_end", |b| {
        b.iter(|| dom.position_at(body, black_box(5_000)))
    });
}

criterion_group!(benches, parse_agreement, serialize_agreement, offsets_agreement);
criterion_main!(benches);
