use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use framescope::agent::structural_path;
use framescope::bridge::{AgentMessage, HostMessage, decode, encode};
use framescope::renderer::{HtmlParser, format_html, outer_html};
use framescope::{Host, StaticLoader};

fn page(items: usize) -> String {
    let rows: String = (0..items)
        .map(|i| format!("<li class=\"row\"><span>{}</span><a href=\"/item/{}\">open</a></li>", i, i))
        .collect();
    format!(
        "<html><head><title>Bench</title></head><body><div><ul>{}</ul></div></body></html>",
        rows
    )
}

/// Parsing and serialising documents of growing size
fn benchmark_documents(c: &mut Criterion) {
    let mut group = c.benchmark_group("documents");

    for items in [10, 100, 1000] {
        let html = page(items);
        group.bench_with_input(BenchmarkId::new("parse", items), &html, |b, html| {
            b.iter(|| HtmlParser::new().parse(black_box(html)))
        });

        let document = HtmlParser::new().parse(&html).unwrap();
        let root = document.document_element().unwrap();
        group.bench_with_input(BenchmarkId::new("outer_html", items), root, |b, root| {
            b.iter(|| outer_html(black_box(root)))
        });

        let source = outer_html(root);
        group.bench_with_input(BenchmarkId::new("format_html", items), &source, |b, source| {
            b.iter(|| format_html(black_box(source)))
        });
    }

    group.finish();
}

/// Path computation for the deepest, last element of a large list
fn benchmark_structural_path(c: &mut Criterion) {
    let document = HtmlParser::new().parse(&page(1000)).unwrap();
    let target = document
        .elements()
        .into_iter()
        .map(|(_, n)| n)
        .filter(|n| n.has_tag("a"))
        .last()
        .unwrap()
        .id;

    c.bench_function("structural_path", |b| {
        b.iter(|| structural_path(black_box(&document), black_box(target)))
    });
}

fn benchmark_protocol(c: &mut Criterion) {
    let command = HostMessage::ConsoleCommand {
        id: 7,
        code: "document.querySelectorAll('li').length".to_string(),
    };
    let envelope = encode(&AgentMessage::ConsoleResult {
        id: 7,
        result: "1000".to_string(),
    })
    .unwrap();

    let mut group = c.benchmark_group("protocol");
    group.bench_function("encode_command", |b| b.iter(|| encode(black_box(&command))));
    group.bench_function("decode_result", |b| {
        b.iter(|| decode::<AgentMessage>(black_box(&envelope)))
    });
    group.finish();
}

/// Submit, pump both sides, settle
fn benchmark_console_roundtrip(c: &mut Criterion) {
    let loader = StaticLoader::new()
        .with_page("https://bench.test/", &page(10))
        .unwrap();
    let mut host = Host::with_loader(loader);
    host.open("bench.test").unwrap();

    c.bench_function("console_roundtrip", |b| {
        b.iter(|| {
            host.run_console_code(black_box("6 * 7")).unwrap();
            host.tick();
        })
    });
}

criterion_group!(
    benches,
    benchmark_documents,
    benchmark_structural_path,
    benchmark_protocol,
    benchmark_console_roundtrip
);
criterion_main!(benches);
