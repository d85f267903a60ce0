use criterion::{black_box, criterion_group, criterion_main, Criterion};

use go_annot::io::gaf::Associations;
use go_annot::io::obo;
use go_annot::ontology::ancestors::AncestorResolver;
use go_annot::ontology::Ontology;
use go_annot::report::{ReportBuilder, ReportOpt};

/// 分层 DAG：每层 `width` 个 term，每个 term 有 `fan` 个来自上一层的父节点
fn make_ontology(levels: usize, width: usize, fan: usize) -> Ontology {
    let id = |l: usize, i: usize| format!("GO:{:07}", l * width + i);
    let mut x: u32 = 42;
    let mut edges: Vec<(String, Vec<String>)> = Vec::with_capacity(levels * width);
    for l in 0..levels {
        for i in 0..width {
            let mut parents = Vec::new();
            if l > 0 {
                for _ in 0..fan {
                    x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                    parents.push(id(l - 1, (x >> 16) as usize % width));
                }
            }
            edges.push((id(l, i), parents));
        }
    }
    Ontology::from_edges(
        edges
            .iter()
            .map(|(t, ps)| (t.as_str(), ps.iter().map(String::as_str))),
    )
}

fn make_obo(terms: usize) -> String {
    let mut s = String::from("format-version: 1.2\n\n");
    for i in 0..terms {
        s.push_str(&format!("[Term]\nid: GO:{:07}\nname: term {}\nnamespace: biological_process\n", i, i));
        if i > 0 {
            s.push_str(&format!("is_a: GO:{:07} ! parent\n", i / 2));
        }
        s.push('\n');
    }
    s
}

fn bench_resolve_all(c: &mut Criterion) {
    let onto = make_ontology(15, 400, 3);
    let ids: Vec<String> = onto.terms().map(|t| t.id.clone()).collect();

    c.bench_function("resolve_all_6000_terms", |b| {
        b.iter(|| {
            let mut r = AncestorResolver::new(&onto);
            for id in &ids {
                black_box(r.resolve(id).map(|s| s.len()).unwrap_or(0));
            }
        })
    });
}

fn bench_report(c: &mut Criterion) {
    let onto = make_ontology(12, 300, 2);
    let ids: Vec<String> = onto.terms().map(|t| t.id.clone()).collect();
    let assoc: Associations = (0..2_000)
        .map(|p| (format!("P{:05}", p), ids[(p * 7919) % ids.len()].clone()))
        .collect();

    c.bench_function("report_2000_proteins", |b| {
        b.iter(|| {
            let mut out = Vec::new();
            ReportBuilder::new(&onto, &assoc, ReportOpt::default()).write(&mut out).unwrap();
            black_box(out.len());
        })
    });
}

fn bench_parse_obo(c: &mut Criterion) {
    let text = make_obo(10_000);

    c.bench_function("parse_obo_10k_terms", |b| {
        b.iter(|| {
            let parsed = obo::parse_ontology(std::io::Cursor::new(black_box(text.as_bytes()))).unwrap();
            black_box(parsed.value.len());
        })
    });
}

criterion_group!(benches, bench_resolve_all, bench_report, bench_parse_obo);
criterion_main!(benches);
