use std::fs;
use std::io::Cursor;
use std::path::Path;

use proptest::prelude::*;

use go_annot::io::{self, gaf, obo};
use go_annot::ontology::ancestors::all_ancestors;
use go_annot::report::expression::{self, AnnotateInputs, ExpressionOpt};
use go_annot::report::{self, ReportBuilder, ReportOpt};

const OBO: &str = "format-version: 1.2
data-version: releases/2019-10-07

[Term]
id: GO:0000001
name: root process
namespace: biological_process

[Term]
id: GO:0000002
name: left branch
is_a: GO:0000001 ! root process

[Term]
id: GO:0000003
name: right branch
is_a: GO:0000001 ! root process

[Term]
id: GO:0000004
name: leaf
is_a: GO:0000002 ! left branch
is_a: GO:0000003 ! right branch

[Term]
name: stanza without id
is_a: GO:0000001 ! root process

[Typedef]
id: part_of
name: part of
";

const GAF: &str = "!gaf-version: 2.1
UniProtKB\tP2\tGENE2\t\tGO:0000002\tPMID:1\tIDA
UniProtKB\tP1\tGENE1\t\tGO:0000004\tPMID:1\tIDA
UniProtKB\tP1\tGENE1\t\tGO:0000999\tPMID:1\tIEA
UniProtKB\tP1\tGENE1\t\tGO:0000004\tPMID:2\tIMP
UniProtKB\tP3\tGENE3\t\tGO:0000001\tPMID:1\tIDA
";

const EXPECTED: &str = "P1\tGO:0000004\tGO:0000001
\t\tGO:0000002
\t\tGO:0000003
\tGO:0000999\tUNKNOWN_TERM
P2\tGO:0000002\tGO:0000001
P3\tGO:0000001\t
";

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let p = dir.join(name);
    fs::write(&p, content).unwrap();
    p
}

fn render(gaf_text: &str) -> String {
    let onto = obo::parse_ontology(Cursor::new(OBO.as_bytes())).unwrap().value;
    let assoc = gaf::parse_associations(Cursor::new(gaf_text.as_bytes())).unwrap().value;
    let mut out = Vec::new();
    ReportBuilder::new(&onto, &assoc, ReportOpt::default()).write(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn ontology_skips_stanza_without_id() {
    let parsed = obo::parse_ontology(Cursor::new(OBO.as_bytes())).unwrap();
    assert_eq!(parsed.value.len(), 4);
    assert_eq!(parsed.skipped.len(), 1);
    let leaf = all_ancestors(&parsed.value, "GO:0000004").unwrap();
    assert_eq!(leaf.into_iter().collect::<Vec<_>>(), vec!["GO:0000001", "GO:0000002", "GO:0000003"]);
}

#[test]
fn report_from_files_matches_expected() {
    let dir = tempfile::tempdir().unwrap();
    let obo_path = write(dir.path(), "go-basic.obo", OBO);
    let gaf_path = write(dir.path(), "assoc.gaf", GAF);
    let out_path = dir.path().join("results.tsv");

    let summary = report::run_report(&obo_path, &gaf_path, Some(out_path.as_path()), ReportOpt::default()).unwrap();
    assert_eq!(fs::read_to_string(&out_path).unwrap(), EXPECTED);
    assert_eq!(summary.proteins, 3);
    assert_eq!(summary.unknown_terms.len(), 1);
}

#[test]
fn report_from_snapshot_matches_obo() {
    let dir = tempfile::tempdir().unwrap();
    let obo_path = write(dir.path(), "go-basic.obo", OBO);
    let gaf_path = write(dir.path(), "assoc.gaf", GAF);
    let snap_path = dir.path().join("go.goidx");
    io::load_ontology(&obo_path).unwrap().value.save_to_file(&snap_path).unwrap();

    let out_path = dir.path().join("from_snapshot.tsv");
    report::run_report(&snap_path, &gaf_path, Some(out_path.as_path()), ReportOpt::default()).unwrap();
    assert_eq!(fs::read_to_string(&out_path).unwrap(), EXPECTED);
}

#[test]
fn missing_input_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let gaf_path = write(dir.path(), "assoc.gaf", GAF);
    let err = report::run_report(&dir.path().join("absent.obo"), &gaf_path, None, ReportOpt::default()).unwrap_err();
    assert!(matches!(err, go_annot::error::AnnotError::Io(_)));
}

#[test]
fn report_is_byte_identical_across_runs() {
    assert_eq!(render(GAF), render(GAF));
    assert_eq!(render(GAF), EXPECTED);
}

proptest! {
    #[test]
    fn report_ignores_association_line_order(seed in any::<u64>()) {
        let mut lines: Vec<&str> = GAF.lines().collect();
        // 确定性洗牌
        let mut x = seed;
        for i in (1..lines.len()).rev() {
            x = x.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            let j = (x >> 33) as usize % (i + 1);
            lines.swap(i, j);
        }
        let shuffled = lines.join("\n") + "\n";
        prop_assert_eq!(render(&shuffled), EXPECTED);
    }
}

#[test]
fn expression_annotation_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let blast = write(
        dir.path(),
        "blastp.outfmt6",
        "c0_g1_i1|m.1\tsp|P1.1|GENE1_HUMAN\t99.8\t200\t0\t0\t1\t200\t1\t200\t1e-100\t400\n\
c1_g1_i1|m.2\tsp|P2.3|GENE2_HUMAN\t80.0\t200\t40\t0\t1\t200\t1\t200\t1e-20\t100\n",
    );
    let matrix = write(dir.path(), "diffExpr.matrix", "\tsp_ds\tsp_hs\nc0_g1_i1\t1.5\t-2.0\nc1_g1_i1\t0.1\t0.2\n");
    let obo_path = write(dir.path(), "go-basic.obo", OBO);
    let gaf_path = write(dir.path(), "assoc.gaf", GAF);
    let out = dir.path().join("report.tsv");

    let inputs = AnnotateInputs { blast: &blast, gaf: &gaf_path, ontology: &obo_path, matrix: &matrix };
    let summary = expression::run_annotate(&inputs, Some(out.as_path()), ExpressionOpt::default()).unwrap();
    let text = fs::read_to_string(&out).unwrap();
    assert_eq!(
        text,
        "c0_g1_i1\tP1\t1.5\t-2.0\tGO:0000004\tleaf\n\
\t\t\t\tGO:0000999\tNA\n\
c1_g1_i1\tNA\t0.1\t0.2\tNA\tNA\n"
    );
    assert_eq!(summary.matched, 1);
}
