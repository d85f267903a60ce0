//! 差异表达注释报告：表达矩阵 + BLAST 最佳命中 + GAF + GO term 名称。
//!
//! 每个矩阵行（保持输入顺序）输出其对应蛋白的所有 GO term，第一行带 transcript、
//! 蛋白与表达值，之后的行把这些列留空：
//!
//! ```text
//! c0_g1_i1<TAB>P34230<TAB>1.2<TAB>-0.5<TAB>GO:0005777<TAB>peroxisome
//! <TAB><TAB><TAB><TAB>GO:0015910<TAB>long-chain fatty acid import into peroxisome
//! ```
//!
//! 没有 BLAST 命中、没有 GO 注释或 term 不在本体中时，对应列写 [`NO_MATCH`]。

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::io::blast;
use crate::io::gaf::{self, Associations};
use crate::io::matrix::{self, Matrix};
use crate::ontology::Ontology;

pub const NO_MATCH: &str = "NA";

#[derive(Debug, Clone, Copy)]
pub struct ExpressionOpt {
    /// BLAST 命中的最低同一性（严格大于）
    pub min_identity: f64,
}

impl Default for ExpressionOpt {
    fn default() -> Self {
        Self { min_identity: 95.0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpressionSummary {
    pub transcripts: usize,
    pub matched: usize,
    pub annotated: usize,
    pub rows: usize,
}

pub fn write_expression_report<W: Write + ?Sized>(
    matrix: &Matrix,
    best_hits: &HashMap<String, String>,
    associations: &Associations,
    ontology: &Ontology,
    out: &mut W,
) -> Result<ExpressionSummary> {
    let no_terms = [NO_MATCH.to_string()];
    let mut summary = ExpressionSummary { transcripts: matrix.rows.len(), ..Default::default() };
    // transcript、蛋白、表达值各占一列
    let blank = "\t".repeat(2 + matrix.conditions.len());

    for row in &matrix.rows {
        let protein = best_hits.get(&row.transcript).map(String::as_str);
        if protein.is_some() {
            summary.matched += 1;
        }
        let terms: Vec<&String> = match protein.and_then(|p| associations.terms(p)) {
            Some(ts) => {
                summary.annotated += 1;
                ts.iter().collect()
            }
            None => no_terms.iter().collect(),
        };

        for (i, go_id) in terms.into_iter().enumerate() {
            let name = ontology.name(go_id).unwrap_or(NO_MATCH);
            if i == 0 {
                write!(out, "{}\t{}", row.transcript, protein.unwrap_or(NO_MATCH))?;
                for v in &row.values {
                    write!(out, "\t{}", v)?;
                }
                writeln!(out, "\t{}\t{}", go_id, name)?;
            } else {
                writeln!(out, "{}{}\t{}", blank, go_id, name)?;
            }
            summary.rows += 1;
        }
    }
    out.flush()?;
    Ok(summary)
}

pub struct AnnotateInputs<'p> {
    pub blast: &'p Path,
    pub gaf: &'p Path,
    pub ontology: &'p Path,
    pub matrix: &'p Path,
}

pub fn run_annotate(inputs: &AnnotateInputs<'_>, out_path: Option<&Path>, opt: ExpressionOpt) -> Result<ExpressionSummary> {
    let hits = blast::parse_hits(crate::io::open(inputs.blast)?)?.value;
    let best = blast::best_hits(&hits, opt.min_identity);
    info!(transcripts = best.len(), min_identity = opt.min_identity, "best BLAST hits selected");

    let associations = gaf::parse_associations(crate::io::open(inputs.gaf)?)?.value;
    let ontology = crate::io::load_ontology(inputs.ontology)?.value;
    let matrix = matrix::parse_matrix(crate::io::open(inputs.matrix)?)?.value;

    let mut out: Box<dyn Write> = match out_path {
        Some(p) => Box::new(std::io::BufWriter::new(std::fs::File::create(p)?)),
        None => Box::new(std::io::BufWriter::new(std::io::stdout())),
    };
    let summary = write_expression_report(&matrix, &best, &associations, &ontology, &mut out)?;
    info!(
        transcripts = summary.transcripts,
        matched = summary.matched,
        annotated = summary.annotated,
        rows = summary.rows,
        "expression report written"
    );
    Ok(summary)
}
