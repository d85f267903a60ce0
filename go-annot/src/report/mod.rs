//! 蛋白 / GO term / 祖先 三列报告。
//!
//! 蛋白按字典序输出，每个蛋白的 GO term 按字典序输出，每个 term 的祖先按字典序输出：
//!
//! ```text
//! P1<TAB>GO:2<TAB>GO:1
//! <TAB>GO:4<TAB>GO:1
//! <TAB><TAB>GO:2
//! <TAB><TAB>GO:3
//! ```
//!
//! 根节点 term 输出一行，祖先列为空；本体中不存在的 term 输出一行，祖先列为
//! [`UNKNOWN_TERM_MARKER`]。

pub mod expression;

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use tracing::{error, info, warn};

use crate::error::{AnnotError, Result};
use crate::io::gaf::{self, Associations};
use crate::ontology::ancestors::AncestorResolver;
use crate::ontology::Ontology;

pub const UNKNOWN_TERM_MARKER: &str = "UNKNOWN_TERM";

#[derive(Debug, Clone)]
pub struct ReportOpt {
    /// 未知 term 的祖先列占位符
    pub unknown_marker: String,
}

impl Default for ReportOpt {
    fn default() -> Self {
        Self { unknown_marker: UNKNOWN_TERM_MARKER.to_string() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AncestorCell<'a> {
    Term(&'a str),
    /// 已知的根节点，没有祖先
    Root,
    /// term 不在本体中
    Unknown,
}

/// 报告中的一行；`None` 表示该列留空
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRow<'a> {
    pub protein: Option<&'a str>,
    pub term: Option<&'a str>,
    pub ancestor: AncestorCell<'a>,
}

impl ReportRow<'_> {
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W, opt: &ReportOpt) -> std::io::Result<()> {
        let ancestor = match self.ancestor {
            AncestorCell::Term(a) => a,
            AncestorCell::Root => "",
            AncestorCell::Unknown => opt.unknown_marker.as_str(),
        };
        writeln!(w, "{}\t{}\t{}", self.protein.unwrap_or(""), self.term.unwrap_or(""), ancestor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub proteins: usize,
    pub annotations: usize,
    pub rows: usize,
    /// 没有祖先的已知 term 出现次数
    pub root_terms: usize,
    pub unknown_terms: BTreeSet<String>,
    /// 被注释引用、但在本体中标记为 `is_obsolete` 的 term
    pub obsolete_terms: BTreeSet<String>,
}

pub struct ReportBuilder<'a> {
    ontology: &'a Ontology,
    associations: &'a Associations,
    opt: ReportOpt,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(ontology: &'a Ontology, associations: &'a Associations, opt: ReportOpt) -> Self {
        Self { ontology, associations, opt }
    }

    /// 按输出顺序逐行回调。遇到环时中止并返回 [`AnnotError::CyclicOntology`]。
    pub fn for_each_row<F>(&self, mut f: F) -> Result<ReportSummary>
    where
        F: FnMut(ReportRow<'a>) -> Result<()>,
    {
        let assoc: &'a Associations = self.associations;
        let mut resolver = AncestorResolver::new(self.ontology);
        let mut summary = ReportSummary {
            proteins: assoc.proteins(),
            annotations: assoc.annotations(),
            ..Default::default()
        };

        for (protein, terms) in assoc.iter() {
            let mut protein_cell = Some(protein);
            for term in terms {
                let term = term.as_str();
                let obsolete = self.ontology.get(term).is_some_and(|t| t.obsolete);
                if obsolete && summary.obsolete_terms.insert(term.to_string()) {
                    warn!(protein = %protein, term = %term, "GO term is marked obsolete");
                }
                match resolver.resolve(term) {
                    Ok(ancestors) if ancestors.is_empty() => {
                        summary.root_terms += 1;
                        f(ReportRow { protein: protein_cell, term: Some(term), ancestor: AncestorCell::Root })?;
                        summary.rows += 1;
                    }
                    Ok(ancestors) => {
                        let mut term_cell = Some(term);
                        for &a in ancestors {
                            f(ReportRow {
                                protein: protein_cell.take(),
                                term: term_cell.take(),
                                ancestor: AncestorCell::Term(a),
                            })?;
                            summary.rows += 1;
                        }
                    }
                    Err(AnnotError::UnknownTerm(id)) => {
                        if !summary.unknown_terms.contains(&id) {
                            warn!(protein = %protein, term = %id, "GO term not found in ontology");
                            summary.unknown_terms.insert(id);
                        }
                        f(ReportRow { protein: protein_cell, term: Some(term), ancestor: AncestorCell::Unknown })?;
                        summary.rows += 1;
                    }
                    Err(e) => {
                        error!(protein = %protein, term = %term, error = %e, "ancestor resolution failed");
                        return Err(e);
                    }
                }
                protein_cell = None;
            }
        }
        Ok(summary)
    }

    pub fn rows(&self) -> Result<(Vec<ReportRow<'a>>, ReportSummary)> {
        let mut rows = Vec::new();
        let summary = self.for_each_row(|r| {
            rows.push(r);
            Ok(())
        })?;
        Ok((rows, summary))
    }

    pub fn write<W: Write + ?Sized>(&self, out: &mut W) -> Result<ReportSummary> {
        let summary = self.for_each_row(|r| Ok(r.write_to(&mut *out, &self.opt)?))?;
        out.flush()?;
        Ok(summary)
    }
}

/// 读取本体（OBO 或快照）与 GAF，写出报告；`out_path` 为空时写到 stdout
pub fn run_report(
    ontology_path: &Path,
    gaf_path: &Path,
    out_path: Option<&Path>,
    opt: ReportOpt,
) -> Result<ReportSummary> {
    let ontology = crate::io::load_ontology(ontology_path)?.value;
    let associations = gaf::parse_associations(crate::io::open(gaf_path)?)?.value;

    let mut out: Box<dyn Write> = match out_path {
        Some(p) => Box::new(std::io::BufWriter::new(std::fs::File::create(p)?)),
        None => Box::new(std::io::BufWriter::new(std::io::stdout())),
    };
    let summary = ReportBuilder::new(&ontology, &associations, opt).write(&mut out)?;
    info!(
        proteins = summary.proteins,
        annotations = summary.annotations,
        rows = summary.rows,
        unknown_terms = summary.unknown_terms.len(),
        obsolete_terms = summary.obsolete_terms.len(),
        "report written"
    );
    Ok(summary)
}
