//! GAF（gene association file）解析：蛋白 id -> 直接注释的 GO term 集合。

use std::collections::{BTreeMap, BTreeSet};
use std::io::BufRead;

use tracing::{info, warn};

use super::{LineReader, Parsed};
use crate::error::{Result, SkippedRecord};

/// 0-based 列号
pub const PROTEIN_COL: usize = 1;
pub const GO_TERM_COL: usize = 4;

/// 蛋白 id -> GO term 集合，键与值均有序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Associations {
    map: BTreeMap<String, BTreeSet<String>>,
}

impl Associations {
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回该 (protein, term) 对是否为新增
    pub fn insert(&mut self, protein: impl Into<String>, term: impl Into<String>) -> bool {
        self.map.entry(protein.into()).or_default().insert(term.into())
    }

    pub fn terms(&self, protein: &str) -> Option<&BTreeSet<String>> {
        self.map.get(protein)
    }

    /// 按蛋白 id 字典序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.map.iter().map(|(p, ts)| (p.as_str(), ts))
    }

    pub fn proteins(&self) -> usize {
        self.map.len()
    }

    /// 去重后的 (protein, term) 对数
    pub fn annotations(&self) -> usize {
        self.map.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<P: Into<String>, T: Into<String>> FromIterator<(P, T)> for Associations {
    fn from_iter<I: IntoIterator<Item = (P, T)>>(iter: I) -> Self {
        let mut a = Associations::new();
        for (p, t) in iter {
            a.insert(p, t);
        }
        a
    }
}

fn parse_line(line: &str, line_no: usize) -> std::result::Result<(&str, &str), SkippedRecord> {
    let cols: Vec<&str> = line.split('\t').collect();
    if cols.len() <= GO_TERM_COL {
        return Err(SkippedRecord::new(
            line_no,
            format!("expected at least {} columns, found {}", GO_TERM_COL + 1, cols.len()),
        ));
    }
    let protein = cols[PROTEIN_COL].trim();
    let term = cols[GO_TERM_COL].trim();
    if protein.is_empty() {
        return Err(SkippedRecord::new(line_no, "empty protein id"));
    }
    if term.is_empty() {
        return Err(SkippedRecord::new(line_no, "empty GO term"));
    }
    Ok((protein, term))
}

/// 解析 GAF。以 `!` 开头的行与空行被忽略；列数不足的行被跳过并记录。
pub fn parse_associations<R: BufRead>(reader: R) -> Result<Parsed<Associations>> {
    let mut assoc = Associations::new();
    let mut skipped = Vec::new();
    let mut lines = LineReader::new(reader);
    let mut n_lines = 0usize;

    while let Some((line_no, text)) = lines.next_line()? {
        let parsed = text.and_then(|line| {
            if line.trim().is_empty() || line.starts_with('!') {
                return Ok(None);
            }
            parse_line(line, line_no).map(Some)
        });
        match parsed {
            Ok(None) => continue,
            Ok(Some((protein, term))) => {
                assoc.insert(protein, term);
            }
            Err(s) => {
                warn!(line = s.line, reason = %s.reason, "skipped association line");
                skipped.push(s);
            }
        }
        n_lines += 1;
    }

    info!(
        lines = n_lines,
        proteins = assoc.proteins(),
        annotations = assoc.annotations(),
        skipped = skipped.len(),
        "associations parsed"
    );
    Ok(Parsed { value: assoc, skipped })
}
