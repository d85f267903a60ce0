//! BLAST 表格输出（`-outfmt 6`）解析。

use std::collections::HashMap;
use std::io::BufRead;

use tracing::{info, warn};

use super::{LineReader, Parsed};
use crate::error::{Result, SkippedRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct BlastHit {
    /// qseqid 中最后一个 `|` 之前的部分
    pub transcript_id: String,
    /// sseqid 中 `sp|` 之后、版本号 `.` 之前的 SwissProt accession
    pub sp_id: String,
    pub pident: f64,
}

impl BlastHit {
    pub fn parse(line: &str, line_no: usize) -> std::result::Result<Self, SkippedRecord> {
        let cols: Vec<&str> = line.split('\t').map(str::trim).collect();
        if cols.len() < 5 {
            return Err(SkippedRecord::new(line_no, format!("expected at least 5 columns, found {}", cols.len())));
        }
        let transcript_id = transcript_of(cols[0])
            .ok_or_else(|| SkippedRecord::new(line_no, format!("cannot extract transcript from '{}'", cols[0])))?;
        let sp_id = swissprot_of(cols[1])
            .ok_or_else(|| SkippedRecord::new(line_no, format!("cannot extract SwissProt id from '{}'", cols[1])))?;
        let pident: f64 = cols[2]
            .parse()
            .map_err(|_| SkippedRecord::new(line_no, format!("invalid pident '{}'", cols[2])))?;
        Ok(Self {
            transcript_id: transcript_id.to_string(),
            sp_id: sp_id.to_string(),
            pident,
        })
    }

    /// 同一性严格大于阈值
    pub fn is_good_match(&self, min_identity: f64) -> bool {
        self.pident > min_identity
    }
}

/// `c0_g1_i1|m.1` -> `c0_g1_i1`
fn transcript_of(qseqid: &str) -> Option<&str> {
    let (head, tail) = qseqid.rsplit_once('|')?;
    (!head.is_empty() && !tail.is_empty()).then_some(head)
}

/// `sp|P34230.1|PXA2_YEAST` -> `P34230`
fn swissprot_of(sseqid: &str) -> Option<&str> {
    let start = sseqid.rfind("sp|")? + 3;
    let (acc, _) = sseqid[start..].rsplit_once('.')?;
    (!acc.is_empty()).then_some(acc)
}

pub fn parse_hits<R: BufRead>(reader: R) -> Result<Parsed<Vec<BlastHit>>> {
    let mut hits = Vec::new();
    let mut skipped = Vec::new();
    let mut lines = LineReader::new(reader);

    while let Some((line_no, text)) = lines.next_line()? {
        let parsed = text.and_then(|line| {
            if line.trim().is_empty() || line.starts_with('#') {
                return Ok(None);
            }
            BlastHit::parse(line, line_no).map(Some)
        });
        match parsed {
            Ok(None) => {}
            Ok(Some(h)) => hits.push(h),
            Err(s) => {
                warn!(line = s.line, reason = %s.reason, "skipped BLAST hit");
                skipped.push(s);
            }
        }
    }

    info!(hits = hits.len(), skipped = skipped.len(), "BLAST hits parsed");
    Ok(Parsed { value: hits, skipped })
}

/// transcript -> 第一个同一性超过阈值的命中所对应的 SwissProt id
pub fn best_hits(hits: &[BlastHit], min_identity: f64) -> HashMap<String, String> {
    let mut out: HashMap<String, String> = HashMap::new();
    for h in hits.iter().filter(|h| h.is_good_match(min_identity)) {
        out.entry(h.transcript_id.clone()).or_insert_with(|| h.sp_id.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HITS: &str = "c0_g1_i1|m.1\tsp|P34230.1|PXA2_YEAST\t99.5\t200\t1\t0\t1\t200\t1\t200\t1e-100\t400\n\
c0_g1_i1|m.1\tsp|Q9XYZ1.2|OTHER_YEAST\t100.0\t200\t0\t0\t1\t200\t1\t200\t1e-100\t410\n\
c1_g1_i1|m.2\tsp|P12345.1|LOW_YEAST\t60.0\t200\t80\t0\t1\t200\t1\t200\t1e-5\t80\n";

    #[test]
    fn parse_hit_fields() {
        let h = BlastHit::parse(HITS.lines().next().unwrap(), 1).unwrap();
        assert_eq!(h.transcript_id, "c0_g1_i1");
        assert_eq!(h.sp_id, "P34230");
        assert!((h.pident - 99.5).abs() < 1e-9);
        assert!(h.is_good_match(95.0));
        assert!(!h.is_good_match(99.5));
    }

    #[test]
    fn first_good_hit_wins() {
        let p = parse_hits(Cursor::new(HITS.as_bytes())).unwrap();
        assert_eq!(p.value.len(), 3);
        let best = best_hits(&p.value, 95.0);
        assert_eq!(best.len(), 1);
        assert_eq!(best["c0_g1_i1"], "P34230");
        // 阈值升高后第一个命中不再合格
        assert_eq!(best_hits(&p.value, 99.5)["c0_g1_i1"], "Q9XYZ1");
    }

    #[test]
    fn invalid_utf8_hit_is_skipped() {
        let mut data = HITS.as_bytes().to_vec();
        data.extend_from_slice(b"c2_g1_i1|m.3\tsp|P9.1|\xffX\t99.0\t1\t0\n");
        let p = parse_hits(Cursor::new(data)).unwrap();
        assert_eq!(p.value.len(), 3);
        assert_eq!(p.skipped, vec![SkippedRecord::new(4, "invalid UTF-8")]);
    }

    #[test]
    fn malformed_hits_are_skipped() {
        let data = "nobar\tsp|P1.1|X\t99\t1\t0\n\
a|b\tP1\t99\t1\t0\n\
a|b\tsp|P1.1|X\tNaNish\t1\t0\n\
a|b\tsp|P1.1|X\t99\n";
        let p = parse_hits(Cursor::new(data.as_bytes())).unwrap();
        assert!(p.value.is_empty());
        assert_eq!(p.skipped.len(), 4);
    }
}
