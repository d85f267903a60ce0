//! 错误类型

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnnotError>;

#[derive(Error, Debug)]
pub enum AnnotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 单条记录无法解析（行号从 1 开始）
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// 查询的 GO term 不在本体中
    #[error("unknown GO term: {0}")]
    UnknownTerm(String),

    /// 祖先解析时发现环；`cycle` 为闭合路径（首尾相同）
    #[error("cycle detected while resolving ancestors of {term}: {}", .cycle.join(" -> "))]
    CyclicOntology { term: String, cycle: Vec<String> },

    #[error("ontology snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),
}

/// 解析时跳过的记录，随结果一并返回给调用方
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub line: usize,
    pub reason: String,
}

impl SkippedRecord {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self { line, reason: reason.into() }
    }
}

impl From<SkippedRecord> for AnnotError {
    fn from(s: SkippedRecord) -> Self {
        AnnotError::MalformedRecord { line: s.line, reason: s.reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_lists_path() {
        let e = AnnotError::CyclicOntology {
            term: "GO:3".to_string(),
            cycle: vec!["GO:1".into(), "GO:2".into(), "GO:1".into()],
        };
        assert_eq!(
            e.to_string(),
            "cycle detected while resolving ancestors of GO:3: GO:1 -> GO:2 -> GO:1"
        );
    }

    #[test]
    fn skipped_record_converts_to_malformed() {
        let e: AnnotError = SkippedRecord::new(7, "missing id").into();
        assert!(matches!(e, AnnotError::MalformedRecord { line: 7, .. }));
        assert_eq!(e.to_string(), "malformed record at line 7: missing id");
    }
}
