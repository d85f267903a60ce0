use std::io::BufRead;

use tracing::{info, warn};

use super::{LineReader, Parsed};
use crate::error::{AnnotError, Result, SkippedRecord};

/// 差异表达矩阵的一行：transcript + 各条件下的值（原样保留文本）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub transcript: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matrix {
    /// 条件名（不含行名列）
    pub conditions: Vec<String>,
    /// 保持输入顺序
    pub rows: Vec<Expression>,
}

/// 由表头和第一条数据行的列数确定条件名。
///
/// 表头与数据行等宽时第一列是行名列（可能为空，也可能写成 `transcript`）；
/// 否则表头只含条件名（R write.table 风格），仅去掉开头的空单元格。
fn conditions_of(header: &[String], row_width: usize) -> Vec<String> {
    if header.len() == row_width {
        header[1..].to_vec()
    } else {
        header.iter().skip_while(|h| h.is_empty()).cloned().collect()
    }
}

/// 解析 Trinity 风格的 `.matrix` 文件。第一行为表头；列数与条件数不一致的行被跳过。
pub fn parse_matrix<R: BufRead>(reader: R) -> Result<Parsed<Matrix>> {
    let mut lines = LineReader::new(reader);
    let header: Vec<String> = match lines.next_line()? {
        None => {
            return Err(AnnotError::MalformedRecord { line: 1, reason: "missing matrix header".to_string() });
        }
        Some((_, text)) => text?.split('\t').map(|h| h.trim().to_string()).collect(),
    };

    let mut conditions: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    let mut skipped = Vec::new();
    while let Some((line_no, text)) = lines.next_line()? {
        let line = match text {
            Ok(l) => l,
            Err(s) => {
                skipped.push(s);
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let cols: Vec<&str> = line.split('\t').map(str::trim).collect();
        let conditions = conditions.get_or_insert_with(|| conditions_of(&header, cols.len()));
        let (transcript, values) = (cols[0], &cols[1..]);
        if transcript.is_empty() {
            skipped.push(SkippedRecord::new(line_no, "empty transcript id"));
            continue;
        }
        if values.len() != conditions.len() {
            skipped.push(SkippedRecord::new(
                line_no,
                format!("expected {} values, found {}", conditions.len(), values.len()),
            ));
            continue;
        }
        rows.push(Expression {
            transcript: transcript.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        });
    }
    let matrix = Matrix {
        conditions: conditions.unwrap_or_else(|| conditions_of(&header, 0)),
        rows,
    };

    for s in &skipped {
        warn!(line = s.line, reason = %s.reason, "skipped matrix row");
    }
    info!(rows = matrix.rows.len(), conditions = matrix.conditions.len(), "expression matrix parsed");
    Ok(Parsed { value: matrix, skipped })
}
