pub mod blast;
pub mod gaf;
pub mod matrix;
pub mod obo;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::error::{Result, SkippedRecord};
use crate::ontology::Ontology;

/// 二进制本体快照的扩展名
pub const SNAPSHOT_EXT: &str = "goidx";

/// 解析结果：值 + 被跳过的记录
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub value: T,
    pub skipped: Vec<SkippedRecord>,
}

impl<T> Parsed<T> {
    pub fn new(value: T) -> Self {
        Self { value, skipped: Vec::new() }
    }
}

/// 逐行读取字节并校验 UTF-8。非 UTF-8 的行不中断读取，而是作为
/// [`SkippedRecord`] 交给调用方。
pub struct LineReader<R> {
    reader: R,
    buf: Vec<u8>,
    line_no: usize,
}

/// 一行输入：行号（从 1 开始）+ 去掉行尾的文本
pub type Line<'b> = (usize, std::result::Result<&'b str, SkippedRecord>);

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, buf: Vec::new(), line_no: 0 }
    }

    pub fn next_line(&mut self) -> Result<Option<Line<'_>>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        let text = match std::str::from_utf8(&self.buf) {
            Ok(s) => Ok(s.trim_end_matches(['\n', '\r'])),
            Err(_) => Err(SkippedRecord::new(self.line_no, "invalid UTF-8")),
        };
        Ok(Some((self.line_no, text)))
    }
}

pub fn open(path: impl AsRef<Path>) -> Result<BufReader<File>> {
    let fh = File::open(path)?;
    Ok(BufReader::new(fh))
}

/// 按扩展名加载本体：`.goidx` 为快照，其余按 OBO 文本解析
pub fn load_ontology(path: impl AsRef<Path>) -> Result<Parsed<Ontology>> {
    let path = path.as_ref();
    let is_snapshot = path.extension().is_some_and(|e| e == SNAPSHOT_EXT);
    if is_snapshot {
        let onto = Ontology::load_from_file(path)?;
        info!(path = %path.display(), terms = onto.len(), "ontology snapshot loaded");
        return Ok(Parsed::new(onto));
    }
    let mut parsed = obo::parse_ontology(open(path)?)?;
    parsed.value.meta_mut().source_file = Some(path.display().to_string());
    Ok(parsed)
}
