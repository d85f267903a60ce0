//! OBO 本体文件解析。
//!
//! 文件由 `[Term]` / `[Typedef]` / `[Instance]` 头行分段；第一个头行之前的
//! 内容为文件头（format-version、data-version 等）。只有 `[Term]` 段产生 term。

use std::io::BufRead;

use tracing::{debug, info, warn};

use super::{LineReader, Parsed};
use crate::error::{Result, SkippedRecord};
use crate::ontology::{is_go_id, Ontology, Term};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StanzaKind {
    Header,
    Term,
    Typedef,
    Instance,
    Other(String),
}

impl StanzaKind {
    fn from_header(name: &str) -> Self {
        match name {
            "Term" => StanzaKind::Term,
            "Typedef" => StanzaKind::Typedef,
            "Instance" => StanzaKind::Instance,
            other => StanzaKind::Other(other.to_string()),
        }
    }
}

/// `tag: value` 行，附带行号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagValue {
    pub tag: String,
    pub value: String,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct Stanza {
    pub kind: StanzaKind,
    /// 头行所在行号；文件头为 1
    pub line: usize,
    pub tags: Vec<TagValue>,
}

impl Stanza {
    pub fn values<'s>(&'s self, tag: &'s str) -> impl Iterator<Item = &'s TagValue> + 's {
        self.tags.iter().filter(move |tv| tv.tag == tag)
    }

    pub fn first(&self, tag: &str) -> Option<&str> {
        self.tags.iter().find(|tv| tv.tag == tag).map(|tv| tv.value.as_str())
    }
}

pub struct OboReader<R: BufRead> {
    lines: LineReader<R>,
    skipped: Vec<SkippedRecord>,
    done: bool,
    started: bool,
    peek_header: Option<(StanzaKind, usize)>,
}

impl<R: BufRead> OboReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: LineReader::new(reader),
            skipped: Vec::new(),
            done: false,
            started: false,
            peek_header: None,
        }
    }

    /// 读取下一段。文件头（若非空）作为第一段返回。
    pub fn next_stanza(&mut self) -> Result<Option<Stanza>> {
        if self.done && self.peek_header.is_none() {
            return Ok(None);
        }

        let (kind, line) = match self.peek_header.take() {
            Some(h) => h,
            None if !self.started => (StanzaKind::Header, 1),
            None => return Ok(None),
        };
        self.started = true;

        let mut tags = Vec::new();
        loop {
            let (line_no, text) = match self.lines.next_line()? {
                Some((n, Ok(t))) => (n, t.trim()),
                Some((_, Err(s))) => {
                    self.skipped.push(s);
                    continue;
                }
                None => {
                    self.done = true;
                    break;
                }
            };
            if text.is_empty() || text.starts_with('!') {
                continue;
            }
            if let Some(name) = text.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                self.peek_header = Some((StanzaKind::from_header(name.trim()), line_no));
                break;
            }
            match text.split_once(':') {
                Some((tag, value)) => tags.push(TagValue {
                    tag: tag.trim().to_string(),
                    value: value.trim().to_string(),
                    line: line_no,
                }),
                None => debug!(line = line_no, "ignoring line without tag"),
            }
        }

        if kind == StanzaKind::Header && tags.is_empty() && self.peek_header.is_some() {
            // 空文件头，直接进入第一段
            return self.next_stanza();
        }
        if kind == StanzaKind::Header && tags.is_empty() && self.done {
            return Ok(None);
        }
        Ok(Some(Stanza { kind, line, tags }))
    }

    /// 取出迄今因非 UTF-8 而跳过的行
    pub fn take_skipped(&mut self) -> Vec<SkippedRecord> {
        std::mem::take(&mut self.skipped)
    }
}

/// is_a 值的第一个 token 为父节点 id，其后的 `! 注释` 与限定符丢弃
fn parent_of(value: &str) -> &str {
    value.split_whitespace().next().unwrap_or("")
}

fn term_from_stanza(stanza: &Stanza, skipped: &mut Vec<SkippedRecord>) -> Option<Term> {
    let ids: Vec<&TagValue> = stanza.values("id").collect();
    let id = match ids.as_slice() {
        [] => {
            skipped.push(SkippedRecord::new(stanza.line, "[Term] stanza without id"));
            return None;
        }
        [one] => one,
        [_, dup, ..] => {
            skipped.push(SkippedRecord::new(dup.line, "[Term] stanza with more than one id"));
            return None;
        }
    };
    // id 行可能也带有尾随注释
    let id_value = parent_of(&id.value);
    if !is_go_id(id_value) {
        skipped.push(SkippedRecord::new(id.line, format!("invalid GO id '{}'", id.value)));
        return None;
    }

    let mut term = Term::new(id_value);
    term.name = stanza.first("name").map(str::to_string);
    term.namespace = stanza.first("namespace").map(str::to_string);
    term.obsolete = stanza.first("is_obsolete") == Some("true");
    for tv in stanza.values("is_a") {
        let parent = parent_of(&tv.value);
        if is_go_id(parent) {
            term.parents.insert(parent.to_string());
        } else {
            skipped.push(SkippedRecord::new(tv.line, format!("invalid is_a parent '{}'", tv.value)));
        }
    }
    Some(term)
}

/// 解析完整 OBO 文件。格式错误的 `[Term]` 段被跳过并记录，不会中断解析。
pub fn parse_ontology<R: BufRead>(reader: R) -> Result<Parsed<Ontology>> {
    let mut r = OboReader::new(reader);
    let mut onto = Ontology::new();
    let mut skipped = Vec::new();
    let mut n_other = 0usize;

    while let Some(stanza) = r.next_stanza()? {
        match stanza.kind {
            StanzaKind::Header => {
                let meta = onto.meta_mut();
                meta.format_version = stanza.first("format-version").map(str::to_string);
                meta.data_version = stanza.first("data-version").map(str::to_string);
            }
            StanzaKind::Term => {
                if let Some(term) = term_from_stanza(&stanza, &mut skipped) {
                    let id = term.id.clone();
                    if !onto.insert(term) {
                        skipped.push(SkippedRecord::new(stanza.line, format!("duplicate term id '{}'", id)));
                    }
                }
            }
            _ => {
                n_other += 1;
                debug!(line = stanza.line, kind = ?stanza.kind, "skipping non-term stanza");
            }
        }
    }

    skipped.extend(r.take_skipped());
    skipped.sort_by_key(|s| s.line);
    for s in &skipped {
        warn!(line = s.line, reason = %s.reason, "skipped ontology record");
    }
    info!(
        terms = onto.len(),
        obsolete = onto.terms().filter(|t| t.obsolete).count(),
        namespaces = ?onto.namespace_counts(),
        other_stanzas = n_other,
        skipped = skipped.len(),
        "ontology parsed"
    );
    Ok(Parsed { value: onto, skipped })
}
