pub mod ancestors;

use std::collections::{btree_map, BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// 判断是否为 `GO:` + 数字 形式的标识符（数字位数不限）
pub fn is_go_id(s: &str) -> bool {
    match s.strip_prefix("GO:") {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// 本体中的一个 term。`parents` 只记录直接 is_a 父节点。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: String,
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub parents: BTreeSet<String>,
    pub obsolete: bool,
}

impl Term {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            namespace: None,
            parents: BTreeSet::new(),
            obsolete: false,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyMeta {
    pub format_version: Option<String>,
    pub data_version: Option<String>,
    pub source_file: Option<String>,
    pub build_timestamp: Option<String>,
}

/// GO 本体：term id -> Term。构建完成后只读。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ontology {
    terms: BTreeMap<String, Term>,
    meta: OntologyMeta,
}

impl Ontology {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入 term；id 已存在时不覆盖，返回 false
    pub fn insert(&mut self, term: Term) -> bool {
        match self.terms.entry(term.id.clone()) {
            btree_map::Entry::Occupied(_) => false,
            btree_map::Entry::Vacant(v) => {
                v.insert(term);
                true
            }
        }
    }

    /// 由 (id, 直接父节点) 列表构建，主要用于测试与基准
    pub fn from_edges<'s, I, P>(edges: I) -> Self
    where
        I: IntoIterator<Item = (&'s str, P)>,
        P: IntoIterator<Item = &'s str>,
    {
        let mut onto = Self::new();
        for (id, parents) in edges {
            let mut term = Term::new(id);
            term.parents = parents.into_iter().map(str::to_string).collect();
            onto.insert(term);
        }
        onto
    }

    pub fn get(&self, id: &str) -> Option<&Term> {
        self.terms.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.terms.contains_key(id)
    }

    /// 直接父节点；未知 term 返回 None
    pub fn parents(&self, id: &str) -> Option<&BTreeSet<String>> {
        self.terms.get(id).map(|t| &t.parents)
    }

    pub fn name(&self, id: &str) -> Option<&str> {
        self.terms.get(id).and_then(|t| t.name.as_deref())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// 各 namespace 下的 term 数；没有 namespace 的 term 不计入
    pub fn namespace_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for ns in self.terms.values().filter_map(|t| t.namespace.as_deref()) {
            *counts.entry(ns).or_insert(0) += 1;
        }
        counts
    }

    /// 按 id 字典序遍历
    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        self.terms.values()
    }

    pub fn meta(&self) -> &OntologyMeta {
        &self.meta
    }

    pub fn set_meta(&mut self, meta: OntologyMeta) {
        self.meta = meta;
    }

    pub fn meta_mut(&mut self) -> &mut OntologyMeta {
        &mut self.meta
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let f = std::fs::File::create(path)?;
        let mut w = std::io::BufWriter::new(f);
        bincode::serialize_into(&mut w, self)?;
        w.flush()?;
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let f = std::fs::File::open(path)?;
        let onto: Self = bincode::deserialize_from(std::io::BufReader::new(f))?;
        Ok(onto)
    }
}
