use std::collections::{btree_set, BTreeSet, HashMap, HashSet};

use tracing::{trace, warn};

use super::Ontology;
use crate::error::{AnnotError, Result};

/// 某个 term 的全部严格祖先（不含自身），按字典序
pub type AncestorSet<'a> = BTreeSet<&'a str>;

/// 带记忆化的祖先解析器。
///
/// 沿 is_a 边做深度优先遍历，使用显式栈而非递归；每个被访问到的 term 的
/// 祖先集合在回溯时写入缓存，之后的查询直接复用。缓存只属于当前解析器，
/// 生命周期与一次报告生成相同。
///
/// 环处理策略：检测并拒绝。遍历中若再次进入仍在当前路径上的 term，返回
/// [`AnnotError::CyclicOntology`]，本次遍历的中间结果不写入缓存。
pub struct AncestorResolver<'a> {
    ontology: &'a Ontology,
    cache: HashMap<&'a str, AncestorSet<'a>>,
    /// 被 is_a 引用但本体中不存在的父节点
    dangling: HashSet<&'a str>,
}

impl<'a> AncestorResolver<'a> {
    pub fn new(ontology: &'a Ontology) -> Self {
        Self {
            ontology,
            cache: HashMap::new(),
            dangling: HashSet::new(),
        }
    }

    /// 返回 `id` 的全部祖先。
    ///
    /// 未知 term 返回 [`AnnotError::UnknownTerm`]，与“已知但没有祖先”的根节点
    /// （返回空集合）区分开。
    pub fn resolve(&mut self, id: &str) -> Result<&AncestorSet<'a>> {
        let onto = self.ontology;
        let term = onto
            .get(id)
            .ok_or_else(|| AnnotError::UnknownTerm(id.to_string()))?;
        let key = term.id.as_str();
        if !self.cache.contains_key(key) {
            self.fill(key)?;
        }
        Ok(&self.cache[key])
    }

    /// 已缓存祖先集合的 term 数
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// 至今遇到的悬空父节点
    pub fn dangling(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.dangling.iter().copied()
    }

    fn fill(&mut self, root: &'a str) -> Result<()> {
        let onto = self.ontology;
        let mut on_path: HashSet<&'a str> = HashSet::new();
        let mut stack: Vec<(&'a str, btree_set::Iter<'a, String>)> = Vec::new();

        if let Some(parents) = onto.parents(root) {
            on_path.insert(root);
            stack.push((root, parents.iter()));
        }

        while let Some((term, pending)) = stack.last_mut() {
            let term = *term;
            match pending.next() {
                Some(parent) => {
                    let parent = parent.as_str();
                    if self.cache.contains_key(parent) {
                        continue;
                    }
                    if on_path.contains(parent) {
                        let mut cycle: Vec<String> = stack
                            .iter()
                            .skip_while(|(t, _)| *t != parent)
                            .map(|(t, _)| t.to_string())
                            .collect();
                        cycle.push(parent.to_string());
                        return Err(AnnotError::CyclicOntology { term: root.to_string(), cycle });
                    }
                    match onto.parents(parent) {
                        Some(grand) => {
                            on_path.insert(parent);
                            stack.push((parent, grand.iter()));
                        }
                        None => {
                            if self.dangling.insert(parent) {
                                warn!(term = %term, parent = %parent, "is_a parent not present in ontology");
                            }
                        }
                    }
                }
                None => {
                    // 所有父节点都已解析完毕，合并它们的祖先
                    let mut set = AncestorSet::new();
                    if let Some(parents) = onto.parents(term) {
                        for p in parents {
                            set.insert(p.as_str());
                            if let Some(up) = self.cache.get(p.as_str()) {
                                set.extend(up.iter().copied());
                            }
                        }
                    }
                    trace!(term = %term, ancestors = set.len(), "cached");
                    on_path.remove(term);
                    stack.pop();
                    self.cache.insert(term, set);
                }
            }
        }
        Ok(())
    }
}

/// 一次性查询，返回拥有所有权的集合
pub fn all_ancestors(ontology: &Ontology, id: &str) -> Result<BTreeSet<String>> {
    let mut resolver = AncestorResolver::new(ontology);
    let set = resolver.resolve(id)?;
    Ok(set.iter().map(|s| s.to_string()).collect())
}
