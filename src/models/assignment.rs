use crate::models::form::Form;
use std::collections::HashSet;

/// 一位参与者的测验/任务排列
///
/// 两个排列相等当且仅当表单ID序列逐位相同
#[derive(Debug, Clone)]
pub struct Permutation {
    forms: Vec<Form>,
}

impl Permutation {
    pub fn new(forms: Vec<Form>) -> Self {
        Self { forms }
    }

    pub fn forms(&self) -> &[Form] {
        &self.forms
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// 表单ID序列，作为去重索引的键
    pub fn key(&self) -> Vec<String> {
        self.forms.iter().map(|f| f.id.clone()).collect()
    }
}

impl PartialEq for Permutation {
    fn eq(&self, other: &Self) -> bool {
        self.forms.len() == other.forms.len()
            && self
                .forms
                .iter()
                .zip(&other.forms)
                .all(|(a, b)| a.id == b.id)
    }
}

impl Eq for Permutation {}

/// 互不相同的排列集合，保持插入顺序（决定参与者编号）
#[derive(Debug, Clone, Default)]
pub struct AssignmentSet {
    permutations: Vec<Permutation>,
    index: HashSet<Vec<String>>,
}

impl AssignmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入排列；已存在相同ID序列时返回 false
    pub fn insert(&mut self, permutation: Permutation) -> bool {
        if !self.index.insert(permutation.key()) {
            return false;
        }
        self.permutations.push(permutation);
        true
    }

    pub fn contains(&self, permutation: &Permutation) -> bool {
        self.index.contains(&permutation.key())
    }

    pub fn len(&self) -> usize {
        self.permutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permutations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permutation> {
        self.permutations.iter()
    }
}

impl IntoIterator for AssignmentSet {
    type Item = Permutation;
    type IntoIter = std::vec::IntoIter<Permutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.permutations.into_iter()
    }
}

/// 插入分隔表单后的完整表单序列
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionizedAssignment {
    pub forms: Vec<Form>,
}

impl SessionizedAssignment {
    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    pub fn form_ids(&self) -> Vec<&str> {
        self.forms.iter().map(|f| f.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::form::FormKind;

    fn perm(ids: &[&str]) -> Permutation {
        Permutation::new(
            ids.iter()
                .map(|id| Form::new(*id, format!("表单 {}", id), FormKind::Test))
                .collect(),
        )
    }

    #[test]
    fn test_equality_is_by_id_sequence() {
        let a = perm(&["T1", "T2", "K1"]);
        let mut b = perm(&["T1", "T2", "K1"]);
        b.forms[0].name = "另一个名字".to_string();
        assert_eq!(a, b);
        assert_ne!(a, perm(&["T2", "T1", "K1"]));
        assert_ne!(a, perm(&["T1", "T2"]));
    }

    #[test]
    fn test_set_rejects_duplicates_and_keeps_order() {
        let mut set = AssignmentSet::new();
        assert!(set.insert(perm(&["A", "B"])));
        assert!(set.insert(perm(&["B", "A"])));
        assert!(!set.insert(perm(&["A", "B"])));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&perm(&["B", "A"])));

        let keys: Vec<Vec<String>> = set.iter().map(|p| p.key()).collect();
        assert_eq!(keys, vec![vec!["A", "B"], vec!["B", "A"]]);
    }
}
