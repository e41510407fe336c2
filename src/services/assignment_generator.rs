//! 排列生成服务 - 业务能力层
//!
//! 只负责"为每位参与者生成一个不重复的排列"

use crate::error::{AppError, AppResult};
use crate::models::{AssignmentSet, Form, Permutation};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use tracing::debug;

/// 排列生成器
///
/// 拒绝采样：反复均匀洗牌，已存在相同ID序列的候选直接丢弃，
/// 直到收集到足够数量的不同排列。
pub struct AssignmentGenerator {
    rng: StdRng,
}

impl AssignmentGenerator {
    /// 使用系统熵创建
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// 使用固定种子创建（结果可复现）
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map(Self::with_seed).unwrap_or_default()
    }

    /// 生成 `count` 个互不相同的排列
    ///
    /// # 参数
    /// - `catalog`: 全部测验和任务（不会被修改）
    /// - `count`: 参与者数量
    ///
    /// # 返回
    /// 超出目录可生成的排列数量时返回 `CapacityExceeded`
    pub fn generate(&mut self, catalog: &[Form], count: usize) -> AppResult<AssignmentSet> {
        let capacity = distinct_permutations(catalog);
        if (count as u128) > capacity {
            return Err(AppError::CapacityExceeded {
                requested: count,
                capacity,
            });
        }

        let mut working: Vec<Form> = catalog.to_vec();
        let mut set = AssignmentSet::new();
        let mut rejected = 0usize;

        while set.len() < count {
            working.shuffle(&mut self.rng);
            if !set.insert(Permutation::new(working.clone())) {
                rejected += 1;
            }
        }

        debug!(
            "生成 {} 个排列（目录 {} 个表单，丢弃重复候选 {} 次）",
            set.len(),
            catalog.len(),
            rejected
        );
        Ok(set)
    }
}

impl Default for AssignmentGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// 目录的不同排列数量
///
/// 按表单ID计算多重集排列数 `n! / Π(mᵢ!)`，溢出时取 `u128::MAX`
pub fn distinct_permutations(catalog: &[Form]) -> u128 {
    let mut multiplicities: HashMap<&str, u128> = HashMap::new();
    for form in catalog {
        *multiplicities.entry(form.id.as_str()).or_default() += 1;
    }

    // 逐步乘以二项式系数，保持中间结果为整数
    let mut total: u128 = 1;
    let mut placed: u128 = 0;
    for &m in multiplicities.values() {
        for k in 1..=m {
            placed += 1;
            total = match total.checked_mul(placed) {
                Some(v) => v / k,
                None => return u128::MAX,
            };
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FormKind;
    use std::collections::HashSet;

    fn catalog(ids: &[&str]) -> Vec<Form> {
        ids.iter()
            .map(|id| Form::new(*id, format!("表单 {}", id), FormKind::Test))
            .collect()
    }

    #[test]
    fn test_capacity_is_factorial() {
        assert_eq!(distinct_permutations(&catalog(&[])), 1);
        assert_eq!(distinct_permutations(&catalog(&["A"])), 1);
        assert_eq!(distinct_permutations(&catalog(&["A", "B", "C", "D"])), 24);
        assert_eq!(distinct_permutations(&catalog(&["A", "B", "C", "D", "E", "F"])), 720);
    }

    #[test]
    fn test_capacity_with_repeated_ids() {
        // 4! / 2! = 12
        assert_eq!(distinct_permutations(&catalog(&["A", "A", "B", "C"])), 12);
    }

    #[test]
    fn test_capacity_saturates() {
        let ids: Vec<String> = (0..40).map(|i| format!("F{}", i)).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        assert_eq!(distinct_permutations(&catalog(&refs)), u128::MAX);
    }

    #[test]
    fn test_generate_exhausts_small_catalog() {
        let forms = catalog(&["T1", "T2", "K1"]);
        let mut generator = AssignmentGenerator::with_seed(42);

        let set = generator.generate(&forms, 6).unwrap();
        assert_eq!(set.len(), 6);

        let keys: HashSet<Vec<String>> = set.iter().map(|p| p.key()).collect();
        assert_eq!(keys.len(), 6);
        for p in set.iter() {
            let mut ids = p.key();
            ids.sort();
            assert_eq!(ids, vec!["K1", "T1", "T2"]);
        }
    }

    #[test]
    fn test_generate_over_capacity_fails_fast() {
        let forms = catalog(&["T1", "T2", "K1"]);
        let err = AssignmentGenerator::with_seed(1)
            .generate(&forms, 7)
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::CapacityExceeded {
                requested: 7,
                capacity: 6
            }
        ));
    }

    #[test]
    fn test_generate_degenerate_catalogs() {
        let mut generator = AssignmentGenerator::with_seed(3);
        assert_eq!(generator.generate(&catalog(&["A"]), 1).unwrap().len(), 1);
        assert!(generator.generate(&catalog(&["A"]), 2).is_err());
        assert_eq!(generator.generate(&catalog(&[]), 1).unwrap().len(), 1);
        assert!(generator.generate(&catalog(&["A", "B"]), 0).unwrap().is_empty());
    }

    #[test]
    fn test_same_seed_same_assignments() {
        let forms = catalog(&["T1", "T2", "T3", "K1", "K2"]);
        let a = AssignmentGenerator::with_seed(9).generate(&forms, 10).unwrap();
        let b = AssignmentGenerator::with_seed(9).generate(&forms, 10).unwrap();

        let keys_a: Vec<Vec<String>> = a.iter().map(|p| p.key()).collect();
        let keys_b: Vec<Vec<String>> = b.iter().map(|p| p.key()).collect();
        assert_eq!(keys_a, keys_b);
    }

    #[test]
    fn test_catalog_is_not_reordered() {
        let forms = catalog(&["T1", "T2", "K1", "K2"]);
        let before = forms.clone();
        AssignmentGenerator::with_seed(5).generate(&forms, 8).unwrap();
        assert_eq!(forms, before);
    }
}
