//! 题目合并服务 - 业务能力层
//!
//! 把一位参与者序列中所有源表单的题目合并成一个合成表单的题目列表。
//!
//! ## 合并规则
//!
//! - `qid` 改写为 `源表单ID-原qid`，不同源表单之间不会冲突
//! - 同一表单在序列中再次出现时（如每个会话的休息表单），`qid` 追加出现次数：`源表单ID-原qid-2`
//! - 序列第一个表单的 `order` 原样保留
//! - 其余表单的 `order` 加上此前已合并的题目数量（偏移量）
//! - 每合并完一个表单，偏移量增加该表单的题目数量
//! - 获取失败或题目数据不完整的表单整体跳过，不计入偏移量

use crate::error::AppResult;
use crate::models::{CompositeQuestionList, Question, QuestionAttributes, SessionizedAssignment};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use tracing::{debug, warn};

/// 被跳过的源表单
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOmission {
    /// 在序列中的位置（从 0 开始）
    pub position: usize,
    pub form_id: String,
    pub reason: String,
}

impl fmt::Display for MergeOmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "位置 {} 的表单 {} 已跳过: {}",
            self.position, self.form_id, self.reason
        )
    }
}

/// 合并结果
#[derive(Debug, Clone, Default)]
pub struct Synthesis {
    pub questions: CompositeQuestionList,
    pub omissions: Vec<MergeOmission>,
}

impl Synthesis {
    pub fn is_partial(&self) -> bool {
        !self.omissions.is_empty()
    }
}

/// 合并累加器
///
/// 偏移量只存在于一次合并过程中，不跨调用共享
#[derive(Debug, Default)]
pub struct MergeAccumulator {
    offset: i64,
    /// 每个源表单已合并的次数
    occurrences: HashMap<String, usize>,
    questions: Vec<QuestionAttributes>,
    omissions: Vec<MergeOmission>,
}

impl MergeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 合并一个源表单的全部题目
    ///
    /// 任何一道题数据不完整时整个表单都不合并，记为跳过
    pub fn push_form(&mut self, position: usize, form_id: &str, questions: Vec<Question>) {
        let count = questions.len() as i64;
        let occurrence = self.occurrences.get(form_id).copied().unwrap_or(0) + 1;
        let merged: Result<Vec<_>, String> = questions
            .into_iter()
            .map(|q| self.rewrite(position, occurrence, form_id, q))
            .collect();

        match merged {
            Ok(merged) => {
                debug!(
                    "合并表单 {} (位置 {}, 第 {} 次): {} 道题，偏移量 {}",
                    form_id, position, occurrence, count, self.offset
                );
                self.questions.extend(merged);
                self.occurrences.insert(form_id.to_string(), occurrence);
                self.offset += count;
            }
            Err(reason) => self.omit(position, form_id, reason),
        }
    }

    /// 记录一个被跳过的表单
    pub fn omit(&mut self, position: usize, form_id: &str, reason: impl Into<String>) {
        let omission = MergeOmission {
            position,
            form_id: form_id.to_string(),
            reason: reason.into(),
        };
        warn!("⚠️ {}", omission);
        self.omissions.push(omission);
    }

    pub fn finish(self) -> Synthesis {
        Synthesis {
            questions: CompositeQuestionList {
                questions: self.questions,
            },
            omissions: self.omissions,
        }
    }

    fn rewrite(
        &self,
        position: usize,
        occurrence: usize,
        form_id: &str,
        question: Question,
    ) -> Result<QuestionAttributes, String> {
        let qid = question
            .qid()
            .ok_or_else(|| "题目缺少 qid".to_string())?;

        let new_order = if position == 0 {
            None
        } else {
            let original = question
                .order()
                .ok_or_else(|| format!("题目 {} 缺少 order", qid))?;
            let order: i64 = original
                .trim()
                .parse()
                .map_err(|_| format!("题目 {} 的 order 不是整数: '{}'", qid, original))?;
            Some(order + self.offset)
        };

        let merged_qid = if occurrence == 1 {
            format!("{}-{}", form_id, qid)
        } else {
            format!("{}-{}-{}", form_id, qid, occurrence)
        };

        let mut attributes = question.attributes;
        attributes.insert("qid".to_string(), Value::String(merged_qid));
        if let Some(order) = new_order {
            attributes.insert("order".to_string(), Value::String(order.to_string()));
        }
        Ok(attributes)
    }
}

/// 按顺序合并已经获取到的题目
pub fn merge_questions<'a>(
    sources: impl IntoIterator<Item = (&'a str, Vec<Question>)>,
) -> Synthesis {
    let mut acc = MergeAccumulator::new();
    for (position, (form_id, questions)) in sources.into_iter().enumerate() {
        acc.push_form(position, form_id, questions);
    }
    acc.finish()
}

/// 获取并合并序列中所有表单的题目
///
/// # 参数
/// - `sequence`: 参与者的完整表单序列
/// - `fetch_questions`: 按表单ID获取题目（应自带重试）
/// - `concurrency`: 同时进行的获取数量
///
/// # 返回
/// 获取失败的表单记为跳过；取消则直接返回错误
pub async fn synthesize<F, Fut>(
    sequence: &SessionizedAssignment,
    fetch_questions: F,
    concurrency: usize,
) -> AppResult<Synthesis>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = AppResult<Vec<Question>>>,
{
    // buffered 按提交顺序产出结果，偏移量与完成顺序无关
    let mut fetched = stream::iter(sequence.forms.iter().enumerate().map(|(position, form)| {
        let pending = fetch_questions(form.id.clone());
        async move { (position, form, pending.await) }
    }))
    .buffered(concurrency.max(1));

    let mut acc = MergeAccumulator::new();
    while let Some((position, form, result)) = fetched.next().await {
        match result {
            Ok(questions) => acc.push_form(position, &form.id, questions),
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => acc.omit(position, &form.id, e.to_string()),
        }
    }

    Ok(acc.finish())
}
