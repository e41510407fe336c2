use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 题目属性表（保持服务返回时的键顺序）
pub type QuestionAttributes = Map<String, Value>;

/// 源表单中的一道题目
///
/// 属性原样保存，只在合并时改写 `qid` 和 `order`
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub source_form_id: String,
    pub attributes: QuestionAttributes,
}

impl Question {
    pub fn new(source_form_id: impl Into<String>, attributes: QuestionAttributes) -> Self {
        Self {
            source_form_id: source_form_id.into(),
            attributes,
        }
    }

    /// 源表单内的题目ID
    pub fn qid(&self) -> Option<String> {
        self.attributes.get("qid").and_then(scalar_to_string)
    }

    /// 原始显示顺序（原样文本）
    pub fn order(&self) -> Option<String> {
        self.attributes.get("order").and_then(scalar_to_string)
    }
}

/// 服务有时用字符串、有时用数字表示 `qid` / `order`
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 合成表单的题目列表
///
/// 序列化结果就是写入题目接口的请求体：`{"questions": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositeQuestionList {
    pub questions: Vec<QuestionAttributes>,
}

impl CompositeQuestionList {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// 合并后的题目ID，按列表顺序
    pub fn qids(&self) -> Vec<String> {
        self.questions
            .iter()
            .filter_map(|q| q.get("qid").and_then(scalar_to_string))
            .collect()
    }
}
