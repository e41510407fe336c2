//! 表单托管服务的抽象，便于在测试中替换

use crate::error::AppResult;
use crate::models::{CompositeQuestionList, Question};
use async_trait::async_trait;

/// 托管服务分配的表单ID
pub type HostedFormId = String;

/// 表单托管服务的单次调用（不含重试）
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FormHost: Send + Sync {
    /// 创建一个新表单，返回托管服务分配的ID
    async fn create_form(&self, title: &str) -> AppResult<HostedFormId>;

    /// 获取源表单的全部题目，按服务返回的顺序
    async fn fetch_questions(&self, form_id: &str) -> AppResult<Vec<Question>>;

    /// 把合并后的题目一次性写入表单
    async fn put_questions(&self, form_id: &str, questions: &CompositeQuestionList)
        -> AppResult<()>;
}
