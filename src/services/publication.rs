//! 发布服务 - 业务能力层
//!
//! 在表单托管服务的单次调用之上加上重试和取消

use crate::clients::{FormHost, HostedFormId};
use crate::error::AppResult;
use crate::infrastructure::{CancellationToken, RetryPolicy};
use crate::models::{CompositeQuestionList, Question};
use std::sync::Arc;
use tracing::{debug, info};

/// 发布客户端
///
/// 职责：
/// - 创建表单、获取题目、写入题目，每一步都按重试策略执行
/// - 不关心题目如何合并
/// - 不关心参与者编号
pub struct PublicationClient<H: FormHost> {
    host: Arc<H>,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl<H: FormHost> Clone for PublicationClient<H> {
    fn clone(&self) -> Self {
        Self {
            host: Arc::clone(&self.host),
            policy: self.policy.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<H: FormHost> PublicationClient<H> {
    /// 创建新的发布客户端
    pub fn new(host: Arc<H>, policy: RetryPolicy, cancel: CancellationToken) -> Self {
        Self {
            host,
            policy,
            cancel,
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// 创建新表单
    pub async fn create_form(&self, title: &str) -> AppResult<HostedFormId> {
        let id = self
            .policy
            .run("创建表单", &self.cancel, || self.host.create_form(title))
            .await?;
        info!("✓ 已创建表单 {} ({})", id, title);
        Ok(id)
    }

    /// 获取源表单题目
    pub async fn fetch_questions(&self, form_id: &str) -> AppResult<Vec<Question>> {
        let operation = format!("获取表单 {} 的题目", form_id);
        let questions = self
            .policy
            .run(&operation, &self.cancel, || self.host.fetch_questions(form_id))
            .await?;
        debug!("表单 {} 共 {} 道题", form_id, questions.len());
        Ok(questions)
    }

    /// 把合并后的题目一次性写入表单
    pub async fn upload_questions(
        &self,
        form_id: &str,
        questions: &CompositeQuestionList,
    ) -> AppResult<()> {
        let operation = format!("写入表单 {} 的题目", form_id);
        self.policy
            .run(&operation, &self.cancel, || {
                self.host.put_questions(form_id, questions)
            })
            .await?;
        info!("✓ 已向表单 {} 写入 {} 道题", form_id, questions.len());
        Ok(())
    }

    /// 创建表单并写入题目
    ///
    /// # 参数
    /// - `name`: 表单标题
    /// - `questions`: 合并后的题目
    ///
    /// # 返回
    /// 返回托管服务分配的表单ID
    pub async fn publish(
        &self,
        name: &str,
        questions: &CompositeQuestionList,
    ) -> AppResult<HostedFormId> {
        let form_id = self.create_form(name).await?;
        self.upload_questions(&form_id, questions).await?;
        Ok(form_id)
    }
}
