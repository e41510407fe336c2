//! 参与者处理流程 - 流程层
//!
//! 核心职责：定义"一位参与者"的合成表单生成流程
//!
//! 流程顺序：
//! 1. 创建空的合成表单
//! 2. 逐个获取序列中源表单的题目并合并
//! 3. 把合并结果一次性写入合成表单
//!
//! 第 1 步成功而第 3 步失败时，服务上会留下一个空表单，只记录日志不做清理

use tracing::{error, info, warn};

use crate::clients::{FormHost, HostedFormId};
use crate::error::AppResult;
use crate::models::SessionizedAssignment;
use crate::services::question_merger::{synthesize, MergeOmission};
use crate::services::PublicationClient;
use crate::workflow::participant_ctx::ParticipantCtx;

/// 参与者处理结果
#[derive(Debug, Clone)]
pub struct ParticipantOutcome {
    pub participant: usize,
    pub hosted_form_id: HostedFormId,
    pub question_count: usize,
    /// 被跳过的源表单
    pub omissions: Vec<MergeOmission>,
}

impl ParticipantOutcome {
    pub fn is_partial(&self) -> bool {
        !self.omissions.is_empty()
    }
}

/// 参与者处理流程
///
/// - 编排创建 → 合并 → 写入
/// - 不持有任何资源，只依赖发布客户端
pub struct ParticipantFlow<H: FormHost> {
    publication: PublicationClient<H>,
    fetch_concurrency: usize,
    verbose_logging: bool,
}

impl<H: FormHost> ParticipantFlow<H> {
    /// 创建新的参与者处理流程
    pub fn new(publication: PublicationClient<H>, fetch_concurrency: usize, verbose_logging: bool) -> Self {
        Self {
            publication,
            fetch_concurrency,
            verbose_logging,
        }
    }

    pub async fn run(
        &self,
        ctx: &ParticipantCtx,
        sequence: &SessionizedAssignment,
    ) -> AppResult<ParticipantOutcome> {
        info!("{} 📝 开始生成合成表单，共 {} 个源表单", ctx, sequence.len());

        // ========== 第 1 步: 创建表单 ==========
        let hosted_form_id = self.publication.create_form(&ctx.title).await?;

        // ========== 第 2 步: 获取并合并题目 ==========
        let publication = &self.publication;
        let synthesis = match synthesize(
            sequence,
            |form_id| async move { publication.fetch_questions(&form_id).await },
            self.fetch_concurrency,
        )
        .await
        {
            Ok(synthesis) => synthesis,
            Err(e) => {
                self.log_orphan(ctx, &hosted_form_id);
                return Err(e);
            }
        };

        if self.verbose_logging {
            for qid in synthesis.questions.qids() {
                info!("{}   合并题目 {}", ctx, qid);
            }
        }

        // ========== 第 3 步: 写入题目 ==========
        if let Err(e) = self
            .publication
            .upload_questions(&hosted_form_id, &synthesis.questions)
            .await
        {
            error!("{} ❌ 写入题目失败: {}", ctx, e);
            self.log_orphan(ctx, &hosted_form_id);
            return Err(e);
        }

        if synthesis.is_partial() {
            warn!(
                "{} ⚠️ 合成表单 {} 缺少 {} 个源表单的题目",
                ctx,
                hosted_form_id,
                synthesis.omissions.len()
            );
        } else {
            info!(
                "{} ✅ 合成表单 {} 完成，共 {} 道题",
                ctx,
                hosted_form_id,
                synthesis.questions.len()
            );
        }

        Ok(ParticipantOutcome {
            participant: ctx.participant,
            hosted_form_id,
            question_count: synthesis.questions.len(),
            omissions: synthesis.omissions,
        })
    }

    fn log_orphan(&self, ctx: &ParticipantCtx, hosted_form_id: &str) {
        warn!(
            "{} ⚠️ 表单 {} 已创建但没有写入题目，需要手动清理",
            ctx, hosted_form_id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MockFormHost;
    use crate::error::AppError;
    use crate::infrastructure::{CancellationToken, RetryPolicy};
    use crate::models::{Form, FormKind, Question};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn flow(host: MockFormHost) -> ParticipantFlow<MockFormHost> {
        let publication = PublicationClient::new(
            Arc::new(host),
            RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(1)),
            CancellationToken::new(),
        );
        ParticipantFlow::new(publication, 2, false)
    }

    fn sequence(ids: &[&str]) -> SessionizedAssignment {
        SessionizedAssignment {
            forms: ids
                .iter()
                .map(|id| Form::new(*id, *id, FormKind::Task))
                .collect(),
        }
    }

    fn questions(form_id: &str, count: usize) -> Vec<Question> {
        (1..=count)
            .map(|i| {
                let attrs = json!({"qid": i.to_string(), "order": i.to_string()});
                Question::new(form_id, attrs.as_object().cloned().unwrap())
            })
            .collect()
    }

    #[tokio::test]
    async fn test_run_merges_and_uploads() {
        let mut host = MockFormHost::new();
        host.expect_create_form()
            .times(1)
            .returning(|_| Ok("H1".to_string()));
        host.expect_fetch_questions()
            .times(2)
            .returning(|id| Ok(questions(id, 2)));
        host.expect_put_questions()
            .withf(|id, qs| {
                id.to_string() == "H1" && qs.qids() == vec!["A-1", "A-2", "B-1", "B-2"]
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let outcome = flow(host)
            .run(&ParticipantCtx::new(1, "Form"), &sequence(&["A", "B"]))
            .await
            .unwrap();

        assert_eq!(outcome.hosted_form_id, "H1");
        assert_eq!(outcome.question_count, 4);
        assert!(!outcome.is_partial());
    }

    #[tokio::test]
    async fn test_run_reports_omitted_forms() {
        let mut host = MockFormHost::new();
        host.expect_create_form()
            .returning(|_| Ok("H2".to_string()));
        host.expect_fetch_questions().returning(|id| {
            if id == "B" {
                Err(AppError::BadStatus {
                    endpoint: "/form/B/questions".to_string(),
                    status: 404,
                    body: String::new(),
                })
            } else {
                Ok(questions(id, 1))
            }
        });
        host.expect_put_questions()
            .withf(|_, qs| qs.len() == 2)
            .returning(|_, _| Ok(()));

        let outcome = flow(host)
            .run(&ParticipantCtx::new(2, "Form"), &sequence(&["A", "B", "C"]))
            .await
            .unwrap();

        assert!(outcome.is_partial());
        assert_eq!(outcome.omissions.len(), 1);
        assert_eq!(outcome.omissions[0].form_id, "B");
    }

    #[tokio::test]
    async fn test_run_fails_when_create_never_succeeds() {
        let mut host = MockFormHost::new();
        host.expect_create_form().times(2).returning(|_| {
            Err(AppError::BadStatus {
                endpoint: "/forms".to_string(),
                status: 503,
                body: String::new(),
            })
        });

        let result = flow(host)
            .run(&ParticipantCtx::new(3, "Form"), &sequence(&["A"]))
            .await;

        assert!(matches!(result, Err(AppError::Transport { .. })));
    }
}
