//! 批量参与者处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责整次运行的调度和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：日志文件、取消信号（Ctrl-C / 整体超时）
//! 2. **生成计划**：加载表单目录，生成排列并插入分隔表单
//! 3. **写分配表**：每位参与者一行
//! 4. **分批发布**：按批次并发生成合成表单，每批完成后再开始下一批
//! 5. **全局统计**：汇总所有参与者的处理结果

use crate::clients::{FormHost, HostedFormId, JotformClient};
use crate::config::{Config, RunMode};
use crate::error::AppError;
use crate::infrastructure::{CancellationToken, RetryPolicy};
use crate::models::{load_or_empty, Form, FormKind, SessionizedAssignment};
use crate::services::assignment_generator::distinct_permutations;
use crate::services::{AssignmentGenerator, PublicationClient, ResultWriter, SessionAssembler};
use crate::utils::logging::{
    init_log_file, log_batch_complete, log_batch_start, log_catalog_loaded, log_startup,
    print_final_stats,
};
use crate::workflow::{ParticipantCtx, ParticipantFlow};
use anyhow::{Context, Result};
use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    cancel: CancellationToken,
}

/// 处理统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub success: usize,
    pub partial: usize,
    pub failed: usize,
    pub total: usize,
}

/// 发布结果
#[derive(Debug, Default)]
pub struct PublishReport {
    pub stats: ProcessingStats,
    /// (参与者编号, 合成表单ID)，按编号排列
    pub published: Vec<(usize, HostedFormId)>,
}

impl App {
    /// 创建应用（不安装信号处理）
    pub fn new(config: Config, cancel: CancellationToken) -> Self {
        Self { config, cancel }
    }

    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)
            .with_context(|| format!("无法创建日志文件: {}", config.output_log_file))?;

        log_startup(&config);

        let cancel = CancellationToken::new();
        watch_ctrl_c(cancel.clone());
        if let Some(secs) = config.run_timeout_secs {
            watch_deadline(cancel.clone(), Duration::from_secs(secs));
        }

        Ok(Self::new(config, cancel))
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<ProcessingStats> {
        let assignments = self.plan().await?;

        let writer = ResultWriter::new(&self.config.form_url_base);
        writer
            .write_assignments(Path::new(&self.config.output_file), &assignments)
            .await
            .context("写入分配表失败")?;

        let mut stats = ProcessingStats {
            total: assignments.len(),
            ..Default::default()
        };

        if self.config.mode == RunMode::Publish {
            let host = Arc::new(JotformClient::new(&self.config)?);
            let report = self.publish_all(host, &assignments).await;

            writer
                .write_composites(Path::new(&self.config.composite_output_file), &report.published)
                .await
                .context("写入合成表单列表失败")?;

            stats = report.stats;
            if self.cancel.is_cancelled() {
                anyhow::bail!(AppError::cancelled("发布合成表单"));
            }
        } else {
            stats.success = assignments.len();
        }

        print_final_stats(
            stats.success,
            stats.partial,
            stats.failed,
            stats.total,
            &self.config.output_file,
        );

        Ok(stats)
    }

    /// 加载表单目录，生成每位参与者的完整表单序列
    pub async fn plan(&self) -> Result<Vec<SessionizedAssignment>> {
        info!("\n📁 正在加载表单目录...");

        let tests = load_or_empty(Path::new(&self.config.tests_file), FormKind::Test).await;
        let tasks = load_or_empty(Path::new(&self.config.tasks_file), FormKind::Task).await;
        let front = load_or_empty(Path::new(&self.config.front_file), FormKind::Marker).await;
        let middle_marker = first_marker(&self.config.middle_file, "休息").await?;
        let end_marker = first_marker(&self.config.end_file, "会话结束").await?;

        let (test_count, task_count) = (tests.len(), tasks.len());
        let catalog: Vec<Form> = tests.into_iter().chain(tasks).collect();
        log_catalog_loaded(test_count, task_count, distinct_permutations(&catalog));

        if catalog.is_empty() {
            warn!("⚠️ 没有找到任何测验或任务");
        }

        let set = AssignmentGenerator::from_seed_option(self.config.shuffle_seed)
            .generate(&catalog, self.config.participants)?;

        let assembler =
            SessionAssembler::new(self.config.sessions, front, middle_marker, end_marker)?;
        let assignments: Vec<SessionizedAssignment> =
            set.iter().map(|perm| assembler.assemble(perm)).collect();

        info!("✓ 已为 {} 位参与者生成表单序列", assignments.len());
        Ok(assignments)
    }

    /// 为每位参与者创建合成表单
    ///
    /// 单个参与者失败不影响其他参与者；取消后不再开始新的批次
    pub async fn publish_all<H: FormHost>(
        &self,
        host: Arc<H>,
        assignments: &[SessionizedAssignment],
    ) -> PublishReport {
        let publication = PublicationClient::new(
            host,
            RetryPolicy::from_config(&self.config),
            self.cancel.clone(),
        );
        let flow = ParticipantFlow::new(
            publication,
            self.config.fetch_concurrency,
            self.config.verbose_logging,
        );

        let total = assignments.len();
        let batch_size = self.config.max_concurrent_participants.max(1);
        let mut report = PublishReport {
            stats: ProcessingStats {
                total,
                ..Default::default()
            },
            published: Vec::new(),
        };

        // 分批处理
        for batch_start in (0..total).step_by(batch_size) {
            if self.cancel.is_cancelled() {
                warn!("⚠️ 运行已取消，剩余 {} 位参与者未处理", total - batch_start);
                report.stats.failed += total - batch_start;
                break;
            }

            let batch_end = (batch_start + batch_size).min(total);
            let batch_num = batch_start / batch_size + 1;
            let total_batches = (total + batch_size - 1) / batch_size;
            log_batch_start(batch_num, total_batches, batch_start + 1, batch_end, total);

            let contexts: Vec<ParticipantCtx> = (batch_start..batch_end)
                .map(|index| ParticipantCtx::new(index + 1, &self.config.form_title_prefix))
                .collect();
            let results = join_all(
                contexts
                    .iter()
                    .zip(&assignments[batch_start..batch_end])
                    .map(|(ctx, sequence)| flow.run(ctx, sequence)),
            )
            .await;

            let mut batch_success = 0;
            for (ctx, result) in contexts.iter().zip(results) {
                match result {
                    Ok(outcome) => {
                        batch_success += 1;
                        if outcome.is_partial() {
                            report.stats.partial += 1;
                        } else {
                            report.stats.success += 1;
                        }
                        report
                            .published
                            .push((outcome.participant, outcome.hosted_form_id));
                    }
                    Err(e) => {
                        error!("{} ❌ 处理过程中发生错误: {}", ctx, e);
                        report.stats.failed += 1;
                    }
                }
            }

            log_batch_complete(batch_num, batch_success, batch_end - batch_start);
        }

        report
    }
}

/// 读取分隔表单文件的第一条记录
async fn first_marker(path: &str, kind: &'static str) -> Result<Form> {
    let forms = load_or_empty(Path::new(path), FormKind::Marker).await;
    forms.into_iter().next().ok_or_else(|| {
        AppError::MissingMarker {
            kind,
            path: path.to_string(),
        }
        .into()
    })
}

fn watch_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⚠️ 收到 Ctrl-C，正在取消所有请求...");
            cancel.cancel();
        }
    });
}

fn watch_deadline(cancel: CancellationToken, timeout: Duration) {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(timeout) => {
                warn!("⚠️ 超过运行时限 {} 秒，正在取消所有请求...", timeout.as_secs());
                cancel.cancel();
            }
        }
    });
}
