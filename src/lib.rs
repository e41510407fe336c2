//! # Shuffled Forms
//!
//! 为每位参与者生成互不相同的表单顺序，并在表单服务上发布合成表单
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure / Clients）
//! - `clients/` - 表单服务接口 `FormHost` 及其 HTTP 实现 `JotformClient`
//! - `infrastructure/` - 重试策略 `RetryPolicy` 与取消令牌
//!
//! ### ② 业务能力层（Services）
//! - `AssignmentGenerator` - 生成互不相同的排列
//! - `SessionAssembler` - 插入开场、休息和会话结束表单
//! - `question_merger` - 合并题目并重写 qid / order
//! - `PublicationClient` - 带重试的创建 / 获取 / 写入
//! - `ResultWriter` - 写分配表和合成表单列表
//!
//! ### ③ 流程层（Workflow）
//! - `ParticipantCtx` - 上下文封装（参与者编号 + 表单标题）
//! - `ParticipantFlow` - 流程编排（创建 → 合并 → 写入）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 整次运行的调度和统计
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{FormHost, HostedFormId, JotformClient};
pub use config::{Config, RunMode};
pub use error::{AppError, AppResult};
pub use infrastructure::{CancellationToken, RetryPolicy};
pub use models::{CompositeQuestionList, Form, FormKind, Question, SessionizedAssignment};
pub use orchestrator::{App, ProcessingStats};
pub use workflow::{ParticipantCtx, ParticipantFlow, ParticipantOutcome};
