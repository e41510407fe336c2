//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责整次运行的调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量参与者处理器
//! - 管理应用生命周期（初始化、运行）
//! - 加载表单目录，生成并分隔每位参与者的表单序列
//! - 写分配表与合成表单列表
//! - 控制同时处理的参与者数量
//! - 输出全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<SessionizedAssignment>)
//!     ↓
//! workflow::ParticipantFlow (处理单个参与者)
//!     ↓
//! services (能力层：generator / assembler / merger / publication / writer)
//!     ↓
//! clients + infrastructure (FormHost / RetryPolicy / CancellationToken)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层创建 HTTP 客户端和取消令牌
//! 2. **向下依赖**：编排层 → workflow → services → clients / infrastructure
//! 3. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod batch_processor;

// 重新导出主要类型
pub use batch_processor::{App, ProcessingStats, PublishReport};
