//! 参与者处理上下文
//!
//! 封装"我正在为第几位参与者生成合成表单"这一信息

use std::fmt::Display;

/// 参与者处理上下文
#[derive(Debug, Clone)]
pub struct ParticipantCtx {
    /// 参与者编号（从1开始，与输出文件中的 user 编号一致）
    pub participant: usize,

    /// 合成表单标题
    pub title: String,
}

impl ParticipantCtx {
    /// 创建新的参与者上下文
    pub fn new(participant: usize, title_prefix: &str) -> Self {
        Self {
            participant,
            title: format!("{}{}", title_prefix, participant),
        }
    }
}

impl Display for ParticipantCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[参与者 #{} 表单 {}]", self.participant, self.title)
    }
}
