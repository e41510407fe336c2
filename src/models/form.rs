use serde::{Deserialize, Serialize};
use std::fmt;

/// 表单类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormKind {
    /// 测验
    Test,
    /// 任务
    Task,
    /// 分隔表单（说明、休息、会话结束）
    Marker,
}

impl FormKind {
    pub fn name(self) -> &'static str {
        match self {
            FormKind::Test => "测验",
            FormKind::Task => "任务",
            FormKind::Marker => "分隔",
        }
    }
}

/// 表单
///
/// 加载后不再修改，以 `id` 作为身份
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    pub id: String,
    pub name: String,
    pub kind: FormKind,
}

impl Form {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: FormKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }

    /// 表单在托管服务上的访问地址
    pub fn url(&self, url_base: &str) -> String {
        format!("{}{}", url_base, self.id)
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}#{}]", self.name, self.kind.name(), self.id)
    }
}
