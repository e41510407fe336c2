use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 表单目录读取失败（文件不存在或格式错误）
    #[error("表单目录读取失败 ({path}): {source}")]
    CatalogLoad {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 请求的参与者数量超过了可生成的不同排列数量
    #[error("请求 {requested} 个不同排列，但目录最多只能生成 {capacity} 个")]
    CapacityExceeded { requested: usize, capacity: u128 },

    /// 会话数量无效
    #[error("会话数量必须至少为 1")]
    InvalidSessions,

    /// 缺少分隔表单（休息 / 会话结束）
    #[error("缺少 {kind} 表单: {path} 中没有任何记录")]
    MissingMarker { kind: &'static str, path: String },

    /// 网络请求失败（单次尝试）
    #[error("HTTP 请求失败 ({endpoint}): {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// 服务返回非成功状态码（单次尝试）
    #[error("服务返回错误状态 ({endpoint}): {status} {body}")]
    BadStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// 服务返回的内容无法识别，重试也无济于事
    #[error("无法解析服务响应 ({endpoint}): {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    /// 重试次数用尽
    #[error("{operation} 在 {attempts} 次尝试后仍然失败: {source}")]
    Transport {
        operation: String,
        attempts: u32,
        #[source]
        source: Box<AppError>,
    },

    /// 操作被取消（Ctrl-C 或整体超时）
    #[error("{operation} 已取消")]
    Cancelled { operation: String },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    #[error("文件错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建目录读取错误
    pub fn catalog_load(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::CatalogLoad {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// 创建 HTTP 请求失败错误
    pub fn http(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        AppError::Http {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// 创建响应解析错误
    pub fn malformed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::MalformedResponse {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// 创建取消错误
    pub fn cancelled(operation: impl Into<String>) -> Self {
        AppError::Cancelled {
            operation: operation.into(),
        }
    }

    /// 是否值得重试
    ///
    /// 只有网络层面的失败和非成功状态码会重试；
    /// 响应格式错误、取消以及其他错误直接返回。
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Http { .. } | AppError::BadStatus { .. })
    }

    /// 是否为取消错误
    pub fn is_cancelled(&self) -> bool {
        match self {
            AppError::Cancelled { .. } => true,
            AppError::Transport { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
