use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// 运行模式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// 只生成分配表，不访问网络
    Assign,
    /// 生成分配表并为每位参与者创建合成表单
    Publish,
}

impl FromStr for RunMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "assign" => Ok(RunMode::Assign),
            "publish" => Ok(RunMode::Publish),
            other => Err(AppError::Config(format!("未知的运行模式: {}", other))),
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 表单服务 API 配置 ---
    pub api_key: String,
    /// 读取题目的接口地址（不含表单ID）
    pub get_form_url: String,
    /// 创建表单 / 写入题目的接口地址
    pub post_form_url: String,
    /// 输出文件中表单链接的前缀
    pub form_url_base: String,

    // --- 输入文件 ---
    pub tests_file: String,
    pub tasks_file: String,
    pub front_file: String,
    pub middle_file: String,
    pub end_file: String,

    // --- 输出文件 ---
    pub output_file: String,
    pub composite_output_file: String,
    pub output_log_file: String,

    // --- 实验设置 ---
    /// 参与者数量
    pub participants: usize,
    /// 每位参与者的会话数量
    pub sessions: usize,
    pub mode: RunMode,
    /// 合成表单标题前缀，后接参与者编号
    pub form_title_prefix: String,
    /// 固定随机种子（用于复现）
    pub shuffle_seed: Option<u64>,

    // --- 并发与重试 ---
    pub max_concurrent_participants: usize,
    /// 单个参与者内同时获取的源表单数量
    pub fetch_concurrency: usize,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub request_timeout_secs: u64,
    /// 整体运行时限，超过后取消所有请求
    pub run_timeout_secs: Option<u64>,

    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            get_form_url: "https://api.jotform.com/form".to_string(),
            post_form_url: "https://api.jotform.com/user/forms".to_string(),
            form_url_base: "http://form.jotformpro.com/form/".to_string(),
            tests_file: "data/testsFile.csv".to_string(),
            tasks_file: "data/tasksFile.csv".to_string(),
            front_file: "data/front.csv".to_string(),
            middle_file: "data/middle.csv".to_string(),
            end_file: "data/end.csv".to_string(),
            output_file: "output/listOfShuffledTestsAndTasks.csv".to_string(),
            composite_output_file: "output/compositeForms.csv".to_string(),
            output_log_file: "output.txt".to_string(),
            participants: 80,
            sessions: 3,
            mode: RunMode::Assign,
            form_title_prefix: "Form".to_string(),
            shuffle_seed: None,
            max_concurrent_participants: 1,
            fetch_concurrency: 4,
            max_attempts: 8,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            request_timeout_secs: 30,
            run_timeout_secs: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从 TOML 文件加载配置，文件不存在时使用默认值
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("无法解析 {}: {}", path.display(), e)))
    }

    /// 加载配置：先读 TOML 文件，再用环境变量覆盖
    ///
    /// 配置文件路径取自 `FORM_COMPOSER_CONFIG`，默认 `config.toml`
    pub fn load() -> AppResult<Self> {
        let path =
            std::env::var("FORM_COMPOSER_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        let config = Self::from_file(&path)?.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(self) -> AppResult<Self> {
        let default = self;
        Ok(Self {
            api_key: env_string("API_KEY").unwrap_or(default.api_key),
            get_form_url: env_string("API_GET_FORM").unwrap_or(default.get_form_url),
            post_form_url: env_string("API_POST_FORM").unwrap_or(default.post_form_url),
            form_url_base: env_string("FORM_URL_BASE").unwrap_or(default.form_url_base),
            tests_file: env_string("TESTS_FILE").unwrap_or(default.tests_file),
            tasks_file: env_string("TASKS_FILE").unwrap_or(default.tasks_file),
            front_file: env_string("FRONT_FILE").unwrap_or(default.front_file),
            middle_file: env_string("MIDDLE_FILE").unwrap_or(default.middle_file),
            end_file: env_string("END_FILE").unwrap_or(default.end_file),
            output_file: env_string("OUTPUT_FILE").unwrap_or(default.output_file),
            composite_output_file: env_string("COMPOSITE_OUTPUT_FILE")
                .unwrap_or(default.composite_output_file),
            output_log_file: env_string("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            participants: env_parse("PARTICIPANTS")?.unwrap_or(default.participants),
            sessions: env_parse("SESSIONS")?.unwrap_or(default.sessions),
            mode: env_parse("RUN_MODE")?.unwrap_or(default.mode),
            form_title_prefix: env_string("FORM_TITLE_PREFIX")
                .unwrap_or(default.form_title_prefix),
            shuffle_seed: env_parse("SHUFFLE_SEED")?.or(default.shuffle_seed),
            max_concurrent_participants: env_parse("MAX_CONCURRENT_PARTICIPANTS")?
                .unwrap_or(default.max_concurrent_participants),
            fetch_concurrency: env_parse("FETCH_CONCURRENCY")?
                .unwrap_or(default.fetch_concurrency),
            max_attempts: env_parse("MAX_ATTEMPTS")?.unwrap_or(default.max_attempts),
            initial_backoff_ms: env_parse("INITIAL_BACKOFF_MS")?
                .unwrap_or(default.initial_backoff_ms),
            max_backoff_ms: env_parse("MAX_BACKOFF_MS")?.unwrap_or(default.max_backoff_ms),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS")?
                .unwrap_or(default.request_timeout_secs),
            run_timeout_secs: env_parse("RUN_TIMEOUT_SECS")?.or(default.run_timeout_secs),
            verbose_logging: env_parse("VERBOSE_LOGGING")?.unwrap_or(default.verbose_logging),
        })
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> AppResult<()> {
        if self.sessions == 0 {
            return Err(AppError::InvalidSessions);
        }
        if self.max_concurrent_participants == 0 || self.fetch_concurrency == 0 {
            return Err(AppError::Config("并发数量必须至少为 1".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(AppError::Config("max_attempts 必须至少为 1".to_string()));
        }
        if self.mode == RunMode::Publish && self.api_key.is_empty() {
            return Err(AppError::Config("publish 模式需要设置 api_key".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// 读取并解析环境变量；变量存在但无法解析时报错，而不是静默忽略
fn env_parse<T: FromStr>(name: &str) -> AppResult<Option<T>> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().map(Some).map_err(|_| {
            AppError::Config(format!("环境变量 {} 解析失败: '{}'", name, value))
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid_for_assign_mode() {
        let config = Config::default();
        assert_eq!(config.mode, RunMode::Assign);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_publish_mode_requires_api_key() {
        let config = Config {
            mode: RunMode::Publish,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_zero_sessions_rejected() {
        let config = Config {
            sessions: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AppError::InvalidSessions)));
    }

    #[test]
    fn test_from_file_partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "api_key = \"secret\"\nparticipants = 12\nmode = \"publish\"\nshuffle_seed = 7"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.participants, 12);
        assert_eq!(config.mode, RunMode::Publish);
        assert_eq!(config.shuffle_seed, Some(7));
        assert_eq!(config.sessions, 3);
        assert_eq!(config.max_attempts, 8);
    }

    #[test]
    fn test_from_file_missing_uses_defaults() {
        let config = Config::from_file("/definitely/not/here/config.toml").unwrap();
        assert_eq!(config.participants, Config::default().participants);
    }

    #[test]
    fn test_example_file_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.example.toml");
        let example = Config::from_file(&path).unwrap();
        let default = Config::default();

        assert_eq!(example.tests_file, default.tests_file);
        assert_eq!(example.tasks_file, default.tasks_file);
        assert_eq!(example.front_file, default.front_file);
        assert_eq!(example.middle_file, default.middle_file);
        assert_eq!(example.end_file, default.end_file);
        assert_eq!(example.output_file, default.output_file);
        assert_eq!(example.composite_output_file, default.composite_output_file);
        assert_eq!(example.sessions, default.sessions);
        assert_eq!(example.mode, default.mode);
    }

    #[test]
    fn test_run_mode_parse() {
        assert_eq!("Publish".parse::<RunMode>().unwrap(), RunMode::Publish);
        assert_eq!(" assign ".parse::<RunMode>().unwrap(), RunMode::Assign);
        assert!("both".parse::<RunMode>().is_err());
    }
}
