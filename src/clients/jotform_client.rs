/// 表单托管服务 API 客户端
///
/// 封装所有与表单服务 REST API 相关的调用逻辑，每个方法只发一次请求
use crate::clients::form_host::{FormHost, HostedFormId};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{CompositeQuestionList, Question};
use crate::utils::logging::truncate_text;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{json, Value};
use tracing::debug;

/// 表单服务客户端
pub struct JotformClient {
    http: Client,
    api_key: String,
    get_form_url: String,
    post_form_url: String,
}

impl JotformClient {
    /// 创建新的表单服务客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::http("构建 HTTP 客户端", e))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            get_form_url: config.get_form_url.trim_end_matches('/').to_string(),
            post_form_url: config.post_form_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .query(&[("apiKey", self.api_key.as_str())])
            .header(reqwest::header::ACCEPT, "application/json")
    }

    /// 发送请求，检查状态码并解析 JSON 响应
    ///
    /// 日志和错误信息中只出现不带 apiKey 的地址
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> AppResult<Value> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::http(endpoint, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::http(endpoint, e))?;

        if !status.is_success() {
            return Err(AppError::BadStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: truncate_text(&body, 200),
            });
        }

        debug!("{} 响应: {}", endpoint, truncate_text(&body, 500));

        serde_json::from_str(&body)
            .map_err(|e| AppError::malformed(endpoint, format!("响应不是合法 JSON: {}", e)))
    }
}

#[async_trait]
impl FormHost for JotformClient {
    async fn create_form(&self, title: &str) -> AppResult<HostedFormId> {
        let endpoint = self.post_form_url.clone();
        let payload = json!({ "properties": { "title": title } });

        debug!("创建表单 Payload: {}", payload);

        let request = self.request(Method::POST, &endpoint).json(&payload);
        let response = self.send(&endpoint, request).await?;
        parse_created_form_id(&endpoint, &response)
    }

    async fn fetch_questions(&self, form_id: &str) -> AppResult<Vec<Question>> {
        let endpoint = format!("{}/{}/questions", self.get_form_url, form_id);
        let request = self.request(Method::GET, &endpoint);
        let response = self.send(&endpoint, request).await?;
        parse_form_questions(&endpoint, form_id, &response)
    }

    async fn put_questions(
        &self,
        form_id: &str,
        questions: &CompositeQuestionList,
    ) -> AppResult<()> {
        let endpoint = format!("{}/{}/questions", self.post_form_url, form_id);

        debug!("写入题目: {} 道 -> {}", questions.len(), endpoint);

        let request = self.request(Method::PUT, &endpoint).json(questions);
        self.send(&endpoint, request).await?;
        Ok(())
    }
}

// ========== 响应解析 ==========

/// 从创建表单的响应中提取 `content.id`
fn parse_created_form_id(endpoint: &str, response: &Value) -> AppResult<HostedFormId> {
    match response.get("content").and_then(|c| c.get("id")) {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(AppError::malformed(endpoint, "响应中缺少 content.id")),
    }
}

/// 把 `content` 中的题目按出现顺序转换为 `Question`
///
/// 没有题目的表单，服务可能返回空数组
fn parse_form_questions(endpoint: &str, form_id: &str, response: &Value) -> AppResult<Vec<Question>> {
    match response.get("content") {
        Some(Value::Object(entries)) => entries
            .iter()
            .map(|(key, value)| match value {
                Value::Object(attributes) => Ok(Question::new(form_id, attributes.clone())),
                _ => Err(AppError::malformed(
                    endpoint,
                    format!("题目 {} 不是对象", key),
                )),
            })
            .collect(),
        Some(Value::Array(items)) if items.is_empty() => Ok(Vec::new()),
        Some(Value::Null) => Ok(Vec::new()),
        _ => Err(AppError::malformed(endpoint, "响应中缺少 content")),
    }
}
