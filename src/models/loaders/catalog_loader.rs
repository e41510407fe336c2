use crate::error::{AppError, AppResult};
use crate::models::form::{Form, FormKind};
use csv::{ReaderBuilder, Trim};
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

/// 从 CSV 文件加载表单列表
///
/// 每行两列：`id`, `title`，值可以用单引号包裹。
/// 第一行如果是 `id,title` 表头会被跳过。
pub async fn load_catalog(path: &Path, kind: FormKind) -> AppResult<Vec<Form>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::catalog_load(path.display().to_string(), e))?;

    let forms = parse_catalog(&content, kind)
        .map_err(|e| AppError::catalog_load(path.display().to_string(), e))?;

    info!(
        "📄 已加载 {} 个{}表单: {}",
        forms.len(),
        kind.name(),
        path.display()
    );
    Ok(forms)
}

/// 加载表单列表，失败时记录警告并返回空列表
pub async fn load_or_empty(path: &Path, kind: FormKind) -> Vec<Form> {
    match load_catalog(path, kind).await {
        Ok(forms) => forms,
        Err(e) => {
            warn!("⚠️ {}，该列表按空处理", e);
            Vec::new()
        }
    }
}

fn parse_catalog(content: &str, kind: FormKind) -> Result<Vec<Form>, csv::Error> {
    // Excel 另存的 UTF-8 文件带 BOM
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut forms = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let id = record.get(0).map(strip_quotes).unwrap_or_default();
        let title = record.get(1).map(strip_quotes).unwrap_or_default();

        if line == 0 && id.eq_ignore_ascii_case("id") {
            continue;
        }
        if id.is_empty() {
            continue;
        }
        forms.push(Form::new(id, title, kind));
    }
    Ok(forms)
}

fn strip_quotes(field: &str) -> String {
    let field = field.trim();
    field
        .strip_prefix('\'')
        .and_then(|f| f.strip_suffix('\''))
        .unwrap_or(field)
        .to_string()
}
