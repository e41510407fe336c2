//! 结果写入服务 - 业务能力层
//!
//! 只负责把"参与者 → 表单链接"写到文件

use crate::clients::HostedFormId;
use crate::error::AppResult;
use crate::models::SessionizedAssignment;
use std::path::Path;
use tokio::fs;
use tracing::info;

/// 分配表第一行
pub const ASSIGNMENT_HEADER: &str = "Forms for users";

/// 结果写入服务
///
/// 分配表每行一位参与者，每个字段后都跟一个逗号（包括最后一个）：
/// `'user<N>','<链接>','<链接>',`
pub struct ResultWriter {
    url_base: String,
}

impl ResultWriter {
    pub fn new(url_base: impl Into<String>) -> Self {
        Self {
            url_base: url_base.into(),
        }
    }

    /// 格式化一位参与者的表单序列（编号从 1 开始）
    pub fn assignment_line(&self, participant: usize, assignment: &SessionizedAssignment) -> String {
        let mut line = format!("'user{}',", participant);
        for form in &assignment.forms {
            line.push_str(&format!("'{}',", form.url(&self.url_base)));
        }
        line
    }

    /// 格式化一位参与者的合成表单
    pub fn composite_line(&self, participant: usize, hosted_form_id: &str) -> String {
        format!(
            "'user{}','{}{}'",
            participant, self.url_base, hosted_form_id
        )
    }

    /// 写入全部参与者的表单序列
    ///
    /// # 参数
    /// - `path`: 输出文件路径（会覆盖已有文件）
    /// - `assignments`: 按参与者编号排列
    pub async fn write_assignments(
        &self,
        path: &Path,
        assignments: &[SessionizedAssignment],
    ) -> AppResult<()> {
        let mut content = String::from(ASSIGNMENT_HEADER);
        content.push('\n');
        for (index, assignment) in assignments.iter().enumerate() {
            content.push_str(&self.assignment_line(index + 1, assignment));
            content.push('\n');
        }

        write_file(path, &content).await?;
        info!(
            "💾 已写入 {} 位参与者的表单序列: {}",
            assignments.len(),
            path.display()
        );
        Ok(())
    }

    /// 写入已发布的合成表单
    ///
    /// # 参数
    /// - `path`: 输出文件路径
    /// - `published`: (参与者编号, 表单ID)
    pub async fn write_composites(
        &self,
        path: &Path,
        published: &[(usize, HostedFormId)],
    ) -> AppResult<()> {
        let content: String = published
            .iter()
            .map(|(participant, id)| self.composite_line(*participant, id) + "\n")
            .collect();

        write_file(path, &content).await?;
        info!(
            "💾 已写入 {} 个合成表单链接: {}",
            published.len(),
            path.display()
        );
        Ok(())
    }
}

async fn write_file(path: &Path, content: &str) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(path, content).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Form, FormKind};

    const BASE: &str = "http://form.jotformpro.com/form/";

    fn assignment(ids: &[&str]) -> SessionizedAssignment {
        SessionizedAssignment {
            forms: ids
                .iter()
                .map(|id| Form::new(*id, *id, FormKind::Test))
                .collect(),
        }
    }

    #[test]
    fn test_assignment_line_format() {
        let writer = ResultWriter::new(BASE);
        let line = writer.assignment_line(3, &assignment(&["10", "20"]));
        assert_eq!(
            line,
            "'user3','http://form.jotformpro.com/form/10','http://form.jotformpro.com/form/20',"
        );
    }

    #[test]
    fn test_assignment_line_without_forms_keeps_user_field() {
        let writer = ResultWriter::new(BASE);
        assert_eq!(writer.assignment_line(1, &assignment(&[])), "'user1',");
    }

    #[tokio::test]
    async fn test_write_assignments_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("list.csv");
        let writer = ResultWriter::new(BASE);

        writer
            .write_assignments(&path, &[assignment(&["1"]), assignment(&["2", "3"])])
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], ASSIGNMENT_HEADER);
        assert!(lines[1].starts_with("'user1',"));
        assert_eq!(lines[2].matches(BASE).count(), 2);
    }

    #[tokio::test]
    async fn test_write_composites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("composite.csv");
        let writer = ResultWriter::new(BASE);

        writer
            .write_composites(&path, &[(1, "901".to_string()), (3, "903".to_string())])
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "'user1','http://form.jotformpro.com/form/901'\n'user3','http://form.jotformpro.com/form/903'\n"
        );
    }
}
