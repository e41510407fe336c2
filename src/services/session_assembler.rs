//! 会话拼装服务 - 业务能力层
//!
//! 在排列中插入说明、休息和会话结束表单

use crate::error::{AppError, AppResult};
use crate::models::{Form, Permutation, SessionizedAssignment};

/// 会话拼装器
///
/// 持有整次运行共用的分隔表单
#[derive(Debug, Clone)]
pub struct SessionAssembler {
    sessions: usize,
    front: Vec<Form>,
    middle_marker: Form,
    end_marker: Form,
}

impl SessionAssembler {
    pub fn new(
        sessions: usize,
        front: Vec<Form>,
        middle_marker: Form,
        end_marker: Form,
    ) -> AppResult<Self> {
        if sessions == 0 {
            return Err(AppError::InvalidSessions);
        }
        Ok(Self {
            sessions,
            front,
            middle_marker,
            end_marker,
        })
    }

    pub fn assemble(&self, perm: &Permutation) -> SessionizedAssignment {
        let mut forms = Vec::with_capacity(self.front.len() + perm.len() + 2 * self.sessions);
        forms.extend(self.front.iter().cloned());

        let (size_of_session, size_no_break) = session_sizes(perm.len(), self.sessions);
        let mut current_session = 1;

        // count 从 1 开始，整个排列累计，不按会话清零
        for (index, form) in perm.forms().iter().enumerate() {
            forms.push(form.clone());
            let count = index + 1;

            if count == (current_session - 1) * size_of_session + size_no_break {
                forms.push(self.middle_marker.clone());
            } else if count == current_session * size_of_session {
                forms.push(self.end_marker.clone());
                current_session += 1;
            }
        }

        SessionizedAssignment { forms }
    }
}

/// 一次性拼装
///
/// # 参数
/// - `perm`: 参与者的排列
/// - `sessions`: 会话数量（至少为 1）
/// - `front`: 放在最前面的表单（通常是说明）
/// - `middle_marker`: 会话中间的休息表单
/// - `end_marker`: 会话结束表单
pub fn assemble(
    perm: &Permutation,
    sessions: usize,
    front: &[Form],
    middle_marker: &Form,
    end_marker: &Form,
) -> AppResult<SessionizedAssignment> {
    let assembler = SessionAssembler::new(
        sessions,
        front.to_vec(),
        middle_marker.clone(),
        end_marker.clone(),
    )?;
    Ok(assembler.assemble(perm))
}

/// 计算 (每个会话的表单数, 会话内休息前的表单数)，均为四舍五入
pub fn session_sizes(total: usize, sessions: usize) -> (usize, usize) {
    let size_of_session = round_div(total, sessions);
    let size_no_break = round_div(size_of_session, 2);
    (size_of_session, size_no_break)
}

/// 整数除法，半数向上取整
fn round_div(numerator: usize, denominator: usize) -> usize {
    (2 * numerator + denominator) / (2 * denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FormKind;

    fn forms(prefix: &str, n: usize) -> Vec<Form> {
        (1..=n)
            .map(|i| Form::new(format!("{}{}", prefix, i), format!("表单 {}", i), FormKind::Task))
            .collect()
    }

    fn markers() -> (Form, Form, Form) {
        (
            Form::new("FRONT", "说明", FormKind::Marker),
            Form::new("MID", "休息", FormKind::Marker),
            Form::new("END", "结束", FormKind::Marker),
        )
    }

    /// 返回每个分隔表单前面已经放入的排列表单数量
    fn marker_positions(result: &SessionizedAssignment, marker_id: &str) -> Vec<usize> {
        let mut count = 0;
        let mut positions = Vec::new();
        for form in &result.forms {
            if form.kind != FormKind::Marker {
                count += 1;
            } else if form.id == marker_id {
                positions.push(count);
            }
        }
        positions
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_div(12, 3), 4);
        assert_eq!(round_div(7, 2), 4);
        assert_eq!(round_div(5, 2), 3);
        assert_eq!(round_div(10, 3), 3);
        assert_eq!(round_div(11, 3), 4);
        assert_eq!(round_div(1, 3), 0);
    }

    #[test]
    fn test_twelve_forms_three_sessions() {
        let (front, mid, end) = markers();
        let perm = Permutation::new(forms("F", 12));

        let result = assemble(&perm, 3, &[front], &mid, &end).unwrap();

        assert_eq!(session_sizes(12, 3), (4, 2));
        assert_eq!(result.forms[0].id, "FRONT");
        assert_eq!(marker_positions(&result, "MID"), vec![2, 6, 10]);
        assert_eq!(marker_positions(&result, "END"), vec![4, 8, 12]);
        assert_eq!(result.len(), 1 + 12 + 6);
    }

    #[test]
    fn test_single_session_four_forms() {
        let (front, mid, end) = markers();
        let perm = Permutation::new(forms("K", 4));

        let result = assemble(&perm, 1, &[front], &mid, &end).unwrap();

        assert_eq!(result.len(), 7);
        assert_eq!(
            result.form_ids(),
            vec!["FRONT", "K1", "K2", "MID", "K3", "K4", "END"]
        );
    }

    #[test]
    fn test_uneven_split_keeps_rounding_artefacts() {
        let (_, mid, end) = markers();
        // 10 / 3 -> 3，休息点 round(1.5) = 2
        let perm = Permutation::new(forms("F", 10));

        let result = assemble(&perm, 3, &[], &mid, &end).unwrap();

        assert_eq!(marker_positions(&result, "MID"), vec![2, 5, 8]);
        assert_eq!(marker_positions(&result, "END"), vec![3, 6, 9]);
        assert_eq!(result.forms.last().map(|f| f.id.as_str()), Some("F10"));
    }

    #[test]
    fn test_middle_branch_wins_when_boundaries_coincide() {
        let (_, mid, end) = markers();
        // 2 / 2 -> 1，休息点 round(0.5) = 1，与会话结束重合
        let perm = Permutation::new(forms("F", 2));

        let result = assemble(&perm, 2, &[], &mid, &end).unwrap();

        assert_eq!(marker_positions(&result, "MID"), vec![1]);
        assert!(marker_positions(&result, "END").is_empty());
    }

    #[test]
    fn test_multiple_front_forms_in_order() {
        let (front, mid, end) = markers();
        let consent = Form::new("CONSENT", "同意书", FormKind::Marker);
        let perm = Permutation::new(forms("F", 4));

        let result = assemble(&perm, 2, &[consent, front], &mid, &end).unwrap();

        assert_eq!(result.form_ids()[..2], ["CONSENT", "FRONT"]);
    }

    #[test]
    fn test_zero_sessions_rejected() {
        let (_, mid, end) = markers();
        let perm = Permutation::new(forms("F", 4));
        assert!(matches!(
            assemble(&perm, 0, &[], &mid, &end),
            Err(AppError::InvalidSessions)
        ));
    }
}
