//! Filter状态的变更层
//!
//! 所有对 `FilterState` 的修改都通过 `reduce(state, action, columns)`
//! 完成, UI层只负责发出 `Action`, 不直接改状态. 这样结构不变式
//! (组非空、连接符数量、运算符合法性) 集中在一处维护:
//!
//! - 组内永远至少有一个条件, 删除最后一个条件等价于删除整个组
//! - `connectors.len() == max(0, groups.len() - 1)` 在任何动作之后成立
//! - 条件的运算符永远属于其列类别允许的集合
//!
//! 未知ID和越界下标全部静默忽略, 返回原状态.

use crate::model::{Condition, ConditionId, FilterState, Group, GroupId, Operator};
use crate::schema::{category_for, ColumnDescriptor};

/// 对单个条件某个字段的修改
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionPatch {
    Column(String),
    Operator(Operator),
    Value(String),
    Value2(String),
}

/// Filter状态机的全部动作
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// 追加一个新组, 内含一个默认条件 (目录首列, `=`, 空值)
    AddGroup,
    RemoveGroup(GroupId),
    AddCondition(GroupId),
    RemoveCondition {
        group: GroupId,
        condition: ConditionId,
    },
    UpdateCondition {
        group: GroupId,
        condition: ConditionId,
        patch: ConditionPatch,
    },
    /// 翻转组内 AND/OR
    ToggleGroupLogic(GroupId),
    /// 翻转第 index 个组间连接符
    ToggleConnector(usize),
}

/// 纯状态转移: 消费旧状态, 返回新状态
///
/// `columns` 是当前表的列描述符, 用于生成默认条件和检查运算符合法性
pub fn reduce(mut state: FilterState, action: Action, columns: &[ColumnDescriptor]) -> FilterState {
    match action {
        Action::AddGroup => {
            let condition = default_condition(&mut state, columns);
            let group_id = GroupId(state.alloc_id());
            state.push_group(Group::new(group_id, condition));
        }
        Action::RemoveGroup(group_id) => {
            state.remove_group(group_id);
        }
        Action::AddCondition(group_id) => {
            if state.group(group_id).is_some() {
                let condition = default_condition(&mut state, columns);
                if let Some(group) = state.group_mut(group_id) {
                    group.conditions.push(condition);
                }
            }
        }
        Action::RemoveCondition { group, condition } => {
            let found = state.group(group).map(|g| {
                (
                    g.conditions.len(),
                    g.conditions.iter().position(|c| c.id == condition),
                )
            });
            match found {
                Some((len, Some(position))) => {
                    if len == 1 {
                        // 组不能为空: 删除最后一个条件时删除整个组
                        state.remove_group(group);
                    } else if let Some(g) = state.group_mut(group) {
                        g.conditions.remove(position);
                    }
                }
                _ => {} // 未知组或未知条件, 忽略
            }
        }
        Action::UpdateCondition {
            group,
            condition,
            patch,
        } => {
            if let Some(target) = state
                .group_mut(group)
                .and_then(|g| g.conditions.iter_mut().find(|c| c.id == condition))
            {
                apply_patch(target, patch, columns);
            }
        }
        Action::ToggleGroupLogic(group_id) => {
            if let Some(group) = state.group_mut(group_id) {
                group.logic = group.logic.toggled();
            }
        }
        Action::ToggleConnector(index) => {
            if let Some(connector) = state.connectors.get_mut(index) {
                *connector = connector.toggled();
            }
        }
    }
    state
}

/// 默认条件: 目录里的第一列, `=` 运算符, 空值
fn default_condition(state: &mut FilterState, columns: &[ColumnDescriptor]) -> Condition {
    let column = columns
        .first()
        .map(|c| c.column_name.clone())
        .unwrap_or_default();
    Condition::new(ConditionId(state.alloc_id()), column)
}

fn apply_patch(condition: &mut Condition, patch: ConditionPatch, columns: &[ColumnDescriptor]) {
    match patch {
        ConditionPatch::Column(column) => {
            let category = category_for(columns, &column);
            condition.column = column;
            // 换列后运算符若不再合法, 重置为通用默认值并清空输入
            if !category.allows(condition.operator) {
                condition.operator = Operator::Eq;
                condition.value.clear();
                condition.value2 = None;
            }
        }
        ConditionPatch::Operator(operator) => {
            let category = category_for(columns, &condition.column);
            if !category.allows(operator) {
                return; // 非法运算符, 忽略
            }
            condition.operator = operator;
            if !operator.takes_second_value() {
                condition.value2 = None;
            }
        }
        ConditionPatch::Value(value) => {
            condition.value = value;
        }
        ConditionPatch::Value2(value) => {
            // value2 只对 BETWEEN 有意义
            if condition.operator.takes_second_value() {
                condition.value2 = Some(value);
            }
        }
    }
}
