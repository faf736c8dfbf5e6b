//! Filter状态树的数据模型: 条件 → 条件组 → 整体状态

use serde::{Deserialize, Serialize};

/// 逻辑连接符 (组内与组间共用)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Connector {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl Connector {
    /// AND ↔ OR 翻转
    pub fn toggled(self) -> Self {
        match self {
            Connector::And => Connector::Or,
            Connector::Or => Connector::And,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

/// 条件运算符
///
/// 序列化时使用SQL写法 (持久化格式的一部分, 不可改动)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq, // =
    #[serde(rename = "!=")]
    NotEq, // !=
    #[serde(rename = ">")]
    Gt, // >
    #[serde(rename = "<")]
    Lt, // <
    #[serde(rename = ">=")]
    Gte, // >=
    #[serde(rename = "<=")]
    Lte, // <=
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "ILIKE")]
    ILike,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "BETWEEN")]
    Between,
    #[serde(rename = "IS NULL")]
    IsNull,
    #[serde(rename = "IS NOT NULL")]
    IsNotNull,
}

impl Operator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
            Operator::ILike => "ILIKE",
            Operator::In => "IN",
            Operator::Between => "BETWEEN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        }
    }

    /// 空值检查运算符不需要用户输入值
    pub fn is_null_check(self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }

    /// BETWEEN 需要第二个值 (value2)
    pub fn takes_second_value(self) -> bool {
        matches!(self, Operator::Between)
    }
}

/// 条件的不透明ID, 仅在内存中有效, 不参与持久化
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConditionId(pub u64);

/// 条件组的不透明ID, 仅在内存中有效, 不参与持久化
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub u64);

/// 单个过滤条件: 列 + 运算符 + 值
///
/// `value2` 仅在运算符为 BETWEEN 时存在
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub id: ConditionId,
    pub column: String,
    pub operator: Operator,
    pub value: String,
    pub value2: Option<String>,
}

impl Condition {
    /// 创建默认条件: 指定列, `=` 运算符, 空值
    pub fn new(id: ConditionId, column: String) -> Self {
        Self {
            id,
            column,
            operator: Operator::Eq,
            value: String::new(),
            value2: None,
        }
    }

    /// 条件是否会参与序列化/预览输出
    ///
    /// 规则: 值非空, 或者运算符是空值检查 (IS NULL / IS NOT NULL)
    pub fn is_valid(&self) -> bool {
        self.operator.is_null_check() || !self.value.is_empty()
    }
}

/// 条件组: 一组条件共享同一个组内逻辑连接符
///
/// 不变式: 组内至少有一个条件. 删除最后一个条件时整个组被删除,
/// 该规则由变更层 (reducer) 保证.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: GroupId,
    pub conditions: Vec<Condition>,
    pub logic: Connector,
}

impl Group {
    pub fn new(id: GroupId, first: Condition) -> Self {
        Self {
            id,
            conditions: vec![first],
            logic: Connector::And,
        }
    }

    /// 组内是否存在会输出的条件
    pub fn has_valid_condition(&self) -> bool {
        self.conditions.iter().any(Condition::is_valid)
    }
}

/// 完整的Filter状态: 条件组序列 + 组间连接符序列
///
/// 不变式: `connectors.len() == max(0, groups.len() - 1)`,
/// 即每两个相邻组之间恰好有一个连接符.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterState {
    pub groups: Vec<Group>,
    pub connectors: Vec<Connector>,
    next_id: u64,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// 是否有任何条件会参与输出
    pub fn has_valid_condition(&self) -> bool {
        self.groups.iter().any(Group::has_valid_condition)
    }

    /// 分配一个新的不透明ID
    pub fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    fn group_index(&self, id: GroupId) -> Option<usize> {
        self.groups.iter().position(|g| g.id == id)
    }

    /// 追加一个新组, 同时维护组间连接符不变式
    ///
    /// 如果之前已有组, 在连接符序列末尾补一个 AND
    pub fn push_group(&mut self, group: Group) {
        if !self.groups.is_empty() {
            self.connectors.push(Connector::And);
        }
        self.groups.push(group);
    }

    /// 删除一个组, 同时删除对应的组间连接符
    ///
    /// 连接符的删除位置很关键: 删除第一个组时删掉 `connectors[0]`
    /// (它后面的连接符), 否则删掉 `connectors[index-1]` (它前面的连接符).
    /// 删错一侧会让相邻组的逻辑错位.
    pub fn remove_group(&mut self, id: GroupId) {
        let Some(index) = self.group_index(id) else {
            return; // 未知ID, 忽略
        };
        self.groups.remove(index);
        if self.connectors.is_empty() {
            return;
        }
        if index == 0 {
            self.connectors.remove(0);
        } else {
            self.connectors.remove(index - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(state: &mut FilterState, column: &str) -> Condition {
        let id = ConditionId(state.alloc_id());
        Condition::new(id, column.to_string())
    }

    fn push_group_with(state: &mut FilterState, column: &str) -> GroupId {
        let cond = condition(state, column);
        let gid = GroupId(state.alloc_id());
        state.push_group(Group::new(gid, cond));
        gid
    }

    #[test]
    fn test_connector_toggle() {
        assert_eq!(Connector::And.toggled(), Connector::Or);
        assert_eq!(Connector::Or.toggled(), Connector::And);
    }

    #[test]
    fn test_null_check_operators_are_valid_without_value() {
        let mut state = FilterState::new();
        let mut cond = condition(&mut state, "deleted_at");
        assert!(!cond.is_valid());

        cond.operator = Operator::IsNull;
        assert!(cond.is_valid());

        cond.operator = Operator::IsNotNull;
        assert!(cond.is_valid());
    }

    #[test]
    fn test_condition_with_value_is_valid() {
        let mut state = FilterState::new();
        let mut cond = condition(&mut state, "status");
        cond.value = "active".to_string();
        assert!(cond.is_valid());
    }

    #[test]
    fn test_push_group_maintains_connector_invariant() {
        let mut state = FilterState::new();
        assert_eq!(state.connectors.len(), 0);

        push_group_with(&mut state, "a");
        assert_eq!(state.groups.len(), 1);
        assert_eq!(state.connectors.len(), 0);

        push_group_with(&mut state, "b");
        assert_eq!(state.groups.len(), 2);
        assert_eq!(state.connectors.len(), 1);
        assert_eq!(state.connectors[0], Connector::And);

        push_group_with(&mut state, "c");
        assert_eq!(state.connectors.len(), 2);
    }

    #[test]
    fn test_remove_first_group_splices_leading_connector() {
        let mut state = FilterState::new();
        let g1 = push_group_with(&mut state, "a");
        push_group_with(&mut state, "b");
        push_group_with(&mut state, "c");

        // a AND b OR c, 然后删除 a
        state.connectors[1] = Connector::Or;
        state.remove_group(g1);

        assert_eq!(state.groups.len(), 2);
        // b 和 c 之间的 OR 必须保留
        assert_eq!(state.connectors, vec![Connector::Or]);
    }

    #[test]
    fn test_remove_middle_group_splices_preceding_connector() {
        let mut state = FilterState::new();
        push_group_with(&mut state, "a");
        let g2 = push_group_with(&mut state, "b");
        push_group_with(&mut state, "c");

        // a OR b AND c, 删除 b 后应剩下 a AND c
        state.connectors[0] = Connector::Or;
        state.remove_group(g2);

        assert_eq!(state.groups.len(), 2);
        assert_eq!(state.connectors, vec![Connector::And]);
    }

    #[test]
    fn test_remove_unknown_group_is_ignored() {
        let mut state = FilterState::new();
        push_group_with(&mut state, "a");
        state.remove_group(GroupId(999));
        assert_eq!(state.groups.len(), 1);
    }

    #[test]
    fn test_operator_wire_format_round_trip() {
        for op in [
            Operator::Eq,
            Operator::NotEq,
            Operator::Gt,
            Operator::Lt,
            Operator::Gte,
            Operator::Lte,
            Operator::Like,
            Operator::ILike,
            Operator::In,
            Operator::Between,
            Operator::IsNull,
            Operator::IsNotNull,
        ] {
            let json = serde_json::to_string(&op).unwrap();
            assert_eq!(json, format!("\"{}\"", op.as_sql()));
            let back: Operator = serde_json::from_str(&json).unwrap();
            assert_eq!(back, op);
        }
    }
}
