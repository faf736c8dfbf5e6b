//! Serializer: canonical versioned persistence form plus the SQL
//! `WHERE`-clause preview shown to operators.
//!
//! Both outputs only include "valid" conditions — a condition
//! contributes when its value is non-empty or its operator is a null
//! check. Groups left without any contributing condition are dropped
//! together with their connecting operator, so the output never contains
//! dangling `AND`/`OR`.

use crate::model::{Condition, Connector, FilterState, Operator};
use serde::{Deserialize, Serialize};

/// Version tag of the canonical persistence form.
pub(crate) const CANONICAL_VERSION: u32 = 2;

/// 持久化格式 (版本2). 字段名是持久化契约的一部分, 不可改动.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct PersistedFilter {
    pub(crate) version: u32,
    pub(crate) groups: Vec<PersistedGroup>,
    #[serde(rename = "interLogic")]
    pub(crate) connectors: Vec<Connector>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct PersistedGroup {
    pub(crate) conditions: Vec<PersistedCondition>,
    #[serde(rename = "intraLogic")]
    pub(crate) logic: Connector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct PersistedCondition {
    pub(crate) column: String,
    pub(crate) operator: Operator,
    pub(crate) value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) value2: Option<String>,
}

/// Serialize a filter state into the canonical persisted string.
///
/// A state without any valid condition serializes to the empty string,
/// which downstream storage treats as "no filter".
pub fn serialize(state: &FilterState) -> String {
    if !state.has_valid_condition() {
        return String::new();
    }

    let mut groups = Vec::new();
    let mut connectors = Vec::new();
    for (index, group) in state.groups.iter().enumerate() {
        let conditions: Vec<PersistedCondition> = group
            .conditions
            .iter()
            .filter(|c| c.is_valid())
            .map(persist_condition)
            .collect();
        if conditions.is_empty() {
            continue; // group contributes nothing, its connector is skipped
        }
        if !groups.is_empty() {
            let connector = index
                .checked_sub(1)
                .and_then(|i| state.connectors.get(i))
                .copied()
                .unwrap_or_default();
            connectors.push(connector);
        }
        groups.push(PersistedGroup {
            conditions,
            logic: group.logic,
        });
    }

    let wire = PersistedFilter {
        version: CANONICAL_VERSION,
        groups,
        connectors,
    };
    serde_json::to_string(&wire).unwrap_or_default()
}

fn persist_condition(condition: &Condition) -> PersistedCondition {
    // Null checks ignore whatever is left in the value box; the canonical
    // form stores them normalized so round-trips are stable.
    let value = if condition.operator.is_null_check() {
        String::new()
    } else {
        condition.value.clone()
    };
    let value2 = if condition.operator.takes_second_value() {
        condition.value2.clone()
    } else {
        None
    };
    PersistedCondition {
        column: condition.column.clone(),
        operator: condition.operator,
        value,
        value2,
    }
}

/// Render the SQL `WHERE`-clause preview for operator feedback.
///
/// Display-only: the string is never executed or persisted by this crate.
pub fn render_sql(state: &FilterState) -> String {
    let mut clause = String::new();
    for (index, group) in state.groups.iter().enumerate() {
        let rendered: Vec<String> = group
            .conditions
            .iter()
            .filter_map(render_condition)
            .collect();
        if rendered.is_empty() {
            continue;
        }
        let joined = rendered.join(&format!(" {} ", group.logic.as_sql()));
        let group_clause = if rendered.len() > 1 {
            format!("({joined})")
        } else {
            joined
        };
        if !clause.is_empty() {
            // connector preceding this group; AND when undefined
            let connector = index
                .checked_sub(1)
                .and_then(|i| state.connectors.get(i))
                .copied()
                .unwrap_or_default();
            clause.push_str(&format!(" {} ", connector.as_sql()));
        }
        clause.push_str(&group_clause);
    }
    clause
}

/// Render one condition, or `None` when it contributes nothing.
fn render_condition(condition: &Condition) -> Option<String> {
    let column = &condition.column;
    match condition.operator {
        Operator::IsNull | Operator::IsNotNull => {
            Some(format!("{column} {}", condition.operator.as_sql()))
        }
        _ if condition.value.is_empty() => None,
        Operator::Between => match &condition.value2 {
            Some(value2) if !value2.is_empty() => Some(format!(
                "{column} BETWEEN {} AND {}",
                quote(&condition.value),
                quote(value2)
            )),
            // second value missing: fall through to plain comparison shape
            _ => Some(format!(
                "{column} BETWEEN {}",
                literal(&condition.value)
            )),
        },
        Operator::Like | Operator::ILike => Some(format!(
            "{column} {} '%{}%'",
            condition.operator.as_sql(),
            escape_quotes(&condition.value)
        )),
        Operator::In => {
            let values = split_in_values(&condition.value);
            if values.is_empty() {
                return None;
            }
            let rendered: Vec<String> = values.iter().map(|v| literal(v)).collect();
            Some(format!("{column} IN ({})", rendered.join(", ")))
        }
        _ => Some(format!(
            "{column} {} {}",
            condition.operator.as_sql(),
            literal(&condition.value)
        )),
    }
}

/// Split an IN value list on commas, trimming and dropping empty tokens.
pub(crate) fn split_in_values(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Bare integer/decimal literals stay unquoted, everything else becomes
/// a quoted string literal.
fn literal(value: &str) -> String {
    if is_bare_number(value) {
        value.to_string()
    } else {
        quote(value)
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", escape_quotes(value))
}

fn escape_quotes(value: &str) -> String {
    value.replace('\'', "''")
}

/// Matches `^\d+(\.\d+)?$` — unsigned integers and decimals only, so a
/// leading sign or stray dot falls back to string quoting.
pub(crate) fn is_bare_number(value: &str) -> bool {
    fn digits(s: &str) -> bool {
        !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
    }
    match value.split_once('.') {
        Some((int_part, frac_part)) => digits(int_part) && digits(frac_part),
        None => digits(value),
    }
}
