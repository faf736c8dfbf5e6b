//! Predicate compiler that converts filter states into executable
//! sea-query conditions.
//!
//! The hand-rendered preview in `serializer` is a display contract; this
//! module is for consumers that need a real predicate to attach to a
//! query. Literals are typed from the column's category so numeric and
//! boolean columns compare natively instead of as strings.

use crate::model::{Condition as FilterCondition, Connector, FilterState, Operator};
use crate::schema::{category_for, ColumnDescriptor, TypeCategory};
use crate::serializer::split_in_values;
use sea_query::extension::postgres::PgExpr;
use sea_query::{
    Asterisk, Cond, Condition, Expr, Iden, PostgresQueryBuilder, SelectStatement, SimpleExpr,
    Value,
};

/// Column identifier wrapper
#[derive(Debug, Clone)]
pub struct ColumnName(pub String);

impl Iden for ColumnName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "{}", self.0).unwrap();
    }
}

/// Table identifier wrapper
#[derive(Debug, Clone)]
pub struct TableName(pub String);

impl Iden for TableName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "{}", self.0).unwrap();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub message: String,
}

impl CompileError {
    fn new(message: String) -> Self {
        Self { message }
    }
}

/// Compiles filter states against a column descriptor list.
pub struct PredicateCompiler<'a> {
    columns: &'a [ColumnDescriptor],
}

impl<'a> PredicateCompiler<'a> {
    pub fn new(columns: &'a [ColumnDescriptor]) -> Self {
        Self { columns }
    }

    /// Compile a filter state into a sea-query condition tree.
    ///
    /// Invalid conditions are skipped like the preview does; a state left
    /// with nothing to compile is an error, because callers reaching for
    /// a predicate need one.
    pub fn compile(&self, state: &FilterState) -> Result<Condition, CompileError> {
        let mut compiled: Vec<(usize, Condition)> = Vec::new();
        for (index, group) in state.groups.iter().enumerate() {
            let exprs: Vec<SimpleExpr> = group
                .conditions
                .iter()
                .filter_map(|c| self.compile_condition(c))
                .collect();
            if exprs.is_empty() {
                continue;
            }
            let mut condition = match group.logic {
                Connector::And => Cond::all(),
                Connector::Or => Cond::any(),
            };
            for expr in exprs {
                condition = condition.add(expr);
            }
            compiled.push((index, condition));
        }

        let mut rest = compiled.into_iter();
        let Some((_, first)) = rest.next() else {
            return Err(CompileError::new(
                "filter contains no valid condition".to_string(),
            ));
        };

        // 连接符左结合折叠: A AND B OR C == (A AND B) OR C
        let mut combined = first;
        for (index, condition) in rest {
            let connector = index
                .checked_sub(1)
                .and_then(|i| state.connectors.get(i))
                .copied()
                .unwrap_or_default();
            combined = match connector {
                Connector::And => Cond::all().add(combined).add(condition),
                Connector::Or => Cond::any().add(combined).add(condition),
            };
        }
        Ok(combined)
    }

    /// Wrap the compiled predicate in `SELECT * FROM table WHERE ...`,
    /// rendered for Postgres.
    pub fn compile_select(
        &self,
        table: &str,
        state: &FilterState,
    ) -> Result<String, CompileError> {
        let condition = self.compile(state)?;

        let mut select = SelectStatement::new();
        select.from(TableName(table.to_string()));
        select.column(Asterisk);
        select.cond_where(condition);

        Ok(select.to_string(PostgresQueryBuilder))
    }

    /// Compile a single condition. `None` when it contributes nothing.
    fn compile_condition(&self, condition: &FilterCondition) -> Option<SimpleExpr> {
        if !condition.is_valid() {
            return None;
        }
        let column = Expr::col(ColumnName(condition.column.clone()));

        let expr = match condition.operator {
            Operator::IsNull => column.is_null(),
            Operator::IsNotNull => column.is_not_null(),
            Operator::Like => column.like(format!("%{}%", condition.value)),
            Operator::ILike => column.ilike(format!("%{}%", condition.value)),
            Operator::In => {
                let values: Vec<Value> = split_in_values(&condition.value)
                    .iter()
                    .map(|v| self.typed_value(&condition.column, v))
                    .collect();
                if values.is_empty() {
                    return None;
                }
                column.is_in(values)
            }
            Operator::Between => {
                let low = self.typed_value(&condition.column, &condition.value);
                match condition.value2.as_deref().filter(|v| !v.is_empty()) {
                    Some(high) => column.between(low, self.typed_value(&condition.column, high)),
                    // 缺上界时退化为下界比较
                    None => column.gte(low),
                }
            }
            Operator::Eq => column.eq(self.typed_value(&condition.column, &condition.value)),
            Operator::NotEq => column.ne(self.typed_value(&condition.column, &condition.value)),
            Operator::Gt => column.gt(self.typed_value(&condition.column, &condition.value)),
            Operator::Lt => column.lt(self.typed_value(&condition.column, &condition.value)),
            Operator::Gte => column.gte(self.typed_value(&condition.column, &condition.value)),
            Operator::Lte => column.lte(self.typed_value(&condition.column, &condition.value)),
        };
        Some(expr)
    }

    /// Convert a raw value string to a sea-query value typed by the
    /// column's category. Values that fail to parse fall back to strings.
    fn typed_value(&self, column: &str, raw: &str) -> Value {
        match category_for(self.columns, column) {
            TypeCategory::Number => {
                if let Ok(n) = raw.parse::<i64>() {
                    Value::BigInt(Some(n))
                } else if let Ok(f) = raw.parse::<f64>() {
                    Value::Double(Some(f))
                } else {
                    Value::String(Some(Box::new(raw.to_string())))
                }
            }
            TypeCategory::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Value::Bool(Some(true)),
                "false" | "f" | "0" => Value::Bool(Some(false)),
                _ => Value::String(Some(Box::new(raw.to_string()))),
            },
            _ => Value::String(Some(Box::new(raw.to_string()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Condition, ConditionId, Group, GroupId};

    fn test_columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("status", "character varying"),
            ColumnDescriptor::new("qty", "integer"),
            ColumnDescriptor::new("price", "numeric"),
            ColumnDescriptor::new("active", "boolean"),
            ColumnDescriptor::new("created_at", "date"),
        ]
    }

    fn cond(column: &str, operator: Operator, value: &str) -> Condition {
        let mut condition = Condition::new(ConditionId(1), column.to_string());
        condition.operator = operator;
        condition.value = value.to_string();
        condition
    }

    fn single_state(condition: Condition) -> FilterState {
        let mut state = FilterState::new();
        state.push_group(Group::new(GroupId(1), condition));
        state
    }

    fn compile_sql(state: &FilterState) -> String {
        let columns = test_columns();
        PredicateCompiler::new(&columns)
            .compile_select("orders", state)
            .unwrap()
    }

    #[test]
    fn test_simple_predicate() {
        let sql = compile_sql(&single_state(cond("status", Operator::Eq, "active")));
        assert_eq!(sql, r#"SELECT * FROM "orders" WHERE "status" = 'active'"#);
    }

    #[test]
    fn test_numeric_column_gets_typed_literal() {
        let sql = compile_sql(&single_state(cond("qty", Operator::Gt, "10")));
        assert_eq!(sql, r#"SELECT * FROM "orders" WHERE "qty" > 10"#);

        let sql = compile_sql(&single_state(cond("price", Operator::Lte, "42.5")));
        assert_eq!(sql, r#"SELECT * FROM "orders" WHERE "price" <= 42.5"#);
    }

    #[test]
    fn test_boolean_column_gets_typed_literal() {
        let sql = compile_sql(&single_state(cond("active", Operator::Eq, "true")));
        assert_eq!(sql, r#"SELECT * FROM "orders" WHERE "active" = TRUE"#);
    }

    #[test]
    fn test_unknown_column_compares_as_text() {
        let sql = compile_sql(&single_state(cond("mystery", Operator::Eq, "7")));
        assert_eq!(sql, r#"SELECT * FROM "orders" WHERE "mystery" = '7'"#);
    }

    #[test]
    fn test_in_list_typed_per_column() {
        let sql = compile_sql(&single_state(cond("qty", Operator::In, "1, 2, 3")));
        assert_eq!(sql, r#"SELECT * FROM "orders" WHERE "qty" IN (1, 2, 3)"#);

        let sql = compile_sql(&single_state(cond("status", Operator::In, "a, b")));
        assert_eq!(sql, r#"SELECT * FROM "orders" WHERE "status" IN ('a', 'b')"#);
    }

    #[test]
    fn test_between_both_bounds() {
        let mut condition = cond("created_at", Operator::Between, "2024-01-01");
        condition.value2 = Some("2024-01-31".to_string());
        let sql = compile_sql(&single_state(condition));
        assert_eq!(
            sql,
            r#"SELECT * FROM "orders" WHERE "created_at" BETWEEN '2024-01-01' AND '2024-01-31'"#
        );
    }

    #[test]
    fn test_between_missing_upper_bound_degrades() {
        let sql = compile_sql(&single_state(cond("created_at", Operator::Between, "2024-01-01")));
        assert_eq!(
            sql,
            r#"SELECT * FROM "orders" WHERE "created_at" >= '2024-01-01'"#
        );
    }

    #[test]
    fn test_like_and_ilike_wrap_wildcards() {
        let sql = compile_sql(&single_state(cond("status", Operator::Like, "acme")));
        assert_eq!(sql, r#"SELECT * FROM "orders" WHERE "status" LIKE '%acme%'"#);

        let sql = compile_sql(&single_state(cond("status", Operator::ILike, "acme")));
        assert_eq!(sql, r#"SELECT * FROM "orders" WHERE "status" ILIKE '%acme%'"#);
    }

    #[test]
    fn test_null_checks() {
        let sql = compile_sql(&single_state(cond("status", Operator::IsNull, "")));
        assert_eq!(sql, r#"SELECT * FROM "orders" WHERE "status" IS NULL"#);

        let sql = compile_sql(&single_state(cond("status", Operator::IsNotNull, "")));
        assert_eq!(sql, r#"SELECT * FROM "orders" WHERE "status" IS NOT NULL"#);
    }

    #[test]
    fn test_intra_group_logic() {
        let mut group = Group::new(GroupId(1), cond("status", Operator::Eq, "a"));
        group.conditions.push(cond("qty", Operator::Gt, "5"));
        group.logic = Connector::Or;
        let mut state = FilterState::new();
        state.push_group(group);

        let sql = compile_sql(&state);
        assert_eq!(
            sql,
            r#"SELECT * FROM "orders" WHERE "status" = 'a' OR "qty" > 5"#
        );
    }

    #[test]
    fn test_mixed_connectors_fold_left() {
        let mut state = FilterState::new();
        state.push_group(Group::new(GroupId(1), cond("status", Operator::Eq, "a")));
        state.push_group(Group::new(GroupId(2), cond("qty", Operator::Gt, "5")));
        state.push_group(Group::new(GroupId(3), cond("active", Operator::Eq, "true")));
        state.connectors[0] = Connector::And;
        state.connectors[1] = Connector::Or;

        let sql = compile_sql(&state);
        // (A AND B) OR C
        assert_eq!(
            sql,
            r#"SELECT * FROM "orders" WHERE ("status" = 'a' AND "qty" > 5) OR "active" = TRUE"#
        );
    }

    #[test]
    fn test_invalid_conditions_are_skipped() {
        let mut group = Group::new(GroupId(1), cond("status", Operator::Eq, "a"));
        group.conditions.push(cond("qty", Operator::Gt, ""));
        let mut state = FilterState::new();
        state.push_group(group);

        let sql = compile_sql(&state);
        assert_eq!(sql, r#"SELECT * FROM "orders" WHERE "status" = 'a'"#);
    }

    #[test]
    fn test_empty_state_is_an_error() {
        let columns = test_columns();
        let compiler = PredicateCompiler::new(&columns);
        let error = compiler.compile(&FilterState::new()).unwrap_err();
        assert!(error.message.contains("no valid condition"));
    }
}
