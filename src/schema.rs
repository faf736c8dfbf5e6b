//! 列类型解析: 把列的声明类型名映射到类型类别和值输入类别
//!
//! 类型名匹配是大小写不敏感的子串匹配, 未知类型一律退化为文本类别,
//! 因此这里的所有函数都是全函数, 没有错误分支.

use crate::model::Operator;
use serde::{Deserialize, Serialize};

/// 列描述符, 由外部的schema目录提供, 本引擎只读不改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub column_name: String,
    /// 目录中声明的类型名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    /// 底层真实类型名, 存在时优先于 `data_type`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_data_type: Option<String>,
}

impl ColumnDescriptor {
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            column_name: name.to_string(),
            data_type: Some(data_type.to_string()),
            real_data_type: None,
        }
    }

    /// 用于类型判定的有效类型名: real_data_type 优先, 缺失时退回 data_type
    fn effective_type(&self) -> &str {
        self.real_data_type
            .as_deref()
            .or(self.data_type.as_deref())
            .unwrap_or("")
    }
}

/// 类型类别, 决定该列允许的运算符集合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Boolean,
    Text,
    Number,
    Date,
}

const NUMBER_FRAGMENTS: [&str; 7] = [
    "int", "numeric", "decimal", "float", "double", "real", "money",
];

const BOOLEAN_OPERATORS: [Operator; 4] = [
    Operator::Eq,
    Operator::NotEq,
    Operator::IsNull,
    Operator::IsNotNull,
];

const TEXT_OPERATORS: [Operator; 7] = [
    Operator::Eq,
    Operator::NotEq,
    Operator::Like,
    Operator::ILike,
    Operator::In,
    Operator::IsNull,
    Operator::IsNotNull,
];

const NUMBER_OPERATORS: [Operator; 9] = [
    Operator::Eq,
    Operator::NotEq,
    Operator::Gt,
    Operator::Lt,
    Operator::Gte,
    Operator::Lte,
    Operator::In,
    Operator::IsNull,
    Operator::IsNotNull,
];

const DATE_OPERATORS: [Operator; 9] = [
    Operator::Eq,
    Operator::NotEq,
    Operator::Gt,
    Operator::Lt,
    Operator::Gte,
    Operator::Lte,
    Operator::Between,
    Operator::IsNull,
    Operator::IsNotNull,
];

impl TypeCategory {
    /// 从类型名解析类别
    ///
    /// 匹配顺序: bool → 数字片段 → date/time → 其余全部视为文本
    pub fn from_type_name(type_name: &str) -> Self {
        let name = type_name.to_ascii_lowercase();
        if name.contains("bool") {
            return TypeCategory::Boolean;
        }
        if NUMBER_FRAGMENTS.iter().any(|f| name.contains(f)) {
            return TypeCategory::Number;
        }
        if name.contains("date") || name.contains("time") {
            return TypeCategory::Date;
        }
        TypeCategory::Text
    }

    pub fn of(column: &ColumnDescriptor) -> Self {
        Self::from_type_name(column.effective_type())
    }

    /// 该类别允许的运算符集合 (顺序即UI展示顺序)
    pub fn operators(self) -> &'static [Operator] {
        match self {
            TypeCategory::Boolean => &BOOLEAN_OPERATORS,
            TypeCategory::Text => &TEXT_OPERATORS,
            TypeCategory::Number => &NUMBER_OPERATORS,
            TypeCategory::Date => &DATE_OPERATORS,
        }
    }

    pub fn allows(self, operator: Operator) -> bool {
        self.operators().contains(&operator)
    }
}

/// 值输入类别, 决定UI使用哪种输入控件
///
/// 与 `TypeCategory` 相互独立: 例如 `timestamp` 类的列属于日期类别
/// (允许 BETWEEN 等运算符), 但类型名里没有完整的 "date", 编辑时按
/// 普通文本处理.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Numeric,
    Date,
    DateTime,
    Text,
}

impl ValueKind {
    pub fn from_type_name(type_name: &str) -> Self {
        let name = type_name.to_ascii_lowercase();
        if TypeCategory::from_type_name(&name) == TypeCategory::Number {
            return ValueKind::Numeric;
        }
        // datetime 要求类型名同时含有日期与时间两部分
        if name.contains("date") && name.contains("time") {
            return ValueKind::DateTime;
        }
        if name.contains("date") {
            return ValueKind::Date;
        }
        ValueKind::Text
    }

    pub fn of(column: &ColumnDescriptor) -> Self {
        Self::from_type_name(column.effective_type())
    }
}

/// 在描述符列表中查找某列的类别, 未知列退化为文本类别
pub fn category_for(columns: &[ColumnDescriptor], column_name: &str) -> TypeCategory {
    columns
        .iter()
        .find(|c| c.column_name == column_name)
        .map(TypeCategory::of)
        .unwrap_or(TypeCategory::Text)
}
