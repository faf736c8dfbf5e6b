//! 行级筛选引擎
//!
//! 把结构化的条件组（组内/组间各自独立的 AND/OR 逻辑）变换为：
//! - 规范的版本化持久化形式（JSON, version 2）
//! - 展示用的 SQL `WHERE` 子句预览
//! - 可执行的 sea-query 谓词
//!
//! 解析入口同时兼容两种旧版文本编码，按策略链逐级回退，永不报错。
//! 列的类型类别约束每个条件允许的运算符集合。

pub mod catalog;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod reducer;
pub mod schema;
pub mod serializer;
pub mod sql;
pub mod token;

pub use catalog::{CatalogError, SchemaCatalog};
pub use model::{Condition, ConditionId, Connector, FilterState, Group, GroupId, Operator};
pub use parser::parse;
pub use reducer::{reduce, Action, ConditionPatch};
pub use schema::{category_for, ColumnDescriptor, TypeCategory, ValueKind};
pub use serializer::{render_sql, serialize};
pub use sql::{CompileError, PredicateCompiler};
