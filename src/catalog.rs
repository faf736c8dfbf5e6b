//! 表结构目录，负责加载各表的列描述JSON配置

use crate::schema::ColumnDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// 表结构目录错误
#[derive(Debug)]
pub struct CatalogError {
    pub message: String,
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "目录错误: {}", self.message)
    }
}

impl std::error::Error for CatalogError {}

impl CatalogError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

/// 表名到列描述列表的映射
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaCatalog {
    #[serde(flatten)]
    pub tables: HashMap<String, Vec<ColumnDescriptor>>,
}

impl SchemaCatalog {
    /// 从JSON文件加载表结构目录
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path_ref = path.as_ref();

        // 检查文件是否存在
        if !path_ref.exists() {
            return Err(CatalogError::new(format!(
                "目录文件不存在: {}",
                path_ref.display()
            )));
        }

        // 读取文件内容
        let content = fs::read_to_string(path_ref).map_err(|e| {
            CatalogError::new(format!(
                "无法读取目录文件 {}: {}",
                path_ref.display(),
                e
            ))
        })?;

        // 解析JSON
        let tables: HashMap<String, Vec<ColumnDescriptor>> = serde_json::from_str(&content)
            .map_err(|e| {
                CatalogError::new(format!(
                    "无法解析JSON目录文件 {}: {}",
                    path_ref.display(),
                    e
                ))
            })?;

        Ok(SchemaCatalog { tables })
    }

    /// 获取某个表的列描述，未知表返回空切片
    pub fn columns(&self, table: &str) -> &[ColumnDescriptor] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 已登记的表名，按字典序
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// 内置演示目录（目录文件缺失时的fallback）
    pub fn demo() -> Self {
        let mut tables = HashMap::new();
        tables.insert(
            "orders".to_string(),
            vec![
                ColumnDescriptor::new("id", "bigint"),
                ColumnDescriptor::new("status", "character varying"),
                ColumnDescriptor::new("total", "numeric"),
                ColumnDescriptor::new("paid", "boolean"),
                ColumnDescriptor::new("created_at", "timestamp without time zone"),
                ColumnDescriptor::new("shipped_on", "date"),
            ],
        );
        tables.insert(
            "customers".to_string(),
            vec![
                ColumnDescriptor::new("id", "bigint"),
                ColumnDescriptor::new("name", "text"),
                ColumnDescriptor::new("email", "text"),
                ColumnDescriptor::new("vip", "boolean"),
                ColumnDescriptor::new("signed_up", "date"),
            ],
        );
        Self { tables }
    }
}
