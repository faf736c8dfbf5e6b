//! 行级筛选构建台：交互式地组装筛选、查看预览并演示持久化往返。

use anyhow::{Context, Result};
use filter_composer::{
    parse, reduce, render_sql, serialize, Action, ConditionId, ConditionPatch, FilterState,
    GroupId, Operator, PredicateCompiler, SchemaCatalog, TypeCategory, ValueKind,
};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

struct Console {
    catalog: SchemaCatalog,
    table: String,
    state: FilterState,
}

fn main() -> Result<()> {
    env_logger::init();

    println!("--- Filter Composer: 行级筛选构建台 ---");

    let catalog = load_catalog();
    let table = catalog
        .table_names()
        .first()
        .map(|name| name.to_string())
        .unwrap_or_default();

    if table.is_empty() {
        println!("⚠️ 目录中没有任何表");
    } else {
        println!("已加载表: {}", catalog.table_names().join(", "));
        println!("当前表: {} (table <名称> 切换, help 查看命令)", table);
    }

    let mut console = Console {
        catalog,
        table,
        state: FilterState::new(),
    };

    let mut editor = DefaultEditor::new().context("初始化命令行编辑器失败")?;
    loop {
        match editor.readline("filter> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line).ok();
                if !console.dispatch(line) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(error) => {
                println!("✗ 读取输入失败: {}", error);
                break;
            }
        }
    }
    println!("再见!");
    Ok(())
}

/// 优先使用JSON目录文件，失败时退回内置演示目录
fn load_catalog() -> SchemaCatalog {
    match SchemaCatalog::from_json_file("schema_catalog.json") {
        Ok(catalog) => {
            println!(
                "✅ 成功加载表结构目录: schema_catalog.json ({} 个表)",
                catalog.tables.len()
            );
            catalog
        }
        Err(error) => {
            println!("⚠️ 无法加载表结构目录 ({}), 使用内置演示目录", error);
            SchemaCatalog::demo()
        }
    }
}

impl Console {
    /// 处理一行命令，返回 false 表示退出
    fn dispatch(&mut self, line: &str) -> bool {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "quit" | "exit" => return false,
            "help" => self.help(),
            "tables" => self.tables(),
            "table" => self.pick_table(rest),
            "columns" => self.columns(),
            "add-group" => self.apply(Action::AddGroup),
            "rm-group" => self.rm_group(rest),
            "add-cond" => self.add_condition(rest),
            "rm-cond" => self.rm_condition(rest),
            "set" => self.set_field(rest),
            "logic" => self.toggle_logic(rest),
            "conn" => self.toggle_connector(rest),
            "show" => self.show(),
            "load" => self.load(rest),
            "save" => self.save(),
            "demo" => self.demo(),
            "clear" => {
                self.state = FilterState::new();
                println!("✓ 已清空筛选");
            }
            _ => println!("✗ 未知命令: {} (help 查看帮助)", command),
        }
        true
    }

    fn help(&self) {
        println!("可用命令:");
        println!("  tables                  列出所有表");
        println!("  table <名称>            切换当前表 (重置筛选)");
        println!("  columns                 查看当前表的列与可用运算符");
        println!("  add-group               新增条件组");
        println!("  rm-group <组>           删除条件组");
        println!("  add-cond <组>           组内新增条件");
        println!("  rm-cond <组> <条件>     删除条件 (最后一个条件时整组删除)");
        println!("  set <组> <条件> column|op|value|value2 <内容>");
        println!("  logic <组>              切换组内 AND/OR");
        println!("  conn <序号>             切换组间连接符");
        println!("  show                    结构 / SQL预览 / 规范形式 / sea-query SQL");
        println!("  load <串>               解析持久化串 (规范或旧版格式)");
        println!("  save                    输出规范持久化串");
        println!("  demo                    旧版格式解析演示");
        println!("  clear                   清空筛选");
        println!("  quit                    退出");
    }

    fn tables(&self) {
        for name in self.catalog.table_names() {
            println!("  • {} ({} 列)", name, self.catalog.columns(name).len());
        }
    }

    fn pick_table(&mut self, name: &str) {
        if name.is_empty() {
            println!("✗ 用法: table <名称>");
            return;
        }
        if self.catalog.tables.contains_key(name) {
            self.table = name.to_string();
            self.state = FilterState::new();
            println!("✓ 切换到表 {}, 筛选已重置", name);
        } else {
            println!("✗ 未知表: {} (tables 查看全部)", name);
        }
    }

    fn columns(&self) {
        let columns = self.catalog.columns(&self.table);
        if columns.is_empty() {
            println!("⚠️ 表 {} 没有列信息", self.table);
            return;
        }
        println!("表 {} 的列:", self.table);
        for descriptor in columns {
            let category = TypeCategory::of(descriptor);
            let operators: Vec<&str> = category.operators().iter().map(|op| op.as_sql()).collect();
            println!(
                "  • {} [{:?}/{:?}] 运算符: {}",
                descriptor.column_name,
                category,
                ValueKind::of(descriptor),
                operators.join(", ")
            );
        }
    }

    /// 经由 reducer 应用一个动作，然后刷新预览
    fn apply(&mut self, action: Action) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action, self.catalog.columns(&self.table));
        self.preview();
    }

    fn preview(&self) {
        let sql = render_sql(&self.state);
        if sql.is_empty() {
            println!("(无有效条件)");
        } else {
            println!("WHERE {}", sql);
        }
    }

    fn rm_group(&mut self, rest: &str) {
        match self.group_id_at(rest) {
            Some(id) => self.apply(Action::RemoveGroup(id)),
            None => println!("✗ 找不到组 {}", rest),
        }
    }

    fn add_condition(&mut self, rest: &str) {
        match self.group_id_at(rest) {
            Some(id) => self.apply(Action::AddCondition(id)),
            None => println!("✗ 找不到组 {}", rest),
        }
    }

    fn rm_condition(&mut self, rest: &str) {
        let mut parts = rest.split_whitespace();
        let (Some(group_str), Some(condition_str)) = (parts.next(), parts.next()) else {
            println!("✗ 用法: rm-cond <组> <条件>");
            return;
        };
        match self.condition_at(group_str, condition_str) {
            Some((group, condition)) => self.apply(Action::RemoveCondition { group, condition }),
            None => println!("✗ 找不到条件 {}.{}", group_str, condition_str),
        }
    }

    fn set_field(&mut self, rest: &str) {
        let mut parts = rest.splitn(4, char::is_whitespace);
        let (Some(group_str), Some(condition_str), Some(field)) =
            (parts.next(), parts.next(), parts.next())
        else {
            println!("✗ 用法: set <组> <条件> column|op|value|value2 <内容>");
            return;
        };
        let text = parts.next().unwrap_or("").trim().to_string();

        let Some((group, condition)) = self.condition_at(group_str, condition_str) else {
            println!("✗ 找不到条件 {}.{}", group_str, condition_str);
            return;
        };

        let patch = match field {
            "column" | "col" => ConditionPatch::Column(text),
            "op" | "operator" => match parse_operator_name(&text) {
                Some(operator) => ConditionPatch::Operator(operator),
                None => {
                    println!("✗ 不认识的运算符: {}", text);
                    return;
                }
            },
            "value" | "v" => ConditionPatch::Value(text),
            "value2" | "v2" => ConditionPatch::Value2(text),
            _ => {
                println!("✗ 可设置的字段: column / op / value / value2");
                return;
            }
        };
        self.apply(Action::UpdateCondition {
            group,
            condition,
            patch,
        });
    }

    fn toggle_logic(&mut self, rest: &str) {
        match self.group_id_at(rest) {
            Some(id) => self.apply(Action::ToggleGroupLogic(id)),
            None => println!("✗ 找不到组 {}", rest),
        }
    }

    fn toggle_connector(&mut self, rest: &str) {
        match rest.parse::<usize>() {
            Ok(index) if index >= 1 => self.apply(Action::ToggleConnector(index - 1)),
            _ => println!("✗ 用法: conn <连接符序号>"),
        }
    }

    fn show(&self) {
        if self.state.is_empty() {
            println!("(空筛选, add-group 开始)");
            return;
        }

        println!("[结构]:");
        for (group_index, group) in self.state.groups.iter().enumerate() {
            if group_index > 0 {
                let connector = self
                    .state
                    .connectors
                    .get(group_index - 1)
                    .copied()
                    .unwrap_or_default();
                println!("  —— {} ——", connector.as_sql());
            }
            println!("组 {} (组内 {}):", group_index + 1, group.logic.as_sql());
            for (condition_index, condition) in group.conditions.iter().enumerate() {
                let value2 = condition
                    .value2
                    .as_deref()
                    .map(|v| format!(" ~ {}", v))
                    .unwrap_or_default();
                println!(
                    "  {}.{} {} {} {}{}",
                    group_index + 1,
                    condition_index + 1,
                    condition.column,
                    condition.operator.as_sql(),
                    condition.value,
                    value2
                );
            }
        }

        println!("\n[SQL 预览]:");
        self.preview();

        println!("\n[规范形式]:");
        let canonical = serialize(&self.state);
        if canonical.is_empty() {
            println!("(空 —— 没有有效条件)");
        } else {
            println!("{}", canonical);
        }

        println!("\n[sea-query SQL]:");
        let columns = self.catalog.columns(&self.table);
        match PredicateCompiler::new(columns).compile_select(&self.table, &self.state) {
            Ok(sql) => println!("{}", sql),
            Err(error) => println!("⚠️ {}", error.message),
        }
    }

    fn load(&mut self, raw: &str) {
        if raw.is_empty() {
            println!("✗ 用法: load <持久化串>");
            return;
        }
        self.state = parse(Some(raw));
        println!("✓ 解析得到 {} 个组", self.state.groups.len());
        self.preview();
    }

    fn save(&self) {
        let canonical = serialize(&self.state);
        if canonical.is_empty() {
            println!("(无有效条件, 序列化为空串)");
        } else {
            println!("{}", canonical);
        }
    }

    /// 演示三种持久化格式都能回到同一个构建台
    fn demo(&self) {
        let samples = [
            ("旧版A (分号分隔)", "status = 'active';total > 100"),
            ("旧版B (子句提取)", "name LIKE '%acme%' AND vip = true"),
            (
                "规范形式",
                r#"{"version":2,"groups":[{"conditions":[{"column":"status","operator":"IN","value":"new, paid"}],"intraLogic":"AND"}],"interLogic":[]}"#,
            ),
        ];
        for (label, raw) in samples {
            println!("\n[{}]", label);
            println!("输入: {}", raw);
            let state = parse(Some(raw));
            let sql = render_sql(&state);
            println!(
                "解析: {} 个组, 预览: {}",
                state.groups.len(),
                if sql.is_empty() { "(空)".to_string() } else { sql }
            );
        }
        println!("\n(load <串> 可把任意一种格式读入当前构建台)");
    }

    /// 1-based 组序号 → GroupId
    fn group_id_at(&self, index_str: &str) -> Option<GroupId> {
        let index: usize = index_str.trim().parse().ok()?;
        self.state.groups.get(index.checked_sub(1)?).map(|g| g.id)
    }

    /// 1-based (组, 条件) 序号对 → (GroupId, ConditionId)
    fn condition_at(&self, group_str: &str, condition_str: &str) -> Option<(GroupId, ConditionId)> {
        let group_index: usize = group_str.trim().parse().ok()?;
        let condition_index: usize = condition_str.trim().parse().ok()?;
        let group = self.state.groups.get(group_index.checked_sub(1)?)?;
        let condition = group.conditions.get(condition_index.checked_sub(1)?)?;
        Some((group.id, condition.id))
    }
}

/// 把用户输入的运算符文本转成 Operator
fn parse_operator_name(text: &str) -> Option<Operator> {
    let operator = match text.to_ascii_lowercase().as_str() {
        "=" | "eq" => Operator::Eq,
        "!=" | "<>" | "ne" => Operator::NotEq,
        ">" | "gt" => Operator::Gt,
        "<" | "lt" => Operator::Lt,
        ">=" | "gte" => Operator::Gte,
        "<=" | "lte" => Operator::Lte,
        "like" => Operator::Like,
        "ilike" => Operator::ILike,
        "in" => Operator::In,
        "between" => Operator::Between,
        "null" | "is-null" => Operator::IsNull,
        "not-null" | "is-not-null" => Operator::IsNotNull,
        _ => return None,
    };
    Some(operator)
}
