//! 持久化筛选串的解析器
//!
//! ## 解析流程图
//!
//! ```text
//! parse(raw)
//!   ├─ 缺失/空白输入 → 空状态
//!   │
//!   ├─ 策略1: parse_canonical()        (规范JSON, version == 2)
//!   │          ├─ serde 严格解析
//!   │          ├─ 重新分配全部ID (ID从不持久化)
//!   │          └─ 丢弃空组并拼接连接符
//!   │
//!   ├─ 策略2: parse_legacy_semicolon() (旧版A: 分号分隔的单子句)
//!   │          └─ 每个非空片段必须恰好解析为一个子句, 否则整体放弃
//!   │
//!   └─ 策略3: parse_legacy_scan()      (旧版B: 从左到右提取子句)
//!              └─ 无法识别的 token 记入日志后丢弃, 永不报错
//! ```
//!
//! ## 子句语法
//!
//! ```text
//! clause := column IS [NOT] NULL
//!         | column BETWEEN value AND value
//!         | column LIKE value
//!         | column ILIKE value
//!         | column IN ( value (, value)* )
//!         | column (= | != | <> | > | < | >= | <=) value
//!
//! column := Identifier
//! value  := 'string' | number | true | false
//! ```
//!
//! 子句文法覆盖的是序列化器自身的输出形状, 不是通用SQL.
//! 解析是全函数: 三个策略都不命中时返回空状态, 从不报错.
//!
//! ## 解析示例
//!
//! ```text
//! // 规范形式
//! {"version":2,"groups":[{"conditions":[...],"intraLogic":"AND"}],"interLogic":[]}
//!
//! // 旧版A
//! status = 'active';qty > 5
//!
//! // 旧版B
//! created_at BETWEEN '2024-01-01' AND '2024-01-31' AND status IN (1, 2)
//! ```

use crate::lexer::Lexer;
use crate::model::{Condition, ConditionId, FilterState, Group, GroupId, Operator};
use crate::serializer::{PersistedCondition, PersistedFilter, CANONICAL_VERSION};
use crate::token::{Span, Token, TokenKind};

/// 解析持久化的筛选串, 重建筛选状态.
///
/// 输入缺失或为空白时返回空状态. 永不失败.
pub fn parse(raw: Option<&str>) -> FilterState {
    let Some(raw) = raw else {
        return FilterState::new();
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return FilterState::new();
    }

    if let Some(state) = parse_canonical(raw) {
        return state;
    }
    if let Some(state) = parse_legacy_semicolon(raw) {
        log::debug!("parsed legacy semicolon form: {} group(s)", state.groups.len());
        return state;
    }
    let state = parse_legacy_scan(raw);
    log::debug!("legacy scan recovered {} group(s)", state.groups.len());
    state
}

/// 策略1: 规范JSON形式. 非JSON或版本不符时返回 None.
fn parse_canonical(raw: &str) -> Option<FilterState> {
    let wire: PersistedFilter = serde_json::from_str(raw).ok()?;
    if wire.version != CANONICAL_VERSION {
        log::debug!("unsupported canonical version {}", wire.version);
        return None;
    }

    let mut state = FilterState::new();
    for (index, persisted) in wire.groups.into_iter().enumerate() {
        let mut conditions = persisted.conditions.into_iter();
        let Some(first) = conditions.next() else {
            continue; // 防御: 空组连同它的连接符一起丢弃
        };

        let first_id = ConditionId(state.alloc_id());
        let mut group = Group::new(GroupId(state.alloc_id()), restore_condition(first_id, first));
        group.logic = persisted.logic;
        for persisted_condition in conditions {
            let id = ConditionId(state.alloc_id());
            group.conditions.push(restore_condition(id, persisted_condition));
        }

        state.push_group(group);
        if state.groups.len() >= 2 {
            // push_group 默认追加 AND, 用持久化的连接符覆盖
            let connector = index
                .checked_sub(1)
                .and_then(|i| wire.connectors.get(i))
                .copied()
                .unwrap_or_default();
            let last = state.connectors.len() - 1;
            state.connectors[last] = connector;
        }
    }
    Some(state)
}

fn restore_condition(id: ConditionId, persisted: PersistedCondition) -> Condition {
    let mut condition = Condition::new(id, persisted.column);
    condition.operator = persisted.operator;
    condition.value = persisted.value;
    condition.value2 = if persisted.operator.takes_second_value() {
        persisted.value2
    } else {
        None
    };
    condition
}

/// 策略2: 旧版A —— 分号分隔, 每个片段恰好一个子句.
///
/// 任何片段解析失败或带有多余 token 都会让整个策略放弃,
/// 交给策略3兜底.
fn parse_legacy_semicolon(raw: &str) -> Option<FilterState> {
    let mut state = FilterState::new();
    for fragment in raw.split(';') {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            continue;
        }
        let tokens: Vec<Token> = Lexer::new(fragment).collect();
        let mut parser = ClauseParser::new(&tokens);
        let clause = parser.parse_clause().ok()?;
        if !parser.is_at_end() {
            return None; // 片段不止一个子句
        }
        push_clause(&mut state, clause);
    }
    if state.groups.is_empty() {
        return None;
    }
    Some(state)
}

/// 策略3: 旧版B —— 从左到右提取能识别的子句形状, 其余丢弃.
fn parse_legacy_scan(raw: &str) -> FilterState {
    let tokens: Vec<Token> = Lexer::new(raw).collect();
    let mut state = FilterState::new();
    let mut position = 0;
    while position < tokens.len() {
        let mut parser = ClauseParser::new(&tokens[position..]);
        match parser.parse_clause() {
            Ok(clause) => {
                position += parser.position();
                push_clause(&mut state, clause);
            }
            Err(error) => {
                log::debug!(
                    "legacy scan discarded token at {}: {}",
                    position,
                    error.message
                );
                position += 1;
            }
        }
    }
    state
}

/// 把一个子句装进新的单条件组. 旧版格式没有组概念, 连接符一律AND.
fn push_clause(state: &mut FilterState, clause: Clause) {
    let mut condition = Condition::new(ConditionId(state.alloc_id()), clause.column);
    condition.operator = clause.operator;
    condition.value = clause.value;
    condition.value2 = clause.value2;
    let group_id = GroupId(state.alloc_id());
    state.push_group(Group::new(group_id, condition));
}

/// 单个旧版子句的解析结果.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub column: String,
    pub operator: Operator,
    pub value: String,
    pub value2: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Option<Span>,
}

impl ParseError {
    fn new(message: String, span: Option<Span>) -> Self {
        Self { message, span }
    }

    fn at_position(message: String, span: Span) -> Self {
        Self { message, span: Some(span) }
    }
}

/// 旧版子句的语法分析器, 工作在一段 token 切片上.
pub struct ClauseParser<'a> {
    tokens: &'a [Token<'a>],
    position: usize,
}

impl<'a> ClauseParser<'a> {
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        Self { tokens, position: 0 }
    }

    /// 已消费的 token 数
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    /// 返回当前 token，不推进位置
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.position)
    }

    /// 返回当前 token 并推进位置
    fn advance(&mut self) -> Option<&Token<'a>> {
        if self.position < self.tokens.len() {
            let token = &self.tokens[self.position];
            self.position += 1;
            Some(token)
        } else {
            None
        }
    }

    /// 期望特定类型的 token 并推进，否则返回错误
    fn expect(&mut self, expected: TokenKind) -> Result<&Token<'a>, ParseError> {
        if let Some(token) = self.peek() {
            if std::mem::discriminant(&token.kind) == std::mem::discriminant(&expected) {
                Ok(self.advance().unwrap())
            } else {
                Err(ParseError::at_position(
                    format!("Expected {:?}, found {:?}", expected, token.kind),
                    token.span,
                ))
            }
        } else {
            Err(ParseError::new(
                format!("Expected {:?}, but reached end of input", expected),
                None,
            ))
        }
    }

    /// 检查当前 token 是否匹配给定类型
    fn match_token(&self, kind: &TokenKind) -> bool {
        if let Some(token) = self.peek() {
            std::mem::discriminant(&token.kind) == std::mem::discriminant(kind)
        } else {
            false
        }
    }

    /// 检查当前 token 是否为比较运算符
    fn is_comparison_operator(&self) -> bool {
        if let Some(token) = self.peek() {
            matches!(
                token.kind,
                TokenKind::Eq
                    | TokenKind::NotEq
                    | TokenKind::Gt
                    | TokenKind::Lt
                    | TokenKind::Gte
                    | TokenKind::Lte
            )
        } else {
            false
        }
    }

    /// 解析一个完整子句: `column 运算符 值`
    pub fn parse_clause(&mut self) -> Result<Clause, ParseError> {
        let column_token = self.expect(TokenKind::Identifier(""))?;
        let column = if let TokenKind::Identifier(name) = &column_token.kind {
            name.to_string()
        } else {
            return Err(ParseError::at_position(
                "Expected column identifier".to_string(),
                column_token.span,
            ));
        };

        if let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::Is => {
                    self.advance(); // 消费 IS
                    let operator = if self.match_token(&TokenKind::Not) {
                        self.advance(); // 消费 NOT
                        Operator::IsNotNull
                    } else {
                        Operator::IsNull
                    };
                    self.expect(TokenKind::Null)?;
                    Ok(Clause {
                        column,
                        operator,
                        value: String::new(),
                        value2: None,
                    })
                }
                TokenKind::Between => {
                    self.advance(); // 消费 BETWEEN
                    let low = self.parse_value()?;
                    self.expect(TokenKind::And)?;
                    let high = self.parse_value()?;
                    Ok(Clause {
                        column,
                        operator: Operator::Between,
                        value: low,
                        value2: Some(high),
                    })
                }
                TokenKind::Like => {
                    self.advance(); // 消费 LIKE
                    let raw = self.parse_value()?;
                    Ok(Clause {
                        column,
                        operator: Operator::Like,
                        value: strip_wildcards(&raw).to_string(),
                        value2: None,
                    })
                }
                TokenKind::ILike => {
                    self.advance(); // 消费 ILIKE
                    let raw = self.parse_value()?;
                    Ok(Clause {
                        column,
                        operator: Operator::ILike,
                        value: strip_wildcards(&raw).to_string(),
                        value2: None,
                    })
                }
                TokenKind::In => {
                    self.advance(); // 消费 IN
                    self.expect(TokenKind::LParen)?;
                    let mut values = Vec::new();

                    // 解析逗号分隔的值列表
                    if !self.match_token(&TokenKind::RParen) {
                        loop {
                            values.push(self.parse_value()?);
                            if self.match_token(&TokenKind::RParen) {
                                break;
                            }
                            self.expect(TokenKind::Comma)?;
                        }
                    }
                    self.expect(TokenKind::RParen)?;

                    if values.is_empty() {
                        return Err(ParseError::new(
                            "IN list requires at least one value".to_string(),
                            None,
                        ));
                    }
                    Ok(Clause {
                        column,
                        operator: Operator::In,
                        value: values.join(", "),
                        value2: None,
                    })
                }
                _ => {
                    if self.is_comparison_operator() {
                        let operator = self.parse_comparison_operator()?;
                        let value = self.parse_value()?;
                        Ok(Clause {
                            column,
                            operator,
                            value,
                            value2: None,
                        })
                    } else {
                        Err(ParseError::at_position(
                            format!("Expected operator, found {:?}", token.kind),
                            token.span,
                        ))
                    }
                }
            }
        } else {
            Err(ParseError::new("Unexpected end of input".to_string(), None))
        }
    }

    fn parse_comparison_operator(&mut self) -> Result<Operator, ParseError> {
        if let Some(token) = self.advance() {
            match &token.kind {
                TokenKind::Eq => Ok(Operator::Eq),
                TokenKind::NotEq => Ok(Operator::NotEq),
                TokenKind::Gt => Ok(Operator::Gt),
                TokenKind::Lt => Ok(Operator::Lt),
                TokenKind::Gte => Ok(Operator::Gte),
                TokenKind::Lte => Ok(Operator::Lte),
                _ => Err(ParseError::at_position(
                    format!("Expected comparison operator, found {:?}", token.kind),
                    token.span,
                )),
            }
        } else {
            Err(ParseError::new(
                "Expected comparison operator".to_string(),
                None,
            ))
        }
    }

    /// 解析一个字面值, 返回其文本形式
    fn parse_value(&mut self) -> Result<String, ParseError> {
        if let Some(token) = self.advance() {
            match &token.kind {
                TokenKind::String(s) => Ok(unescape_quotes(s)),
                TokenKind::Number(n) => Ok((*n).to_string()),
                TokenKind::True => Ok("true".to_string()),
                TokenKind::False => Ok("false".to_string()),
                _ => Err(ParseError::at_position(
                    format!("Expected literal value, found {:?}", token.kind),
                    token.span,
                )),
            }
        } else {
            Err(ParseError::new("Expected literal value".to_string(), None))
        }
    }
}

/// 去掉一层包裹的 `%...%` 通配对 (序列化器为 LIKE 加上的那层)
fn strip_wildcards(value: &str) -> &str {
    value
        .strip_prefix('%')
        .and_then(|v| v.strip_suffix('%'))
        .unwrap_or(value)
}

/// 把 `''` 转义对还原成单引号
fn unescape_quotes(value: &str) -> String {
    value.replace("''", "'")
}
