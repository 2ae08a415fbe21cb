//! AST factory.
//!
//! [`AstBuilder`] is the per-statement build context. Every construction
//! operation validates its tokens before allocating; the first failure is
//! recorded and from then on every call returns `None` without re-validating,
//! so grammar actions compose factory calls freely and check validity exactly
//! once, at [`AstBuilder::finish`]. The context never recovers: a failed
//! build stays failed.
//!
//! Composite constructions desugar here, at parse time, so later passes only
//! ever see primitive comparison/logic nodes: BETWEEN becomes a conjunction
//! of two comparisons, NOT BETWEEN a disjunction, IS \[NOT\] NULL a unary
//! comparison operator.

use tempoql_error::{Result, TempoError};
use tempoql_nodes::{
    ColumnNode, FillMode, FillNode, FunctionNode, GroupingSetNode, IntervalWindowNode,
    JoinTableNode, JoinType, LimitNode, Literal, LogicCond, LogicConditionNode, Node, NodeList,
    NodeListNode, OperatorKind, OperatorNode, OrderByExprNode, NullOrder, RawExprNode,
    RealTableNode, SelectStmt, SessionWindowNode, SetOpKind, SetOperatorNode, ShowKind, ShowStmt,
    SortOrder, StateWindowNode, TargetNode, TempTableNode, ValueNode,
};
use tempoql_types::{COL_NAME_LEN, DB_NAME_LEN, FUNC_NAME_LEN, TABLE_NAME_LEN, TimeUnit};
use tracing::debug;

use crate::token::{Token, TokenKind};

/// Per-statement build context and node factory.
#[derive(Debug, Default)]
pub struct AstBuilder {
    /// First recorded failure; sticky for the rest of the build.
    err: Option<TempoError>,
}

impl AstBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True while no factory call has failed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.err.is_none()
    }

    /// The first recorded failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&TempoError> {
        self.err.as_ref()
    }

    /// Consume the builder: the root node on success, the *first* recorded
    /// failure otherwise.
    pub fn finish(self, root: Option<Node>) -> Result<Node> {
        match self.err {
            Some(err) => Err(err),
            None => root.ok_or(TempoError::EmptyBuild),
        }
    }

    /// Record the first failure. Later failures are ignored; the context is
    /// already invalid and callers stopped getting nodes at the first one.
    fn fail(&mut self, err: TempoError) {
        if self.err.is_none() {
            debug!("ast build marked invalid: {err}");
            self.err = Some(err);
        }
    }

    /// Bound-check an identifier token. A byte length equal to `max` is
    /// already over the limit.
    fn check_ident(&mut self, what: &'static str, token: &Token<'_>, max: usize) -> bool {
        if token.len() < max {
            true
        } else {
            self.fail(TempoError::IdentifierTooLong {
                what,
                len: token.len(),
                max,
            });
            false
        }
    }

    // -----------------------------------------------------------------------
    // Lists
    // -----------------------------------------------------------------------

    /// Start a list from its first element.
    pub fn node_list(&mut self, node: Option<Node>) -> Option<NodeList> {
        if self.err.is_some() {
            return None;
        }
        Some(NodeList::with_node(node?))
    }

    /// Append an element to a list under construction.
    pub fn append(&mut self, list: Option<NodeList>, node: Option<Node>) -> Option<NodeList> {
        if self.err.is_some() {
            return None;
        }
        let mut list = list?;
        list.append(node?);
        Some(list)
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    /// `[table.]column` reference.
    pub fn column(&mut self, table: Option<&Token<'_>>, col: &Token<'_>) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        if let Some(table) = table {
            if !self.check_ident("table name", table, TABLE_NAME_LEN) {
                return None;
            }
        }
        if !self.check_ident("column name", col, COL_NAME_LEN) {
            return None;
        }
        Some(Node::Column(ColumnNode {
            table_name: table.map(|t| t.text.to_owned()),
            col_name: col.text.to_owned(),
            alias: None,
        }))
    }

    /// Literal value, parsed according to the token's lexical class.
    pub fn value(&mut self, literal: &Token<'_>) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        let parsed = match literal.kind {
            TokenKind::IntegerLiteral => literal
                .text
                .parse::<i64>()
                .ok()
                .map(Literal::Integer),
            TokenKind::FloatLiteral => literal.text.parse::<f64>().ok().map(Literal::Float),
            TokenKind::BoolLiteral => match literal.text.to_ascii_lowercase().as_str() {
                "true" => Some(Literal::Bool(true)),
                "false" => Some(Literal::Bool(false)),
                _ => None,
            },
            TokenKind::StringLiteral => Some(Literal::String(unquote(literal.text).to_owned())),
            TokenKind::DurationLiteral => {
                parse_duration(literal.text).map(|(value, unit)| Literal::Duration { value, unit })
            }
            TokenKind::Identifier | TokenKind::Nil => None,
        };
        match parsed {
            Some(literal) => Some(Node::Value(ValueNode {
                literal,
                alias: None,
            })),
            None => {
                self.fail(TempoError::InvalidLiteral {
                    what: "value",
                    text: literal.text.to_owned(),
                });
                None
            }
        }
    }

    /// Duration literal (`10m`, `1h`, ...), used by window specs.
    pub fn duration_value(&mut self, literal: &Token<'_>) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        match parse_duration(literal.text) {
            Some((value, unit)) => Some(Node::Value(ValueNode {
                literal: Literal::Duration { value, unit },
                alias: None,
            })),
            None => {
                self.fail(TempoError::InvalidLiteral {
                    what: "duration",
                    text: literal.text.to_owned(),
                });
                None
            }
        }
    }

    /// Unary arithmetic negation.
    pub fn minus(&mut self, expr: Option<Node>) -> Option<Node> {
        self.operator(OperatorKind::Minus, expr, None)
    }

    /// N-ary logical connective seeded with two operands.
    pub fn logic_condition(
        &mut self,
        cond: LogicCond,
        param1: Option<Node>,
        param2: Option<Node>,
    ) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        let mut params = NodeList::with_node(param1?);
        params.append(param2?);
        Some(Node::LogicCondition(LogicConditionNode {
            cond,
            params,
            alias: None,
        }))
    }

    /// Operator application. Unary operators pass `None` for `right`.
    pub fn operator(
        &mut self,
        op: OperatorKind,
        left: Option<Node>,
        right: Option<Node>,
    ) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        Some(Node::Operator(OperatorNode {
            op,
            left: left.map(Box::new),
            right: right.map(Box::new),
            alias: None,
        }))
    }

    /// `expr BETWEEN low AND high` desugars to `(expr >= low) AND
    /// (expr <= high)`, in that operand order. `expr` is cloned into the
    /// second comparison; each comparison owns its operand outright.
    pub fn between_and(
        &mut self,
        expr: Option<Node>,
        low: Option<Node>,
        high: Option<Node>,
    ) -> Option<Node> {
        let lower = self.operator(OperatorKind::GreaterEqual, expr.clone(), low);
        let upper = self.operator(OperatorKind::LowerEqual, expr, high);
        self.logic_condition(LogicCond::And, lower, upper)
    }

    /// `expr NOT BETWEEN low AND high` desugars to `(expr < low) OR
    /// (expr > high)`.
    pub fn not_between_and(
        &mut self,
        expr: Option<Node>,
        low: Option<Node>,
        high: Option<Node>,
    ) -> Option<Node> {
        let below = self.operator(OperatorKind::LowerThan, expr.clone(), low);
        let above = self.operator(OperatorKind::GreaterThan, expr, high);
        self.logic_condition(LogicCond::Or, below, above)
    }

    /// `expr IS [NOT] NULL` desugars to a unary comparison operator.
    pub fn is_null_cond(&mut self, expr: Option<Node>, is_null: bool) -> Option<Node> {
        let op = if is_null {
            OperatorKind::IsNull
        } else {
            OperatorKind::IsNotNull
        };
        self.operator(op, expr, None)
    }

    /// Function call. Resolution against the function catalog happens later.
    pub fn function(&mut self, name: &Token<'_>, params: Option<NodeList>) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        if !self.check_ident("function name", name, FUNC_NAME_LEN) {
            return None;
        }
        Some(Node::Function(FunctionNode {
            name: name.text.to_owned(),
            params: params?,
            alias: None,
        }))
    }

    /// A list used in expression position (IN lists, fill values).
    pub fn node_list_expr(&mut self, list: Option<NodeList>) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        Some(Node::NodeListExpr(NodeListNode { list: list? }))
    }

    /// Grammar-internal wrapper around a freshly parsed expression.
    pub fn raw_expr(&mut self, inner: Option<Node>) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        Some(Node::RawExpr(RawExprNode {
            inner: Box::new(inner?),
        }))
    }

    /// Planner target binding an expression to an output slot.
    pub fn target(
        &mut self,
        data_block_id: i16,
        slot_id: i16,
        expr: Option<Node>,
    ) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        Some(Node::Target(TargetNode {
            data_block_id,
            slot_id,
            expr: Box::new(expr?),
        }))
    }

    // -----------------------------------------------------------------------
    // Tables
    // -----------------------------------------------------------------------

    /// `[db.]table [alias]` reference.
    pub fn real_table(
        &mut self,
        db: Option<&Token<'_>>,
        table: &Token<'_>,
        alias: Option<&Token<'_>>,
    ) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        if let Some(db) = db {
            if !self.check_ident("database name", db, DB_NAME_LEN) {
                return None;
            }
        }
        if !self.check_ident("table name", table, TABLE_NAME_LEN) {
            return None;
        }
        if let Some(alias) = alias {
            if !self.check_ident("table alias", alias, TABLE_NAME_LEN) {
                return None;
            }
        }
        Some(Node::RealTable(RealTableNode {
            db_name: db.map(|t| t.text.to_owned()),
            table_name: table.text.to_owned(),
            alias: alias.map(|t| t.text.to_owned()),
        }))
    }

    /// Subquery in FROM position.
    pub fn temp_table(&mut self, subquery: Option<Node>, alias: &Token<'_>) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        if !self.check_ident("table alias", alias, TABLE_NAME_LEN) {
            return None;
        }
        Some(Node::TempTable(TempTableNode {
            subquery: Box::new(subquery?),
            alias: if alias.is_empty() {
                None
            } else {
                Some(alias.text.to_owned())
            },
        }))
    }

    /// Join of two table expressions.
    pub fn join_table(
        &mut self,
        join_type: JoinType,
        left: Option<Node>,
        right: Option<Node>,
        on_cond: Option<Node>,
    ) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        Some(Node::JoinTable(JoinTableNode {
            join_type,
            left: Box::new(left?),
            right: Box::new(right?),
            on_cond: on_cond.map(Box::new),
        }))
    }

    // -----------------------------------------------------------------------
    // Clause pieces
    // -----------------------------------------------------------------------

    /// LIMIT / SLIMIT with an optional offset.
    pub fn limit(&mut self, limit: &Token<'_>, offset: Option<&Token<'_>>) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        let Some(limit) = parse_i64(limit) else {
            self.fail(TempoError::InvalidLiteral {
                what: "limit",
                text: limit.text.to_owned(),
            });
            return None;
        };
        let offset = match offset {
            Some(token) => match parse_i64(token) {
                Some(v) => v,
                None => {
                    self.fail(TempoError::InvalidLiteral {
                        what: "offset",
                        text: token.text.to_owned(),
                    });
                    return None;
                }
            },
            None => 0,
        };
        Some(Node::Limit(LimitNode { limit, offset }))
    }

    /// One ORDER BY term.
    pub fn order_by_expr(
        &mut self,
        expr: Option<Node>,
        order: SortOrder,
        null_order: NullOrder,
    ) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        Some(Node::OrderByExpr(OrderByExprNode {
            expr: Box::new(expr?),
            order,
            null_order,
        }))
    }

    /// One grouping set of a GROUP BY clause.
    pub fn grouping_set(&mut self, params: Option<NodeList>) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        Some(Node::GroupingSet(GroupingSetNode { params: params? }))
    }

    /// SESSION window: a column and the inactivity gap.
    pub fn session_window(&mut self, col: Option<Node>, gap: &Token<'_>) -> Option<Node> {
        let gap = self.duration_value(gap);
        if self.err.is_some() {
            return None;
        }
        Some(Node::SessionWindow(SessionWindowNode {
            col: col.map(Box::new),
            gap: gap.map(Box::new),
        }))
    }

    /// STATE_WINDOW over a column. The expression slot is filled during
    /// translation.
    pub fn state_window(&mut self, col: Option<Node>) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        Some(Node::StateWindow(StateWindowNode {
            expr: None,
            col: col.map(Box::new),
        }))
    }

    /// INTERVAL window. The column slot is bound to the primary timestamp
    /// during translation.
    pub fn interval_window(
        &mut self,
        interval: Option<Node>,
        offset: Option<Node>,
        sliding: Option<Node>,
        fill: Option<Node>,
    ) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        Some(Node::IntervalWindow(IntervalWindowNode {
            interval: interval.map(Box::new),
            offset: offset.map(Box::new),
            sliding: sliding.map(Box::new),
            fill: fill.map(Box::new),
            col: None,
        }))
    }

    /// FILL clause of an interval window.
    pub fn fill(&mut self, mode: FillMode, values: Option<Node>) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        Some(Node::Fill(FillNode {
            mode,
            values: values.map(Box::new),
        }))
    }

    /// Set the output alias on a projection expression.
    pub fn set_projection_alias(&mut self, node: Option<Node>, alias: &Token<'_>) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        if !self.check_ident("column alias", alias, COL_NAME_LEN) {
            return None;
        }
        let mut node = node?;
        node.set_alias(alias.text);
        Some(node)
    }

    // -----------------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------------

    /// SELECT statement. `projections: None` means `SELECT *`.
    pub fn select_stmt(
        &mut self,
        distinct: bool,
        projections: Option<NodeList>,
        from: Option<Node>,
    ) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        Some(Node::Select(Box::new(SelectStmt {
            distinct,
            projections,
            from: from.map(Box::new),
            where_clause: None,
            partition_by: NodeList::new(),
            window: None,
            group_by: NodeList::new(),
            having: None,
            order_by: NodeList::new(),
            slimit: None,
            limit: None,
        })))
    }

    /// Attach a WHERE predicate to a select under construction.
    pub fn with_where(&mut self, stmt: Option<Node>, predicate: Option<Node>) -> Option<Node> {
        self.with_select(stmt, |select| select.where_clause = predicate.map(Box::new))
    }

    /// Attach a PARTITION BY list.
    pub fn with_partition_by(
        &mut self,
        stmt: Option<Node>,
        list: Option<NodeList>,
    ) -> Option<Node> {
        self.with_select(stmt, |select| {
            select.partition_by = list.unwrap_or_default();
        })
    }

    /// Attach a window spec.
    pub fn with_window(&mut self, stmt: Option<Node>, window: Option<Node>) -> Option<Node> {
        self.with_select(stmt, |select| select.window = window.map(Box::new))
    }

    /// Attach a GROUP BY list.
    pub fn with_group_by(&mut self, stmt: Option<Node>, list: Option<NodeList>) -> Option<Node> {
        self.with_select(stmt, |select| select.group_by = list.unwrap_or_default())
    }

    /// Attach a HAVING predicate.
    pub fn with_having(&mut self, stmt: Option<Node>, predicate: Option<Node>) -> Option<Node> {
        self.with_select(stmt, |select| select.having = predicate.map(Box::new))
    }

    /// Attach an ORDER BY list.
    pub fn with_order_by(&mut self, stmt: Option<Node>, list: Option<NodeList>) -> Option<Node> {
        self.with_select(stmt, |select| select.order_by = list.unwrap_or_default())
    }

    /// Attach a LIMIT.
    pub fn with_limit(&mut self, stmt: Option<Node>, limit: Option<Node>) -> Option<Node> {
        self.with_select(stmt, |select| select.limit = limit.map(Box::new))
    }

    /// Attach an SLIMIT.
    pub fn with_slimit(&mut self, stmt: Option<Node>, slimit: Option<Node>) -> Option<Node> {
        self.with_select(stmt, |select| select.slimit = slimit.map(Box::new))
    }

    /// Clause attachment is a no-op on non-select statements, matching the
    /// grammar's tolerance for compound statements in statement position.
    fn with_select<F>(&mut self, stmt: Option<Node>, attach: F) -> Option<Node>
    where
        F: FnOnce(&mut SelectStmt),
    {
        if self.err.is_some() {
            return None;
        }
        let mut stmt = stmt?;
        if let Node::Select(select) = &mut stmt {
            attach(select);
        }
        Some(stmt)
    }

    /// UNION / UNION ALL of two query branches.
    pub fn set_operator(
        &mut self,
        op: SetOpKind,
        left: Option<Node>,
        right: Option<Node>,
    ) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        Some(Node::SetOperator(SetOperatorNode {
            op,
            left: Box::new(left?),
            right: Box::new(right?),
        }))
    }

    /// SHOW statement.
    pub fn show_stmt(&mut self, kind: ShowKind) -> Option<Node> {
        if self.err.is_some() {
            return None;
        }
        Some(Node::Show(ShowStmt { kind }))
    }
}

// ---------------------------------------------------------------------------
// Literal helpers
// ---------------------------------------------------------------------------

/// Strip one level of matching quotes, if present.
fn unquote(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 && (bytes[0] == b'\'' || bytes[0] == b'"') && bytes[bytes.len() - 1] == bytes[0]
    {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

/// Parse `<integer><unit-suffix>` duration text.
fn parse_duration(text: &str) -> Option<(i64, TimeUnit)> {
    let suffix = text.chars().last()?;
    let unit = TimeUnit::from_suffix(suffix)?;
    let digits = &text[..text.len() - suffix.len_utf8()];
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok().map(|value| (value, unit))
}

fn parse_i64(token: &Token<'_>) -> Option<i64> {
    token.text.parse::<i64>().ok()
}
