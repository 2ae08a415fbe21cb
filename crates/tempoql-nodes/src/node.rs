//! AST node model.
//!
//! [`Node`] is a closed sum type: one variant per SQL construct, each with an
//! owned payload struct. Children are held in `Box<Node>` /
//! `Option<Box<Node>>` slots or in a [`NodeList`], so every subtree has
//! exactly one owner and destruction is exhaustive by construction. The
//! traversal and rewrite engines match on every variant; adding a kind
//! without teaching them about it is a compile error.

use tempoql_types::TimeUnit;

// ---------------------------------------------------------------------------
// Scalar payloads
// ---------------------------------------------------------------------------

/// Literal payload of a [`ValueNode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Duration literal (`10m`, `1h`, ...), kept with its unit until the
    /// planner normalizes it against the database precision.
    Duration { value: i64, unit: TimeUnit },
}

/// Binary and unary operator kinds.
///
/// Unary kinds leave the right slot of their [`OperatorNode`] empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    GreaterThan,
    GreaterEqual,
    LowerThan,
    LowerEqual,
    Equal,
    NotEqual,
    In,
    NotIn,
    Like,
    NotLike,
    IsNull,
    IsNotNull,
    /// Unary arithmetic negation.
    Minus,
}

impl OperatorKind {
    /// True for operators that take a single operand.
    #[must_use]
    pub fn is_unary(self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull | Self::Minus)
    }
}

/// Connective of a [`LogicConditionNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicCond {
    And,
    Or,
    Not,
}

/// Join flavor of a [`JoinTableNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
}

/// Sort direction of an [`OrderByExprNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// NULL placement of an [`OrderByExprNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrder {
    Default,
    First,
    Last,
}

/// Gap-filling strategy of a [`FillNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    None,
    Value,
    Prev,
    Null,
    Linear,
    Next,
}

/// Compound operator of a [`SetOperatorNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOpKind {
    Union,
    UnionAll,
}

/// Object class listed by a [`ShowStmt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowKind {
    Databases,
    Tables,
    Stables,
    Vgroups,
}

// ---------------------------------------------------------------------------
// NodeList
// ---------------------------------------------------------------------------

/// Owned, ordered sequence of nodes.
///
/// Insertion order is semantically meaningful (parameter order, projection
/// order). Every element is a real node; a list may be empty. Traversal never
/// changes list length or order, only element contents or (during a rewrite)
/// element identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeList {
    items: Vec<Node>,
}

impl NodeList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create a one-element list.
    #[must_use]
    pub fn with_node(node: Node) -> Self {
        Self { items: vec![node] }
    }

    /// Append a node, preserving order. O(1) amortized.
    pub fn append(&mut self, node: Node) {
        self.items.push(node);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Shared access to the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Node> {
        self.items.get(index)
    }

    /// Mutable-slot access for in-place replacement of the element at
    /// `index`.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Node> {
        self.items.iter_mut()
    }
}

impl IntoIterator for NodeList {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a NodeList {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a> IntoIterator for &'a mut NodeList {
    type Item = &'a mut Node;
    type IntoIter = std::slice::IterMut<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter_mut()
    }
}

impl FromIterator<Node> for NodeList {
    fn from_iter<T: IntoIterator<Item = Node>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-kind payloads
// ---------------------------------------------------------------------------

/// Column reference. The catalog resolves `table_name`/`col_name` to a
/// concrete schema entry in a later pass; at this stage they are just the
/// strings the user wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnNode {
    pub table_name: Option<String>,
    pub col_name: String,
    pub alias: Option<String>,
}

/// Literal value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueNode {
    pub literal: Literal,
    pub alias: Option<String>,
}

/// Unary or binary operator application.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorNode {
    pub op: OperatorKind,
    pub left: Option<Box<Node>>,
    pub right: Option<Box<Node>>,
    pub alias: Option<String>,
}

/// N-ary logical connective over `params`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicConditionNode {
    pub cond: LogicCond,
    pub params: NodeList,
    pub alias: Option<String>,
}

/// Function call; resolution against the function catalog happens later.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNode {
    pub name: String,
    pub params: NodeList,
    pub alias: Option<String>,
}

/// Physical table reference (`[db.]table [alias]`).
#[derive(Debug, Clone, PartialEq)]
pub struct RealTableNode {
    pub db_name: Option<String>,
    pub table_name: String,
    pub alias: Option<String>,
}

/// Derived table: a subquery in FROM position.
#[derive(Debug, Clone, PartialEq)]
pub struct TempTableNode {
    pub subquery: Box<Node>,
    pub alias: Option<String>,
}

/// Join of two table expressions with an optional ON condition.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinTableNode {
    pub join_type: JoinType,
    pub left: Box<Node>,
    pub right: Box<Node>,
    pub on_cond: Option<Box<Node>>,
}

/// One grouping set of a GROUP BY clause.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupingSetNode {
    pub params: NodeList,
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExprNode {
    pub expr: Box<Node>,
    pub order: SortOrder,
    pub null_order: NullOrder,
}

/// STATE_WINDOW spec. `expr` stays empty until translation fills it in.
#[derive(Debug, Clone, PartialEq)]
pub struct StateWindowNode {
    pub expr: Option<Box<Node>>,
    pub col: Option<Box<Node>>,
}

/// SESSION window spec: a column and the inactivity gap duration.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionWindowNode {
    pub col: Option<Box<Node>>,
    pub gap: Option<Box<Node>>,
}

/// INTERVAL window spec. `col` is bound to the primary timestamp column
/// during translation.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalWindowNode {
    pub interval: Option<Box<Node>>,
    pub offset: Option<Box<Node>>,
    pub sliding: Option<Box<Node>>,
    pub fill: Option<Box<Node>>,
    pub col: Option<Box<Node>>,
}

/// A node list used in expression position (IN lists, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct NodeListNode {
    pub list: NodeList,
}

/// FILL clause of an interval window.
#[derive(Debug, Clone, PartialEq)]
pub struct FillNode {
    pub mode: FillMode,
    pub values: Option<Box<Node>>,
}

/// Grammar-internal wrapper around a freshly parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub struct RawExprNode {
    pub inner: Box<Node>,
}

/// Planner target: an expression bound to an output slot.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetNode {
    pub data_block_id: i16,
    pub slot_id: i16,
    pub expr: Box<Node>,
}

/// LIMIT / SLIMIT payload. No children.
#[derive(Debug, Clone, PartialEq)]
pub struct LimitNode {
    pub limit: i64,
    pub offset: i64,
}

/// SELECT statement: the nine pipeline clause slots plus limit/slimit.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    pub distinct: bool,
    /// `None` means `SELECT *`; a present-but-empty list is a different
    /// (degenerate) statement. See [`SelectStmt::is_star`].
    pub projections: Option<NodeList>,
    pub from: Option<Box<Node>>,
    pub where_clause: Option<Box<Node>>,
    pub partition_by: NodeList,
    pub window: Option<Box<Node>>,
    pub group_by: NodeList,
    pub having: Option<Box<Node>>,
    pub order_by: NodeList,
    pub slimit: Option<Box<Node>>,
    pub limit: Option<Box<Node>>,
}

impl SelectStmt {
    /// True iff the statement has no explicit projection list
    /// (`SELECT * ...`). Derived from the list's absence, so the invariant
    /// cannot drift from the data.
    #[must_use]
    pub fn is_star(&self) -> bool {
        self.projections.is_none()
    }
}

/// UNION / UNION ALL over two query branches.
#[derive(Debug, Clone, PartialEq)]
pub struct SetOperatorNode {
    pub op: SetOpKind,
    pub left: Box<Node>,
    pub right: Box<Node>,
}

/// SHOW statement. No children.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowStmt {
    pub kind: ShowKind,
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// One AST construct. See the module docs for the ownership rules.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Column(ColumnNode),
    Value(ValueNode),
    Operator(OperatorNode),
    LogicCondition(LogicConditionNode),
    Function(FunctionNode),
    RealTable(RealTableNode),
    TempTable(TempTableNode),
    JoinTable(JoinTableNode),
    GroupingSet(GroupingSetNode),
    OrderByExpr(OrderByExprNode),
    StateWindow(StateWindowNode),
    SessionWindow(SessionWindowNode),
    IntervalWindow(IntervalWindowNode),
    NodeListExpr(NodeListNode),
    Fill(FillNode),
    RawExpr(RawExprNode),
    Target(TargetNode),
    Limit(LimitNode),
    Select(Box<SelectStmt>),
    SetOperator(SetOperatorNode),
    Show(ShowStmt),
}

/// Discriminant of a [`Node`], for passes that dispatch on kind without
/// caring about payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Column,
    Value,
    Operator,
    LogicCondition,
    Function,
    RealTable,
    TempTable,
    JoinTable,
    GroupingSet,
    OrderByExpr,
    StateWindow,
    SessionWindow,
    IntervalWindow,
    NodeListExpr,
    Fill,
    RawExpr,
    Target,
    Limit,
    Select,
    SetOperator,
    Show,
}

impl Node {
    /// The node's kind discriminant.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Column(_) => NodeKind::Column,
            Self::Value(_) => NodeKind::Value,
            Self::Operator(_) => NodeKind::Operator,
            Self::LogicCondition(_) => NodeKind::LogicCondition,
            Self::Function(_) => NodeKind::Function,
            Self::RealTable(_) => NodeKind::RealTable,
            Self::TempTable(_) => NodeKind::TempTable,
            Self::JoinTable(_) => NodeKind::JoinTable,
            Self::GroupingSet(_) => NodeKind::GroupingSet,
            Self::OrderByExpr(_) => NodeKind::OrderByExpr,
            Self::StateWindow(_) => NodeKind::StateWindow,
            Self::SessionWindow(_) => NodeKind::SessionWindow,
            Self::IntervalWindow(_) => NodeKind::IntervalWindow,
            Self::NodeListExpr(_) => NodeKind::NodeListExpr,
            Self::Fill(_) => NodeKind::Fill,
            Self::RawExpr(_) => NodeKind::RawExpr,
            Self::Target(_) => NodeKind::Target,
            Self::Limit(_) => NodeKind::Limit,
            Self::Select(_) => NodeKind::Select,
            Self::SetOperator(_) => NodeKind::SetOperator,
            Self::Show(_) => NodeKind::Show,
        }
    }

    /// True for the expression-valued kinds that can carry an output alias.
    #[must_use]
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            Self::Column(_)
                | Self::Value(_)
                | Self::Operator(_)
                | Self::LogicCondition(_)
                | Self::Function(_)
        )
    }

    /// The output alias, if this is an expression kind and one was set.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        match self {
            Self::Column(n) => n.alias.as_deref(),
            Self::Value(n) => n.alias.as_deref(),
            Self::Operator(n) => n.alias.as_deref(),
            Self::LogicCondition(n) => n.alias.as_deref(),
            Self::Function(n) => n.alias.as_deref(),
            _ => None,
        }
    }

    /// Set the output alias. Returns false (and does nothing) for kinds
    /// that are not expressions.
    pub fn set_alias(&mut self, alias: impl Into<String>) -> bool {
        let slot = match self {
            Self::Column(n) => &mut n.alias,
            Self::Value(n) => &mut n.alias,
            Self::Operator(n) => &mut n.alias,
            Self::LogicCondition(n) => &mut n.alias,
            Self::Function(n) => &mut n.alias,
            _ => return false,
        };
        *slot = Some(alias.into());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> Node {
        Node::Column(ColumnNode {
            table_name: None,
            col_name: name.to_owned(),
            alias: None,
        })
    }

    #[test]
    fn test_node_kind_discriminant() {
        assert_eq!(col("ts").kind(), NodeKind::Column);
        let limit = Node::Limit(LimitNode { limit: 10, offset: 0 });
        assert_eq!(limit.kind(), NodeKind::Limit);
        assert!(!limit.is_expression());
        assert!(col("v").is_expression());
    }

    #[test]
    fn test_alias_only_on_expressions() {
        let mut c = col("current");
        assert!(c.set_alias("c"));
        assert_eq!(c.alias(), Some("c"));

        let mut show = Node::Show(ShowStmt {
            kind: ShowKind::Tables,
        });
        assert!(!show.set_alias("x"));
        assert_eq!(show.alias(), None);
    }

    #[test]
    fn test_node_list_preserves_order() {
        let mut list = NodeList::new();
        assert!(list.is_empty());
        list.append(col("a"));
        list.append(col("b"));
        list.append(col("c"));
        assert_eq!(list.len(), 3);

        let names: Vec<_> = list
            .iter()
            .map(|n| match n {
                Node::Column(c) => c.col_name.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_node_list_slot_replacement() {
        let mut list = NodeList::with_node(col("a"));
        *list.get_mut(0).expect("slot 0") = col("z");
        match list.get(0) {
            Some(Node::Column(c)) => assert_eq!(c.col_name, "z"),
            other => panic!("unexpected slot content: {other:?}"),
        }
    }

    #[test]
    fn test_select_star_is_list_absence() {
        let star = SelectStmt {
            distinct: false,
            projections: None,
            from: None,
            where_clause: None,
            partition_by: NodeList::new(),
            window: None,
            group_by: NodeList::new(),
            having: None,
            order_by: NodeList::new(),
            slimit: None,
            limit: None,
        };
        assert!(star.is_star());

        let empty = SelectStmt {
            projections: Some(NodeList::new()),
            ..star
        };
        assert!(!empty.is_star());
    }
}
