//! AST node model and the generic traversal/rewrite engines.
//!
//! Every later compiler pass (name resolution, optimization, physical
//! planning) runs on the types in this crate: it inspects trees through the
//! walk engine, transforms them through the rewrite engine, and resumes
//! partially-done select passes through the clause-scoped driver.

pub mod node;
pub mod rewrite;
pub mod select;
pub mod walk;

pub use node::{
    ColumnNode, FillMode, FillNode, FunctionNode, GroupingSetNode, IntervalWindowNode,
    JoinTableNode, JoinType, LimitNode, Literal, LogicCond, LogicConditionNode, Node, NodeKind,
    NodeList, NodeListNode, OperatorKind, OperatorNode, OrderByExprNode, RawExprNode,
    RealTableNode, SelectStmt, SessionWindowNode, SetOpKind, SetOperatorNode, ShowKind, ShowStmt,
    SortOrder, StateWindowNode, TargetNode, TempTableNode, NullOrder, ValueNode,
};
pub use rewrite::{
    NodeSlot, rewrite_expr, rewrite_expr_post_order, rewrite_exprs, rewrite_exprs_post_order,
    rewrite_list, rewrite_node,
};
pub use select::{SelectClause, rewrite_select_stmt, walk_select_stmt};
pub use walk::{
    TraversalOrder, VisitOutcome, walk_expr, walk_expr_post_order, walk_exprs,
    walk_exprs_post_order, walk_list, walk_node,
};
