//! Generic read-only traversal over a node tree.
//!
//! The visitor is an `FnMut` closure; whatever state it needs travels in its
//! captures. It may read or mutate node *contents* but must not change tree
//! shape (add or remove children); shape changes belong to the rewrite
//! engine. Every entry point returns the final [`VisitOutcome`] so callers
//! can tell a short-circuited failure from an early successful stop.

use crate::node::{Node, NodeList};
use crate::select::{SelectClause, walk_select_stmt};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Visit order of [`walk_node`] and the rewrite engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    /// Visit a node before its children.
    Pre,
    /// Visit a node after its children.
    Post,
}

/// Outcome returned by a visitor or rewriter callback.
///
/// `Error` and `End` both abort the traversal immediately (no later node in
/// traversal order is visited) and propagate unchanged to the top-level
/// caller. They differ only in meaning: `Error` is a caller-defined failure,
/// `End` is "found what I was looking for".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitOutcome {
    Continue,
    Error,
    End,
}

impl VisitOutcome {
    /// True iff the traversal should keep going.
    #[must_use]
    pub fn is_continue(self) -> bool {
        matches!(self, Self::Continue)
    }
}

// ---------------------------------------------------------------------------
// Walk engine
// ---------------------------------------------------------------------------

/// Walk one node (and its subtree) in the given order.
pub fn walk_node<F>(node: &mut Node, order: TraversalOrder, visitor: &mut F) -> VisitOutcome
where
    F: FnMut(&mut Node) -> VisitOutcome,
{
    if order == TraversalOrder::Pre {
        let res = visitor(node);
        if !res.is_continue() {
            return res;
        }
    }

    let res = walk_children(node, order, visitor);
    if !res.is_continue() {
        return res;
    }

    if order == TraversalOrder::Post {
        return visitor(node);
    }
    VisitOutcome::Continue
}

/// Walk every element of a list in order, stopping at the first
/// non-`Continue` outcome.
pub fn walk_list<F>(list: &mut NodeList, order: TraversalOrder, visitor: &mut F) -> VisitOutcome
where
    F: FnMut(&mut Node) -> VisitOutcome,
{
    for node in list.iter_mut() {
        let res = walk_node(node, order, visitor);
        if !res.is_continue() {
            return res;
        }
    }
    VisitOutcome::Continue
}

/// Walk an optional child slot; an absent child is skipped.
pub(crate) fn walk_opt<F>(
    node: Option<&mut Node>,
    order: TraversalOrder,
    visitor: &mut F,
) -> VisitOutcome
where
    F: FnMut(&mut Node) -> VisitOutcome,
{
    match node {
        Some(node) => walk_node(node, order, visitor),
        None => VisitOutcome::Continue,
    }
}

/// Visit a node's children in their fixed per-kind order, stopping after the
/// first non-`Continue` child outcome.
fn walk_children<F>(node: &mut Node, order: TraversalOrder, visitor: &mut F) -> VisitOutcome
where
    F: FnMut(&mut Node) -> VisitOutcome,
{
    match node {
        // Leaf kinds.
        Node::Column(_)
        | Node::Value(_)
        | Node::RealTable(_)
        | Node::Limit(_)
        | Node::Show(_) => VisitOutcome::Continue,

        Node::Operator(op) => {
            let res = walk_opt(op.left.as_deref_mut(), order, visitor);
            if !res.is_continue() {
                return res;
            }
            walk_opt(op.right.as_deref_mut(), order, visitor)
        }

        Node::LogicCondition(cond) => walk_list(&mut cond.params, order, visitor),
        Node::Function(func) => walk_list(&mut func.params, order, visitor),
        Node::GroupingSet(set) => walk_list(&mut set.params, order, visitor),
        Node::NodeListExpr(wrapper) => walk_list(&mut wrapper.list, order, visitor),

        Node::TempTable(table) => walk_node(&mut table.subquery, order, visitor),

        Node::JoinTable(join) => {
            let res = walk_node(&mut join.left, order, visitor);
            if !res.is_continue() {
                return res;
            }
            let res = walk_node(&mut join.right, order, visitor);
            if !res.is_continue() {
                return res;
            }
            walk_opt(join.on_cond.as_deref_mut(), order, visitor)
        }

        Node::OrderByExpr(term) => walk_node(&mut term.expr, order, visitor),

        Node::StateWindow(win) => {
            let res = walk_opt(win.expr.as_deref_mut(), order, visitor);
            if !res.is_continue() {
                return res;
            }
            walk_opt(win.col.as_deref_mut(), order, visitor)
        }

        Node::SessionWindow(win) => {
            let res = walk_opt(win.col.as_deref_mut(), order, visitor);
            if !res.is_continue() {
                return res;
            }
            walk_opt(win.gap.as_deref_mut(), order, visitor)
        }

        Node::IntervalWindow(win) => {
            let res = walk_opt(win.interval.as_deref_mut(), order, visitor);
            if !res.is_continue() {
                return res;
            }
            let res = walk_opt(win.offset.as_deref_mut(), order, visitor);
            if !res.is_continue() {
                return res;
            }
            let res = walk_opt(win.sliding.as_deref_mut(), order, visitor);
            if !res.is_continue() {
                return res;
            }
            let res = walk_opt(win.fill.as_deref_mut(), order, visitor);
            if !res.is_continue() {
                return res;
            }
            walk_opt(win.col.as_deref_mut(), order, visitor)
        }

        Node::Fill(fill) => walk_opt(fill.values.as_deref_mut(), order, visitor),
        Node::RawExpr(raw) => walk_node(&mut raw.inner, order, visitor),
        Node::Target(target) => walk_node(&mut target.expr, order, visitor),

        Node::Select(stmt) => {
            let res = walk_select_stmt(stmt, SelectClause::From, order, visitor);
            if !res.is_continue() {
                return res;
            }
            let res = walk_opt(stmt.limit.as_deref_mut(), order, visitor);
            if !res.is_continue() {
                return res;
            }
            walk_opt(stmt.slimit.as_deref_mut(), order, visitor)
        }

        Node::SetOperator(set_op) => {
            let res = walk_node(&mut set_op.left, order, visitor);
            if !res.is_continue() {
                return res;
            }
            walk_node(&mut set_op.right, order, visitor)
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience entry points
// ---------------------------------------------------------------------------

/// Pre-order walk of one expression tree.
pub fn walk_expr<F>(node: &mut Node, visitor: &mut F) -> VisitOutcome
where
    F: FnMut(&mut Node) -> VisitOutcome,
{
    walk_node(node, TraversalOrder::Pre, visitor)
}

/// Post-order walk of one expression tree.
pub fn walk_expr_post_order<F>(node: &mut Node, visitor: &mut F) -> VisitOutcome
where
    F: FnMut(&mut Node) -> VisitOutcome,
{
    walk_node(node, TraversalOrder::Post, visitor)
}

/// Pre-order walk of every expression in a list.
pub fn walk_exprs<F>(list: &mut NodeList, visitor: &mut F) -> VisitOutcome
where
    F: FnMut(&mut Node) -> VisitOutcome,
{
    walk_list(list, TraversalOrder::Pre, visitor)
}

/// Post-order walk of every expression in a list.
pub fn walk_exprs_post_order<F>(list: &mut NodeList, visitor: &mut F) -> VisitOutcome
where
    F: FnMut(&mut Node) -> VisitOutcome,
{
    walk_list(list, TraversalOrder::Post, visitor)
}
