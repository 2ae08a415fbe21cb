//! Generic traversal that can replace nodes in place.
//!
//! The rewriter callback receives a [`NodeSlot`], a handle to whatever
//! currently holds the node (a struct field, a list element, a clause slot),
//! instead of the node itself. Replacing a node means updating the
//! parent's slot, which only the slot holder can do; the slot makes that
//! ownership transfer explicit. The engine never frees a displaced subtree on
//! the rewriter's behalf: [`NodeSlot::replace`] hands it back, and the
//! rewriter drops or reuses it.

use crate::node::{Node, NodeList};
use crate::select::{SelectClause, rewrite_select_stmt};
use crate::walk::{TraversalOrder, VisitOutcome};

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

/// Mutable handle to the place a node currently lives in.
#[derive(Debug)]
pub struct NodeSlot<'a> {
    node: &'a mut Node,
}

impl<'a> NodeSlot<'a> {
    /// Wrap a slot around the node held in `node`'s location.
    #[must_use]
    pub fn new(node: &'a mut Node) -> Self {
        Self { node }
    }

    /// The node currently in the slot.
    #[must_use]
    pub fn node(&self) -> &Node {
        self.node
    }

    /// Mutable access to the node currently in the slot, for content edits
    /// that stop short of replacement.
    #[must_use]
    pub fn node_mut(&mut self) -> &mut Node {
        self.node
    }

    /// Put `replacement` into the slot and return the displaced subtree.
    ///
    /// The caller owns the returned tree: drop it or graft it elsewhere.
    /// After a pre-order replacement the engine descends into `replacement`'s
    /// children; the displaced tree is never visited again.
    #[must_use = "the displaced subtree is the rewriter's to drop or reuse"]
    pub fn replace(&mut self, replacement: Node) -> Node {
        std::mem::replace(self.node, replacement)
    }
}

// ---------------------------------------------------------------------------
// Rewrite engine
// ---------------------------------------------------------------------------

/// Rewrite one slot (and the subtree below whatever ends up in it).
pub fn rewrite_node<R>(node: &mut Node, order: TraversalOrder, rewriter: &mut R) -> VisitOutcome
where
    R: FnMut(&mut NodeSlot<'_>) -> VisitOutcome,
{
    if order == TraversalOrder::Pre {
        let res = rewriter(&mut NodeSlot::new(node));
        if !res.is_continue() {
            return res;
        }
    }

    // Descend into whatever now occupies the slot. If the pre-order callback
    // replaced the node, its children are the replacement's children.
    let res = rewrite_children(node, order, rewriter);
    if !res.is_continue() {
        return res;
    }

    if order == TraversalOrder::Post {
        return rewriter(&mut NodeSlot::new(node));
    }
    VisitOutcome::Continue
}

/// Rewrite every element slot of a list in order, stopping at the first
/// non-`Continue` outcome. Length and order are fixed; only element identity
/// changes.
pub fn rewrite_list<R>(list: &mut NodeList, order: TraversalOrder, rewriter: &mut R) -> VisitOutcome
where
    R: FnMut(&mut NodeSlot<'_>) -> VisitOutcome,
{
    for node in list.iter_mut() {
        let res = rewrite_node(node, order, rewriter);
        if !res.is_continue() {
            return res;
        }
    }
    VisitOutcome::Continue
}

/// Rewrite an optional child slot; an absent child is skipped.
pub(crate) fn rewrite_opt<R>(
    slot: &mut Option<Box<Node>>,
    order: TraversalOrder,
    rewriter: &mut R,
) -> VisitOutcome
where
    R: FnMut(&mut NodeSlot<'_>) -> VisitOutcome,
{
    match slot.as_deref_mut() {
        Some(node) => rewrite_node(node, order, rewriter),
        None => VisitOutcome::Continue,
    }
}

fn rewrite_children<R>(node: &mut Node, order: TraversalOrder, rewriter: &mut R) -> VisitOutcome
where
    R: FnMut(&mut NodeSlot<'_>) -> VisitOutcome,
{
    match node {
        Node::Column(_)
        | Node::Value(_)
        | Node::RealTable(_)
        | Node::Limit(_)
        | Node::Show(_) => VisitOutcome::Continue,

        Node::Operator(op) => {
            let res = rewrite_opt(&mut op.left, order, rewriter);
            if !res.is_continue() {
                return res;
            }
            rewrite_opt(&mut op.right, order, rewriter)
        }

        Node::LogicCondition(cond) => rewrite_list(&mut cond.params, order, rewriter),
        Node::Function(func) => rewrite_list(&mut func.params, order, rewriter),
        Node::GroupingSet(set) => rewrite_list(&mut set.params, order, rewriter),
        Node::NodeListExpr(wrapper) => rewrite_list(&mut wrapper.list, order, rewriter),

        Node::TempTable(table) => rewrite_node(&mut table.subquery, order, rewriter),

        Node::JoinTable(join) => {
            let res = rewrite_node(&mut join.left, order, rewriter);
            if !res.is_continue() {
                return res;
            }
            let res = rewrite_node(&mut join.right, order, rewriter);
            if !res.is_continue() {
                return res;
            }
            rewrite_opt(&mut join.on_cond, order, rewriter)
        }

        Node::OrderByExpr(term) => rewrite_node(&mut term.expr, order, rewriter),

        Node::StateWindow(win) => {
            let res = rewrite_opt(&mut win.expr, order, rewriter);
            if !res.is_continue() {
                return res;
            }
            rewrite_opt(&mut win.col, order, rewriter)
        }

        Node::SessionWindow(win) => {
            let res = rewrite_opt(&mut win.col, order, rewriter);
            if !res.is_continue() {
                return res;
            }
            rewrite_opt(&mut win.gap, order, rewriter)
        }

        Node::IntervalWindow(win) => {
            let res = rewrite_opt(&mut win.interval, order, rewriter);
            if !res.is_continue() {
                return res;
            }
            let res = rewrite_opt(&mut win.offset, order, rewriter);
            if !res.is_continue() {
                return res;
            }
            let res = rewrite_opt(&mut win.sliding, order, rewriter);
            if !res.is_continue() {
                return res;
            }
            let res = rewrite_opt(&mut win.fill, order, rewriter);
            if !res.is_continue() {
                return res;
            }
            rewrite_opt(&mut win.col, order, rewriter)
        }

        Node::Fill(fill) => rewrite_opt(&mut fill.values, order, rewriter),
        Node::RawExpr(raw) => rewrite_node(&mut raw.inner, order, rewriter),
        Node::Target(target) => rewrite_node(&mut target.expr, order, rewriter),

        Node::Select(stmt) => {
            let res = rewrite_select_stmt(stmt, SelectClause::From, order, rewriter);
            if !res.is_continue() {
                return res;
            }
            let res = rewrite_opt(&mut stmt.limit, order, rewriter);
            if !res.is_continue() {
                return res;
            }
            rewrite_opt(&mut stmt.slimit, order, rewriter)
        }

        Node::SetOperator(set_op) => {
            let res = rewrite_node(&mut set_op.left, order, rewriter);
            if !res.is_continue() {
                return res;
            }
            rewrite_node(&mut set_op.right, order, rewriter)
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience entry points
// ---------------------------------------------------------------------------

/// Pre-order rewrite of one expression slot.
pub fn rewrite_expr<R>(node: &mut Node, rewriter: &mut R) -> VisitOutcome
where
    R: FnMut(&mut NodeSlot<'_>) -> VisitOutcome,
{
    rewrite_node(node, TraversalOrder::Pre, rewriter)
}

/// Post-order rewrite of one expression slot.
pub fn rewrite_expr_post_order<R>(node: &mut Node, rewriter: &mut R) -> VisitOutcome
where
    R: FnMut(&mut NodeSlot<'_>) -> VisitOutcome,
{
    rewrite_node(node, TraversalOrder::Post, rewriter)
}

/// Pre-order rewrite of every element slot in a list.
pub fn rewrite_exprs<R>(list: &mut NodeList, rewriter: &mut R) -> VisitOutcome
where
    R: FnMut(&mut NodeSlot<'_>) -> VisitOutcome,
{
    rewrite_list(list, TraversalOrder::Pre, rewriter)
}

/// Post-order rewrite of every element slot in a list.
pub fn rewrite_exprs_post_order<R>(list: &mut NodeList, rewriter: &mut R) -> VisitOutcome
where
    R: FnMut(&mut NodeSlot<'_>) -> VisitOutcome,
{
    rewrite_list(list, TraversalOrder::Post, rewriter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ColumnNode, Literal, NodeKind, OperatorKind, OperatorNode, ValueNode};

    fn col(name: &str) -> Node {
        Node::Column(ColumnNode {
            table_name: None,
            col_name: name.to_owned(),
            alias: None,
        })
    }

    fn int(v: i64) -> Node {
        Node::Value(ValueNode {
            literal: Literal::Integer(v),
            alias: None,
        })
    }

    fn binary(op: OperatorKind, left: Node, right: Node) -> Node {
        Node::Operator(OperatorNode {
            op,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
            alias: None,
        })
    }

    #[test]
    fn test_replace_returns_displaced_subtree() {
        // a + b, replace the left column with a literal.
        let mut root = binary(OperatorKind::Add, col("a"), col("b"));
        let mut displaced = None;
        let res = rewrite_expr(&mut root, &mut |slot| {
            if matches!(slot.node(), Node::Column(c) if c.col_name == "a") {
                displaced = Some(slot.replace(int(1)));
            }
            VisitOutcome::Continue
        });
        assert_eq!(res, VisitOutcome::Continue);
        assert_eq!(displaced, Some(col("a")));
        match &root {
            Node::Operator(op) => {
                assert_eq!(op.left.as_deref(), Some(&int(1)));
                assert_eq!(op.right.as_deref(), Some(&col("b")));
            }
            other => panic!("unexpected root: {other:?}"),
        }
    }

    #[test]
    fn test_pre_order_replacement_is_descended_into() {
        // Replacing the root with a new operator must continue into the
        // replacement's children, not the original's.
        let mut root = binary(OperatorKind::Add, col("old_l"), col("old_r"));
        let mut seen = Vec::new();
        let res = rewrite_expr(&mut root, &mut |slot| {
            match slot.node() {
                Node::Operator(op) if op.op == OperatorKind::Add => {
                    let _old = slot.replace(binary(OperatorKind::Subtract, col("new_l"), int(2)));
                }
                Node::Column(c) => seen.push(c.col_name.clone()),
                Node::Value(_) => seen.push("value".to_owned()),
                _ => {}
            }
            VisitOutcome::Continue
        });
        assert_eq!(res, VisitOutcome::Continue);
        assert_eq!(seen, ["new_l", "value"]);
    }

    #[test]
    fn test_post_order_rewrite_sees_children_first() {
        let mut root = binary(OperatorKind::Add, int(1), int(2));
        let mut kinds = Vec::new();
        let res = rewrite_expr_post_order(&mut root, &mut |slot| {
            kinds.push(slot.node().kind());
            VisitOutcome::Continue
        });
        assert_eq!(res, VisitOutcome::Continue);
        assert_eq!(kinds, [NodeKind::Value, NodeKind::Value, NodeKind::Operator]);
    }

    #[test]
    fn test_list_rewrite_changes_identity_not_length() {
        let mut list: NodeList = [col("a"), col("b"), col("c")].into_iter().collect();
        let res = rewrite_exprs(&mut list, &mut |slot| {
            if matches!(slot.node(), Node::Column(c) if c.col_name == "b") {
                let _old = slot.replace(int(42));
            }
            VisitOutcome::Continue
        });
        assert_eq!(res, VisitOutcome::Continue);
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(1), Some(&int(42)));
    }
}
