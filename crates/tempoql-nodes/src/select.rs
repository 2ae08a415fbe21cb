//! Clause-scoped traversal of a SELECT statement.
//!
//! The nine clause slots are processed in one fixed pipeline order. A caller
//! names the clause to start at and the driver processes that clause and
//! every clause after it, skipping the ones before. A multi-stage pass can
//! therefore resume mid-pipeline ("re-resolve everything from the window
//! clause onward") without restarting at FROM.

use crate::node::SelectStmt;
use crate::rewrite::{NodeSlot, rewrite_list, rewrite_opt};
use crate::walk::{TraversalOrder, VisitOutcome, walk_list, walk_opt};

/// One clause slot of a [`SelectStmt`], in pipeline position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectClause {
    From,
    Where,
    PartitionBy,
    Window,
    GroupBy,
    Having,
    /// Owns no sub-expression; exists to mark its pipeline position.
    Distinct,
    OrderBy,
    Projection,
}

impl SelectClause {
    /// The fixed pipeline order.
    pub const PIPELINE: [Self; 9] = [
        Self::From,
        Self::Where,
        Self::PartitionBy,
        Self::Window,
        Self::GroupBy,
        Self::Having,
        Self::Distinct,
        Self::OrderBy,
        Self::Projection,
    ];

    fn pipeline_index(self) -> usize {
        match self {
            Self::From => 0,
            Self::Where => 1,
            Self::PartitionBy => 2,
            Self::Window => 3,
            Self::GroupBy => 4,
            Self::Having => 5,
            Self::Distinct => 6,
            Self::OrderBy => 7,
            Self::Projection => 8,
        }
    }

    /// This clause and every clause after it, in pipeline order.
    #[must_use]
    pub fn tail(self) -> &'static [Self] {
        &Self::PIPELINE[self.pipeline_index()..]
    }
}

/// Walk `start` and every later clause of a select statement.
///
/// Short-circuits across clauses: the first non-`Continue` outcome from any
/// clause's subtree is returned and no later clause is visited.
pub fn walk_select_stmt<F>(
    stmt: &mut SelectStmt,
    start: SelectClause,
    order: TraversalOrder,
    visitor: &mut F,
) -> VisitOutcome
where
    F: FnMut(&mut crate::node::Node) -> VisitOutcome,
{
    for clause in start.tail() {
        let res = match clause {
            SelectClause::From => walk_opt(stmt.from.as_deref_mut(), order, visitor),
            SelectClause::Where => walk_opt(stmt.where_clause.as_deref_mut(), order, visitor),
            SelectClause::PartitionBy => walk_list(&mut stmt.partition_by, order, visitor),
            SelectClause::Window => walk_opt(stmt.window.as_deref_mut(), order, visitor),
            SelectClause::GroupBy => walk_list(&mut stmt.group_by, order, visitor),
            SelectClause::Having => walk_opt(stmt.having.as_deref_mut(), order, visitor),
            SelectClause::Distinct => VisitOutcome::Continue,
            SelectClause::OrderBy => walk_list(&mut stmt.order_by, order, visitor),
            SelectClause::Projection => match stmt.projections.as_mut() {
                Some(list) => walk_list(list, order, visitor),
                None => VisitOutcome::Continue,
            },
        };
        if !res.is_continue() {
            return res;
        }
    }
    VisitOutcome::Continue
}

/// Rewrite twin of [`walk_select_stmt`]: the rewriter sees each clause's
/// slots and may replace their contents.
pub fn rewrite_select_stmt<R>(
    stmt: &mut SelectStmt,
    start: SelectClause,
    order: TraversalOrder,
    rewriter: &mut R,
) -> VisitOutcome
where
    R: FnMut(&mut NodeSlot<'_>) -> VisitOutcome,
{
    for clause in start.tail() {
        let res = match clause {
            SelectClause::From => rewrite_opt(&mut stmt.from, order, rewriter),
            SelectClause::Where => rewrite_opt(&mut stmt.where_clause, order, rewriter),
            SelectClause::PartitionBy => rewrite_list(&mut stmt.partition_by, order, rewriter),
            SelectClause::Window => rewrite_opt(&mut stmt.window, order, rewriter),
            SelectClause::GroupBy => rewrite_list(&mut stmt.group_by, order, rewriter),
            SelectClause::Having => rewrite_opt(&mut stmt.having, order, rewriter),
            SelectClause::Distinct => VisitOutcome::Continue,
            SelectClause::OrderBy => rewrite_list(&mut stmt.order_by, order, rewriter),
            SelectClause::Projection => match stmt.projections.as_mut() {
                Some(list) => rewrite_list(list, order, rewriter),
                None => VisitOutcome::Continue,
            },
        };
        if !res.is_continue() {
            return res;
        }
    }
    VisitOutcome::Continue
}
