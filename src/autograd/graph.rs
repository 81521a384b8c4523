//! Topological ordering of the graph reachable from a root

use super::{Context, Tensor};
use crate::Result;
use std::collections::HashSet;

/// Linearize every tensor reachable from `root`, dependencies first.
///
/// Operands are explored left before right and `root` comes last. A tensor
/// shared by several consumers appears once. The visited set is local to
/// the call, so tensors carry no traversal state between walks.
pub fn build_list(ctx: &Context, root: Tensor) -> Result<Vec<Tensor>> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    // (tensor, operands already scheduled)
    let mut stack = vec![(root, false)];

    while let Some((t, expanded)) = stack.pop() {
        if expanded {
            order.push(t);
            continue;
        }
        if !visited.insert(t) {
            continue;
        }

        let op = ctx.op(t)?;
        stack.push((t, true));
        let operands: Vec<Tensor> = op.operands().collect();
        for operand in operands.into_iter().rev() {
            stack.push((operand, false));
        }
    }

    log::debug!("graph from {} has {} nodes", root, order.len());
    Ok(order)
}
