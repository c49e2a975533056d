/*!
 * Queue tree flattening
 */

use rmbridge_interface::QueueInfo;

use crate::error::{BridgeError, Result};

/// Deepest descendant level accepted below the starting queue
pub const MAX_QUEUE_DEPTH: usize = 64;

/// Every descendant of `start`, depth-first pre-order, children in the order
/// the resource manager returned them. `start` itself is excluded.
///
/// Walks with an explicit stack, so a hostile tree cannot overflow ours; a
/// branch deeper than [`MAX_QUEUE_DEPTH`] is reported as an invalid response.
pub fn flatten_descendants(start: &QueueInfo) -> Result<Vec<&QueueInfo>> {
    let mut flattened = Vec::new();
    let mut stack: Vec<(&QueueInfo, usize)> = start
        .child_queues
        .iter()
        .rev()
        .map(|child| (child, 1))
        .collect();

    while let Some((queue, depth)) = stack.pop() {
        if depth > MAX_QUEUE_DEPTH {
            return Err(BridgeError::InvalidResponse(format!(
                "Queue hierarchy below '{}' is deeper than {} levels",
                start.queue_name, MAX_QUEUE_DEPTH
            )));
        }

        flattened.push(queue);
        stack.extend(queue.child_queues.iter().rev().map(|child| (child, depth + 1)));
    }

    Ok(flattened)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(queues: &[&QueueInfo]) -> Vec<String> {
        queues.iter().map(|q| q.queue_name.clone()).collect()
    }

    /// A single chain `root -> q1 -> q2 -> ... -> q<depth>`
    fn chain(depth: usize) -> QueueInfo {
        let mut node = QueueInfo::leaf(format!("q{}", depth), 1.0);
        for level in (1..depth).rev() {
            node = QueueInfo::leaf(format!("q{}", level), 1.0).with_children(vec![node]);
        }
        QueueInfo::leaf("root", 1.0).with_children(vec![node])
    }

    #[test]
    fn test_pre_order_with_service_child_order() {
        let root = QueueInfo::leaf("root", 1.0).with_children(vec![
            QueueInfo::leaf("A", 0.6).with_children(vec![
                QueueInfo::leaf("A1", 0.5),
                QueueInfo::leaf("A2", 0.5),
            ]),
            QueueInfo::leaf("B", 0.4),
        ]);

        let flat = flatten_descendants(&root).unwrap();
        assert_eq!(names(&flat), vec!["A", "A1", "A2", "B"]);
    }

    #[test]
    fn test_leaf_has_no_descendants() {
        let root = QueueInfo::leaf("root", 1.0);
        assert!(flatten_descendants(&root).unwrap().is_empty());
    }

    #[test]
    fn test_deep_grandchildren_precede_later_siblings() {
        let root = QueueInfo::leaf("root", 1.0).with_children(vec![
            QueueInfo::leaf("A", 0.5).with_children(vec![QueueInfo::leaf("A1", 1.0)
                .with_children(vec![QueueInfo::leaf("A1x", 1.0)])]),
            QueueInfo::leaf("B", 0.5)
                .with_children(vec![QueueInfo::leaf("B1", 1.0)]),
        ]);

        let flat = flatten_descendants(&root).unwrap();
        assert_eq!(names(&flat), vec!["A", "A1", "A1x", "B", "B1"]);
    }

    #[test]
    fn test_depth_at_limit_is_accepted() {
        let root = chain(MAX_QUEUE_DEPTH);
        let flat = flatten_descendants(&root).unwrap();
        assert_eq!(flat.len(), MAX_QUEUE_DEPTH);
        assert_eq!(flat.last().unwrap().queue_name, format!("q{}", MAX_QUEUE_DEPTH));
    }

    #[test]
    fn test_depth_beyond_limit_is_rejected() {
        let root = chain(MAX_QUEUE_DEPTH + 1);
        let result = flatten_descendants(&root);
        assert!(matches!(result, Err(BridgeError::InvalidResponse(_))));
    }
}
