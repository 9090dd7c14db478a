//! Decide whether and where a cursor marker may go
//!
//! Rules, in order:
//! 1. Anywhere below a text-mode command (`\text{...}`) the marker is
//!    suppressed, however deep.
//! 2. On a command token the marker is suppressed; splicing there would
//!    split the control sequence.
//! 3. In a gap (no node), on a node without span, or directly on a
//!    structural node (environment, formula, `&`, `\\`) the marker goes
//!    exactly at the cursor.
//! 4. Otherwise the node's content span is wrapped in an explicit group and
//!    the marker goes inside it.

use super::locate::NodeLookup;
use super::position::{LocalPosition, Location};
use super::tree::{MathNode, NodeKind};

/// Outcome of the placement policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementDecision {
    /// Leave the snippet alone
    Suppress,
    /// Splice the marker in at this position
    InsertAtPoint(LocalPosition),
    /// Wrap `start..end` in a group and put the marker at `cursor`.
    /// Always `start <= cursor <= end`.
    InsertWithBraces {
        start: LocalPosition,
        cursor: LocalPosition,
        end: LocalPosition,
    },
}

/// Apply the placement rules to a lookup result
pub fn decide(lookup: Option<&NodeLookup<'_>>, cursor: LocalPosition) -> PlacementDecision {
    let Some(lookup) = lookup else {
        return PlacementDecision::InsertAtPoint(cursor);
    };

    if lookup.ancestors.iter().any(|n| n.kind.is_text_command()) {
        tracing::trace!("cursor inside a text-mode command");
        return PlacementDecision::Suppress;
    }

    let node = lookup.node;
    let Some(location) = node.location else {
        return PlacementDecision::InsertAtPoint(cursor);
    };

    match &node.kind {
        NodeKind::Command { .. } | NodeKind::TextCommand { .. } => {
            tracing::trace!(kind = ?node.kind, "cursor on a command token");
            PlacementDecision::Suppress
        }
        NodeKind::Environment { .. } | NodeKind::Formula { .. } | NodeKind::Separator => {
            PlacementDecision::InsertAtPoint(cursor)
        }
        NodeKind::Subscript | NodeKind::Superscript => {
            let (start, end) = script_span(location);
            wrap(start, end, cursor)
        }
        NodeKind::Group(_) | NodeKind::Leaf { .. } => match content_span(node, location) {
            Some((start, end)) => wrap(start, end, cursor),
            None => PlacementDecision::Suppress,
        },
    }
}

/// First child's start to last child's end, or the node's own span when it
/// has no children. `None` when a boundary child has no span.
fn content_span(node: &MathNode, own: Location) -> Option<(LocalPosition, LocalPosition)> {
    match (node.content.first(), node.content.last()) {
        (Some(first), Some(last)) => {
            let start = first.location?.start.to_local();
            let end = last.location?.end.to_local();
            Some((start, end))
        }
        _ => Some((own.start.to_local(), own.end.to_local())),
    }
}

/// Script span without the leading `^`/`_`
fn script_span(location: Location) -> (LocalPosition, LocalPosition) {
    let start = LocalPosition::new(
        location.start.line.saturating_sub(1),
        location.start.column,
    );
    let end = location.end.to_local();
    (start, end.max(start))
}

fn wrap(start: LocalPosition, end: LocalPosition, cursor: LocalPosition) -> PlacementDecision {
    let end = end.max(start);
    PlacementDecision::InsertWithBraces {
        start,
        cursor: cursor.max(start).min(end),
        end,
    }
}
