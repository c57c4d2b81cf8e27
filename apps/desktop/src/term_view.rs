//! Terminal implementation of the view-mount primitive.
//!
//! Maintains the mounted node tree the way the presenter shapes it and
//! renders it to plain text on demand. Escape attachment is bookkeeping
//! only: the shell routes the actual key to the presenter.

use std::collections::HashSet;

use parking_lot::Mutex;

use chrono::{DateTime, Utc};
use client_core::{MountPoint, MountPosition, ViewHost, ViewId, ViewSpec};
use shared::domain::PointDraft;

struct Node {
    id: ViewId,
    spec: ViewSpec,
    children: Vec<Node>,
}

#[derive(Default)]
struct TermState {
    roots: Vec<Node>,
    escape: HashSet<ViewId>,
}

pub struct TermHost {
    state: Mutex<TermState>,
}

impl TermHost {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TermState::default()),
        }
    }

    pub fn escape_armed(&self) -> bool {
        !self.state.lock().escape.is_empty()
    }

    /// Current screen as text, one mounted node per line.
    pub fn render(&self) -> String {
        let state = self.state.lock();
        if state.roots.is_empty() {
            return "  (empty screen)".to_string();
        }
        let mut out = String::new();
        render_nodes(&state.roots, 1, &mut out);
        out
    }
}

fn render_nodes(nodes: &[Node], depth: usize, out: &mut String) {
    for node in nodes {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format_spec(&node.spec));
        out.push('\n');
        render_nodes(&node.children, depth + 1, out);
    }
}

fn short_time(ts: &DateTime<Utc>) -> String {
    ts.format("%b %d %H:%M").to_string()
}

fn format_draft(draft: &PointDraft, destination: &Option<String>) -> String {
    let destination = destination.clone().unwrap_or_else(|| "<no destination>".to_string());
    format!(
        "{} to {} | {} - {} | price {}",
        draft.kind.label(),
        destination,
        short_time(&draft.date_from),
        short_time(&draft.date_to),
        draft.base_price,
    )
}

fn format_spec(spec: &ViewSpec) -> String {
    match spec {
        ViewSpec::Loading => "Loading...".to_string(),
        ViewSpec::NoPoints { filter } => filter.empty_message().to_string(),
        ViewSpec::SortBar { selected } => format!("Sort by: {}", selected.label()),
        ViewSpec::PointList => "Trip points:".to_string(),
        ViewSpec::PointRow {
            point,
            destination,
            offers,
        } => {
            let destination = destination.clone().unwrap_or_else(|| "<unknown>".to_string());
            let mut line = format!(
                "{} {} {} to {} | {} - {} | price {}",
                point.id,
                if point.is_favorite { "*" } else { " " },
                point.kind.label(),
                destination,
                short_time(&point.date_from),
                short_time(&point.date_to),
                point.base_price,
            );
            for offer in offers {
                line.push_str(&format!(" [+{} {}]", offer.title, offer.price));
            }
            line
        }
        ViewSpec::PointEditor {
            point_id,
            draft,
            destination,
            available_offers,
            pending,
            rejected,
        } => {
            let target = match point_id {
                Some(id) => format!("edit {id}"),
                None => "new point".to_string(),
            };
            let mut line = format!("[{}] {}", target, format_draft(draft, destination));
            if !available_offers.is_empty() {
                line.push_str(&format!(" | {} offers available", available_offers.len()));
            }
            if *pending {
                line.push_str(" (saving...)");
            }
            if *rejected {
                line.push_str(" (save failed, try again)");
            }
            line
        }
        ViewSpec::Statistics { lines } => {
            let mut block = "Statistics:".to_string();
            for line in lines {
                block.push_str(&format!("\n    {:<24} {}", line.label, line.value));
            }
            block
        }
    }
}

fn remove_node(nodes: &mut Vec<Node>, id: ViewId) -> bool {
    if let Some(index) = nodes.iter().position(|node| node.id == id) {
        nodes.remove(index);
        return true;
    }
    nodes
        .iter_mut()
        .any(|node| remove_node(&mut node.children, id))
}

fn subtree_contains(nodes: &[Node], id: ViewId) -> bool {
    nodes
        .iter()
        .any(|node| node.id == id || subtree_contains(&node.children, id))
}

fn find_node(nodes: &mut [Node], id: ViewId) -> Option<&mut Node> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if subtree_contains(&node.children, id) {
            return find_node(&mut node.children, id);
        }
    }
    None
}

impl ViewHost for TermHost {
    fn mount(&self, target: MountPoint, spec: ViewSpec, position: MountPosition) -> ViewId {
        let id = ViewId::fresh();
        let mut state = self.state.lock();
        let node = Node {
            id,
            spec,
            children: Vec::new(),
        };
        let siblings = match target {
            MountPoint::Root => &mut state.roots,
            MountPoint::Within(parent) => match find_node(&mut state.roots, parent) {
                Some(parent) => &mut parent.children,
                None => return id,
            },
        };
        match position {
            MountPosition::AfterBegin => siblings.insert(0, node),
            MountPosition::BeforeEnd => siblings.push(node),
        }
        id
    }

    fn unmount(&self, id: ViewId) {
        remove_node(&mut self.state.lock().roots, id);
    }

    fn replace(&self, id: ViewId, spec: ViewSpec) {
        if let Some(node) = find_node(&mut self.state.lock().roots, id) {
            node.spec = spec;
        }
    }

    fn attach_escape(&self, id: ViewId) {
        self.state.lock().escape.insert(id);
    }

    fn detach_escape(&self, id: ViewId) {
        self.state.lock().escape.remove(&id);
    }
}
