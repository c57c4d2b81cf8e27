//! Shared fakes for the crate's test modules: a scriptable remote source
//! and a recording view host.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use parking_lot::Mutex;

use shared::domain::{
    Destination, DestinationId, EventKind, FilterKind, Offer, OfferGroup, OfferId, Point,
    PointDraft, PointId, SortKind,
};

use crate::api::RemoteApi;
use crate::model::{FilterStore, PointsStore};
use crate::presenter::TripPresenter;
use crate::view::{MountPoint, MountPosition, ViewHost, ViewId, ViewSpec};

// --- remote source fake ---------------------------------------------------

struct FakeApiState {
    points: Vec<Point>,
    destinations: Vec<Destination>,
    offer_groups: Vec<OfferGroup>,
    next_id: u64,
    fail_points: bool,
    fail_destinations: bool,
    fail_offers: bool,
    fail_mutations: bool,
    /// When set, mutations block until the gate is notified.
    gate: Option<Arc<tokio::sync::Notify>>,
    create_calls: u32,
    update_calls: u32,
    delete_calls: u32,
}

pub(crate) struct FakeApi {
    state: Mutex<FakeApiState>,
}

impl FakeApi {
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            state: Mutex::new(FakeApiState {
                points,
                destinations: sample_destinations(),
                offer_groups: sample_offer_groups(),
                next_id: 100,
                fail_points: false,
                fail_destinations: false,
                fail_offers: false,
                fail_mutations: false,
                gate: None,
                create_calls: 0,
                update_calls: 0,
                delete_calls: 0,
            }),
        }
    }

    pub fn failing_points(self) -> Self {
        self.state.lock().fail_points = true;
        self
    }

    pub fn failing_catalogs(self) -> Self {
        {
            let mut state = self.state.lock();
            state.fail_destinations = true;
            state.fail_offers = true;
        }
        self
    }

    pub fn failing_mutations(self) -> Self {
        self.state.lock().fail_mutations = true;
        self
    }

    pub fn set_fail_mutations(&self, fail: bool) {
        self.state.lock().fail_mutations = fail;
    }

    /// Make every subsequent mutation wait until the gate is notified.
    pub fn set_gate(&self, gate: Arc<tokio::sync::Notify>) {
        self.state.lock().gate = Some(gate);
    }

    async fn wait_for_gate(&self) {
        let gate = self.state.lock().gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    /// What the remote side currently holds.
    pub fn server_points(&self) -> Vec<Point> {
        self.state.lock().points.clone()
    }

    pub fn update_calls(&self) -> u32 {
        self.state.lock().update_calls
    }

    pub fn delete_calls(&self) -> u32 {
        self.state.lock().delete_calls
    }
}

#[async_trait]
impl RemoteApi for FakeApi {
    async fn fetch_points(&self) -> Result<Vec<Point>> {
        let state = self.state.lock();
        if state.fail_points {
            return Err(anyhow!("points endpoint unavailable"));
        }
        Ok(state.points.clone())
    }

    async fn fetch_destinations(&self) -> Result<Vec<Destination>> {
        let state = self.state.lock();
        if state.fail_destinations {
            return Err(anyhow!("destinations endpoint unavailable"));
        }
        Ok(state.destinations.clone())
    }

    async fn fetch_offers(&self) -> Result<Vec<OfferGroup>> {
        let state = self.state.lock();
        if state.fail_offers {
            return Err(anyhow!("offers endpoint unavailable"));
        }
        Ok(state.offer_groups.clone())
    }

    async fn create_point(&self, draft: PointDraft) -> Result<Point> {
        self.wait_for_gate().await;
        let mut state = self.state.lock();
        state.create_calls += 1;
        if state.fail_mutations {
            return Err(anyhow!("mutation rejected"));
        }
        let id = PointId::new(format!("p{}", state.next_id));
        state.next_id += 1;
        let point = draft.into_point(id)?;
        state.points.push(point.clone());
        Ok(point)
    }

    async fn update_point(&self, point: Point) -> Result<Point> {
        self.wait_for_gate().await;
        let mut state = self.state.lock();
        state.update_calls += 1;
        if state.fail_mutations {
            return Err(anyhow!("mutation rejected"));
        }
        match state.points.iter().position(|p| p.id == point.id) {
            Some(index) => {
                state.points[index] = point.clone();
                Ok(point)
            }
            None => Err(anyhow!("no such point on server: {}", point.id)),
        }
    }

    async fn delete_point(&self, id: PointId) -> Result<()> {
        self.wait_for_gate().await;
        let mut state = self.state.lock();
        state.delete_calls += 1;
        if state.fail_mutations {
            return Err(anyhow!("mutation rejected"));
        }
        let before = state.points.len();
        state.points.retain(|point| point.id != id);
        if state.points.len() == before {
            return Err(anyhow!("no such point on server: {id}"));
        }
        Ok(())
    }
}

// --- view host fake -------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HostOp {
    Mount(ViewId),
    Unmount(ViewId),
    Replace(ViewId),
    AttachEscape(ViewId),
    DetachEscape(ViewId),
}

struct Node {
    id: ViewId,
    spec: ViewSpec,
    children: Vec<Node>,
}

#[derive(Default)]
struct HostState {
    roots: Vec<Node>,
    ops: Vec<HostOp>,
    escape: HashSet<ViewId>,
}

pub(crate) struct RecordingHost {
    state: Mutex<HostState>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HostState::default()),
        }
    }

    /// Drain the operation log; lets a test assert exactly what one action
    /// did to the tree.
    pub fn take_ops(&self) -> Vec<HostOp> {
        std::mem::take(&mut self.state.lock().ops)
    }

    pub fn escape_attached(&self) -> usize {
        self.state.lock().escape.len()
    }

    pub fn has_loading(&self) -> bool {
        self.find_spec(|spec| matches!(spec, ViewSpec::Loading))
    }

    pub fn no_points_filter(&self) -> Option<FilterKind> {
        let state = self.state.lock();
        let mut found = None;
        walk(&state.roots, &mut |node| {
            if let ViewSpec::NoPoints { filter } = &node.spec {
                found = Some(*filter);
            }
        });
        found
    }

    pub fn sort_bar(&self) -> Option<SortKind> {
        let state = self.state.lock();
        let mut found = None;
        walk(&state.roots, &mut |node| {
            if let ViewSpec::SortBar { selected } = &node.spec {
                found = Some(*selected);
            }
        });
        found
    }

    /// Point ids rendered in the list, in order. An open edit form counts
    /// under the id it edits; the creation form is skipped.
    pub fn row_order(&self) -> Vec<PointId> {
        self.list_children()
            .into_iter()
            .filter_map(|spec| match spec {
                ViewSpec::PointRow { point, .. } => Some(point.id),
                ViewSpec::PointEditor { point_id, .. } => point_id,
                _ => None,
            })
            .collect()
    }

    /// Every child of the point list, in render order.
    pub fn list_children(&self) -> Vec<ViewSpec> {
        let state = self.state.lock();
        let mut children = Vec::new();
        walk(&state.roots, &mut |node| {
            if matches!(node.spec, ViewSpec::PointList) {
                children = node.children.iter().map(|child| child.spec.clone()).collect();
            }
        });
        children
    }

    pub fn editor_for(&self, id: Option<&PointId>) -> Option<ViewSpec> {
        self.list_children().into_iter().find(|spec| {
            matches!(spec, ViewSpec::PointEditor { point_id, .. } if point_id.as_ref() == id)
        })
    }

    pub fn row_for(&self, id: &PointId) -> Option<ViewSpec> {
        self.list_children().into_iter().find(|spec| {
            matches!(spec, ViewSpec::PointRow { point, .. } if point.id == *id)
        })
    }

    fn find_spec(&self, mut predicate: impl FnMut(&ViewSpec) -> bool) -> bool {
        let state = self.state.lock();
        let mut found = false;
        walk(&state.roots, &mut |node| {
            if predicate(&node.spec) {
                found = true;
            }
        });
        found
    }
}

fn walk(nodes: &[Node], visit: &mut impl FnMut(&Node)) {
    for node in nodes {
        visit(node);
        walk(&node.children, visit);
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

impl ViewHost for RecordingHost {
    fn mount(&self, target: MountPoint, spec: ViewSpec, position: MountPosition) -> ViewId {
        let id = ViewId::fresh();
        let mut state = self.state.lock();
        state.ops.push(HostOp::Mount(id));
        let node = Node {
            id,
            spec,
            children: Vec::new(),
        };
        let siblings = match target {
            MountPoint::Root => &mut state.roots,
            MountPoint::Within(parent) => {
                match find_node(&mut state.roots, parent) {
                    Some(parent) => &mut parent.children,
                    // Mount against a torn-down parent is silently dropped,
                    // mirroring a detached DOM node.
                    None => return id,
                }
            }
        };
        match position {
            MountPosition::AfterBegin => siblings.insert(0, node),
            MountPosition::BeforeEnd => siblings.push(node),
        }
        id
    }

    fn unmount(&self, id: ViewId) {
        let mut state = self.state.lock();
        state.ops.push(HostOp::Unmount(id));
        remove_node(&mut state.roots, id);
    }

    fn replace(&self, id: ViewId, spec: ViewSpec) {
        let mut state = self.state.lock();
        state.ops.push(HostOp::Replace(id));
        if let Some(node) = find_node(&mut state.roots, id) {
            node.spec = spec;
        }
    }

    fn attach_escape(&self, id: ViewId) {
        let mut state = self.state.lock();
        state.ops.push(HostOp::AttachEscape(id));
        state.escape.insert(id);
    }

    fn detach_escape(&self, id: ViewId) {
        let mut state = self.state.lock();
        state.ops.push(HostOp::DetachEscape(id));
        state.escape.remove(&id);
    }
}

// --- fixtures -------------------------------------------------------------

pub(crate) fn sample_destinations() -> Vec<Destination> {
    vec![
        Destination {
            id: DestinationId::new("geneva"),
            name: "Geneva".to_string(),
            description: "Lakeside city".to_string(),
            pictures: Vec::new(),
        },
        Destination {
            id: DestinationId::new("oslo"),
            name: "Oslo".to_string(),
            description: "Fjord capital".to_string(),
            pictures: Vec::new(),
        },
    ]
}

pub(crate) fn sample_offer_groups() -> Vec<OfferGroup> {
    vec![OfferGroup {
        kind: EventKind::Flight,
        offers: vec![
            Offer {
                id: OfferId(1),
                title: "Extra luggage".to_string(),
                price: 30,
            },
            Offer {
                id: OfferId(2),
                title: "Seat choice".to_string(),
                price: 10,
            },
        ],
    }]
}

/// A flight to Geneva starting on the given March day, 10:00 UTC.
pub(crate) fn sample_point(id: &str, day: u32, duration_hours: i64, price: u32) -> Point {
    let date_from = Utc.with_ymd_and_hms(2024, 3, day, 10, 0, 0).unwrap();
    Point {
        id: PointId::new(id),
        kind: EventKind::Flight,
        destination: DestinationId::new("geneva"),
        date_from,
        date_to: date_from + Duration::hours(duration_hours),
        base_price: price,
        is_favorite: false,
        offers: vec![OfferId(1)],
    }
}

pub(crate) struct Fixture {
    pub api: Arc<FakeApi>,
    pub points: Arc<PointsStore>,
    pub filter: Arc<FilterStore>,
    pub host: Arc<RecordingHost>,
    pub presenter: Arc<TripPresenter>,
}

/// Presenter wired to fakes, initialized and loaded with the given points.
pub(crate) async fn loaded_fixture(points: Vec<Point>) -> Fixture {
    let api = Arc::new(FakeApi::new(points));
    let points_store = Arc::new(PointsStore::new(api.clone()));
    let filter = Arc::new(FilterStore::new());
    let host = Arc::new(RecordingHost::new());
    let presenter = TripPresenter::new(points_store.clone(), filter.clone(), host.clone());
    presenter.init();
    points_store.load().await.expect("initial load");
    Fixture {
        api,
        points: points_store,
        filter,
        host,
        presenter,
    }
}
