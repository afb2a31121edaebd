use serde_json::Value;

use crate::adapter::{DataSource, TextMeasurer, UnicodeWidthMeasurer};
use crate::builder::HierarchyBuilder;
use crate::collapse::{self, Toggled};
use crate::error::{Error, LoadError, Result};
use crate::flatten::{NodeBox, VisibleSet};
use crate::hierarchy::{Hierarchy, NodeIndex};
use crate::layout::LayoutEngine;
use crate::reconcile::{reconcile, snapshot_positions, Anchor, Reconciliation};

/// Where a [`TreeSession`] is in loading its data.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    /// The last load failed with this message. An earlier tree stays usable.
    Failed(String),
}

/// Input to a [`TreeSession`], usually produced from a click on a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Collapse or expand the visible node with this identity key.
    Toggle(String),
    /// Show every node.
    ExpandAll,
    /// Back to the startup state: only the root and its children are visible.
    CollapseAll,
}

#[derive(Debug, Clone)]
struct Loaded {
    hierarchy: Hierarchy,
    /// Visible set of the last completed cycle
    rendered: VisibleSet,
}

/// One interactive tree diagram.
///
/// Owns the [`Hierarchy`], its collapse state and the last rendered [`VisibleSet`].
/// Every command runs the full cycle (mutate, layout, reconcile) before it returns.
/// A failing command leaves the session exactly as it was.
///
/// # Example
///
/// ```
/// # use tui_tree_diagram::{Command, TreeSession};
/// let raw = serde_json::json!([{
///     "valor": "Homo Ludens",
///     "subnodos": [
///         { "valor": "Juego", "subnodos": [{ "valor": "Reglas" }] },
///         { "valor": "Cultura" }
///     ]
/// }]);
/// let mut session = TreeSession::default();
/// let initial = session.load(&mut raw.clone())?;
/// assert_eq!(initial.nodes.entering.len(), 3);
///
/// let expanded = session.dispatch(&Command::Toggle("Juego".to_owned()))?;
/// assert_eq!(expanded.nodes.entering[0].key, "Reglas");
/// # Ok::<(), tui_tree_diagram::Error>(())
/// ```
pub struct TreeSession {
    builder: HierarchyBuilder,
    layout: LayoutEngine,
    node_box: NodeBox,
    measurer: Box<dyn TextMeasurer>,
    state: LoadState,
    tree: Option<Loaded>,
}

impl Default for TreeSession {
    fn default() -> Self {
        Self::new(HierarchyBuilder::default(), LayoutEngine::default())
    }
}

impl std::fmt::Debug for TreeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeSession")
            .field("builder", &self.builder)
            .field("layout", &self.layout)
            .field("node_box", &self.node_box)
            .field("state", &self.state)
            .field("tree", &self.tree)
            .finish_non_exhaustive()
    }
}

impl TreeSession {
    #[must_use]
    pub fn new(builder: HierarchyBuilder, layout: LayoutEngine) -> Self {
        Self {
            builder,
            layout,
            node_box: NodeBox::default(),
            measurer: Box::new(UnicodeWidthMeasurer::default()),
            state: LoadState::Idle,
            tree: None,
        }
    }

    #[must_use]
    pub fn measurer<M>(mut self, measurer: M) -> Self
    where
        M: TextMeasurer + 'static,
    {
        self.measurer = Box::new(measurer);
        self
    }

    #[must_use]
    pub fn node_box(mut self, node_box: NodeBox) -> Self {
        self.node_box = node_box;
        self
    }

    #[must_use]
    pub const fn layout_engine(&self) -> &LayoutEngine {
        &self.layout
    }

    #[must_use]
    pub const fn load_state(&self) -> &LoadState {
        &self.state
    }

    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self.state, LoadState::Loading)
    }

    #[must_use]
    pub fn hierarchy(&self) -> Option<&Hierarchy> {
        self.tree.as_ref().map(|tree| &tree.hierarchy)
    }

    /// The visible nodes and edges of the last completed cycle.
    #[must_use]
    pub fn visible(&self) -> Option<&VisibleSet> {
        self.tree.as_ref().map(|tree| &tree.rendered)
    }

    /// Mark the session as loading. The data is handed over with [`finish_load`](Self::finish_load).
    ///
    /// # Errors
    ///
    /// Errors with [`Error::Busy`] while another load is pending.
    pub fn begin_load(&mut self) -> Result<()> {
        if self.is_busy() {
            return Err(Error::Busy);
        }
        self.state = LoadState::Loading;
        Ok(())
    }

    /// Build the tree from fetched data and run the first cycle.
    ///
    /// The returned [`Reconciliation`] lets every node grow out of the root's default anchor.
    ///
    /// # Errors
    ///
    /// Errors with [`Error::NotLoading`] without a preceding [`begin_load`](Self::begin_load),
    /// the session stays as it is.
    /// Errors when the fetch failed or the payload is malformed.
    /// The session is then [`LoadState::Failed`] and keeps any earlier tree.
    pub fn finish_load(
        &mut self,
        fetched: std::result::Result<Value, LoadError>,
    ) -> Result<Reconciliation> {
        if !self.is_busy() {
            return Err(Error::NotLoading);
        }
        let result = fetched
            .map_err(Error::from)
            .and_then(|raw| self.start(&raw));
        match result {
            Ok(reconciliation) => {
                self.state = LoadState::Ready;
                Ok(reconciliation)
            }
            Err(error) => {
                log::warn!("loading the tree failed: {error}");
                self.state = LoadState::Failed(error.to_string());
                Err(error)
            }
        }
    }

    /// Fetch from `source` and run the first cycle.
    ///
    /// # Errors
    ///
    /// See [`begin_load`](Self::begin_load) and [`finish_load`](Self::finish_load).
    pub fn load<S>(&mut self, source: &mut S) -> Result<Reconciliation>
    where
        S: DataSource + ?Sized,
    {
        self.begin_load()?;
        let fetched = source.fetch();
        self.finish_load(fetched)
    }

    /// Shortcut for [`Command::Toggle`].
    ///
    /// # Errors
    ///
    /// See [`dispatch`](Self::dispatch).
    pub fn toggle(&mut self, key: &str) -> Result<Reconciliation> {
        self.dispatch(&Command::Toggle(key.to_owned()))
    }

    /// Apply a command and run the layout and reconciliation for it.
    ///
    /// # Errors
    ///
    /// - [`Error::NotLoaded`] before a tree was loaded.
    /// - [`Error::UnknownNode`] when the toggled key is not visible.
    /// - [`Error::DuplicateIdentity`] when the key or the new visible set is ambiguous.
    pub fn dispatch(&mut self, command: &Command) -> Result<Reconciliation> {
        let tree = self.tree.as_ref().ok_or(Error::NotLoaded)?;
        let mut hierarchy = tree.hierarchy.clone();
        let anchor = match command {
            Command::Toggle(key) => {
                let index = hierarchy.find_visible(key)?;
                match collapse::toggle(&mut hierarchy, index) {
                    Toggled::Unchanged => log::trace!("{key:?} has nothing to toggle"),
                    toggled => log::debug!("toggle {key:?}: {toggled:?}"),
                }
                index
            }
            Command::ExpandAll => {
                collapse::expand_all(&mut hierarchy);
                hierarchy.root()
            }
            Command::CollapseAll => {
                collapse::collapse_below_root(&mut hierarchy);
                hierarchy.root()
            }
        };
        let (loaded, reconciliation) = self.settle(hierarchy, anchor, &tree.rendered)?;
        self.tree = Some(loaded);
        Ok(reconciliation)
    }

    fn start(&mut self, raw: &Value) -> Result<Reconciliation> {
        let mut hierarchy = self.builder.build(raw)?;
        collapse::collapse_below_root(&mut hierarchy);
        let root = hierarchy.root();
        hierarchy.node_mut(root).previous_position = self.layout.default_anchor();

        let empty = VisibleSet::default();
        let previous = self.tree.as_ref().map_or(&empty, |tree| &tree.rendered);
        let (loaded, reconciliation) = self.settle(hierarchy, root, previous)?;
        log::debug!("loaded tree with {} nodes", loaded.hierarchy.len());
        self.tree = Some(loaded);
        Ok(reconciliation)
    }

    /// Measure, layout, collect and reconcile a mutated copy of the hierarchy.
    fn settle(
        &self,
        mut hierarchy: Hierarchy,
        anchor: NodeIndex,
        previous: &VisibleSet,
    ) -> Result<(Loaded, Reconciliation)> {
        self.measure(&mut hierarchy);
        self.layout.layout(&mut hierarchy);
        let rendered = VisibleSet::collect(&hierarchy, &self.node_box)?;

        let node = hierarchy.node(anchor);
        let anchor = Anchor {
            previous: node.previous_position,
            current: node.position,
        };
        let reconciliation = reconcile(previous, &rendered, anchor);
        snapshot_positions(&mut hierarchy);
        Ok((
            Loaded {
                hierarchy,
                rendered,
            },
            reconciliation,
        ))
    }

    /// Labels are measured once, the first time their node is visible.
    fn measure(&self, hierarchy: &mut Hierarchy) {
        for index in hierarchy.visible() {
            let node = hierarchy.node_mut(index);
            if node.measured_extent.is_none() {
                node.measured_extent = Some(self.measurer.measure(&node.id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::point::Point;

    fn homo_ludens() -> Value {
        json!([{
            "valor": "Homo Ludens",
            "subnodos": [
                { "valor": "Juego", "subnodos": [{ "valor": "Reglas" }] },
                { "valor": "Cultura" }
            ]
        }])
    }

    fn loaded() -> TreeSession {
        let mut session = TreeSession::default();
        session.load(&mut homo_ludens()).unwrap();
        session
    }

    fn position(session: &TreeSession, key: &str) -> Point {
        session.visible().unwrap().node(key).unwrap().position
    }

    fn keys<T>(items: &[T], key: impl Fn(&T) -> &str) -> Vec<&str> {
        items.iter().map(key).collect()
    }

    #[test]
    fn load_shows_root_and_children() {
        let mut session = TreeSession::default();
        assert_eq!(session.load_state(), &LoadState::Idle);
        let initial = session.load(&mut homo_ludens()).unwrap();

        assert_eq!(session.load_state(), &LoadState::Ready);
        assert_eq!(
            keys(&initial.nodes.entering, |node| node.key.as_str()),
            ["Homo Ludens", "Juego", "Cultura"]
        );
        assert_eq!(initial.edges.entering.len(), 2);
        assert!(initial.nodes.updating.is_empty());
        assert!(initial.nodes.exiting.is_empty());
        for node in &initial.nodes.entering {
            assert_eq!(node.from, Point::new(400.0, 0.0));
        }

        assert_eq!(session.visible().unwrap().len(), 3);
        assert_eq!(position(&session, "Homo Ludens"), Point::new(400.0, 0.0));
        assert_eq!(position(&session, "Juego"), Point::new(200.0, 960.0));
        assert_eq!(position(&session, "Cultura"), Point::new(600.0, 960.0));
    }

    #[test]
    fn expanding_grows_out_of_the_toggled_node() {
        let mut session = loaded();
        let expanded = session.toggle("Juego").unwrap();

        assert_eq!(expanded.anchor.previous, Point::new(200.0, 960.0));
        assert_eq!(expanded.anchor.current, Point::new(200.0, 480.0));
        assert_eq!(keys(&expanded.nodes.entering, |node| node.key.as_str()), ["Reglas"]);
        assert_eq!(expanded.nodes.entering[0].from, Point::new(200.0, 960.0));
        assert_eq!(expanded.nodes.entering[0].to, Point::new(200.0, 960.0));
        assert_eq!(keys(&expanded.edges.entering, |edge| edge.key.as_str()), ["Reglas"]);
        assert_eq!(
            expanded.edges.entering[0].from,
            crate::flatten::EdgePath::collapsed(Point::new(200.0, 960.0))
        );
        assert_eq!(expanded.nodes.updating.len(), 3);
        assert!(expanded.nodes.exiting.is_empty());

        assert_eq!(session.visible().unwrap().len(), 4);
        assert_eq!(position(&session, "Cultura"), Point::new(600.0, 480.0));
    }

    #[test]
    fn collapsing_shrinks_into_the_toggled_node() {
        let mut session = loaded();
        session.toggle("Juego").unwrap();
        let collapsed = session.toggle("Juego").unwrap();

        assert_eq!(keys(&collapsed.nodes.exiting, |node| node.key.as_str()), ["Reglas"]);
        assert_eq!(collapsed.nodes.exiting[0].from, Point::new(200.0, 960.0));
        assert_eq!(collapsed.nodes.exiting[0].to, Point::new(200.0, 960.0));
        assert_eq!(keys(&collapsed.edges.exiting, |edge| edge.key.as_str()), ["Reglas"]);

        let juego = collapsed
            .nodes
            .updating
            .iter()
            .find(|node| node.key == "Juego")
            .unwrap();
        assert_eq!(juego.from, Point::new(200.0, 480.0));
        assert_eq!(juego.to, Point::new(200.0, 960.0));
        assert!(juego.has_hidden_children);
        assert_eq!(session.visible().unwrap().len(), 3);
    }

    #[test]
    fn toggling_twice_restores_the_layout() {
        let mut session = loaded();
        let before = session.visible().unwrap().clone();
        session.toggle("Juego").unwrap();
        session.toggle("Juego").unwrap();
        assert_eq!(session.visible().unwrap(), &before);
    }

    #[test]
    fn single_root_sits_at_the_default_anchor() {
        let mut session = TreeSession::default();
        let initial = session.load(&mut json!({ "valor": "solo" })).unwrap();
        assert_eq!(initial.nodes.entering.len(), 1);
        assert!(initial.edges.is_empty());
        assert_eq!(position(&session, "solo"), Point::new(400.0, 0.0));

        let toggled = session.toggle("solo").unwrap();
        assert!(toggled.nodes.entering.is_empty());
        assert!(toggled.nodes.exiting.is_empty());
        assert_eq!(toggled.nodes.updating.len(), 1);
    }

    #[test]
    fn expand_all_and_collapse_all_round_trip() {
        let mut session = TreeSession::default();
        let mut raw = json!({
            "valor": "a",
            "subnodos": [
                { "valor": "b", "subnodos": [{ "valor": "c", "subnodos": [{ "valor": "d" }] }] },
                { "valor": "e" }
            ]
        });
        session.load(&mut raw).unwrap();
        let startup = session.visible().unwrap().clone();

        let expanded = session.dispatch(&Command::ExpandAll).unwrap();
        assert_eq!(keys(&expanded.nodes.entering, |node| node.key.as_str()), ["c", "d"]);
        assert_eq!(session.visible().unwrap().len(), 5);

        let collapsed = session.dispatch(&Command::CollapseAll).unwrap();
        assert_eq!(keys(&collapsed.nodes.exiting, |node| node.key.as_str()), ["c", "d"]);
        assert_eq!(session.visible().unwrap(), &startup);
    }

    #[test]
    fn labels_are_measured_into_the_box() {
        let session = loaded();
        let juego = session.visible().unwrap().node("Juego").unwrap();
        assert!((juego.shape.width - (5.0 * 8.0 + 20.0)).abs() < f64::EPSILON);
        assert!((juego.shape.height - 20.0).abs() < f64::EPSILON);
        let hierarchy = session.hierarchy().unwrap();
        let reglas = hierarchy
            .iter()
            .find(|(_, node)| node.id() == "Reglas")
            .unwrap()
            .1;
        assert_eq!(reglas.measured_extent(), None);
    }

    #[test]
    fn failed_toggle_leaves_session_untouched() {
        let mut session = TreeSession::new(
            HierarchyBuilder::default().unique_identities(false),
            LayoutEngine::default(),
        );
        let mut raw = json!({
            "valor": "r",
            "subnodos": [
                { "valor": "a", "subnodos": [{ "valor": "x" }] },
                { "valor": "b", "subnodos": [{ "valor": "x" }] }
            ]
        });
        session.load(&mut raw).unwrap();
        session.toggle("a").unwrap();
        let hierarchy = session.hierarchy().unwrap().clone();
        let visible = session.visible().unwrap().clone();

        let error = session.toggle("b").unwrap_err();
        assert!(matches!(error, Error::DuplicateIdentity { id } if id == "x"));
        assert_eq!(session.hierarchy().unwrap(), &hierarchy);
        assert_eq!(session.visible().unwrap(), &visible);

        session.toggle("a").unwrap();
        session.toggle("b").unwrap();
        assert_eq!(session.visible().unwrap().len(), 4);
    }

    #[test]
    fn unknown_or_hidden_node_is_rejected() {
        let mut session = loaded();
        assert!(matches!(
            session.toggle("Reglas"),
            Err(Error::UnknownNode { id }) if id == "Reglas"
        ));
        assert!(matches!(
            session.toggle("nope"),
            Err(Error::UnknownNode { .. })
        ));
        assert_eq!(session.visible().unwrap().len(), 3);
    }

    #[test]
    fn commands_need_a_tree() {
        let mut session = TreeSession::default();
        assert!(matches!(
            session.dispatch(&Command::ExpandAll),
            Err(Error::NotLoaded)
        ));
    }

    #[test]
    fn second_load_while_loading_is_busy() {
        let mut session = TreeSession::default();
        session.begin_load().unwrap();
        assert!(session.is_busy());
        assert!(matches!(session.begin_load(), Err(Error::Busy)));
        assert!(matches!(
            session.load(&mut homo_ludens()),
            Err(Error::Busy)
        ));
        session.finish_load(Ok(homo_ludens())).unwrap();
        assert!(!session.is_busy());
    }

    #[test]
    fn finishing_requires_a_started_load() {
        let mut session = TreeSession::default();
        assert!(matches!(
            session.finish_load(Ok(homo_ludens())),
            Err(Error::NotLoading)
        ));
        assert_eq!(session.load_state(), &LoadState::Idle);
        assert!(session.visible().is_none());

        let mut session = loaded();
        session.toggle("Juego").unwrap();
        let visible = session.visible().unwrap().clone();
        assert!(matches!(
            session.finish_load(Ok(homo_ludens())),
            Err(Error::NotLoading)
        ));
        assert_eq!(session.load_state(), &LoadState::Ready);
        assert_eq!(session.visible().unwrap(), &visible);
    }

    #[test]
    fn failed_load_keeps_previous_tree() {
        let mut session = loaded();
        session.begin_load().unwrap();
        let error = session
            .finish_load(Err(LoadError::Source("offline".to_owned())))
            .unwrap_err();
        assert!(matches!(error, Error::Load(LoadError::Source(_))));
        assert!(matches!(session.load_state(), LoadState::Failed(message) if message.ends_with("offline")));
        assert!(!session.is_busy());
        assert_eq!(session.visible().unwrap().len(), 3);
        session.toggle("Juego").unwrap();
    }

    #[test]
    fn malformed_payload_fails_the_load() {
        let mut session = TreeSession::default();
        let error = session.load(&mut json!([{ "subnodos": [] }])).unwrap_err();
        assert!(matches!(error, Error::MalformedInput { .. }));
        assert!(matches!(session.load_state(), LoadState::Failed(_)));
        assert!(session.visible().is_none());
    }
}
