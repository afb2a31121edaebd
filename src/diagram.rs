use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Line as Segment, Rectangle};
use ratatui::widgets::{Block, Widget};
use unicode_width::UnicodeWidthStr;

use crate::flatten::{EdgePath, NodeShape};
use crate::layout::LayoutEngine;
use crate::point::Point;
use crate::scene::{FrameNode, SceneFrame};

/// Straight pieces each curved edge is drawn with.
const LINK_SEGMENTS: usize = 12;

/// A [`SceneFrame`] which can be rendered.
///
/// The primary axis runs from left to right, the cross axis from top to bottom.
/// Edges are drawn as horizontal cubic curves, nodes as boxes with their label centered on them.
///
/// # Example
///
/// ```
/// # use std::time::Instant;
/// # use ratatui::backend::TestBackend;
/// # use ratatui::widgets::Block;
/// # use ratatui::Terminal;
/// # use tui_tree_diagram::{Scene, TreeDiagram, TreeSession};
/// # let mut terminal = Terminal::new(TestBackend::new(64, 32)).unwrap();
/// let raw = serde_json::json!({ "valor": "root", "subnodos": [{ "valor": "leaf" }] });
/// let mut session = TreeSession::default();
/// let mut scene = Scene::new(Instant::now());
/// session.load(&mut raw.clone()).unwrap().present(&mut scene);
///
/// let frame = scene.frame();
/// terminal.draw(|f| {
///     let diagram = TreeDiagram::new(&frame, session.layout_engine())
///         .block(Block::bordered().title("Tree Diagram"));
///     f.render_widget(diagram, f.size());
/// })?;
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct TreeDiagram<'a> {
    frame: &'a SceneFrame,
    cross_extent: f64,
    primary_extent: f64,
    /// Diagram units kept free around the layout extents
    margin: f64,

    block: Option<Block<'a>>,
    marker: Marker,
    /// Style used as a base style for the widget
    style: Style,
    label_style: Style,
    exiting_style: Style,
    edge_color: Color,
    node_color: Color,

    /// Symbol displayed in front of a collapsed node
    node_closed_symbol: &'a str,
    /// Symbol displayed in front of a node with visible children
    node_open_symbol: &'a str,
    /// Symbol displayed in front of a node without children
    node_no_children_symbol: &'a str,
}

impl<'a> TreeDiagram<'a> {
    /// Draw `frame` into the extents `layout` positions nodes in.
    #[must_use]
    pub fn new(frame: &'a SceneFrame, layout: &LayoutEngine) -> Self {
        let (cross_extent, primary_extent) = layout.extents();
        Self {
            frame,
            cross_extent,
            primary_extent,
            margin: 60.0,
            block: None,
            marker: Marker::Braille,
            style: Style::new(),
            label_style: Style::new(),
            exiting_style: Style::new().fg(Color::DarkGray),
            edge_color: Color::Gray,
            node_color: Color::White,
            node_closed_symbol: "\u{25b6} ", // Arrow to right
            node_open_symbol: "\u{25bc} ",   // Arrow down
            node_no_children_symbol: "  ",
        }
    }

    #[allow(clippy::missing_const_for_fn)]
    #[must_use]
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    #[must_use]
    pub const fn margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    #[must_use]
    pub const fn marker(mut self, marker: Marker) -> Self {
        self.marker = marker;
        self
    }

    #[must_use]
    pub const fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub const fn label_style(mut self, style: Style) -> Self {
        self.label_style = style;
        self
    }

    /// Style of the labels of nodes on their way out.
    #[must_use]
    pub const fn exiting_style(mut self, style: Style) -> Self {
        self.exiting_style = style;
        self
    }

    #[must_use]
    pub const fn edge_color(mut self, color: Color) -> Self {
        self.edge_color = color;
        self
    }

    #[must_use]
    pub const fn node_color(mut self, color: Color) -> Self {
        self.node_color = color;
        self
    }

    #[must_use]
    pub const fn node_closed_symbol(mut self, symbol: &'a str) -> Self {
        self.node_closed_symbol = symbol;
        self
    }

    #[must_use]
    pub const fn node_open_symbol(mut self, symbol: &'a str) -> Self {
        self.node_open_symbol = symbol;
        self
    }

    #[must_use]
    pub const fn node_no_children_symbol(mut self, symbol: &'a str) -> Self {
        self.node_no_children_symbol = symbol;
        self
    }

    /// Identity key of the node drawn at the terminal cell `column`, `row`.
    ///
    /// `area` has to be the area the widget was rendered into.
    /// Both the box and the printed label of a node count. Nodes on their way out are not hit.
    #[must_use]
    pub fn hit_test(&self, area: Rect, column: u16, row: u16) -> Option<&'a str> {
        let area = self.block.as_ref().map_or(area, |block| block.inner(area));
        if area.width < 2 || area.height < 2 {
            return None;
        }
        if column < area.x
            || row < area.y
            || column >= area.x + area.width
            || row >= area.y + area.height
        {
            return None;
        }

        let ([left, _], [_, top]) = self.bounds();
        let (cell_width, cell_height) = self.cell_size(area);
        let canvas_x = f64::from(column - area.x).mul_add(cell_width, left);
        let canvas_y = f64::from(row - area.y).mul_add(-cell_height, top);
        let point = self.diagram_point(canvas_x, canvas_y);

        let frame: &'a SceneFrame = self.frame;
        frame
            .nodes
            .iter()
            .rev()
            .filter(|node| !node.exiting)
            .find(|node| {
                // a cell is coarser than the box, anything touching it counts
                let reach = NodeShape {
                    width: node.look.shape.width + cell_width,
                    height: node.look.shape.height + cell_height,
                };
                let (start, width) = self.label_span(node, cell_width);
                let (_, y) = self.canvas_point(node.position);
                let on_label = (start - cell_width..=start + width).contains(&canvas_x)
                    && (canvas_y - y).abs() <= cell_height;
                on_label || reach.contains(node.position, point)
            })
            .map(|node| node.key.as_str())
    }

    fn bounds(&self) -> ([f64; 2], [f64; 2]) {
        (
            [-self.margin, self.primary_extent + self.margin],
            [-self.margin, self.cross_extent + self.margin],
        )
    }

    /// Diagram units covered by a single terminal cell of `area`.
    fn cell_size(&self, area: Rect) -> (f64, f64) {
        let ([left, right], [bottom, top]) = self.bounds();
        (
            (right - left) / f64::from(area.width.saturating_sub(1).max(1)),
            (top - bottom) / f64::from(area.height.saturating_sub(1).max(1)),
        )
    }

    /// Canvas x where the label of `node` starts and how wide it is, centered on the node.
    ///
    /// Labels are kept inside the canvas as the canvas drops any label starting outside of it.
    fn label_span(&self, node: &FrameNode, cell_width: f64) -> (f64, f64) {
        #[allow(clippy::cast_precision_loss)]
        let columns = (self.symbol(node).width() + node.key.width()) as f64;
        let width = columns * cell_width;
        let (x, _) = self.canvas_point(node.position);
        let ([left, right], _) = self.bounds();
        let start = (x - width / 2.0).min(right - width).max(left);
        (start, width)
    }

    /// Canvas coordinates grow upwards, the cross axis grows downwards.
    fn canvas_point(&self, point: Point) -> (f64, f64) {
        (point.y, self.cross_extent - point.x)
    }

    fn diagram_point(&self, x: f64, y: f64) -> Point {
        Point::new(self.cross_extent - y, x)
    }

    fn symbol(&self, node: &FrameNode) -> &'a str {
        if node.look.has_hidden_children {
            self.node_closed_symbol
        } else if node.look.has_visible_children {
            self.node_open_symbol
        } else {
            self.node_no_children_symbol
        }
    }

    fn label(&self, node: &FrameNode) -> Line<'static> {
        let style = if node.exiting {
            self.label_style.patch(self.exiting_style)
        } else {
            self.label_style
        };
        Line::from(vec![
            Span::styled(self.symbol(node).to_owned(), style),
            Span::styled(node.key.clone(), style),
        ])
    }
}

/// Points along the horizontal cubic curve from `path.source` to `path.target`.
///
/// Both control points sit halfway along the primary axis.
#[must_use]
pub fn link_horizontal(path: EdgePath, segments: usize) -> Vec<Point> {
    let segments = segments.max(1);
    let EdgePath { source, target } = path;
    let middle = (source.y + target.y) / 2.0;
    let first = Point::new(source.x, middle);
    let second = Point::new(target.x, middle);
    (0..=segments)
        .map(|step| {
            #[allow(clippy::cast_precision_loss)]
            let t = step as f64 / segments as f64;
            let u = 1.0 - t;
            let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
            Point::new(
                d.mul_add(target.x, c.mul_add(second.x, a.mul_add(source.x, b * first.x))),
                d.mul_add(target.y, c.mul_add(second.y, a.mul_add(source.y, b * first.y))),
            )
        })
        .collect()
}

impl Widget for TreeDiagram<'_> {
    fn render(self, full_area: Rect, buf: &mut Buffer) {
        buf.set_style(full_area, self.style);

        // Get the inner area inside a possible block, otherwise use the full area
        let area = self.block.as_ref().map_or(full_area, |block| {
            let inner_area = block.inner(full_area);
            block.clone().render(full_area, buf);
            inner_area
        });

        if area.width < 1 || area.height < 1 {
            return;
        }

        let edges = self
            .frame
            .edges
            .iter()
            .map(|edge| {
                let points = link_horizontal(edge.path, LINK_SEGMENTS);
                points
                    .windows(2)
                    .map(|pair| {
                        let (x1, y1) = self.canvas_point(pair[0]);
                        let (x2, y2) = self.canvas_point(pair[1]);
                        Segment {
                            x1,
                            y1,
                            x2,
                            y2,
                            color: self.edge_color,
                        }
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        let (cell_width, _) = self.cell_size(area);
        let nodes = self
            .frame
            .nodes
            .iter()
            .map(|node| {
                let (x, y) = self.canvas_point(node.position);
                let (left, bottom) = node.look.shape.offset();
                let rectangle = Rectangle {
                    x: x + left,
                    y: y + bottom,
                    width: node.look.shape.width,
                    height: node.look.shape.height,
                    color: if node.exiting {
                        self.exiting_style.fg.unwrap_or(self.node_color)
                    } else {
                        self.node_color
                    },
                };
                let (start, _) = self.label_span(node, cell_width);
                (rectangle, start, y, self.label(node))
            })
            .collect::<Vec<_>>();

        let (x_bounds, y_bounds) = self.bounds();
        Canvas::default()
            .marker(self.marker)
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(|ctx| {
                for segment in edges.iter().flatten() {
                    ctx.draw(segment);
                }
                ctx.layer();
                for (rectangle, x, y, label) in &nodes {
                    ctx.draw(rectangle);
                    ctx.print(*x, *y, label.clone());
                }
            })
            .render(area, buf);
    }
}
