/*! Seams to the outside world: where the data comes from, how labels are measured and how transitions are drawn. */

use std::path::PathBuf;

use serde_json::Value;
use unicode_width::UnicodeWidthStr;

use crate::error::LoadError;
use crate::reconcile::{Changes, EdgeTransition, NodeTransition};

/// Draws or animates the transitions of a render pass.
///
/// Every item comes with its identity key, where it starts and where it ends.
/// Clicks on a node should be turned into [`Command::Toggle`](crate::Command::Toggle) with its key.
pub trait RenderAdapter {
    fn render_nodes(&mut self, nodes: &Changes<NodeTransition>);
    fn render_edges(&mut self, edges: &Changes<EdgeTransition>);
}

/// Measures the rendered size of a label along the primary axis.
pub trait TextMeasurer {
    fn measure(&self, label: &str) -> f64;
}

/// Supplies the raw payload of a session once.
pub trait DataSource {
    /// # Errors
    ///
    /// Errors when the payload can not be produced.
    fn fetch(&mut self) -> Result<Value, LoadError>;
}

/// Measures labels by their terminal column width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnicodeWidthMeasurer {
    units_per_column: f64,
}

impl Default for UnicodeWidthMeasurer {
    fn default() -> Self {
        Self {
            units_per_column: 8.0,
        }
    }
}

impl UnicodeWidthMeasurer {
    /// Diagram units a single terminal column stands for.
    #[must_use]
    pub const fn units_per_column(mut self, units: f64) -> Self {
        self.units_per_column = units;
        self
    }
}

impl TextMeasurer for UnicodeWidthMeasurer {
    #[allow(clippy::cast_precision_loss)]
    fn measure(&self, label: &str) -> f64 {
        label.width() as f64 * self.units_per_column
    }
}

/// A JSON file read and parsed on fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataSource for JsonFile {
    fn fetch(&mut self) -> Result<Value, LoadError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// An in-memory payload.
impl DataSource for Value {
    fn fetch(&mut self) -> Result<Value, LoadError> {
        Ok(self.clone())
    }
}

#[test]
fn unicode_width_counts_columns() {
    let measurer = UnicodeWidthMeasurer::default().units_per_column(1.0);
    assert!((measurer.measure("Juego") - 5.0).abs() < f64::EPSILON);
    // wide glyphs take two columns
    assert!((measurer.measure("遊び") - 4.0).abs() < f64::EPSILON);
}

#[test]
fn missing_file_is_an_io_error() {
    let mut source = JsonFile::new("/nonexistent/tree.json");
    assert!(matches!(source.fetch(), Err(LoadError::Io { .. })));
}

#[test]
fn invalid_file_is_a_json_error() {
    let path = std::env::temp_dir().join("tui-tree-diagram-invalid.json");
    std::fs::write(&path, "[{ \"valor\": ").unwrap();
    let mut source = JsonFile::new(&path);
    assert!(matches!(source.fetch(), Err(LoadError::Json(_))));
    std::fs::remove_file(path).unwrap();
}
