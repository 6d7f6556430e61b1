#![forbid(unsafe_code)]

//! The demo page and its script.
//!
//! Four boxes share one stack:
//!
//! 1. a tab set whose panes are 150, 200 and 100 tall
//! 2. a fixed card
//! 3. a tab set whose first pane holds another tab set
//! 4. a second card
//!
//! Every tab set carries a one-line header, so its height is the header
//! plus the active pane.

use std::fmt;
use std::rc::Rc;

use autostack_core::{BoxPosition, NodeId};
use autostack_runtime::StackConfig;
use autostack_web::{Document, LayoutSnapshot, MountError, SettleError, StackProgram};
use serde::Serialize;

/// A block with a fixed height.
pub fn fixed_block(doc: &Document, height: f64, text: &str) -> NodeId {
    let node = doc.create_element();
    doc.set_style(node, "height", format!("{height}px"));
    doc.set_text(node, text);
    node
}

/// Header line plus panes, one visible at a time.
#[derive(Debug, Clone)]
pub struct TabSet {
    root: NodeId,
    header: NodeId,
    panes: Vec<NodeId>,
    active: usize,
}

impl TabSet {
    /// Build a tab set showing the first pane.
    pub fn new(doc: &Document, panes: Vec<NodeId>) -> Self {
        let root = doc.create_element();
        let header = doc.create_element();
        doc.append_child(root, header);
        for pane in &panes {
            doc.append_child(root, *pane);
        }
        let mut tabs = Self {
            root,
            header,
            panes,
            active: usize::MAX,
        };
        tabs.select(doc, 0);
        tabs
    }

    /// The tab set's outer node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Index of the visible pane.
    #[must_use]
    pub fn active(&self) -> usize {
        self.active
    }

    /// Show pane `index`. Returns `false` if it is out of range or already shown.
    pub fn select(&mut self, doc: &Document, index: usize) -> bool {
        if index >= self.panes.len() || index == self.active {
            return false;
        }
        for (i, pane) in self.panes.iter().enumerate() {
            if i == index {
                doc.remove_style(*pane, "display");
            } else {
                doc.set_style(*pane, "display", "none");
            }
        }
        let titles: Vec<String> = (0..self.panes.len())
            .map(|i| {
                if i == index {
                    format!("[Tab {}]", i + 1)
                } else {
                    format!("Tab {}", i + 1)
                }
            })
            .collect();
        doc.set_text(self.header, titles.join(" | "));
        self.active = index;
        true
    }
}

/// One scripted host action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Mount and settle.
    Initial,
    /// Switch the first tab set.
    SelectOuter(usize),
    /// Switch the tab set nested in the third box.
    SelectNested(usize),
    /// Switch the third box's tab set.
    SelectGallery(usize),
    /// Resize the viewport.
    Resize(f64, f64),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::SelectOuter(i) => write!(f, "outer tab {}", i + 1),
            Self::SelectNested(i) => write!(f, "nested tab {}", i + 1),
            Self::SelectGallery(i) => write!(f, "gallery tab {}", i + 1),
            Self::Resize(w, h) => write!(f, "resize {w}x{h}"),
        }
    }
}

/// The walkthrough the demo performs.
pub const SCRIPT: &[Action] = &[
    Action::Initial,
    Action::SelectOuter(1),
    Action::SelectNested(1),
    Action::SelectGallery(1),
    Action::SelectOuter(2),
    Action::Resize(480.0, 800.0),
];

/// Result of one scripted action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionRecord {
    /// What was done.
    pub action: String,
    /// Steps taken to settle afterwards.
    pub steps: usize,
    /// Layout once settled.
    pub snapshot: LayoutSnapshot,
}

impl ActionRecord {
    /// Offsets in stack order.
    #[must_use]
    pub fn tops(&self) -> Vec<f64> {
        self.snapshot.boxes.iter().map(|b| b.position.top).collect()
    }
}

/// Error raised while running the demo.
#[derive(Debug)]
pub enum DemoError {
    /// The stack could not be mounted.
    Mount(MountError),
    /// The stack failed to settle after an action.
    Settle(SettleError),
    /// A snapshot could not be encoded.
    Json(serde_json::Error),
}

impl fmt::Display for DemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mount(err) => write!(f, "mount failed: {err}"),
            Self::Settle(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "snapshot encoding failed: {err}"),
        }
    }
}

impl std::error::Error for DemoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Mount(err) => Some(err),
            Self::Settle(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<MountError> for DemoError {
    fn from(err: MountError) -> Self {
        Self::Mount(err)
    }
}

impl From<SettleError> for DemoError {
    fn from(err: SettleError) -> Self {
        Self::Settle(err)
    }
}

impl From<serde_json::Error> for DemoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// The demo document with its stack mounted.
pub struct DemoPage {
    doc: Rc<Document>,
    program: StackProgram,
    outer: TabSet,
    gallery: TabSet,
    nested: TabSet,
}

impl DemoPage {
    /// Build the page and mount the stack into `config.container`.
    pub fn build(viewport: (f64, f64), config: StackConfig) -> Result<Self, MountError> {
        let doc = Rc::new(Document::new(viewport.0, viewport.1));
        doc.create_container(config.container.clone());

        let outer = TabSet::new(
            &doc,
            vec![
                fixed_block(&doc, 150.0, "Overview"),
                fixed_block(&doc, 200.0, "Details"),
                fixed_block(&doc, 100.0, "Notes"),
            ],
        );
        let card = fixed_block(&doc, 120.0, "Card");
        let nested = TabSet::new(
            &doc,
            vec![
                fixed_block(&doc, 80.0, "Inner one"),
                fixed_block(&doc, 60.0, "Inner two"),
            ],
        );
        let nested_pane = doc.create_element();
        doc.append_child(nested_pane, nested.root());
        let gallery = TabSet::new(&doc, vec![nested_pane, fixed_block(&doc, 90.0, "Plain")]);
        let footer = fixed_block(&doc, 60.0, "Second card");

        let program = StackProgram::mount(
            doc.clone(),
            config,
            [outer.root(), card, gallery.root(), footer],
        )?;
        Ok(Self {
            doc,
            program,
            outer,
            gallery,
            nested,
        })
    }

    /// Perform `action` on the document, without settling.
    pub fn apply(&mut self, action: Action) {
        let doc = &self.doc;
        match action {
            Action::Initial => {}
            Action::SelectOuter(i) => {
                self.outer.select(doc, i);
            }
            Action::SelectNested(i) => {
                self.nested.select(doc, i);
            }
            Action::SelectGallery(i) => {
                self.gallery.select(doc, i);
            }
            Action::Resize(w, h) => {
                doc.resize_viewport(w, h);
            }
        }
    }

    /// Perform `action`, settle, and record the layout.
    pub fn perform(&mut self, action: Action) -> Result<ActionRecord, SettleError> {
        self.apply(action);
        let report = self.program.settle()?;
        tracing::info!(
            %action,
            steps = report.steps,
            generation = report.generation,
            "action settled"
        );
        Ok(ActionRecord {
            action: action.to_string(),
            steps: report.steps,
            snapshot: self.program.snapshot(),
        })
    }

    /// Current positions.
    #[must_use]
    pub fn positions(&self) -> Vec<BoxPosition> {
        self.program.positions()
    }
}

/// Render one record as a table row.
#[must_use]
pub fn format_row(record: &ActionRecord) -> String {
    let tops: Vec<String> = record.tops().iter().map(|t| format!("{t:>5}")).collect();
    format!("{:<16} {:>3}  {}", record.action, record.steps, tops.join(" "))
}
