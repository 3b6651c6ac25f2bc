//! Minimal render tree exchanged between components and the page shell.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

/// Animation applied to a placeholder while its section is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseStyle {
    Static,
    #[default]
    Pulse,
    Shimmer,
}

impl PulseStyle {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            PulseStyle::Static => "static",
            PulseStyle::Pulse => "pulse",
            PulseStyle::Shimmer => "shimmer",
        }
    }
}

/// Fallback shown while a section is pending.
///
/// The footprint should match the eventual content so the page does not
/// shift when the content lands. `width: None` means full container width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderSpec {
    #[serde(default)]
    pub width: Option<u32>,
    pub height: u32,
    #[serde(default)]
    pub pulse: PulseStyle,
}

impl PlaceholderSpec {
    #[must_use]
    pub const fn new(height: u32) -> Self {
        Self {
            width: None,
            height,
            pulse: PulseStyle::Pulse,
        }
    }

    #[must_use]
    pub const fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    #[must_use]
    pub const fn with_pulse(mut self, pulse: PulseStyle) -> Self {
        self.pulse = pulse;
        self
    }
}

impl Default for PlaceholderSpec {
    fn default() -> Self {
        Self::new(200)
    }
}

/// A mounted subtree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    #[default]
    Empty,
    Text(String),
    Element { tag: String, children: Vec<Node> },
    Placeholder(PlaceholderSpec),
}

impl Node {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    #[must_use]
    pub fn element(tag: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Element {
            tag: tag.into(),
            children,
        }
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Node::Placeholder(_))
    }

    /// Deterministic indented text rendering, one node per line.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out, 0);
        out
    }

    fn write_text(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        match self {
            Node::Empty => {}
            Node::Text(text) => {
                let _ = writeln!(out, "{indent}{text}");
            }
            Node::Element { tag, children } => {
                let _ = writeln!(out, "{indent}<{tag}>");
                for child in children {
                    child.write_text(out, depth + 1);
                }
            }
            Node::Placeholder(spec) => {
                let _ = match spec.width {
                    Some(width) => writeln!(
                        out,
                        "{indent}[placeholder {width}x{} {}]",
                        spec.height,
                        spec.pulse.label()
                    ),
                    None => writeln!(
                        out,
                        "{indent}[placeholder {}px {}]",
                        spec.height,
                        spec.pulse.label()
                    ),
                };
            }
        }
    }
}
