//! Configuration constants for depviz
//!
//! This module contains all configurable constants used throughout the
//! application, including the Graphviz style attributes applied to the
//! generated graph description.

use std::time::Duration;

/// Progress bar configuration
pub mod progress {
    use super::*;

    /// Duration between progress bar updates
    pub const TICK_INTERVAL: Duration = Duration::from_millis(100);
}

/// Graphviz style configuration
pub mod dot {
    /// Brewer color scheme used for node fill colors
    pub const NODE_COLOR_SCHEME_NAME: &str = "set312";

    /// Number of distinct colors in the scheme; fill colors cycle through
    /// 1..=NODE_COLOR_SCHEME_SIZE
    pub const NODE_COLOR_SCHEME_SIZE: usize = 12;

    /// Top-level graph attributes
    pub const GRAPH_STYLES: &[&str] = &["rankdir=LR"];

    /// Base attributes applied to every node
    pub const NODE_STYLES_DEFAULT: &[&str] = &[
        "shape=box",
        "style=filled",
        "colorscheme=set312",
        "fontname=Helvetica",
    ];

    /// Overrides for nodes that participate in a cycle
    pub const NODE_STYLES_CYCLE: &[&str] = &[
        "colorscheme=X11",
        "fillcolor=yellow",
        "color=red",
        "fontcolor=red",
        "penwidth=2",
    ];

    /// Attributes for edges that lie on a cycle
    pub const EDGE_STYLES_CYCLE: &[&str] = &["color=red", "penwidth=2"];

    /// Attributes for edges discovered only through source analysis, with no
    /// runtime manifest declaration
    pub const EDGE_STYLES_NON_PRODUCTION: &[&str] = &["style=dashed"];
}
