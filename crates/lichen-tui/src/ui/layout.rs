// Centralized layout constants so all panes agree on chrome sizes.

/// Width of the resource tree pane.
pub const TREE_WIDTH: u16 = 44;

/// Header height (title + counts summary).
pub const HEADER_HEIGHT: u16 = 1;

/// Footer height (key hints).
pub const FOOTER_HEIGHT: u16 = 1;

/// Status bar height at the very bottom.
pub const STATUSBAR_HEIGHT: u16 = 1;

/// Indent per tree depth level.
pub const TREE_INDENT: usize = 2;
