pub mod app;
pub mod layout;
pub mod panel;
pub mod terminal;
pub mod theme;

pub use app::{App, Focus, TreeRow};
pub use panel::{PanelState, SyncPanel, WorkerBackedPanel};
pub use terminal::{init as init_terminal, restore as restore_terminal, Tui};
