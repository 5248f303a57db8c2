//! Pure data-to-display mappings. Nothing in here touches the terminal.

pub mod pagination;
pub mod result;
pub mod table;

pub use pagination::{page_window, pagination_controls, PageControl, PageSlot};
pub use result::{render_outcome, ResultPanel};
pub use table::{LogRow, LogTable};
