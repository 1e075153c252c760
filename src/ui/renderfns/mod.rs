pub mod header;
pub mod utils;

pub use header::{draw_footer, draw_header};
pub use utils::{label_color, state_color, state_icon, time_since, truncate};
