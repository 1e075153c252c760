mod command_input;
mod key_result;
mod label_picker;
mod state_tabs;

pub use command_input::{CommandEvent, CommandInput};
pub use key_result::KeyResult;
pub use label_picker::{LabelPicker, LabelPickerEvent};
pub use state_tabs::draw_state_tabs;
