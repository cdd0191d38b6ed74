//! Custom widgets for the TUI

pub mod input_box;
pub mod markdown;
pub mod message_list;
pub mod selector;
pub mod spinner;
pub mod suggestions;

pub use input_box::InputBox;
pub use message_list::{AgentBadge, ChatMessage, MessageList, Role};
pub use selector::{Selector, SelectorItem, SelectorState};
pub use spinner::Spinner;
pub use suggestions::{SuggestionBar, SuggestionState};
