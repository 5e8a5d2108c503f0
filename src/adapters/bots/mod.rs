//! Concrete bot adapters for the secondary backends.

mod dialog;
mod echo;
mod helpdesk;
mod qna;

pub use dialog::DialogBot;
pub use echo::EchoBot;
pub use helpdesk::{HelpdeskBot, HelpdeskCallback, HelpdeskUiElement};
pub use qna::QnaBot;
