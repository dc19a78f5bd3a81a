pub mod format;
pub mod jinja;
pub mod prompting;

pub use format::FormattedPrompt;
pub use jinja::JinjaTemplate;
pub use prompting::{build_prompt, with_system_prompt};
