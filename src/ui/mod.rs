pub mod metrics;
pub mod render;
pub mod terminal;

pub use render::{
    answer_lines, citation_lines, discovery_lines, framework_lines, mode_banner, plain_text, StyledLine, Tone,
};
pub use terminal::{clear_status, terminal_width, write_lines, write_status, LiveRegion};
