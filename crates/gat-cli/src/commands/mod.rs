pub mod completions;
pub mod episode;
pub mod util;
