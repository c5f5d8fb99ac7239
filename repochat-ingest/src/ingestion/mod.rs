pub mod chunking;
pub mod clone;
pub mod code_filter;
pub mod indexing_mode;
pub mod pipeline;
pub mod walker;
