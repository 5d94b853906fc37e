pub mod autofill;
pub mod config;
pub mod design;
pub mod error;
pub mod history;
pub mod image;
pub mod llm;
pub mod pipeline;
pub mod poll;
pub mod terminal;
