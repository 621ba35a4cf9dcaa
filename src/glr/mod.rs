//! Component F: the GLR driver and its graph-structured stack.

pub mod gss;
pub mod parser;

pub use gss::{Gss, GssEdge, GssNode};
pub use parser::GlrParser;
