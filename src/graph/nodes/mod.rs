// Graph Nodes Module
// Individual node implementations

pub mod generate;
pub mod isolate;
pub mod retrieve;

pub use generate::{GenerateNode, Generation};
pub use retrieve::RetrieveNode;
