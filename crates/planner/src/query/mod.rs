pub mod ast;
pub mod transform;
