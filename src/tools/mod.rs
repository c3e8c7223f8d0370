pub mod builtin;
pub mod registry;
