pub mod registry;
pub mod vector;
