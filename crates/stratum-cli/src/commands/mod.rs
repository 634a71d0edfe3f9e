pub mod migrate;
pub mod plan;
pub mod version;
