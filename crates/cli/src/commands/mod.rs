pub mod migrate;
pub mod owner;
