pub mod collector;
pub mod export;
pub mod process;
pub mod provider;
pub mod ranker;
pub mod sampler;
pub mod snapshot;
