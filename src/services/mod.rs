pub mod pool_loader;
pub mod result_writer;
pub mod sampler;

pub use pool_loader::PoolLoader;
pub use result_writer::ResultWriter;
pub use sampler::{Draw, Sampler};
