pub mod toml_loader;

pub use toml_loader::{load_all_seed_files, load_seed_file};
