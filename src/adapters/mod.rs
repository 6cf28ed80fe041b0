// Adapters layer: turns external input into domain structures.

pub mod loader;
