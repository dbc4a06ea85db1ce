pub mod cache;
pub mod fallback;
pub mod normalizer;
pub mod providers;
pub mod transport;
