mod builds;
mod core;
mod pipelines;

pub use self::core::CircleCiClient;
