mod load;
mod migrate;

pub use load::load_state;
pub use migrate::migrate;
