pub mod load;
pub mod types;

pub use load::CONFIG_FILE_NAME;
pub use types::{
    EncoderSettings, FROM_PLACEHOLDER, Location, TO_PLACEHOLDER, TimelapseConfig,
};
