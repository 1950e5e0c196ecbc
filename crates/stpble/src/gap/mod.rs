pub mod advertising;
pub mod constants;
pub mod types;


pub use advertising::{
    parse_ad_structures, AdvConfigPending, AdvertisingController, AdvertisingData, LinkState,
};
pub use constants::*;
pub use types::*;
