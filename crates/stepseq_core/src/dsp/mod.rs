pub mod clock;
pub mod consts;
pub mod seq;
pub mod utils;
