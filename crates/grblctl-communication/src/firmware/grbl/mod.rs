//! GRBL protocol details

pub mod banner;
pub mod error_decoder;

pub use banner::ResetBanner;
pub use error_decoder::{
    decode_alarm, decode_error, describe_response, is_error_response, is_ok_response,
};
