//! Surrender value computation against a policy's rate tables

mod surrender;

pub use surrender::{
    compute_gsv,
    compute_ssv,
    compute_net_value,
    surrender_value,
    GsvResult,
    SsvResult,
    NetValue,
};
