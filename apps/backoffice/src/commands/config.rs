//! # Config Commands
//!
//! The part of the configuration the frontend needs to render prices.

use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    pub tax_rate_bps: u32,
    pub exchange_rate_hundredths: u32,
    pub currency_code: String,
    pub local_currency_code: String,
}

pub fn get_config(state: &AppState) -> PublicConfig {
    let config = &state.config;
    PublicConfig {
        tax_rate_bps: config.tax_rate_bps,
        exchange_rate_hundredths: config.exchange_rate_hundredths,
        currency_code: config.currency_code.clone(),
        local_currency_code: config.local_currency_code.clone(),
    }
}
