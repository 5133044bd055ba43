// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::RateError;
use crate::rates::{BASE_CURRENCY, FetchedRates, Quotation, RateQuote, RateSource, TRACKED_CURRENCIES};
use log::debug;
use rust_decimal::Decimal;
use serde::Deserialize;

pub const NBP_TABLE_A_URL: &str = "https://api.nbp.pl/api/exchangerates/tables/A/?format=json";

#[derive(Debug, Deserialize)]
struct NbpTable {
    #[serde(rename = "effectiveDate")]
    effective_date: String,
    rates: Vec<NbpRate>,
}

#[derive(Debug, Deserialize)]
struct NbpRate {
    code: String,
    mid: Decimal,
}

/// Mid rates from the Polish central bank, quoted in PLN per unit.
pub struct NbpSource {
    client: reqwest::blocking::Client,
    url: String,
    codes: Vec<String>,
}

impl NbpSource {
    pub fn new(client: reqwest::blocking::Client) -> Self {
        Self {
            client,
            url: NBP_TABLE_A_URL.to_string(),
            codes: TRACKED_CURRENCIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl RateSource for NbpSource {
    fn fetch(&self) -> Result<FetchedRates, RateError> {
        let resp = self.client.get(&self.url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RateError::Status(status.as_u16()));
        }
        let body = resp.text()?;
        parse_table(&body, &self.codes)
    }
}

/// Parse an NBP table-A response, keeping only `codes`.
pub fn parse_table(body: &str, codes: &[String]) -> Result<FetchedRates, RateError> {
    let tables: Vec<NbpTable> =
        serde_json::from_str(body).map_err(|e| RateError::Malformed(e.to_string()))?;
    let table = tables
        .into_iter()
        .next()
        .ok_or_else(|| RateError::Malformed("empty table list".into()))?;
    debug!("NBP table effective {}", table.effective_date);

    let quotes: Vec<RateQuote> = table
        .rates
        .into_iter()
        .filter(|r| codes.iter().any(|c| c.eq_ignore_ascii_case(&r.code)))
        .map(|r| RateQuote {
            code: r.code.to_uppercase(),
            rate: r.mid,
        })
        .collect();
    if quotes.is_empty() {
        return Err(RateError::Malformed(
            "none of the tracked currencies were present".into(),
        ));
    }
    Ok(FetchedRates {
        base: BASE_CURRENCY.to_string(),
        quotation: Quotation::BasePerUnit,
        quotes,
    })
}
