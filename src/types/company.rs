use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Company fundamentals for a single symbol.
///
/// Every attribute is optional because no provider fills all of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
    pub enterprise_value: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub payout_ratio: Option<f64>,
    pub beta: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub float_shares: Option<f64>,
    pub week_52_high: Option<f64>,
    pub week_52_low: Option<f64>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub employees: Option<i64>,
    pub updated_at: Option<DateTime<Utc>>,
}

macro_rules! merge_fields {
    ($target:ident, $source:ident, $($field:ident),+ $(,)?) => {
        $(
            if $source.$field.is_some() {
                $target.$field = $source.$field;
            }
        )+
    };
}

impl CompanyInfo {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    /// Overwrite fields with the non-null values of `newer`.
    ///
    /// Fields absent from `newer` keep their current value.
    pub fn merge(&mut self, newer: CompanyInfo) {
        merge_fields!(
            self,
            newer,
            name,
            sector,
            industry,
            market_cap,
            enterprise_value,
            pe_ratio,
            pb_ratio,
            dividend_yield,
            payout_ratio,
            beta,
            shares_outstanding,
            float_shares,
            week_52_high,
            week_52_low,
            currency,
            exchange,
            description,
            website,
            employees,
            updated_at,
        );
    }

    /// Returns true if no attribute besides the symbol and timestamp is set.
    pub fn is_empty(&self) -> bool {
        let mut bare = self.clone();
        bare.updated_at = None;
        bare == CompanyInfo::new(self.symbol.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overwrites_non_null_only() {
        let mut stored = CompanyInfo::new("AFI.AX");
        stored.name = Some("Australian Foundation Investment Company".to_string());
        stored.sector = Some("Financial Services".to_string());
        stored.pe_ratio = Some(25.0);

        let mut update = CompanyInfo::new("AFI.AX");
        update.pe_ratio = Some(27.5);
        update.market_cap = Some(9.1e9);

        stored.merge(update);

        assert_eq!(
            stored.name.as_deref(),
            Some("Australian Foundation Investment Company")
        );
        assert_eq!(stored.sector.as_deref(), Some("Financial Services"));
        assert_eq!(stored.pe_ratio, Some(27.5));
        assert_eq!(stored.market_cap, Some(9.1e9));
    }

    #[test]
    fn test_merge_keeps_symbol() {
        let mut stored = CompanyInfo::new("AFI.AX");
        stored.merge(CompanyInfo::new("OTHER"));
        assert_eq!(stored.symbol, "AFI.AX");
    }

    #[test]
    fn test_is_empty() {
        let mut info = CompanyInfo::new("CBA.AX");
        assert!(info.is_empty());
        info.updated_at = Some(Utc::now());
        assert!(info.is_empty());
        info.beta = Some(0.8);
        assert!(!info.is_empty());
    }

    #[test]
    fn test_serialization_camel_case() {
        let mut info = CompanyInfo::new("AFI.AX");
        info.market_cap = Some(1.0);
        info.week_52_high = Some(7.5);
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"marketCap\":1.0"));
        assert!(json.contains("\"week52High\":7.5"));
    }
}
