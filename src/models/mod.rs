// Strategy definition data model
pub mod template;

pub use template::{store_timestamp, TemplateRecord, TemplateSettings};

use crate::catalog::{KindId, ParamValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Market a strategy is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetMarket {
    Nasdaq,
    Nyse,
    Kospi,
    Kosdaq,
    Crypto,
    Forex,
    Commodity,
}

impl TargetMarket {
    pub const ALL: [TargetMarket; 7] = [
        TargetMarket::Nasdaq,
        TargetMarket::Nyse,
        TargetMarket::Kospi,
        TargetMarket::Kosdaq,
        TargetMarket::Crypto,
        TargetMarket::Forex,
        TargetMarket::Commodity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TargetMarket::Nasdaq => "NASDAQ",
            TargetMarket::Nyse => "NYSE",
            TargetMarket::Kospi => "KOSPI",
            TargetMarket::Kosdaq => "KOSDAQ",
            TargetMarket::Crypto => "CRYPTO",
            TargetMarket::Forex => "FOREX",
            TargetMarket::Commodity => "COMMODITY",
        }
    }
}

impl fmt::Display for TargetMarket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TargetMarket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetMarket::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown target market: {}", s))
    }
}

/// Candle interval the generated strategy polls at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[default]
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
}

impl Timeframe {
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::OneMinute => "1m",
            Timeframe::FiveMinutes => "5m",
            Timeframe::FifteenMinutes => "15m",
            Timeframe::ThirtyMinutes => "30m",
            Timeframe::OneHour => "1h",
            Timeframe::FourHours => "4h",
            Timeframe::OneDay => "1d",
            Timeframe::OneWeek => "1w",
        }
    }

    pub fn seconds(self) -> u64 {
        match self {
            Timeframe::OneMinute => 60,
            Timeframe::FiveMinutes => 5 * 60,
            Timeframe::FifteenMinutes => 15 * 60,
            Timeframe::ThirtyMinutes => 30 * 60,
            Timeframe::OneHour => 60 * 60,
            Timeframe::FourHours => 4 * 60 * 60,
            Timeframe::OneDay => 24 * 60 * 60,
            Timeframe::OneWeek => 7 * 24 * 60 * 60,
        }
    }
}

/// Percent-based risk limits applied by action blocks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSettings {
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub max_position_pct: f64,
}

impl RiskSettings {
    pub const STOP_LOSS_RANGE: (f64, f64) = (1.0, 20.0);
    pub const TAKE_PROFIT_RANGE: (f64, f64) = (5.0, 50.0);
    pub const MAX_POSITION_RANGE: (f64, f64) = (5.0, 50.0);
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            stop_loss_pct: 5.0,
            take_profit_pct: 10.0,
            max_position_pct: 20.0,
        }
    }
}

/// Daily window (local hours, inclusive) in which the strategy may trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingHours {
    pub start: u8,
    pub end: u8,
}

impl Default for TradingHours {
    fn default() -> Self {
        Self { start: 9, end: 17 }
    }
}

/// Session-local identity of a block instance
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A parameterized occurrence of a block kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInstance {
    #[serde(default)]
    pub instance_id: InstanceId,
    pub kind: KindId,
    #[serde(default)]
    pub values: BTreeMap<String, ParamValue>,
}

impl BlockInstance {
    pub fn value(&self, param: &str) -> Option<&ParamValue> {
        self.values.get(param)
    }
}

fn default_paper_trading() -> bool {
    true
}

fn default_initial_balance() -> f64 {
    1_000_000.0
}

/// Unvalidated strategy as edited by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub target_market: TargetMarket,
    #[serde(default)]
    pub timeframe: Timeframe,
    #[serde(default)]
    pub blocks: Vec<BlockInstance>,
    #[serde(default)]
    pub risk: RiskSettings,
    #[serde(default = "default_paper_trading")]
    pub paper_trading: bool,
    #[serde(default = "default_initial_balance")]
    pub initial_balance: f64,
    #[serde(default)]
    pub trading_hours: TradingHours,
}

impl Default for StrategyDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            target_market: TargetMarket::Nasdaq,
            timeframe: Timeframe::default(),
            blocks: Vec::new(),
            risk: RiskSettings::default(),
            paper_trading: default_paper_trading(),
            initial_balance: default_initial_balance(),
            trading_hours: TradingHours::default(),
        }
    }
}

/// A strategy that has passed validation.
///
/// Only `validation::validate` can produce one, so code generation never
/// sees an unchecked draft.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StrategyDefinition {
    draft: StrategyDraft,
}

impl StrategyDefinition {
    pub(crate) fn from_validated(draft: StrategyDraft) -> Self {
        Self { draft }
    }

    pub fn name(&self) -> &str {
        &self.draft.name
    }

    pub fn description(&self) -> &str {
        &self.draft.description
    }

    pub fn target_market(&self) -> TargetMarket {
        self.draft.target_market
    }

    pub fn timeframe(&self) -> Timeframe {
        self.draft.timeframe
    }

    pub fn blocks(&self) -> &[BlockInstance] {
        &self.draft.blocks
    }

    pub fn risk(&self) -> &RiskSettings {
        &self.draft.risk
    }

    pub fn paper_trading(&self) -> bool {
        self.draft.paper_trading
    }

    pub fn initial_balance(&self) -> f64 {
        self.draft.initial_balance
    }

    pub fn trading_hours(&self) -> TradingHours {
        self.draft.trading_hours
    }

    pub fn as_draft(&self) -> &StrategyDraft {
        &self.draft
    }

    pub fn into_draft(self) -> StrategyDraft {
        self.draft
    }
}
