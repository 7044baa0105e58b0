use super::Comparator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three block families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Indicator,
    Condition,
    Action,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Family::Indicator => "indicator",
            Family::Condition => "condition",
            Family::Action => "action",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Family {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "indicator" => Ok(Family::Indicator),
            "condition" => Ok(Family::Condition),
            "action" => Ok(Family::Action),
            other => Err(ParseKindError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown block kind: {0}")]
pub struct ParseKindError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorKind {
    Rsi,
    Macd,
    BollingerBands,
    MovingAverage,
    Stochastic,
    Cci,
    Atr,
    VolumeMa,
    Fibonacci,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 9] = [
        IndicatorKind::Rsi,
        IndicatorKind::Macd,
        IndicatorKind::BollingerBands,
        IndicatorKind::MovingAverage,
        IndicatorKind::Stochastic,
        IndicatorKind::Cci,
        IndicatorKind::Atr,
        IndicatorKind::VolumeMa,
        IndicatorKind::Fibonacci,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IndicatorKind::Rsi => "rsi",
            IndicatorKind::Macd => "macd",
            IndicatorKind::BollingerBands => "bollinger_bands",
            IndicatorKind::MovingAverage => "moving_average",
            IndicatorKind::Stochastic => "stochastic",
            IndicatorKind::Cci => "cci",
            IndicatorKind::Atr => "atr",
            IndicatorKind::VolumeMa => "volume_ma",
            IndicatorKind::Fibonacci => "fibonacci",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConditionKind {
    LessThan,
    GreaterThan,
    CrossesAbove,
    CrossesBelow,
    RsiOversold,
    RsiOverbought,
    GoldenCross,
    DeathCross,
    BollingerLower,
    BollingerUpper,
    VolumeSpike,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 11] = [
        ConditionKind::LessThan,
        ConditionKind::GreaterThan,
        ConditionKind::CrossesAbove,
        ConditionKind::CrossesBelow,
        ConditionKind::RsiOversold,
        ConditionKind::RsiOverbought,
        ConditionKind::GoldenCross,
        ConditionKind::DeathCross,
        ConditionKind::BollingerLower,
        ConditionKind::BollingerUpper,
        ConditionKind::VolumeSpike,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConditionKind::LessThan => "less_than",
            ConditionKind::GreaterThan => "greater_than",
            ConditionKind::CrossesAbove => "crosses_above",
            ConditionKind::CrossesBelow => "crosses_below",
            ConditionKind::RsiOversold => "rsi_oversold",
            ConditionKind::RsiOverbought => "rsi_overbought",
            ConditionKind::GoldenCross => "golden_cross",
            ConditionKind::DeathCross => "death_cross",
            ConditionKind::BollingerLower => "bollinger_lower",
            ConditionKind::BollingerUpper => "bollinger_upper",
            ConditionKind::VolumeSpike => "volume_spike",
        }
    }

    /// Comparison this condition performs; fixed per kind
    pub fn comparator(self) -> Comparator {
        match self {
            ConditionKind::LessThan
            | ConditionKind::RsiOversold
            | ConditionKind::BollingerLower => Comparator::LessThan,
            ConditionKind::GreaterThan
            | ConditionKind::RsiOverbought
            | ConditionKind::BollingerUpper
            | ConditionKind::VolumeSpike => Comparator::GreaterThan,
            ConditionKind::CrossesAbove | ConditionKind::GoldenCross => Comparator::CrossesAbove,
            ConditionKind::CrossesBelow | ConditionKind::DeathCross => Comparator::CrossesBelow,
        }
    }
}

/// When an action block runs inside the generated check/act cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionRole {
    /// Runs on a BUY decision
    Entry,
    /// Runs on a SELL decision
    Exit,
    /// Runs every cycle while a position is open
    Protective,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKind {
    Buy,
    Sell,
    StopLoss,
    TakeProfit,
    TrailingStop,
    Dca,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Buy,
        ActionKind::Sell,
        ActionKind::StopLoss,
        ActionKind::TakeProfit,
        ActionKind::TrailingStop,
        ActionKind::Dca,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Buy => "buy",
            ActionKind::Sell => "sell",
            ActionKind::StopLoss => "stop_loss",
            ActionKind::TakeProfit => "take_profit",
            ActionKind::TrailingStop => "trailing_stop",
            ActionKind::Dca => "dca",
        }
    }

    pub fn role(self) -> ActionRole {
        match self {
            ActionKind::Buy | ActionKind::Dca => ActionRole::Entry,
            ActionKind::Sell => ActionRole::Exit,
            ActionKind::StopLoss | ActionKind::TakeProfit | ActionKind::TrailingStop => {
                ActionRole::Protective
            }
        }
    }
}

/// Identifier of a block kind, partitioned by family.
///
/// On the wire it is the bare snake_case id (`"rsi"`, `"less_than"`, `"buy"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KindId {
    Indicator(IndicatorKind),
    Condition(ConditionKind),
    Action(ActionKind),
}

impl KindId {
    pub fn as_str(self) -> &'static str {
        match self {
            KindId::Indicator(kind) => kind.as_str(),
            KindId::Condition(kind) => kind.as_str(),
            KindId::Action(kind) => kind.as_str(),
        }
    }

    pub fn family(self) -> Family {
        match self {
            KindId::Indicator(_) => Family::Indicator,
            KindId::Condition(_) => Family::Condition,
            KindId::Action(_) => Family::Action,
        }
    }

    pub fn all() -> Vec<KindId> {
        IndicatorKind::ALL
            .into_iter()
            .map(KindId::Indicator)
            .chain(ConditionKind::ALL.into_iter().map(KindId::Condition))
            .chain(ActionKind::ALL.into_iter().map(KindId::Action))
            .collect()
    }
}

impl fmt::Display for KindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for KindId {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KindId::all()
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| ParseKindError(s.to_string()))
    }
}

impl TryFrom<String> for KindId {
    type Error = ParseKindError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KindId> for String {
    fn from(id: KindId) -> Self {
        id.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_wire_ids_are_unique() {
        let ids: HashSet<&str> = KindId::all().into_iter().map(KindId::as_str).collect();
        assert_eq!(ids.len(), KindId::all().len());
    }

    #[test]
    fn test_parse_roundtrip() {
        for id in KindId::all() {
            assert_eq!(id.as_str().parse::<KindId>(), Ok(id));
        }
        assert_eq!(
            "RSI".parse::<KindId>(),
            Err(ParseKindError("RSI".to_string()))
        );
    }

    #[test]
    fn test_serde_uses_bare_id() {
        let id = KindId::Condition(ConditionKind::CrossesAbove);
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""crosses_above""#);
        let parsed: KindId = serde_json::from_str(r#""trailing_stop""#).unwrap();
        assert_eq!(parsed, KindId::Action(ActionKind::TrailingStop));
        assert!(serde_json::from_str::<KindId>(r#""rsi_2""#).is_err());
    }

    #[test]
    fn test_action_roles() {
        assert_eq!(ActionKind::Buy.role(), ActionRole::Entry);
        assert_eq!(ActionKind::Dca.role(), ActionRole::Entry);
        assert_eq!(ActionKind::Sell.role(), ActionRole::Exit);
        assert_eq!(ActionKind::StopLoss.role(), ActionRole::Protective);
    }
}
