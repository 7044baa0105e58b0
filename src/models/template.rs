use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::{
    BlockInstance, RiskSettings, StrategyDefinition, StrategyDraft, TargetMarket, Timeframe,
    TradingHours,
};
use crate::catalog::{BlockCatalog, Family};

/// Current time at the precision every store backend can round-trip (microseconds)
pub fn store_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Trading settings carried by a persisted template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSettings {
    pub max_trade_amount: f64,
    pub stop_loss_percentage: f64,
    pub take_profit_percentage: f64,
    pub max_position_percentage: f64,
    pub paper_trading: bool,
    pub timeframe: Timeframe,
    pub trading_hours: TradingHours,
}

/// Persisted form of a strategy definition
///
/// Field names follow the shared document schema; the human-readable
/// `indicators` / `conditions` / `actions` lists exist for listing and search,
/// `blocks` carries the full composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    /// Empty until the store assigns one on first save
    #[serde(default)]
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub exchange: TargetMarket,
    #[serde(default)]
    pub indicators: Vec<String>,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    pub settings: TemplateSettings,
    #[serde(default)]
    pub blocks: Vec<BlockInstance>,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TemplateRecord {
    /// Build a record for a validated definition and the code emitted from it
    pub fn from_definition(
        owner_id: &str,
        definition: &StrategyDefinition,
        code: String,
        is_public: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        let catalog = BlockCatalog::builtin();
        let names_for = |family: Family| -> Vec<String> {
            definition
                .blocks()
                .iter()
                .filter(|block| block.kind.family() == family)
                .map(|block| match catalog.find(block.kind) {
                    Some(kind) => kind.name().to_string(),
                    None => block.kind.to_string(),
                })
                .collect()
        };
        let risk = definition.risk();

        Self {
            id: String::new(),
            owner_id: owner_id.to_string(),
            name: definition.name().to_string(),
            description: definition.description().to_string(),
            exchange: definition.target_market(),
            indicators: names_for(Family::Indicator),
            actions: names_for(Family::Action),
            conditions: names_for(Family::Condition),
            settings: TemplateSettings {
                max_trade_amount: definition.initial_balance(),
                stop_loss_percentage: risk.stop_loss_pct,
                take_profit_percentage: risk.take_profit_pct,
                max_position_percentage: risk.max_position_pct,
                paper_trading: definition.paper_trading(),
                timeframe: definition.timeframe(),
                trading_hours: definition.trading_hours(),
            },
            blocks: definition.blocks().to_vec(),
            code,
            is_public,
            created_at,
            updated_at: created_at,
        }
    }

    /// Reconstruct the editable draft this record was saved from
    pub fn to_draft(&self) -> StrategyDraft {
        StrategyDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            target_market: self.exchange,
            timeframe: self.settings.timeframe,
            blocks: self.blocks.clone(),
            risk: RiskSettings {
                stop_loss_pct: self.settings.stop_loss_percentage,
                take_profit_pct: self.settings.take_profit_percentage,
                max_position_pct: self.settings.max_position_percentage,
            },
            paper_trading: self.settings.paper_trading,
            initial_balance: self.settings.max_trade_amount,
            trading_hours: self.settings.trading_hours,
        }
    }

    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    /// Owners always see their records; everyone else only sees public ones
    pub fn is_visible_to(&self, viewer_id: &str) -> bool {
        self.is_public || self.owner_id == viewer_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ActionKind, IndicatorKind, KindId};
    use crate::models::InstanceId;
    use crate::validation::validate;

    fn sample_definition() -> StrategyDefinition {
        let catalog = BlockCatalog::builtin();
        let rsi = catalog.get(KindId::Indicator(IndicatorKind::Rsi));
        let buy = catalog.get(KindId::Action(ActionKind::Buy));
        let draft = StrategyDraft {
            name: "RSI dip".to_string(),
            description: "buy oversold".to_string(),
            target_market: TargetMarket::Crypto,
            blocks: vec![
                BlockInstance {
                    instance_id: InstanceId(1),
                    kind: rsi.id(),
                    values: rsi.default_values(),
                },
                BlockInstance {
                    instance_id: InstanceId(2),
                    kind: buy.id(),
                    values: buy.default_values(),
                },
            ],
            ..StrategyDraft::default()
        };
        validate(catalog, &draft).unwrap()
    }

    #[test]
    fn test_from_definition_fills_listing_fields() {
        let definition = sample_definition();
        let now = store_timestamp();
        let record = TemplateRecord::from_definition("alice", &definition, "code".into(), true, now);

        assert!(!record.is_persisted());
        assert_eq!(record.indicators, vec!["RSI".to_string()]);
        assert_eq!(record.actions, vec!["Buy".to_string()]);
        assert!(record.conditions.is_empty());
        assert_eq!(record.settings.stop_loss_percentage, 5.0);
        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(record.to_draft(), definition.into_draft());
    }

    #[test]
    fn test_document_field_names() {
        let record = TemplateRecord::from_definition(
            "alice",
            &sample_definition(),
            String::new(),
            false,
            store_timestamp(),
        );
        let json = serde_json::to_value(&record).unwrap();
        for key in [
            "id", "ownerId", "name", "description", "exchange", "indicators", "actions",
            "conditions", "settings", "code", "isPublic", "createdAt", "updatedAt",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert!(json["settings"].get("maxTradeAmount").is_some());
        assert!(json["settings"].get("stopLossPercentage").is_some());
        assert!(json["settings"].get("takeProfitPercentage").is_some());
        assert_eq!(json["exchange"], "CRYPTO");
    }

    #[test]
    fn test_visibility() {
        let mut record = TemplateRecord::from_definition(
            "alice",
            &sample_definition(),
            String::new(),
            false,
            store_timestamp(),
        );
        assert!(record.is_visible_to("alice"));
        assert!(!record.is_visible_to("bob"));
        record.is_public = true;
        assert!(record.is_visible_to("bob"));
    }
}
