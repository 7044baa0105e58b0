// Block catalog: the closed registry of indicator, condition and action kinds
pub mod builtin;
pub mod kinds;

pub use kinds::{
    ActionKind, ActionRole, ConditionKind, Family, IndicatorKind, KindId, ParseKindError,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Comparison applied by a condition block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    GreaterThan,
    LessThan,
    CrossesAbove,
    CrossesBelow,
}

/// A concrete parameter value held by a block instance
///
/// Serialized untagged so documents carry plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Choice(String),
}

impl ParamValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<&str> {
        match self {
            ParamValue::Choice(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Number(_) => "number",
            ParamValue::Choice(_) => "enum",
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Choice(value.to_string())
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Number(n) => write!(f, "{}", n),
            ParamValue::Choice(s) => write!(f, "{}", s),
        }
    }
}

/// Declared type, default and bounds of one block parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSpec {
    Number {
        default: f64,
        min: Option<f64>,
        max: Option<f64>,
        integer: bool,
    },
    Choice {
        default: &'static str,
        allowed: &'static [&'static str],
    },
    Bool {
        default: bool,
    },
}

/// Why a value does not satisfy its `ParamSpec`
#[derive(Debug, Clone, PartialEq)]
pub enum ParamIssue {
    TypeMismatch { expected: &'static str },
    OutOfRange { min: Option<f64>, max: Option<f64> },
    NotAllowed { allowed: &'static [&'static str] },
}

impl ParamSpec {
    pub fn default_value(&self) -> ParamValue {
        match self {
            ParamSpec::Number { default, .. } => ParamValue::Number(*default),
            ParamSpec::Choice { default, .. } => ParamValue::Choice(default.to_string()),
            ParamSpec::Bool { default } => ParamValue::Bool(*default),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ParamSpec::Number { integer: true, .. } => "integer",
            ParamSpec::Number { .. } => "number",
            ParamSpec::Choice { .. } => "enum",
            ParamSpec::Bool { .. } => "bool",
        }
    }

    /// Check a value against this spec. Numeric bounds are inclusive.
    pub fn check(&self, value: &ParamValue) -> Result<(), ParamIssue> {
        match (self, value) {
            (
                ParamSpec::Number {
                    min, max, integer, ..
                },
                ParamValue::Number(n),
            ) => {
                if *integer && n.is_finite() && n.fract() != 0.0 {
                    return Err(ParamIssue::TypeMismatch {
                        expected: "integer",
                    });
                }
                // NaN fails both comparisons below, so reject it explicitly
                let below = min.is_some_and(|lo| *n < lo);
                let above = max.is_some_and(|hi| *n > hi);
                if n.is_nan() || below || above {
                    return Err(ParamIssue::OutOfRange {
                        min: *min,
                        max: *max,
                    });
                }
                Ok(())
            }
            (ParamSpec::Choice { allowed, .. }, ParamValue::Choice(s)) => {
                if allowed.contains(&s.as_str()) {
                    Ok(())
                } else {
                    Err(ParamIssue::NotAllowed { allowed: *allowed })
                }
            }
            (ParamSpec::Bool { .. }, ParamValue::Bool(_)) => Ok(()),
            (spec, _) => Err(ParamIssue::TypeMismatch {
                expected: spec.type_name(),
            }),
        }
    }
}

/// A named parameter in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: &'static str,
    pub spec: ParamSpec,
}

/// One block kind offered by the catalog
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Indicator {
        id: IndicatorKind,
        name: &'static str,
        parameters: Vec<ParamDecl>,
    },
    Condition {
        id: ConditionKind,
        name: &'static str,
        parameters: Vec<ParamDecl>,
        comparator: Comparator,
    },
    Action {
        id: ActionKind,
        name: &'static str,
        parameters: Vec<ParamDecl>,
    },
}

impl BlockKind {
    pub fn id(&self) -> KindId {
        match self {
            BlockKind::Indicator { id, .. } => KindId::Indicator(*id),
            BlockKind::Condition { id, .. } => KindId::Condition(*id),
            BlockKind::Action { id, .. } => KindId::Action(*id),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Indicator { name, .. }
            | BlockKind::Condition { name, .. }
            | BlockKind::Action { name, .. } => *name,
        }
    }

    pub fn family(&self) -> Family {
        self.id().family()
    }

    /// Declared parameters, in the order they are presented and emitted
    pub fn parameters(&self) -> &[ParamDecl] {
        match self {
            BlockKind::Indicator { parameters, .. }
            | BlockKind::Condition { parameters, .. }
            | BlockKind::Action { parameters, .. } => parameters,
        }
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.parameters()
            .iter()
            .find(|decl| decl.name == name)
            .map(|decl| &decl.spec)
    }

    pub fn comparator(&self) -> Option<Comparator> {
        match self {
            BlockKind::Condition { comparator, .. } => Some(*comparator),
            _ => None,
        }
    }

    /// Materialize every declared parameter at its default
    pub fn default_values(&self) -> BTreeMap<String, ParamValue> {
        self.parameters()
            .iter()
            .map(|decl| (decl.name.to_string(), decl.spec.default_value()))
            .collect()
    }
}

/// Immutable registry of block kinds
#[derive(Debug, Clone)]
pub struct BlockCatalog {
    kinds: Vec<BlockKind>,
}

static BUILTIN: OnceLock<BlockCatalog> = OnceLock::new();

impl BlockCatalog {
    /// The process-wide catalog of every built-in kind
    pub fn builtin() -> &'static BlockCatalog {
        BUILTIN.get_or_init(|| BlockCatalog::from_kinds(builtin::all_kinds()))
    }

    /// Build a catalog from an explicit set of kinds (e.g. a restricted offering)
    pub fn from_kinds(kinds: Vec<BlockKind>) -> Self {
        Self { kinds }
    }

    /// Resolve a wire id such as `"rsi"`; `None` when unknown or not offered
    pub fn lookup(&self, kind_id: &str) -> Option<&BlockKind> {
        let id: KindId = kind_id.parse().ok()?;
        self.find(id)
    }

    pub fn find(&self, id: KindId) -> Option<&BlockKind> {
        self.kinds.iter().find(|kind| kind.id() == id)
    }

    /// Resolve a kind that callers have already established exists.
    ///
    /// # Panics
    /// Panics when the kind is not in this catalog; that is a caller defect.
    pub fn get(&self, id: KindId) -> &BlockKind {
        match self.find(id) {
            Some(kind) => kind,
            None => panic!("block kind `{}` is not in the catalog", id),
        }
    }

    pub fn list(&self, family: Family) -> Vec<&BlockKind> {
        self.kinds
            .iter()
            .filter(|kind| kind.family() == family)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockKind> {
        self.kinds.iter()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_kind() {
        let catalog = BlockCatalog::builtin();
        for id in KindId::all() {
            assert!(catalog.find(id).is_some(), "missing {}", id);
        }
        assert_eq!(catalog.len(), KindId::all().len());
    }

    #[test]
    fn test_lookup_by_wire_id() {
        let catalog = BlockCatalog::builtin();
        let rsi = catalog.lookup("rsi").unwrap();
        assert_eq!(rsi.id(), KindId::Indicator(IndicatorKind::Rsi));
        assert_eq!(rsi.name(), "RSI");
        assert!(catalog.lookup("rsi_fast").is_none());
    }

    #[test]
    fn test_list_by_family() {
        let catalog = BlockCatalog::builtin();
        let actions = catalog.list(Family::Action);
        assert_eq!(actions.len(), ActionKind::ALL.len());
        assert!(actions.iter().all(|k| k.family() == Family::Action));
    }

    #[test]
    fn test_restricted_catalog_hides_kinds() {
        let catalog = BlockCatalog::from_kinds(vec![BlockCatalog::builtin()
            .get(KindId::Action(ActionKind::Buy))
            .clone()]);
        assert!(catalog.lookup("buy").is_some());
        assert!(catalog.lookup("rsi").is_none());
    }

    #[test]
    #[should_panic(expected = "not in the catalog")]
    fn test_get_missing_kind_panics() {
        let catalog = BlockCatalog::from_kinds(Vec::new());
        catalog.get(KindId::Indicator(IndicatorKind::Rsi));
    }

    #[test]
    fn test_condition_kinds_carry_comparator() {
        let catalog = BlockCatalog::builtin();
        for kind in catalog.list(Family::Condition) {
            assert!(kind.comparator().is_some());
            assert!(kind.param("side").is_some(), "{} has no side", kind.id());
        }
        for kind in catalog.list(Family::Indicator) {
            assert!(kind.comparator().is_none());
        }
    }

    #[test]
    fn test_defaults_satisfy_their_own_specs() {
        for kind in BlockCatalog::builtin().iter() {
            for decl in kind.parameters() {
                assert_eq!(
                    decl.spec.check(&decl.spec.default_value()),
                    Ok(()),
                    "{}.{}",
                    kind.id(),
                    decl.name
                );
            }
        }
    }

    #[test]
    fn test_number_check_is_inclusive() {
        let spec = ParamSpec::Number {
            default: 14.0,
            min: Some(5.0),
            max: Some(50.0),
            integer: true,
        };
        assert!(spec.check(&ParamValue::Number(5.0)).is_ok());
        assert!(spec.check(&ParamValue::Number(50.0)).is_ok());
        assert!(matches!(
            spec.check(&ParamValue::Number(51.0)),
            Err(ParamIssue::OutOfRange { .. })
        ));
        assert!(matches!(
            spec.check(&ParamValue::Number(14.5)),
            Err(ParamIssue::TypeMismatch { expected: "integer" })
        ));
        assert!(matches!(
            spec.check(&ParamValue::Number(f64::NAN)),
            Err(ParamIssue::OutOfRange { .. })
        ));
        assert!(matches!(
            spec.check(&ParamValue::Bool(true)),
            Err(ParamIssue::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_choice_check() {
        let spec = ParamSpec::Choice {
            default: "sma",
            allowed: &["sma", "ema"],
        };
        assert!(spec.check(&"ema".into()).is_ok());
        assert!(matches!(
            spec.check(&"wma".into()),
            Err(ParamIssue::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_param_value_json_is_plain_scalar() {
        let values = vec![
            ParamValue::Number(14.0),
            ParamValue::Choice("ema".into()),
            ParamValue::Bool(true),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[14.0,"ema",true]"#);
        let back: Vec<ParamValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }
}
