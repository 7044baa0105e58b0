// Draft validation
// Every check runs independently and every failure is collected, so callers
// always see the complete set of problems with a draft at once.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::catalog::{BlockCatalog, BlockKind, Family, ParamIssue};
use crate::models::{
    BlockInstance, InstanceId, RiskSettings, StrategyDefinition, StrategyDraft,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    EmptyName,
    EmptyDefinition,
    NoActionBlock,
    DuplicateInstanceId,
    UnknownKind,
    MissingParameter,
    UnknownParameter,
    ParameterTypeMismatch,
    ParameterOutOfRange,
    ParameterNotAllowed,
    RiskOutOfRange,
    InvalidTradingHours,
    InvalidInitialBalance,
}

impl ViolationCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationCode::EmptyName => "EMPTY_NAME",
            ViolationCode::EmptyDefinition => "EMPTY_DEFINITION",
            ViolationCode::NoActionBlock => "NO_ACTION_BLOCK",
            ViolationCode::DuplicateInstanceId => "DUPLICATE_INSTANCE_ID",
            ViolationCode::UnknownKind => "UNKNOWN_KIND",
            ViolationCode::MissingParameter => "MISSING_PARAMETER",
            ViolationCode::UnknownParameter => "UNKNOWN_PARAMETER",
            ViolationCode::ParameterTypeMismatch => "PARAMETER_TYPE_MISMATCH",
            ViolationCode::ParameterOutOfRange => "PARAMETER_OUT_OF_RANGE",
            ViolationCode::ParameterNotAllowed => "PARAMETER_NOT_ALLOWED",
            ViolationCode::RiskOutOfRange => "RISK_OUT_OF_RANGE",
            ViolationCode::InvalidTradingHours => "INVALID_TRADING_HOURS",
            ViolationCode::InvalidInitialBalance => "INVALID_INITIAL_BALANCE",
        }
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One user-correctable problem with a draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub code: ViolationCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<InstanceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl Violation {
    fn new(code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            instance_id: None,
            field: None,
            message: message.into(),
        }
    }

    fn on_instance(mut self, instance_id: InstanceId) -> Self {
        self.instance_id = Some(instance_id);
        self
    }

    fn on_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.code)?;
        if let Some(id) = self.instance_id {
            write!(f, " {}", id)?;
        }
        if let Some(field) = &self.field {
            write!(f, " {}", field)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Check a draft against every structural and range rule.
///
/// Returns the confirmed definition, or every violation found.
pub fn validate(
    catalog: &BlockCatalog,
    draft: &StrategyDraft,
) -> Result<StrategyDefinition, Vec<Violation>> {
    let mut violations = Vec::new();

    check_name(draft, &mut violations);
    check_structure(draft, &mut violations);
    check_instance_ids(draft, &mut violations);
    for block in &draft.blocks {
        match catalog.find(block.kind) {
            Some(kind) => check_parameters(block, kind, &mut violations),
            None => violations.push(
                Violation::new(
                    ViolationCode::UnknownKind,
                    format!("block kind `{}` is not offered by this catalog", block.kind),
                )
                .on_instance(block.instance_id)
                .on_field("kind"),
            ),
        }
    }
    check_risk(&draft.risk, &mut violations);
    check_trading_hours(draft, &mut violations);
    check_initial_balance(draft, &mut violations);

    if violations.is_empty() {
        Ok(StrategyDefinition::from_validated(draft.clone()))
    } else {
        Err(violations)
    }
}

fn check_name(draft: &StrategyDraft, out: &mut Vec<Violation>) {
    if draft.name.trim().is_empty() {
        out.push(
            Violation::new(ViolationCode::EmptyName, "strategy name must not be empty")
                .on_field("name"),
        );
    }
}

fn check_structure(draft: &StrategyDraft, out: &mut Vec<Violation>) {
    if draft.blocks.is_empty() {
        out.push(
            Violation::new(ViolationCode::EmptyDefinition, "strategy has no blocks")
                .on_field("blocks"),
        );
    }
    let has_action = draft
        .blocks
        .iter()
        .any(|block| block.kind.family() == Family::Action);
    if !has_action {
        out.push(
            Violation::new(
                ViolationCode::NoActionBlock,
                "strategy needs at least one action block",
            )
            .on_field("blocks"),
        );
    }
}

fn check_instance_ids(draft: &StrategyDraft, out: &mut Vec<Violation>) {
    let mut counts: BTreeMap<InstanceId, usize> = BTreeMap::new();
    for block in &draft.blocks {
        *counts.entry(block.instance_id).or_default() += 1;
    }
    let mut reported = BTreeSet::new();
    for block in &draft.blocks {
        let count = counts[&block.instance_id];
        if count > 1 && reported.insert(block.instance_id) {
            out.push(
                Violation::new(
                    ViolationCode::DuplicateInstanceId,
                    format!("instance id is used by {} blocks", count),
                )
                .on_instance(block.instance_id),
            );
        }
    }
}

fn check_parameters(block: &BlockInstance, kind: &BlockKind, out: &mut Vec<Violation>) {
    for decl in kind.parameters() {
        let Some(value) = block.values.get(decl.name) else {
            out.push(
                Violation::new(
                    ViolationCode::MissingParameter,
                    format!("{} requires parameter `{}`", kind.name(), decl.name),
                )
                .on_instance(block.instance_id)
                .on_field(decl.name),
            );
            continue;
        };

        let issue = match decl.spec.check(value) {
            Ok(()) => continue,
            Err(issue) => issue,
        };
        let violation = match issue {
            ParamIssue::TypeMismatch { expected } => Violation::new(
                ViolationCode::ParameterTypeMismatch,
                format!("expected {}, got {} `{}`", expected, value.type_name(), value),
            ),
            ParamIssue::OutOfRange { min, max } => Violation::new(
                ViolationCode::ParameterOutOfRange,
                format!("{} is outside {}", value, describe_range(min, max)),
            ),
            ParamIssue::NotAllowed { allowed } => Violation::new(
                ViolationCode::ParameterNotAllowed,
                format!("`{}` is not one of {}", value, allowed.join(", ")),
            ),
        };
        out.push(violation.on_instance(block.instance_id).on_field(decl.name));
    }

    for name in block.values.keys() {
        if kind.param(name).is_none() {
            out.push(
                Violation::new(
                    ViolationCode::UnknownParameter,
                    format!("{} has no parameter `{}`", kind.name(), name),
                )
                .on_instance(block.instance_id)
                .on_field(name.clone()),
            );
        }
    }
}

fn describe_range(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(lo), Some(hi)) => format!("[{}, {}]", lo, hi),
        (Some(lo), None) => format!("[{}, ..)", lo),
        (None, Some(hi)) => format!("(.., {}]", hi),
        (None, None) => "the finite numbers".to_string(),
    }
}

fn check_risk(risk: &RiskSettings, out: &mut Vec<Violation>) {
    let fields = [
        ("risk.stopLossPct", risk.stop_loss_pct, RiskSettings::STOP_LOSS_RANGE),
        ("risk.takeProfitPct", risk.take_profit_pct, RiskSettings::TAKE_PROFIT_RANGE),
        ("risk.maxPositionPct", risk.max_position_pct, RiskSettings::MAX_POSITION_RANGE),
    ];
    for (field, value, (lo, hi)) in fields {
        // written so NaN lands outside the range
        if !(value >= lo && value <= hi) {
            out.push(
                Violation::new(
                    ViolationCode::RiskOutOfRange,
                    format!("{} is outside [{}, {}]", value, lo, hi),
                )
                .on_field(field),
            );
        }
    }
}

fn check_trading_hours(draft: &StrategyDraft, out: &mut Vec<Violation>) {
    let hours = draft.trading_hours;
    for (field, hour) in [("tradingHours.start", hours.start), ("tradingHours.end", hours.end)] {
        if hour > 23 {
            out.push(
                Violation::new(
                    ViolationCode::InvalidTradingHours,
                    format!("hour {} is outside [0, 23]", hour),
                )
                .on_field(field),
            );
        }
    }
}

fn check_initial_balance(draft: &StrategyDraft, out: &mut Vec<Violation>) {
    let balance = draft.initial_balance;
    if !(balance.is_finite() && balance > 0.0) {
        out.push(
            Violation::new(
                ViolationCode::InvalidInitialBalance,
                format!("initial balance must be positive, got {}", balance),
            )
            .on_field("initialBalance"),
        );
    }
}
