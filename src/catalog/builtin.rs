use super::{ActionKind, BlockKind, ConditionKind, IndicatorKind, ParamDecl, ParamSpec};

const SIDES: &[&str] = &["buy", "sell"];
const MA_TYPES: &[&str] = &["sma", "ema"];
const FIB_LEVELS: &[&str] = &["standard", "extended"];
const ORDER_TYPES: &[&str] = &["market", "limit"];

/// Series a threshold condition may read
pub const OPERANDS: &[&str] = &[
    "rsi",
    "stochastic_k",
    "cci",
    "price",
    "volume_ratio",
    "macd_histogram",
    "atr",
];

/// Series that can cross a reference line
pub const CROSS_SERIES: &[&str] = &["macd", "ma_short", "stochastic_k", "price"];

pub const CROSS_REFERENCES: &[&str] = &[
    "macd_signal",
    "ma_long",
    "stochastic_d",
    "bollinger_upper",
    "bollinger_middle",
    "bollinger_lower",
];

fn int(name: &'static str, default: f64, min: f64, max: f64) -> ParamDecl {
    ParamDecl {
        name,
        spec: ParamSpec::Number {
            default,
            min: Some(min),
            max: Some(max),
            integer: true,
        },
    }
}

fn num(name: &'static str, default: f64, min: f64, max: f64) -> ParamDecl {
    ParamDecl {
        name,
        spec: ParamSpec::Number {
            default,
            min: Some(min),
            max: Some(max),
            integer: false,
        },
    }
}

fn choice(name: &'static str, default: &'static str, allowed: &'static [&'static str]) -> ParamDecl {
    ParamDecl {
        name,
        spec: ParamSpec::Choice { default, allowed },
    }
}

fn flag(name: &'static str, default: bool) -> ParamDecl {
    ParamDecl {
        name,
        spec: ParamSpec::Bool { default },
    }
}

fn side(default: &'static str) -> ParamDecl {
    choice("side", default, SIDES)
}

fn indicator(id: IndicatorKind, name: &'static str, parameters: Vec<ParamDecl>) -> BlockKind {
    BlockKind::Indicator {
        id,
        name,
        parameters,
    }
}

fn condition(id: ConditionKind, name: &'static str, parameters: Vec<ParamDecl>) -> BlockKind {
    BlockKind::Condition {
        id,
        name,
        parameters,
        comparator: id.comparator(),
    }
}

fn action(id: ActionKind, name: &'static str, parameters: Vec<ParamDecl>) -> BlockKind {
    BlockKind::Action {
        id,
        name,
        parameters,
    }
}

/// Every built-in kind. Ranges mirror the strategy builder form.
pub fn all_kinds() -> Vec<BlockKind> {
    vec![
        // Indicators
        indicator(IndicatorKind::Rsi, "RSI", vec![int("period", 14.0, 5.0, 50.0)]),
        indicator(
            IndicatorKind::Macd,
            "MACD",
            vec![
                int("fast_period", 12.0, 5.0, 20.0),
                int("slow_period", 26.0, 20.0, 50.0),
                int("signal_period", 9.0, 5.0, 20.0),
            ],
        ),
        indicator(
            IndicatorKind::BollingerBands,
            "Bollinger Bands",
            vec![
                int("period", 20.0, 10.0, 50.0),
                num("std_dev", 2.0, 1.0, 5.0),
            ],
        ),
        indicator(
            IndicatorKind::MovingAverage,
            "Moving Average",
            vec![
                int("short_period", 10.0, 5.0, 50.0),
                int("long_period", 50.0, 20.0, 200.0),
                choice("ma_type", "sma", MA_TYPES),
            ],
        ),
        indicator(
            IndicatorKind::Stochastic,
            "Stochastic",
            vec![int("k_period", 14.0, 5.0, 30.0), int("d_period", 3.0, 3.0, 10.0)],
        ),
        indicator(IndicatorKind::Cci, "CCI", vec![int("period", 20.0, 10.0, 50.0)]),
        indicator(IndicatorKind::Atr, "ATR", vec![int("period", 14.0, 5.0, 30.0)]),
        indicator(
            IndicatorKind::VolumeMa,
            "Volume MA",
            vec![int("period", 20.0, 5.0, 50.0)],
        ),
        indicator(
            IndicatorKind::Fibonacci,
            "Fibonacci Retracement",
            vec![choice("levels", "standard", FIB_LEVELS)],
        ),
        // Conditions
        condition(
            ConditionKind::LessThan,
            "Less Than",
            vec![
                choice("operand", "rsi", OPERANDS),
                num("value", 30.0, -1000.0, 1_000_000.0),
                side("buy"),
            ],
        ),
        condition(
            ConditionKind::GreaterThan,
            "Greater Than",
            vec![
                choice("operand", "rsi", OPERANDS),
                num("value", 70.0, -1000.0, 1_000_000.0),
                side("sell"),
            ],
        ),
        condition(
            ConditionKind::CrossesAbove,
            "Crosses Above",
            vec![
                choice("series", "macd", CROSS_SERIES),
                choice("reference", "macd_signal", CROSS_REFERENCES),
                side("buy"),
            ],
        ),
        condition(
            ConditionKind::CrossesBelow,
            "Crosses Below",
            vec![
                choice("series", "macd", CROSS_SERIES),
                choice("reference", "macd_signal", CROSS_REFERENCES),
                side("sell"),
            ],
        ),
        condition(
            ConditionKind::RsiOversold,
            "RSI Oversold",
            vec![int("threshold", 30.0, 10.0, 40.0), side("buy")],
        ),
        condition(
            ConditionKind::RsiOverbought,
            "RSI Overbought",
            vec![int("threshold", 70.0, 60.0, 90.0), side("sell")],
        ),
        condition(ConditionKind::GoldenCross, "Golden Cross", vec![side("buy")]),
        condition(ConditionKind::DeathCross, "Death Cross", vec![side("sell")]),
        condition(ConditionKind::BollingerLower, "Bollinger Lower Band", vec![side("buy")]),
        condition(ConditionKind::BollingerUpper, "Bollinger Upper Band", vec![side("sell")]),
        condition(
            ConditionKind::VolumeSpike,
            "Volume Spike",
            vec![num("multiplier", 2.0, 1.0, 5.0), side("buy")],
        ),
        // Actions
        action(
            ActionKind::Buy,
            "Buy",
            vec![choice("order_type", "market", ORDER_TYPES)],
        ),
        action(
            ActionKind::Sell,
            "Sell",
            vec![
                choice("order_type", "market", ORDER_TYPES),
                num("portion_pct", 100.0, 1.0, 100.0),
            ],
        ),
        action(ActionKind::StopLoss, "Stop Loss", vec![flag("trailing", false)]),
        action(ActionKind::TakeProfit, "Take Profit", vec![flag("partial", false)]),
        action(
            ActionKind::TrailingStop,
            "Trailing Stop",
            vec![num("trail_pct", 3.0, 0.5, 20.0)],
        ),
        action(
            ActionKind::Dca,
            "Dollar Cost Averaging",
            vec![num("step_pct", 10.0, 5.0, 30.0), int("max_entries", 3.0, 1.0, 10.0)],
        ),
    ]
}
