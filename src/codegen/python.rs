// Python emitter
// Produces one self-contained script: a strategy class holding the settings,
// one method per composed block (in composed order), and a check -> act run
// loop. Market data and order routing are hooks the execution runtime fills.

use std::collections::BTreeMap;

use crate::catalog::{
    ActionKind, ActionRole, BlockCatalog, Comparator, ConditionKind, IndicatorKind, KindId,
    ParamValue,
};
use crate::models::{BlockInstance, StrategyDefinition};

const INDENT: &str = "    ";

pub const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY";
pub const API_SECRET_PLACEHOLDER: &str = "YOUR_API_SECRET";

const FIB_STANDARD: &str = "0.236, 0.382, 0.5, 0.618, 0.786";
const FIB_EXTENDED: &str = "0.236, 0.382, 0.5, 0.618, 0.786, 1.0, 1.272, 1.618";

const HELPERS: &str = r##"
    def fetch_market_data(self):
        """Return recent candles as a DataFrame with open, high, low, close and volume columns.

        The execution runtime replaces this hook with its own market-data feed.
        """
        raise NotImplementedError("market data is supplied by the execution runtime")

    def place_order(self, side, quantity, order_type="market", price=None):
        mode = "PAPER" if self.paper_trading else "LIVE"
        print(f"[{mode}] {side.upper()} {quantity:.6f} {self.target_market} @ {price} ({order_type})")
        return {"side": side, "quantity": quantity, "order_type": order_type, "price": price}

    def check_trading_hours(self):
        now = datetime.now()
        seconds = now.hour * 3600 + now.minute * 60 + now.second
        start = self.trading_start * 3600
        end = self.trading_end * 3600
        if start <= end:
            return start <= seconds <= end
        return seconds >= start or seconds <= end

    def _open_position(self, price, order_type="market"):
        quantity = self.balance * self.max_position_pct / 100 / price
        order = self.place_order("buy", quantity, order_type=order_type, price=price)
        self.balance -= quantity * price
        self.position = quantity
        self.entry_price = price
        self.peak_price = price
        self.entries = 1
        return order

    def _record(self, key, value):
        self.values[key] = value

    def _crossed_above(self, series, reference):
        if not self._has_history(series, reference):
            return False
        return (
            self.previous[series] <= self.previous[reference]
            and self.values[series] > self.values[reference]
        )

    def _crossed_below(self, series, reference):
        if not self._has_history(series, reference):
            return False
        return (
            self.previous[series] >= self.previous[reference]
            and self.values[series] < self.values[reference]
        )

    def _has_history(self, *keys):
        return all(key in self.values and key in self.previous for key in keys)

    def _exit_all(self, price, reason):
        quantity = self.position
        order = self.place_order("sell", quantity, price=price)
        order["reason"] = reason
        self.balance += quantity * price
        self._close_position()
        return order

    def _close_position(self):
        self.position = 0.0
        self.entry_price = None
        self.peak_price = None
        self.entries = 0
"##;

/// Line-oriented text builder with Python indentation
struct Script {
    text: String,
}

impl Script {
    fn new() -> Self {
        Self {
            text: String::with_capacity(8 * 1024),
        }
    }

    fn line(&mut self, depth: usize, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..depth {
                self.text.push_str(INDENT);
            }
            self.text.push_str(text);
        }
        self.text.push('\n');
    }

    fn blank(&mut self) {
        self.text.push('\n');
    }

    fn raw(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn finish(self) -> String {
        self.text
    }
}

/// Method names collected during the block pass, wired together in the epilogue
#[derive(Debug, Default)]
struct Wiring {
    indicators: Vec<String>,
    buy_checks: Vec<String>,
    sell_checks: Vec<String>,
    entries: Vec<String>,
    exits: Vec<String>,
    protective: Vec<String>,
}

pub fn emit(definition: &StrategyDefinition) -> String {
    let class = class_name(definition.name());
    let mut script = Script::new();

    preamble(
        &mut script,
        definition.name(),
        definition.target_market().as_str(),
        &class,
    );
    settings(&mut script, definition);
    script.raw(HELPERS);

    let mut wiring = Wiring::default();
    let mut occurrences: BTreeMap<KindId, usize> = BTreeMap::new();

    for block in definition.blocks() {
        let count = occurrences.entry(block.kind).or_insert(0);
        *count += 1;
        let suffix = match *count {
            1 => String::new(),
            n => format!("_{}", n),
        };

        script.blank();
        match block.kind {
            KindId::Indicator(kind) => {
                let method = format!("calculate_{}{}", kind.as_str(), suffix);
                indicator(&mut script, &method, kind, block, &suffix);
                wiring.indicators.push(method);
            }
            KindId::Condition(kind) => {
                let method = format!("check_{}{}", kind.as_str(), suffix);
                condition(&mut script, &method, kind, block);
                if choice(block, "side") == "sell" {
                    wiring.sell_checks.push(method);
                } else {
                    wiring.buy_checks.push(method);
                }
            }
            KindId::Action(kind) => {
                let role = kind.role();
                let prefix = match role {
                    ActionRole::Protective => "manage",
                    ActionRole::Entry | ActionRole::Exit => "execute",
                };
                let method = format!("{}_{}{}", prefix, kind.as_str(), suffix);
                action(&mut script, &method, kind, block);
                match role {
                    ActionRole::Entry => wiring.entries.push(method),
                    ActionRole::Exit => wiring.exits.push(method),
                    ActionRole::Protective => wiring.protective.push(method),
                }
            }
        }
    }

    epilogue(&mut script, &class, &wiring);
    script.finish()
}

fn preamble(script: &mut Script, name: &str, market: &str, class: &str) {
    script.line(0, "# Auto-trading strategy generated by stratforge.");
    script.line(0, "# Credentials below are placeholders; the execution runtime supplies real ones.");
    script.blank();
    script.line(0, "import time");
    script.line(0, "from datetime import datetime");
    script.blank();
    script.line(0, "import numpy as np");
    script.line(0, "import pandas as pd");
    script.blank();
    script.line(0, format!("STRATEGY_NAME = {}", py_str(name)));
    script.line(0, format!("TARGET_MARKET = {}", py_str(market)));
    script.blank();
    script.blank();
    script.line(0, format!("class {}:", class));
    script.line(
        1,
        format!(
            "def __init__(self, api_key={}, api_secret={}):",
            py_str(API_KEY_PLACEHOLDER),
            py_str(API_SECRET_PLACEHOLDER)
        ),
    );
    script.line(2, "self.api_key = api_key");
    script.line(2, "self.api_secret = api_secret");
    script.line(2, "self.name = STRATEGY_NAME");
    script.line(2, "self.target_market = TARGET_MARKET");
}

fn settings(script: &mut Script, definition: &StrategyDefinition) {
    let risk = definition.risk();
    let hours = definition.trading_hours();
    let timeframe = definition.timeframe();

    script.line(2, format!("self.timeframe = {}", py_str(timeframe.as_str())));
    script.line(2, format!("self.interval_seconds = {}", timeframe.seconds()));
    script.line(2, format!("self.paper_trading = {}", py_bool(definition.paper_trading())));
    script.line(
        2,
        format!("self.initial_balance = {}", py_number(definition.initial_balance())),
    );
    script.line(2, format!("self.stop_loss_pct = {}", py_number(risk.stop_loss_pct)));
    script.line(2, format!("self.take_profit_pct = {}", py_number(risk.take_profit_pct)));
    script.line(2, format!("self.max_position_pct = {}", py_number(risk.max_position_pct)));
    script.line(2, format!("self.trading_start = {}", hours.start));
    script.line(2, format!("self.trading_end = {}", hours.end));
    script.blank();
    script.line(2, "self.balance = self.initial_balance");
    script.line(2, "self.position = 0.0");
    script.line(2, "self.entry_price = None");
    script.line(2, "self.peak_price = None");
    script.line(2, "self.entries = 0");
    script.line(2, "self.values = {}");
    script.line(2, "self.previous = {}");
}

/// Emits one indicator method. Every series key it records carries the
/// occurrence `suffix`, so a repeated kind never overwrites the first one.
fn indicator(
    script: &mut Script,
    method: &str,
    kind: IndicatorKind,
    block: &BlockInstance,
    suffix: &str,
) {
    let key = |series: &str| py_str(&format!("{}{}", series, suffix));
    script.line(1, format!("def {}(self, data):", method));
    match kind {
        IndicatorKind::Rsi => {
            script.line(2, format!("period = {}", py_number(number(block, "period"))));
            script.line(2, "delta = data[\"close\"].diff()");
            script.line(2, "gain = delta.where(delta > 0, 0).rolling(window=period).mean()");
            script.line(2, "loss = (-delta.where(delta < 0, 0)).rolling(window=period).mean()");
            script.line(2, "rsi = 100 - (100 / (1 + gain / loss))");
            script.line(2, format!("self._record({}, float(rsi.iloc[-1]))", key("rsi")));
            script.line(2, "return rsi");
        }
        IndicatorKind::Macd => {
            let close = "data[\"close\"]";
            script.line(
                2,
                format!(
                    "ema_fast = {}.ewm(span={}, adjust=False).mean()",
                    close,
                    py_number(number(block, "fast_period"))
                ),
            );
            script.line(
                2,
                format!(
                    "ema_slow = {}.ewm(span={}, adjust=False).mean()",
                    close,
                    py_number(number(block, "slow_period"))
                ),
            );
            script.line(2, "macd_line = ema_fast - ema_slow");
            script.line(
                2,
                format!(
                    "signal_line = macd_line.ewm(span={}, adjust=False).mean()",
                    py_number(number(block, "signal_period"))
                ),
            );
            script.line(2, "histogram = macd_line - signal_line");
            script.line(2, format!("self._record({}, float(macd_line.iloc[-1]))", key("macd")));
            script.line(2, format!("self._record({}, float(signal_line.iloc[-1]))", key("macd_signal")));
            script.line(2, format!("self._record({}, float(histogram.iloc[-1]))", key("macd_histogram")));
            script.line(2, "return macd_line, signal_line, histogram");
        }
        IndicatorKind::BollingerBands => {
            script.line(2, format!("period = {}", py_number(number(block, "period"))));
            script.line(2, format!("std_dev = {}", py_number(number(block, "std_dev"))));
            script.line(2, "middle = data[\"close\"].rolling(window=period).mean()");
            script.line(2, "std = data[\"close\"].rolling(window=period).std()");
            script.line(2, "upper = middle + std * std_dev");
            script.line(2, "lower = middle - std * std_dev");
            script.line(2, format!("self._record({}, float(upper.iloc[-1]))", key("bollinger_upper")));
            script.line(2, format!("self._record({}, float(middle.iloc[-1]))", key("bollinger_middle")));
            script.line(2, format!("self._record({}, float(lower.iloc[-1]))", key("bollinger_lower")));
            script.line(2, "return upper, middle, lower");
        }
        IndicatorKind::MovingAverage => {
            let short = py_number(number(block, "short_period"));
            let long = py_number(number(block, "long_period"));
            script.line(2, "close = data[\"close\"]");
            if choice(block, "ma_type") == "ema" {
                script.line(2, format!("ma_short = close.ewm(span={}, adjust=False).mean()", short));
                script.line(2, format!("ma_long = close.ewm(span={}, adjust=False).mean()", long));
            } else {
                script.line(2, format!("ma_short = close.rolling(window={}).mean()", short));
                script.line(2, format!("ma_long = close.rolling(window={}).mean()", long));
            }
            script.line(2, format!("self._record({}, float(ma_short.iloc[-1]))", key("ma_short")));
            script.line(2, format!("self._record({}, float(ma_long.iloc[-1]))", key("ma_long")));
            script.line(2, "return ma_short, ma_long");
        }
        IndicatorKind::Stochastic => {
            let k = py_number(number(block, "k_period"));
            script.line(2, format!("lowest = data[\"low\"].rolling(window={}).min()", k));
            script.line(2, format!("highest = data[\"high\"].rolling(window={}).max()", k));
            script.line(2, "k = 100 * (data[\"close\"] - lowest) / (highest - lowest)");
            script.line(
                2,
                format!("d = k.rolling(window={}).mean()", py_number(number(block, "d_period"))),
            );
            script.line(2, format!("self._record({}, float(k.iloc[-1]))", key("stochastic_k")));
            script.line(2, format!("self._record({}, float(d.iloc[-1]))", key("stochastic_d")));
            script.line(2, "return k, d");
        }
        IndicatorKind::Cci => {
            script.line(2, format!("period = {}", py_number(number(block, "period"))));
            script.line(2, "typical = (data[\"high\"] + data[\"low\"] + data[\"close\"]) / 3");
            script.line(2, "sma = typical.rolling(window=period).mean()");
            script.line(
                2,
                "mad = typical.rolling(window=period).apply(lambda x: np.mean(np.abs(x - np.mean(x))), raw=True)",
            );
            script.line(2, "cci = (typical - sma) / (0.015 * mad)");
            script.line(2, format!("self._record({}, float(cci.iloc[-1]))", key("cci")));
            script.line(2, "return cci");
        }
        IndicatorKind::Atr => {
            script.line(2, format!("period = {}", py_number(number(block, "period"))));
            script.line(2, "previous_close = data[\"close\"].shift()");
            script.line(2, "ranges = pd.concat(");
            script.line(3, "[");
            script.line(4, "data[\"high\"] - data[\"low\"],");
            script.line(4, "(data[\"high\"] - previous_close).abs(),");
            script.line(4, "(data[\"low\"] - previous_close).abs(),");
            script.line(3, "],");
            script.line(3, "axis=1,");
            script.line(2, ")");
            script.line(2, "atr = ranges.max(axis=1).rolling(window=period).mean()");
            script.line(2, format!("self._record({}, float(atr.iloc[-1]))", key("atr")));
            script.line(2, "return atr");
        }
        IndicatorKind::VolumeMa => {
            script.line(
                2,
                format!(
                    "volume_ma = data[\"volume\"].rolling(window={}).mean()",
                    py_number(number(block, "period"))
                ),
            );
            script.line(2, format!("self._record({}, float(volume_ma.iloc[-1]))", key("volume_ma")));
            script.line(
                2,
                format!(
                    "self._record({}, float(data[\"volume\"].iloc[-1] / volume_ma.iloc[-1]))",
                    key("volume_ratio")
                ),
            );
            script.line(2, "return volume_ma");
        }
        IndicatorKind::Fibonacci => {
            let ratios = match choice(block, "levels").as_str() {
                "extended" => FIB_EXTENDED,
                _ => FIB_STANDARD,
            };
            script.line(2, "high = float(data[\"high\"].max())");
            script.line(2, "low = float(data[\"low\"].min())");
            script.line(2, "span = high - low");
            script.line(
                2,
                format!("levels = {{ratio: high - span * ratio for ratio in ({})}}", ratios),
            );
            script.line(2, format!("self._record({}, levels)", key("fibonacci")));
            script.line(2, "return levels");
        }
    }
}

fn condition(script: &mut Script, method: &str, kind: ConditionKind, block: &BlockInstance) {
    let comparator = kind.comparator();
    script.line(1, format!("def {}(self):", method));
    match kind {
        ConditionKind::LessThan | ConditionKind::GreaterThan => compare_to_value(
            script,
            &choice(block, "operand"),
            comparator,
            number(block, "value"),
        ),
        ConditionKind::RsiOversold | ConditionKind::RsiOverbought => {
            compare_to_value(script, "rsi", comparator, number(block, "threshold"))
        }
        ConditionKind::VolumeSpike => {
            compare_to_value(script, "volume_ratio", comparator, number(block, "multiplier"))
        }
        ConditionKind::BollingerLower => {
            compare_series(script, "price", comparator, "bollinger_lower")
        }
        ConditionKind::BollingerUpper => {
            compare_series(script, "price", comparator, "bollinger_upper")
        }
        ConditionKind::CrossesAbove | ConditionKind::CrossesBelow => crossing(
            script,
            &choice(block, "series"),
            comparator,
            &choice(block, "reference"),
        ),
        ConditionKind::GoldenCross | ConditionKind::DeathCross => {
            crossing(script, "ma_short", comparator, "ma_long")
        }
    }
}

fn python_operator(comparator: Comparator) -> &'static str {
    match comparator {
        Comparator::LessThan | Comparator::CrossesBelow => "<",
        Comparator::GreaterThan | Comparator::CrossesAbove => ">",
    }
}

fn compare_to_value(script: &mut Script, series: &str, comparator: Comparator, bound: f64) {
    script.line(2, format!("value = self.values.get({})", py_str(series)));
    script.line(
        2,
        format!(
            "return value is not None and value {} {}",
            python_operator(comparator),
            py_number(bound)
        ),
    );
}

fn compare_series(script: &mut Script, left: &str, comparator: Comparator, right: &str) {
    script.line(2, format!("left = self.values.get({})", py_str(left)));
    script.line(2, format!("right = self.values.get({})", py_str(right)));
    script.line(
        2,
        format!(
            "return left is not None and right is not None and left {} right",
            python_operator(comparator)
        ),
    );
}

fn crossing(script: &mut Script, series: &str, comparator: Comparator, reference: &str) {
    let helper = match comparator {
        Comparator::CrossesAbove | Comparator::GreaterThan => "_crossed_above",
        Comparator::CrossesBelow | Comparator::LessThan => "_crossed_below",
    };
    script.line(
        2,
        format!("return self.{}({}, {})", helper, py_str(series), py_str(reference)),
    );
}

fn action(script: &mut Script, method: &str, kind: ActionKind, block: &BlockInstance) {
    script.line(1, format!("def {}(self, price):", method));
    match kind {
        ActionKind::Buy => {
            script.line(2, "if self.position > 0:");
            script.line(3, "return None");
            script.line(
                2,
                format!(
                    "return self._open_position(price, order_type={})",
                    py_str(&choice(block, "order_type"))
                ),
            );
        }
        ActionKind::Sell => {
            let portion = number(block, "portion_pct");
            script.line(2, "if self.position <= 0:");
            script.line(3, "return None");
            if portion >= 100.0 {
                script.line(2, "quantity = self.position");
            } else {
                script.line(2, format!("quantity = self.position * {} / 100", py_number(portion)));
            }
            script.line(
                2,
                format!(
                    "order = self.place_order(\"sell\", quantity, order_type={}, price=price)",
                    py_str(&choice(block, "order_type"))
                ),
            );
            script.line(2, "self.balance += quantity * price");
            script.line(2, "self.position -= quantity");
            script.line(2, "if self.position <= 0:");
            script.line(3, "self._close_position()");
            script.line(2, "return order");
        }
        ActionKind::StopLoss => {
            let reference = if flag(block, "trailing") {
                "self.peak_price"
            } else {
                "self.entry_price"
            };
            script.line(2, "if self.position <= 0:");
            script.line(3, "return None");
            script.line(
                2,
                format!("stop_price = {} * (1 - self.stop_loss_pct / 100)", reference),
            );
            script.line(2, "if price <= stop_price:");
            script.line(3, "return self._exit_all(price, \"stop_loss\")");
            script.line(2, "return None");
        }
        ActionKind::TakeProfit => {
            script.line(2, "if self.position <= 0:");
            script.line(3, "return None");
            script.line(2, "target_price = self.entry_price * (1 + self.take_profit_pct / 100)");
            script.line(2, "if price < target_price:");
            script.line(3, "return None");
            if flag(block, "partial") {
                script.line(2, "quantity = self.position / 2");
                script.line(2, "order = self.place_order(\"sell\", quantity, price=price)");
                script.line(2, "order[\"reason\"] = \"take_profit\"");
                script.line(2, "self.balance += quantity * price");
                script.line(2, "self.position -= quantity");
                script.line(2, "self.entry_price = price");
                script.line(2, "return order");
            } else {
                script.line(2, "return self._exit_all(price, \"take_profit\")");
            }
        }
        ActionKind::TrailingStop => {
            script.line(2, "if self.position <= 0:");
            script.line(3, "return None");
            script.line(
                2,
                format!(
                    "if price <= self.peak_price * (1 - {} / 100):",
                    py_number(number(block, "trail_pct"))
                ),
            );
            script.line(3, "return self._exit_all(price, \"trailing_stop\")");
            script.line(2, "return None");
        }
        ActionKind::Dca => {
            script.line(2, "if self.position <= 0:");
            script.line(3, "return self._open_position(price)");
            script.line(
                2,
                format!(
                    "if self.entries >= {}:",
                    py_number(number(block, "max_entries"))
                ),
            );
            script.line(3, "return None");
            script.line(
                2,
                format!(
                    "if price > self.entry_price * (1 - {} / 100):",
                    py_number(number(block, "step_pct"))
                ),
            );
            script.line(3, "return None");
            script.line(2, "quantity = self.balance * self.max_position_pct / 100 / price");
            script.line(2, "order = self.place_order(\"buy\", quantity, price=price)");
            script.line(
                2,
                "self.entry_price = (self.entry_price * self.position + price * quantity) / (self.position + quantity)",
            );
            script.line(2, "self.balance -= quantity * price");
            script.line(2, "self.position += quantity");
            script.line(2, "self.entries += 1");
            script.line(2, "return order");
        }
    }
}

fn epilogue(script: &mut Script, class: &str, wiring: &Wiring) {
    script.blank();
    script.line(1, "def calculate_indicators(self, data):");
    script.line(2, "self.previous = dict(self.values)");
    script.line(2, "self._record(\"price\", float(data[\"close\"].iloc[-1]))");
    for method in &wiring.indicators {
        script.line(2, format!("self.{}(data)", method));
    }

    script.blank();
    script.line(1, "def check_signal(self):");
    script.line(2, "if not self.check_trading_hours():");
    script.line(3, "return \"HOLD\"");
    script.line(2, format!("buy_checks = {}", method_list(&wiring.buy_checks)));
    script.line(2, format!("sell_checks = {}", method_list(&wiring.sell_checks)));
    script.line(2, "if buy_checks and all(check() for check in buy_checks):");
    script.line(3, "return \"BUY\"");
    script.line(2, "if sell_checks and all(check() for check in sell_checks):");
    script.line(3, "return \"SELL\"");
    script.line(2, "return \"HOLD\"");

    script.blank();
    script.line(1, "def execute(self, signal, price):");
    script.line(2, "if self.position > 0:");
    script.line(3, "self.peak_price = max(self.peak_price, price)");
    script.line(2, format!("actions = {}", method_list(&wiring.protective)));
    script.line(2, "if signal == \"BUY\":");
    script.line(3, format!("actions += {}", method_list(&wiring.entries)));
    script.line(2, "elif signal == \"SELL\":");
    script.line(3, format!("actions += {}", method_list(&wiring.exits)));
    script.line(2, "orders = []");
    script.line(2, "for act in actions:");
    script.line(3, "order = act(price)");
    script.line(3, "if order is not None:");
    script.line(4, "orders.append(order)");
    script.line(2, "return orders");

    script.blank();
    script.line(1, "def run_once(self):");
    script.line(2, "data = self.fetch_market_data()");
    script.line(2, "self.calculate_indicators(data)");
    script.line(2, "signal = self.check_signal()");
    script.line(2, "orders = self.execute(signal, self.values[\"price\"])");
    script.line(2, "return signal, orders");

    script.blank();
    script.line(1, "def run(self):");
    script.line(2, "while True:");
    script.line(3, "signal, orders = self.run_once()");
    script.line(
        3,
        "print(f\"[{datetime.now().isoformat()}] {self.name}: {signal}, {len(orders)} order(s)\")",
    );
    script.line(3, "time.sleep(self.interval_seconds)");

    script.blank();
    script.blank();
    script.line(0, "if __name__ == \"__main__\":");
    script.line(1, format!("{}().run()", class));
}

fn method_list(methods: &[String]) -> String {
    let items: Vec<String> = methods.iter().map(|m| format!("self.{}", m)).collect();
    format!("[{}]", items.join(", "))
}

/// Value of a declared parameter, falling back to the catalog default.
///
/// Validated definitions always carry every declared key, so the fallback
/// only keeps this total.
fn resolved(block: &BlockInstance, param: &str) -> Option<ParamValue> {
    block.value(param).cloned().or_else(|| {
        BlockCatalog::builtin()
            .get(block.kind)
            .param(param)
            .map(|spec| spec.default_value())
    })
}

fn number(block: &BlockInstance, param: &str) -> f64 {
    resolved(block, param)
        .and_then(|v| v.as_number())
        .unwrap_or_default()
}

fn choice(block: &BlockInstance, param: &str) -> String {
    resolved(block, param)
        .and_then(|v| v.as_choice().map(str::to_string))
        .unwrap_or_default()
}

fn flag(block: &BlockInstance, param: &str) -> bool {
    resolved(block, param)
        .and_then(|v| v.as_bool())
        .unwrap_or_default()
}

/// PascalCase class name derived from the strategy name
pub fn class_name(name: &str) -> String {
    let mut class: String = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    if class.is_empty() {
        return "GeneratedStrategy".to_string();
    }
    if class.starts_with(|c: char| c.is_ascii_digit()) {
        class.insert_str(0, "Strategy");
    }
    // Capitalized keywords
    if matches!(class.as_str(), "None" | "True" | "False") {
        class.push_str("Strategy");
    }
    class
}

/// Integral values print without a fractional part, others in shortest form
pub fn py_number(value: f64) -> String {
    if value.is_nan() {
        "float(\"nan\")".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            "float(\"inf\")".to_string()
        } else {
            "float(\"-inf\")".to_string()
        }
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

pub fn py_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Double-quoted Python string literal
pub fn py_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
