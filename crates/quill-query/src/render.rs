//! Text rendering of query results.
//!
//! Column widths adapt to the data: each column renderer observes
//! every cell once, freezes its layout, then formats cells at a fixed
//! width. Decimal columns align on the point and pad to a common
//! number of fraction digits, amounts additionally align their
//! currencies, and inventories render one lot per line, so a single
//! row can span several output lines.

use quill_core::{Amount, Decimal, Position};

use crate::execute::QueryResult;
use crate::value::{Value, ValueType};

/// Renders the cells of one column at a fixed width.
trait ColumnRenderer {
    /// Observe a value before the layout is frozen.
    fn update(&mut self, value: &Value);
    /// Freeze the layout.
    fn prepare(&mut self) {}
    /// The frozen column width.
    fn width(&self) -> usize;
    /// Render one cell, one string per output line.
    fn format(&self, value: &Value) -> Vec<String>;
}

/// Point alignment bookkeeping shared by every numeric column.
#[derive(Debug, Default)]
struct DecimalState {
    integer_width: usize,
    fraction_width: usize,
}

impl DecimalState {
    fn observe(&mut self, number: &Decimal) {
        let text = number.to_string();
        let (integer, fraction) = match text.split_once('.') {
            Some((integer, fraction)) => (integer.len(), fraction.len()),
            None => (text.len(), 0),
        };
        self.integer_width = self.integer_width.max(integer);
        self.fraction_width = self.fraction_width.max(fraction);
    }

    fn width(&self) -> usize {
        if self.fraction_width > 0 {
            self.integer_width + 1 + self.fraction_width
        } else {
            self.integer_width
        }
    }

    fn render(&self, number: &Decimal) -> String {
        let scale = self.fraction_width.min(28) as u32;
        let mut scaled = number.round_dp(scale);
        scaled.rescale(scale);
        format!("{:>width$}", scaled.to_string(), width = self.width())
    }
}

/// Number alignment plus a left-justified currency.
#[derive(Debug, Default)]
struct AmountState {
    number: DecimalState,
    currency_width: usize,
}

impl AmountState {
    fn observe(&mut self, amount: &Amount) {
        self.number.observe(&amount.number);
        self.currency_width = self
            .currency_width
            .max(amount.currency.as_str().chars().count());
    }

    fn width(&self) -> usize {
        if self.currency_width == 0 {
            return 0;
        }
        self.number.width() + 1 + self.currency_width
    }

    fn render(&self, amount: &Amount) -> String {
        format!(
            "{} {:<currency$}",
            self.number.render(&amount.number),
            amount.currency.as_str(),
            currency = self.currency_width,
        )
    }
}

/// An amount with an optional trailing cost segment.
#[derive(Debug, Default)]
struct PositionState {
    amount: AmountState,
    cost_width: usize,
}

impl PositionState {
    fn observe(&mut self, position: &Position) {
        self.amount.observe(&position.units);
        if let Some(cost) = &position.cost {
            self.cost_width = self.cost_width.max(cost.to_string().chars().count());
        }
    }

    fn width(&self) -> usize {
        let base = self.amount.width();
        if base == 0 {
            0
        } else if self.cost_width > 0 {
            base + 1 + self.cost_width
        } else {
            base
        }
    }

    fn render(&self, position: &Position) -> String {
        let mut out = self.amount.render(&position.units);
        if self.cost_width > 0 {
            let cost = position
                .cost
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            out.push(' ');
            out.push_str(&format!("{cost:<width$}", width = self.cost_width));
        }
        out
    }
}

#[derive(Default)]
struct StringRenderer {
    width: usize,
}

impl ColumnRenderer for StringRenderer {
    fn update(&mut self, value: &Value) {
        if !value.is_null() {
            self.width = self.width.max(value.to_string().chars().count());
        }
    }

    fn width(&self) -> usize {
        self.width
    }

    fn format(&self, value: &Value) -> Vec<String> {
        if value.is_null() {
            return vec![" ".repeat(self.width)];
        }
        let text = value.to_string();
        // Values longer than the frozen width are truncated silently.
        let rendered = if text.chars().count() > self.width {
            text.chars().take(self.width).collect()
        } else {
            format!("{text:<width$}", width = self.width)
        };
        vec![rendered]
    }
}

const DATE_WIDTH: usize = 10;

struct DateRenderer;

impl ColumnRenderer for DateRenderer {
    fn update(&mut self, _value: &Value) {}

    fn width(&self) -> usize {
        DATE_WIDTH
    }

    fn format(&self, value: &Value) -> Vec<String> {
        match value {
            Value::Date(date) => vec![date.to_string()],
            _ => vec![" ".repeat(DATE_WIDTH)],
        }
    }
}

#[derive(Default)]
struct IntegerRenderer {
    width: usize,
}

impl ColumnRenderer for IntegerRenderer {
    fn update(&mut self, value: &Value) {
        if let Value::Integer(n) = value {
            self.width = self.width.max(n.to_string().len());
        }
    }

    fn width(&self) -> usize {
        self.width
    }

    fn format(&self, value: &Value) -> Vec<String> {
        match value {
            Value::Integer(n) => vec![format!("{:>width$}", n.to_string(), width = self.width)],
            _ => vec![" ".repeat(self.width)],
        }
    }
}

#[derive(Default)]
struct DecimalRenderer {
    state: DecimalState,
}

impl ColumnRenderer for DecimalRenderer {
    fn update(&mut self, value: &Value) {
        if let Some(number) = value.as_decimal() {
            self.state.observe(&number);
        }
    }

    fn width(&self) -> usize {
        self.state.width()
    }

    fn format(&self, value: &Value) -> Vec<String> {
        match value.as_decimal() {
            Some(number) => vec![self.state.render(&number)],
            None => vec![" ".repeat(self.state.width())],
        }
    }
}

#[derive(Default)]
struct AmountRenderer {
    state: AmountState,
}

impl ColumnRenderer for AmountRenderer {
    fn update(&mut self, value: &Value) {
        if let Value::Amount(amount) = value {
            self.state.observe(amount);
        }
    }

    fn width(&self) -> usize {
        self.state.width()
    }

    fn format(&self, value: &Value) -> Vec<String> {
        match value {
            Value::Amount(amount) => vec![self.state.render(amount)],
            _ => vec![" ".repeat(self.state.width())],
        }
    }
}

#[derive(Default)]
struct PositionRenderer {
    state: PositionState,
}

impl ColumnRenderer for PositionRenderer {
    fn update(&mut self, value: &Value) {
        if let Value::Position(position) = value {
            self.state.observe(position);
        }
    }

    fn width(&self) -> usize {
        self.state.width()
    }

    fn format(&self, value: &Value) -> Vec<String> {
        match value {
            Value::Position(position) => vec![self.state.render(position)],
            _ => vec![" ".repeat(self.state.width())],
        }
    }
}

#[derive(Default)]
struct InventoryRenderer {
    state: PositionState,
}

impl ColumnRenderer for InventoryRenderer {
    fn update(&mut self, value: &Value) {
        if let Value::Inventory(inventory) = value {
            for position in inventory.positions() {
                self.state.observe(position);
            }
        }
    }

    fn width(&self) -> usize {
        self.state.width()
    }

    fn format(&self, value: &Value) -> Vec<String> {
        let Value::Inventory(inventory) = value else {
            return vec![" ".repeat(self.state.width())];
        };
        let mut lots: Vec<&Position> = inventory
            .positions()
            .iter()
            .filter(|position| !position.is_empty())
            .collect();
        if lots.is_empty() {
            return vec![" ".repeat(self.state.width())];
        }
        lots.sort_by(|a, b| {
            a.units
                .currency
                .cmp(&b.units.currency)
                .then_with(|| a.to_string().cmp(&b.to_string()))
        });
        lots.iter().map(|lot| self.state.render(lot)).collect()
    }
}

fn renderer_for(dtype: ValueType) -> Box<dyn ColumnRenderer> {
    match dtype {
        ValueType::String | ValueType::StringSet | ValueType::Boolean => {
            Box::new(StringRenderer::default())
        }
        ValueType::Date => Box::new(DateRenderer),
        ValueType::Integer => Box::new(IntegerRenderer::default()),
        ValueType::Number => Box::new(DecimalRenderer::default()),
        ValueType::Amount => Box::new(AmountRenderer::default()),
        ValueType::Position => Box::new(PositionRenderer::default()),
        ValueType::Inventory => Box::new(InventoryRenderer::default()),
    }
}

fn right_aligned(dtype: ValueType) -> bool {
    !matches!(
        dtype,
        ValueType::String | ValueType::StringSet | ValueType::Boolean
    )
}

fn justify(text: &str, width: usize, right: bool) -> String {
    if right {
        format!("{text:>width$}")
    } else {
        format!("{text:<width$}")
    }
}

/// Render a query result as an aligned text table.
#[must_use]
pub fn render_text(result: &QueryResult) -> String {
    let mut renderers: Vec<Box<dyn ColumnRenderer>> = result
        .columns
        .iter()
        .map(|(_, dtype)| renderer_for(*dtype))
        .collect();
    for row in &result.rows {
        for (renderer, value) in renderers.iter_mut().zip(row) {
            renderer.update(value);
        }
    }
    for renderer in &mut renderers {
        renderer.prepare();
    }

    // A column never gets narrower than its header.
    let widths: Vec<usize> = result
        .columns
        .iter()
        .zip(&renderers)
        .map(|((name, _), renderer)| renderer.width().max(name.chars().count()))
        .collect();

    let mut out = String::new();
    for (i, ((name, dtype), &width)) in result.columns.iter().zip(&widths).enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&justify(name, width, right_aligned(*dtype)));
    }
    out.push('\n');
    for (i, &width) in widths.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&"-".repeat(width));
    }
    out.push('\n');

    for row in &result.rows {
        let cells: Vec<Vec<String>> = renderers
            .iter()
            .zip(row)
            .map(|(renderer, value)| renderer.format(value))
            .collect();
        let height = cells.iter().map(Vec::len).max().unwrap_or(1);
        for line in 0..height {
            for (i, (cell, ((_, dtype), &width))) in cells
                .iter()
                .zip(result.columns.iter().zip(&widths))
                .enumerate()
            {
                if i > 0 {
                    out.push(' ');
                }
                let text = cell.get(line).map_or("", String::as_str);
                out.push_str(&justify(text, width, right_aligned(*dtype)));
            }
            out.push('\n');
        }
    }
    out
}
