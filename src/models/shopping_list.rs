use sea_orm::FromQueryResult;

/// One aggregated shopping-list entry.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct ShoppingListLine {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

/// Renders lines as `name (unit) - total`, one per line, in the given order.
#[must_use]
pub fn render(lines: &[ShoppingListLine]) -> String {
    lines
        .iter()
        .map(|line| format!("{} ({}) - {}", line.name, line.measurement_unit, line.total))
        .collect::<Vec<_>>()
        .join("\n")
}
