use super::ui;
use crate::core::AssetRecord;
use comfy_table::Cell;

/// Renders a snapshot as a table with a title line.
pub fn render_snapshot(code: &str, records: &[AssetRecord], limit: Option<usize>) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Symbol"),
        ui::header_cell("Name"),
        ui::header_cell("Price"),
        ui::header_cell("Market Cap"),
        ui::header_cell("24h Change"),
    ]);

    let shown = limit.unwrap_or(records.len()).min(records.len());
    for (rank, record) in records.iter().take(shown).enumerate() {
        table.add_row(vec![
            ui::number_cell((rank + 1).to_string()),
            Cell::new(record.symbol.to_uppercase()),
            Cell::new(&record.name),
            ui::number_cell(format!("{:.2}", record.current_price)),
            ui::number_cell(ui::group_thousands(record.market_cap)),
            ui::change_cell(record.price_change_24h),
        ]);
    }

    let title = format!("Market ({})", code.to_uppercase());
    let mut output = format!("{}\n\n", ui::style_text(&title, ui::StyleType::Title));
    output.push_str(&table.to_string());
    if shown < records.len() {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!("{} of {} assets shown", shown, records.len()),
                ui::StyleType::Subtle
            )
        ));
    }
    output
}
