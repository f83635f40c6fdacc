use super::{start_session, ui};
use crate::core::RateTable;
use crate::core::config::AppConfig;
use anyhow::Result;
use comfy_table::{Cell, CellAlignment};

pub fn display_rates(rates: &RateTable, active: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Label"),
        ui::header_cell(&format!("Per 1 {}", rates.reference())),
    ]);

    for currency in rates.currencies() {
        let code = if currency.code.eq_ignore_ascii_case(active) {
            format!("{} *", currency.code)
        } else {
            currency.code.clone()
        };
        table.add_row(vec![
            Cell::new(code),
            Cell::new(&currency.label),
            Cell::new(format!("{}", currency.rate)).set_alignment(CellAlignment::Right),
        ]);
    }

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Supported currencies", ui::StyleType::Title)
    );
    output.push_str(&table.to_string());
    output.push_str(&format!(
        "\n\n{}",
        ui::style_text("* configured default", ui::StyleType::Subtle)
    ));
    output
}

pub async fn run(config: &AppConfig) -> Result<()> {
    let (orchestrator, _completions) = start_session(config).await;
    println!("{}", display_rates(orchestrator.rates(), &config.currency));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_rates_lists_every_code() {
        let output = display_rates(&RateTable::builtin(), "usd");
        for code in ["CNY", "JPY", "HKD", "RUB", "PHP", "INR", "KRW", "CAD"] {
            assert!(output.contains(code), "missing {code}");
        }
        assert!(output.contains("USD *"));
        assert!(output.contains("185.87"));
    }
}
