use serde_json::Value;
use tailfit_core::Envelope;

use crate::cli::OutputFormat;
use crate::error::CliError;

pub fn render(
    envelope: &Envelope<Value>,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => print!("{}", render_table(envelope)?),
    }

    Ok(())
}

fn render_table(envelope: &Envelope<Value>) -> Result<String, CliError> {
    let mut out = String::new();
    push_line(&mut out, format!("request_id  : {}", envelope.meta.request_id));
    push_line(&mut out, format!("schema      : {}", envelope.meta.schema_version));
    push_line(&mut out, format!("generated_at: {}", envelope.meta.generated_at));
    push_line(&mut out, format!("source      : {}", envelope.meta.source));
    push_line(&mut out, format!("latency_ms  : {}", envelope.meta.latency_ms));

    if !envelope.meta.warnings.is_empty() {
        push_line(&mut out, String::from("warnings:"));
        for warning in &envelope.meta.warnings {
            push_line(&mut out, format!("  - {warning}"));
        }
    }

    match envelope.data.get("mape").and_then(Value::as_array) {
        Some(rows) if !rows.is_empty() => out.push_str(&mape_table(rows)),
        _ => {
            push_line(&mut out, String::from("data:"));
            let pretty_data = serde_json::to_string_pretty(&envelope.data)?;
            for line in pretty_data.lines() {
                push_line(&mut out, format!("  {line}"));
            }
        }
    }

    if !envelope.errors.is_empty() {
        push_line(&mut out, String::from("errors:"));
        for error in &envelope.errors {
            match &error.symbol {
                Some(symbol) => {
                    push_line(&mut out, format!("  - {symbol} {}: {}", error.code, error.message))
                }
                None => push_line(&mut out, format!("  - {}: {}", error.code, error.message)),
            }
        }
    }

    Ok(out)
}

/// Model-by-ticker MAPE grid from the `compare` payload.
fn mape_table(rows: &[Value]) -> String {
    let symbols: Vec<&str> = rows[0]
        .get("values")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(|value| value.get("symbol").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    let mut out = String::from("MAPE (%):\n");
    out.push_str(&format!("  {:<14}", "model"));
    for symbol in &symbols {
        out.push_str(&format!("{symbol:>12}"));
    }
    out.push('\n');

    for row in rows {
        let model = row.get("model").and_then(Value::as_str).unwrap_or("?");
        out.push_str(&format!("  {model:<14}"));
        let values = row.get("values").and_then(Value::as_array);
        for value in values.into_iter().flatten() {
            match value.get("mape").and_then(Value::as_f64) {
                Some(mape) => out.push_str(&format!("{mape:>12.2}")),
                None => out.push_str(&format!("{:>12}", "-")),
            }
        }
        out.push('\n');
    }
    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(&line);
    out.push('\n');
}
