//! Expression commands: submit, list, show, check.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use exprflow_core::compiler::{self, CompiledTask};
use exprflow_types::expression::{Expression, ExpressionId, ExpressionStatus, UserId};
use exprflow_types::task::Task;

use crate::state::AppState;

fn status_cell(status: ExpressionStatus) -> Cell {
    match status {
        ExpressionStatus::Pending => Cell::new("○ pending").fg(Color::Yellow),
        ExpressionStatus::Processing => Cell::new("◐ processing").fg(Color::Blue),
        ExpressionStatus::Completed => Cell::new("● completed").fg(Color::Green),
        ExpressionStatus::Error => Cell::new("✗ error").fg(Color::Red),
    }
}

fn format_result(expr: &Expression) -> String {
    match (expr.status, expr.result) {
        (ExpressionStatus::Error, _) => expr.error.clone(),
        (_, Some(value)) => value.to_string(),
        (_, None) => "-".to_string(),
    }
}

/// Operand column: a literal value, or the producer it waits on.
fn operand(value: Option<f64>, producer: Option<String>) -> String {
    match (value, producer) {
        (Some(v), _) => v.to_string(),
        (None, Some(p)) => format!("<- {p}"),
        (None, None) => String::new(),
    }
}

/// Compile and store an expression for `user`.
pub async fn submit(state: &AppState, user: UserId, input: &str, json: bool) -> Result<()> {
    let expr = state.expression_service.submit(user, input).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&expr)?);
        return Ok(());
    }

    println!(
        "  {} Submitted expression {} ({})",
        style("✓").green().bold(),
        style(expr.id).bold(),
        style(&expr.expression).cyan()
    );
    Ok(())
}

/// List the user's expressions in a table.
pub async fn list(state: &AppState, user: UserId, json: bool) -> Result<()> {
    let expressions = state.expression_service.list(user).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&expressions)?);
        return Ok(());
    }

    if expressions.is_empty() {
        println!();
        println!(
            "  {} No expressions yet. Submit one with {}",
            style("i").blue().bold(),
            style("exprflow submit \"2 + 2\" --user <id>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Expression").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Result").fg(Color::White),
        Cell::new("Submitted").fg(Color::White),
    ]);

    for expr in &expressions {
        table.add_row(vec![
            Cell::new(expr.id).fg(Color::DarkGrey),
            Cell::new(&expr.expression).fg(Color::Cyan),
            status_cell(expr.status),
            Cell::new(format_result(expr)),
            Cell::new(expr.created_at.format("%Y-%m-%d %H:%M:%S")).fg(Color::DarkGrey),
        ]);
    }

    println!("{table}");
    println!("  {} expression(s)", style(expressions.len()).bold());
    Ok(())
}

/// Show one expression and, while it is running, its tasks.
pub async fn show(state: &AppState, user: UserId, id: ExpressionId, json: bool) -> Result<()> {
    let expr = state.expression_service.get(user, id).await?;
    let tasks = state.expression_service.tasks(user, id).await?;

    if json {
        let out = serde_json::json!({
            "expression": expr,
            "tasks": tasks,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {}", style(&expr.expression).cyan().bold());
    println!();
    println!("  {}   {}", style("ID:").bold(), expr.id);
    println!("  {} {}", style("Status:").bold(), expr.status);
    match expr.status {
        ExpressionStatus::Completed => {
            println!("  {} {}", style("Result:").bold(), style(format_result(&expr)).green());
        }
        ExpressionStatus::Error => {
            println!("  {}  {}", style("Error:").bold(), style(&expr.error).red());
        }
        _ => {}
    }

    if !tasks.is_empty() {
        println!();
        println!("{}", task_table(&tasks));
    }
    println!();
    Ok(())
}

fn task_table(tasks: &[Task]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(vec!["Task", "Op", "Left", "Right", "Status", "Result"]);

    for task in tasks {
        let [dep0, dep1] = task.dependencies.map(|d| d.map(|id| format!("#{id}")));
        table.add_row(vec![
            Cell::new(format!("#{}", task.id)),
            Cell::new(task.operation.symbol()),
            Cell::new(operand(task.args[0], dep0)),
            Cell::new(operand(task.args[1], dep1)),
            Cell::new(task.status),
            Cell::new(task.result.map(|r| r.to_string()).unwrap_or_default()),
        ]);
    }
    table
}

/// Compile without storing anything and print the task graph.
///
/// A compile error is printed and returned, so the process exits non-zero.
pub fn check(input: &str, json: bool) -> Result<()> {
    let graph = compiler::compile(input).inspect_err(|err| {
        if json {
            let out = serde_json::json!({
                "valid": false,
                "code": err.code(),
                "message": err.to_string(),
            });
            println!("{out:#}");
        } else {
            println!(
                "  {} {} ({})",
                style("✗").red().bold(),
                err,
                style(err.code()).dim()
            );
        }
    })?;

    if json {
        let out = serde_json::json!({
            "valid": true,
            "root": graph.root(),
            "tasks": graph.tasks(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(vec!["#", "Op", "Left", "Right"]);
    for (index, task) in graph.tasks().iter().enumerate() {
        table.add_row(compiled_row(index, task));
    }

    println!("{table}");
    println!(
        "  {} {} task(s), root is #{}",
        style("✓").green().bold(),
        graph.len(),
        graph.root()
    );
    Ok(())
}

fn compiled_row(index: usize, task: &CompiledTask) -> Vec<String> {
    let [dep0, dep1] = task.dependencies.map(|d| d.map(|i| format!("#{i}")));
    vec![
        format!("#{index}"),
        task.operation.symbol().to_string(),
        operand(task.args[0], dep0),
        operand(task.args[1], dep1),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operand_rendering() {
        assert_eq!(operand(Some(2.5), None), "2.5");
        assert_eq!(operand(None, Some("#3".to_string())), "<- #3");
        assert_eq!(operand(None, None), "");
    }

    #[test]
    fn test_compiled_rows_show_dependencies() {
        let graph = compiler::compile("(1 + 2) * 3").unwrap();
        let rows: Vec<Vec<String>> = graph
            .tasks()
            .iter()
            .enumerate()
            .map(|(i, t)| compiled_row(i, t))
            .collect();
        assert_eq!(rows[0], vec!["#0", "+", "1", "2"]);
        assert_eq!(rows[1], vec!["#1", "*", "<- #0", "3"]);
    }
}
