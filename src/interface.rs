use anyhow::{bail, Result};
use prettytable::Table;

use crate::context::AppContext;
use crate::forms::{CreateTaskForm, EditTaskForm};
use crate::model::{DailyLog, Task};
use crate::scoring::Standing;

const TITLE_WIDTH: usize = 40;
const MEMO_WIDTH: usize = 50;

fn wrap(text: &str, width: usize) -> String {
    textwrap::fill(text, width)
}

fn fmt_due(task: &Task) -> String {
    task.due_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn fmt_standing(standing: &Standing) -> String {
    format!("{} ({})", standing.rank, standing.score)
}

fn fmt_log_standing(log: &DailyLog) -> String {
    match (log.rank, log.score) {
        (Some(rank), Some(score)) => format!("{} ({})", rank, score),
        (Some(rank), None) => rank.to_string(),
        (None, Some(score)) => score.to_string(),
        (None, None) => "-".to_string(),
    }
}

pub fn tasks_table(tasks: &[Task]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["id", "task", "due", "priority", "progress"]);
    for task in tasks {
        table.add_row(row![
            task.id,
            wrap(&task.title, TITLE_WIDTH),
            fmt_due(task),
            task.priority,
            format!("{}%", task.progress)
        ]);
    }
    table
}

pub fn logs_table(logs: &[DailyLog]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["date", "rank", "memo"]);
    for log in logs {
        table.add_row(row![
            log.date,
            fmt_log_standing(log),
            wrap(log.memo.as_deref().unwrap_or(""), MEMO_WIDTH)
        ]);
    }
    table
}

pub fn add_task(
    ctx: &AppContext,
    title: String,
    due: Option<String>,
    priority: Option<String>,
) -> Result<()> {
    let form = CreateTaskForm {
        title: Some(title),
        due_date: due,
        priority,
    };
    match form.into_new_task()? {
        Some(new_task) => {
            let task = ctx.tasks.create(&new_task)?;
            println!(
                "{}. {} (due {}, priority {})",
                task.id,
                task.title,
                fmt_due(&task),
                task.priority
            );
        }
        None => println!("A task needs a title."),
    }
    Ok(())
}

pub fn list(ctx: &AppContext) -> Result<()> {
    let tasks = ctx.tasks.list()?;
    if tasks.is_empty() {
        println!("No tasks! use 'tally add' to add new tasks to your list.");
    } else {
        tasks_table(&tasks).printstd();
    }
    println!(
        "Current rank: {}",
        fmt_standing(&crate::scoring::standing(&tasks))
    );
    Ok(())
}

fn standing_line(ctx: &AppContext) -> Result<String> {
    Ok(format!("Current rank: {}", fmt_standing(&ctx.standing()?)))
}

pub fn score(ctx: &AppContext) -> Result<()> {
    println!("{}", standing_line(ctx)?);
    Ok(())
}

pub fn edit_task(
    ctx: &AppContext,
    id: i64,
    due: Option<String>,
    priority: Option<String>,
    progress: Option<String>,
) -> Result<()> {
    let update = EditTaskForm {
        due_date: due,
        priority,
        progress,
    }
    .into_update()?;
    match ctx.tasks.update(id, &update)? {
        Some(task) => {
            println!(
                "{}. {} (due {}, priority {}, {}%)",
                task.id,
                task.title,
                fmt_due(&task),
                task.priority,
                task.progress
            );
            Ok(())
        }
        None => bail!("There is no task {}.", id),
    }
}

pub fn remove_task(ctx: &AppContext, id: i64) -> Result<()> {
    if !ctx.tasks.delete(id)? {
        bail!("There is no task {}.", id);
    }
    Ok(())
}

pub fn report(ctx: &AppContext) -> Result<()> {
    let report = ctx.report()?;
    println!("{}", report.today.format("%A %Y-%m-%d"));
    println!("Current rank: {}", fmt_standing(&report.current));
    match &report.todays_log {
        Some(log) => {
            println!("Recorded: {}", fmt_log_standing(log));
            if let Some(memo) = &log.memo {
                println!("{}", wrap(memo, MEMO_WIDTH));
            }
        }
        None => println!("Nothing recorded today. Use 'tally log' to record it."),
    }
    if !report.past_logs.is_empty() {
        logs_table(&report.past_logs).printstd();
    }
    Ok(())
}

pub fn log_today(ctx: &AppContext, memo: Option<String>) -> Result<()> {
    let memo = memo.filter(|m| !m.trim().is_empty());
    let log = ctx.record_today(memo)?;
    println!("{}: {}", log.date, fmt_log_standing(&log));
    Ok(())
}
