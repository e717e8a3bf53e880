use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::metrics;
use crate::models::{ChecklistItem, DashboardStats, DependencyRef, Task};

fn flags(t: &Task, today: NaiveDate) -> String {
    let mut out = String::new();
    if metrics::is_overdue(t, today) {
        out.push_str(" OVERDUE");
    }
    if let Some(ref jira) = t.jira_id {
        out.push_str(&format!(" [{jira}]"));
    }
    out
}

pub fn print_task(t: &Task, today: NaiveDate) {
    println!("Task: {} (#{})", t.title, t.id);
    if let Some(ref desc) = t.description {
        println!("  Description: {desc}");
    }
    println!("  Status: {}", t.status.as_str());
    println!("  Priority: {}", t.priority.as_str());
    if let Some(d) = t.assigned_date {
        println!("  Assigned: {d}");
    }
    if let Some(d) = t.due_date {
        let late = if metrics::is_overdue(t, today) { " (overdue)" } else { "" };
        println!("  Due: {d}{late}");
    }
    if let Some(ref jira) = t.jira_id {
        match t.jira_url {
            Some(ref url) => println!("  Issue: {jira} <{url}>"),
            None => println!("  Issue: {jira}"),
        }
    }
    if let Some(ref notes) = t.notes {
        println!("  Notes: {notes}");
    }
    let (done, total) = t.checklist_totals();
    println!("  Progress: {:.0}% ({done}/{total})", metrics::progress(t));
}

pub fn print_task_list(tasks: &[&Task], today: NaiveDate) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    for t in tasks {
        let (done, total) = t.checklist_totals();
        let date = t
            .assigned_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "----------".to_string());
        println!(
            "  #{:<4} {} [{}] {:<6} {} ({done}/{total}){}",
            t.id,
            date,
            t.status.as_str(),
            t.priority.as_str(),
            t.title,
            flags(t, today)
        );
    }
}

pub fn print_checklist(items: &[ChecklistItem]) {
    if items.is_empty() {
        println!("No checklist items.");
        return;
    }
    for (pos, i) in items.iter().enumerate() {
        let mark = if i.completed { "x" } else { " " };
        let branch = i
            .git_branch
            .as_deref()
            .map(|b| format!(" @{b}"))
            .unwrap_or_default();
        println!("  {pos}. [{mark}] {} ({}) #{}{branch}", i.title, i.stage.as_str(), i.id);
    }
}

pub fn print_dependencies(deps: &[DependencyRef]) {
    for d in deps {
        let link = d.id.map(|id| format!(", link #{id}")).unwrap_or_default();
        println!("  [{}] {} (#{}{link})", d.status.as_str(), d.title, d.depends_on_id);
    }
}

pub fn print_stats(s: &DashboardStats) {
    println!("Tasks: {}", s.total_tasks);
    println!(
        "  todo={} in_progress={} done={} blocked={}",
        s.todo_tasks, s.in_progress_tasks, s.done_tasks, s.blocked_tasks
    );
    println!("  overdue={} upcoming={}", s.overdue_tasks, s.upcoming_tasks);
    println!(
        "Checklist: {:.1}% ({}/{})",
        s.checklist_completion_rate, s.completed_checklist_items, s.total_checklist_items
    );
}

pub fn print_agenda(days: &BTreeMap<NaiveDate, Vec<&Task>>, today: NaiveDate) {
    if days.is_empty() {
        println!("Nothing scheduled.");
        return;
    }
    for (date, tasks) in days {
        let marker = if *date == today { " (today)" } else { "" };
        println!("{}{marker}", date.format("%a %Y-%m-%d"));
        for t in tasks {
            println!("  [{}] {} (#{}){}", t.status.as_str(), t.title, t.id, flags(t, today));
        }
    }
}
