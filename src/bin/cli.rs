use anyhow::Context;
use chrono::{Duration, Local, NaiveDate, Utc};
use course_planner::{
    AppConfig, BackupPayload, DayView, Schedule, ScheduleStore, calendar::parse_iso_date, ingest,
    load_schedule_from_csv, logging, read_backup, save_schedule_to_csv, save_schedule_to_json,
    write_backup,
};
use std::fs;
use std::io::{self, BufRead, Write};

fn render_row<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for (ci, cell) in cells.enumerate() {
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(widths[ci].saturating_sub(cell.chars().count())));
        line.push_str(" |");
    }
    line
}

fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&widths, headers.iter().copied()));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(&widths, row.iter().map(String::as_str)));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn render_schedule(schedule: &Schedule) -> String {
    let mut rows = Vec::new();
    for (di, entry) in schedule.entries().iter().enumerate() {
        for (ci, course) in entry.courses.iter().enumerate() {
            rows.push(vec![
                di.to_string(),
                ci.to_string(),
                entry.day.clone(),
                if entry.is_date { "date" } else { "weekly" }.to_string(),
                course.name.clone(),
                course.time.clone().unwrap_or_default(),
                course.topics.join(", "),
                course.note.clone().unwrap_or_default(),
            ]);
        }
    }
    render_text_table(
        &["day#", "course#", "day", "kind", "name", "time", "topics", "note"],
        &rows,
    )
}

fn render_view(view: &DayView) -> String {
    let mut out = format!("{} {} ({} courses)\n", view.weekday, view.date, view.items.len());
    for item in &view.items {
        out.push_str(&format!("  [{}:{}] {}", item.day_index, item.course_index, item.course.name));
        if let Some(time) = &item.course.time {
            out.push_str(&format!(" ({time})"));
        }
        if !item.course.topics.is_empty() {
            out.push_str(&format!(" - {}", item.course.topics.join(", ")));
        }
        if let Some(note) = &item.course.note {
            out.push_str(&format!(" | {note}"));
        }
        out.push('\n');
    }
    out
}

fn print_config(store: &ScheduleStore) {
    let week = store.locale().school_week();
    let names = store.course_names();
    if names.is_empty() {
        println!("No courses yet. Merge a schedule first.");
        return;
    }
    let rows: Vec<Vec<String>> = names
        .iter()
        .map(|name| {
            let mut row = vec![name.clone()];
            row.extend(week.iter().map(|day| {
                if store.is_day_selected(name, day) { "x" } else { "" }.to_string()
            }));
            row
        })
        .collect();
    let mut headers = vec!["course"];
    headers.extend(week.iter().copied());
    println!("{}", render_text_table(&headers, &rows));
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show the whole schedule\n  today                              View today\n  date <YYYY-MM-DD>                  View a specific date\n  next | prev                        Move the viewed date by one day\n  courses                            List course names\n  config                             Show which weekdays each course is visible on\n  toggle <day> <course...>           Toggle a weekday for a course\n  merge <json_path>                  Merge a parsed schedule fragment\n  load csv <path>                    Merge a schedule from CSV\n  save <json|csv> <path>             Write the schedule to disk\n  import <backup_path>               Restore a backup (overwrites everything)\n  export <dir>                       Write a backup file into a directory\n  delete <day#> <course#>            Delete one course occurrence\n  purge <course...>                  Delete a course everywhere\n  clear                              Delete all data\n  quit|exit                          Exit"
    );
}

fn confirm(lines: &mut impl Iterator<Item = io::Result<String>>, prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    let _ = io::stdout().flush();
    match lines.next() {
        Some(Ok(answer)) => matches!(
            answer.trim().to_lowercase().as_str(),
            "y" | "yes" | "e" | "evet"
        ),
        _ => false,
    }
}

fn main() -> anyhow::Result<()> {
    logging::init_tracing("warn");

    let config = AppConfig::from_env().context("failed to read configuration")?;
    let backend = config.open_backend().context("failed to open storage backend")?;
    let mut store = ScheduleStore::open(backend, config.locale).context("failed to load schedule")?;
    let mut current: NaiveDate = Local::now().date_naive();

    println!("Course Planner (CLI) - type 'help' for commands\n");
    println!("{}", render_view(&store.view_for_date(current)));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        let line = match lines.next() {
            Some(Ok(line)) => line,
            _ => break,
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => println!("{}", render_schedule(store.schedule())),
            "today" => {
                current = Local::now().date_naive();
                println!("{}", render_view(&store.view_for_date(current)));
            }
            "next" | "prev" => {
                let step = if cmd == "next" { 1 } else { -1 };
                current += Duration::days(step);
                println!("{}", render_view(&store.view_for_date(current)));
            }
            "date" => match parts.next().and_then(parse_iso_date) {
                Some(date) => {
                    current = date;
                    println!("{}", render_view(&store.view_for_date(current)));
                }
                None => println!("Usage: date <YYYY-MM-DD>"),
            },
            "courses" => {
                for name in store.course_names() {
                    println!("  {name}");
                }
            }
            "config" => print_config(&store),
            "toggle" => {
                let day = parts.next();
                let course = parts.collect::<Vec<_>>().join(" ");
                match day {
                    Some(day) if !course.is_empty() => match store.toggle_day(&course, day) {
                        Ok(days) => println!("{course} is shown on: [{}]", days.join(", ")),
                        Err(e) => println!("Error: {e}"),
                    },
                    _ => println!("Usage: toggle <day> <course...>"),
                }
            }
            "merge" => match parts.next() {
                Some(path) => {
                    let result = fs::read_to_string(path)
                        .map_err(anyhow::Error::from)
                        .and_then(|text| Ok(serde_json::from_str::<serde_json::Value>(&text)?))
                        .and_then(|value| Ok(ingest::normalize_schedule(&value)?))
                        .and_then(|fragment| Ok(store.merge_schedule(fragment)?));
                    match result {
                        Ok(summary) => println!(
                            "Merged {path}: {} new day(s), {} extended, {} course(s).",
                            summary.days_added, summary.days_extended, summary.courses_added
                        ),
                        Err(e) => println!("Error: {e}"),
                    }
                }
                None => println!("Usage: merge <json_path>"),
            },
            "load" => match (parts.next(), parts.next()) {
                (Some("csv"), Some(path)) => {
                    let result = load_schedule_from_csv(path)
                        .map_err(anyhow::Error::from)
                        .and_then(|fragment| Ok(store.merge_schedule(fragment)?));
                    match result {
                        Ok(summary) => println!(
                            "Merged {path}: {} new day(s), {} extended, {} course(s).",
                            summary.days_added, summary.days_extended, summary.courses_added
                        ),
                        Err(e) => println!("Error: {e}"),
                    }
                }
                _ => println!("Usage: load csv <path>"),
            },
            "save" => match (parts.next(), parts.next()) {
                (Some(kind @ ("json" | "csv")), Some(path)) => {
                    let result = if kind == "json" {
                        save_schedule_to_json(store.schedule(), path)
                    } else {
                        save_schedule_to_csv(store.schedule(), path)
                    };
                    match result {
                        Ok(()) => println!("Schedule saved to {path}."),
                        Err(e) => println!("Error: {e}"),
                    }
                }
                _ => println!("Usage: save <json|csv> <path>"),
            },
            "import" => match parts.next() {
                Some(path) => match read_backup(path).and_then(|backup| store.restore(backup)) {
                    Ok(()) => println!(
                        "Backup restored from {path}: {} day(s), {} course(s).",
                        store.schedule().len(),
                        store.schedule().course_count()
                    ),
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: import <backup_path>"),
            },
            "export" => match parts.next() {
                Some(dir) => {
                    let payload = BackupPayload::new(store.schedule(), store.day_config(), Utc::now());
                    match write_backup(dir, &payload) {
                        Ok(path) => println!("Backup written to {}.", path.display()),
                        Err(e) => println!("Error: {e}"),
                    }
                }
                None => println!("Usage: export <dir>"),
            },
            "delete" => {
                let indices = (
                    parts.next().and_then(|s| s.parse::<usize>().ok()),
                    parts.next().and_then(|s| s.parse::<usize>().ok()),
                );
                let (Some(day_index), Some(course_index)) = indices else {
                    println!("Usage: delete <day#> <course#>");
                    continue;
                };
                if !confirm(&mut lines, "Remove this course from the list?") {
                    println!("Cancelled.");
                    continue;
                }
                match store.delete_instance(day_index, course_index) {
                    Ok(true) => println!("Deleted course at day {day_index}, position {course_index}."),
                    Ok(false) => println!("Nothing to delete at day {day_index}, position {course_index}."),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "purge" => {
                let course = parts.collect::<Vec<_>>().join(" ");
                if course.is_empty() {
                    println!("Usage: purge <course...>");
                    continue;
                }
                if !confirm(&mut lines, &format!("Delete '{course}' everywhere?")) {
                    println!("Cancelled.");
                    continue;
                }
                match store.delete_course_everywhere(&course) {
                    Ok(removed) => println!("Removed {removed} occurrence(s) of '{course}'."),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "clear" => {
                if !confirm(&mut lines, "Delete the whole schedule?") {
                    println!("Cancelled.");
                    continue;
                }
                match store.clear() {
                    Ok(()) => println!("All data cleared."),
                    Err(e) => println!("Error: {e}"),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
    Ok(())
}
