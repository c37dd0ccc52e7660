use chrono::{NaiveDate, Utc};
use sprint_capacity::{
    InMemoryRepository, PlanCache, PlannerConfig, SprintPlanner, WorkItem, load_items_from_csv,
    load_items_from_json, save_items_to_csv, save_items_to_json, select_load_bearing_items,
    validation,
};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            if cell.len() > widths[ci] {
                widths[ci] = cell.len();
            }
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

fn render_row<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for (ci, cell) in cells.enumerate() {
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(widths[ci].saturating_sub(cell.len())));
        line.push_str(" |");
    }
    line
}

fn render_items(items: &[WorkItem]) -> String {
    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|item| {
            vec![
                item.id.clone(),
                item.status.to_string(),
                item.story_points.map(|p| p.to_string()).unwrap_or_default(),
                item.sprint_id.clone().unwrap_or_default(),
                item.due_date.map(|d| d.to_string()).unwrap_or_default(),
                item.assignees.iter().cloned().collect::<Vec<_>>().join(","),
                if item.is_deleted() { "yes" } else { "" }.to_string(),
            ]
        })
        .collect();
    render_text_table(
        &["id", "status", "points", "sprint", "due", "assignees", "deleted"],
        &rows,
    )
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_points(field: &str, s: &str) -> Result<i64, String> {
    let value: f64 = s.parse().map_err(|_| format!("{field} must be a number"))?;
    let points = validation::points_from_f64(field, value).map_err(|e| e.to_string())?;
    i64::try_from(points).map_err(|_| format!("{field} is out of range"))
}

fn parse_capacity(s: &str) -> Result<i64, String> {
    let value: f64 = s.parse().map_err(|_| "capacity must be a number".to_string())?;
    validation::capacity_from_f64(value).map_err(|e| e.to_string())
}

fn print_help() {
    println!(
        "Commands:\n  help                                         Show this help\n  load <json|csv> <path>                       Load a work item snapshot\n  save <json|csv> <path>                       Write the current snapshot\n  items                                        Show all loaded work items\n  capacity [points]                            Show or set daily capacity\n  select <sprint> <YYYY-MM-DD>                 Show load-bearing items for a sprint\n  plan <current> <new> [capacity] [YYYY-MM-DD] Plan new work on top of today's points\n  sprint <sprint> <YYYY-MM-DD> <new>           Plan new work against a sprint\n  assignees <sprint> <YYYY-MM-DD> <new>        Plan new work per assignee\n  backlog <project>                            Open points not yet in a sprint\n  quit|exit                                    Exit"
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = match PlannerConfig::load(None) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };
    let mut daily_capacity = config.daily_capacity;
    let cache = PlanCache::with_capacity(config.cache_capacity);
    let mut repository = InMemoryRepository::new();

    println!("Sprint Capacity (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "items" => println!("{}", render_items(repository.items())),
            "load" => match (parts.next(), parts.next()) {
                (Some(format), Some(path)) => {
                    let loaded = match format {
                        "json" => load_items_from_json(path),
                        "csv" => load_items_from_csv(path),
                        _ => {
                            println!("Unknown format '{format}' (expected json or csv)");
                            continue;
                        }
                    };
                    match loaded.and_then(InMemoryRepository::from_items) {
                        Ok(loaded) => {
                            repository = loaded;
                            println!("Loaded {} work items from {path}.", repository.len());
                        }
                        Err(e) => println!("Error loading snapshot: {e}"),
                    }
                }
                _ => println!("Usage: load <json|csv> <path>"),
            },
            "save" => match (parts.next(), parts.next()) {
                (Some(format), Some(path)) => {
                    let saved = match format {
                        "json" => save_items_to_json(repository.items(), path),
                        "csv" => save_items_to_csv(repository.items(), path),
                        _ => {
                            println!("Unknown format '{format}' (expected json or csv)");
                            continue;
                        }
                    };
                    match saved {
                        Ok(()) => println!("Saved {} work items to {path}.", repository.len()),
                        Err(e) => println!("Error saving snapshot: {e}"),
                    }
                }
                _ => println!("Usage: save <json|csv> <path>"),
            },
            "capacity" => match parts.next() {
                None => println!("Daily capacity: {daily_capacity}"),
                Some(raw) => match parse_capacity(raw) {
                    Ok(value) => {
                        daily_capacity = value;
                        println!("Daily capacity set to {daily_capacity}.");
                    }
                    Err(e) => println!("Error: {e}"),
                },
            },
            "select" => match (parts.next(), parts.next().and_then(parse_date)) {
                (Some(sprint), Some(anchor)) => {
                    let set = select_load_bearing_items(repository.items(), sprint, anchor);
                    let rows: Vec<Vec<String>> = set
                        .iter()
                        .map(|item| {
                            vec![
                                item.id.clone(),
                                item.story_points.to_string(),
                                item.due_date.map(|d| d.to_string()).unwrap_or_default(),
                                if item.is_committed_on(anchor) { "yes" } else { "" }.to_string(),
                            ]
                        })
                        .collect();
                    println!(
                        "{}",
                        render_text_table(&["id", "points", "due", "today"], &rows)
                    );
                    println!(
                        "{} load-bearing items, today={}, backlog={}",
                        set.len(),
                        set.current_day_points(),
                        set.backlog_points()
                    );
                }
                _ => println!("Usage: select <sprint> <YYYY-MM-DD>"),
            },
            "plan" => {
                let args: Vec<&str> = parts.collect();
                if args.len() < 2 {
                    println!("Usage: plan <current> <new> [capacity] [YYYY-MM-DD]");
                    continue;
                }
                let current = match parse_points("currentDayPoints", args[0]) {
                    Ok(v) => v,
                    Err(e) => {
                        println!("Error: {e}");
                        continue;
                    }
                };
                let new_work = match parse_points("newWorkPoints", args[1]) {
                    Ok(v) => v,
                    Err(e) => {
                        println!("Error: {e}");
                        continue;
                    }
                };
                let capacity = match args.get(2) {
                    Some(raw) => match parse_capacity(raw) {
                        Ok(v) => v,
                        Err(e) => {
                            println!("Error: {e}");
                            continue;
                        }
                    },
                    None => daily_capacity,
                };
                let anchor = match args.get(3) {
                    Some(raw) => match parse_date(raw) {
                        Some(d) => d,
                        None => {
                            println!("Invalid date (YYYY-MM-DD)");
                            continue;
                        }
                    },
                    None => Utc::now().date_naive(),
                };
                match cache.plan(anchor, current, new_work, capacity) {
                    Ok(plan) => println!("Plan: {}", plan.to_cli_summary()),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "sprint" | "assignees" => {
                let sprint = parts.next();
                let anchor = parts.next().and_then(parse_date);
                let new_work = parts.next();
                let (Some(sprint), Some(anchor), Some(new_work)) = (sprint, anchor, new_work)
                else {
                    println!("Usage: {cmd} <sprint> <YYYY-MM-DD> <new>");
                    continue;
                };
                let new_work = match parse_points("newWorkPoints", new_work) {
                    Ok(v) => v,
                    Err(e) => {
                        println!("Error: {e}");
                        continue;
                    }
                };
                let planner = SprintPlanner::with_daily_capacity(&repository, daily_capacity);
                if cmd == "sprint" {
                    match planner.plan_sprint(sprint, anchor, new_work) {
                        Ok(result) => println!(
                            "Sprint {} ({} load-bearing, backlog={}): {}",
                            result.sprint_id,
                            result.load_bearing_count,
                            result.backlog_points,
                            result.plan.to_cli_summary()
                        ),
                        Err(e) => println!("Error: {e}"),
                    }
                } else {
                    match planner.plan_assignees(sprint, anchor, new_work) {
                        Ok(result) => {
                            for (assignee, plan) in &result.plans {
                                println!("{assignee}: {}", plan.to_cli_summary());
                            }
                            match result.suggested_assignee {
                                Some(name) => println!("Suggested assignee: {name}"),
                                None => println!("No assignees in sprint {sprint}."),
                            }
                        }
                        Err(e) => println!("Error: {e}"),
                    }
                }
            }
            "backlog" => match parts.next() {
                Some(project) => {
                    let planner = SprintPlanner::with_daily_capacity(&repository, daily_capacity);
                    match planner.unplanned_points(project) {
                        Ok(points) => println!("Unplanned points in {project}: {points}"),
                        Err(e) => println!("Error: {e}"),
                    }
                }
                None => println!("Usage: backlog <project>"),
            },
            _ => println!("Unknown command '{cmd}'. Type 'help' for commands."),
        }
    }

    tracing::debug!(hits = cache.hits(), misses = cache.misses(), "plan cache usage");
}
