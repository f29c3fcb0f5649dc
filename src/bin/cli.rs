use chrono::NaiveDate;
use polars::prelude::{AnyValue, DataFrame, PolarsResult};
use std::fs;
use std::io::{self, Write};
use std::str::FromStr;
use timeline_scheduler::{
    ChartWindow, CsvSnapshotFiles, Developer, JsonSnapshotFile, PlanningSnapshot,
    SchedulableItem, SchedulerConfig, SnapshotSource, TimeScale, TimelineReport, WorkCalendar,
    WorkCalendarConfig, compute_timelines, conflicts_frame, logging::init_tracing,
    save_report_to_json, save_snapshot_to_csv, save_snapshot_to_json, save_timelines_to_csv,
    timelines_frame,
};

const CHART_WIDTH: usize = 50;

fn format_cell(value: &AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::Float64(v) => format!("{v:.2}"),
        other => other.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();
    let mut cells: Vec<Vec<String>> = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let row = columns
            .iter()
            .map(|col| {
                col.get(row_idx)
                    .map(|av| format_cell(&av))
                    .unwrap_or_default()
            })
            .collect();
        cells.push(row);
    }

    let mut widths: Vec<usize> = names.iter().map(|n| n.len()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |values: &[String]| {
        let mut line = String::from("|");
        for (ci, value) in values.iter().enumerate() {
            line.push(' ');
            line.push_str(value);
            line.push_str(&" ".repeat(widths[ci].saturating_sub(value.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn developers_frame(snapshot: &PlanningSnapshot) -> PolarsResult<DataFrame> {
    let ids: Vec<String> = snapshot.developers.iter().map(|d| d.id.clone()).collect();
    let names: Vec<String> = snapshot.developers.iter().map(|d| d.name.clone()).collect();
    let hours: Vec<f64> = snapshot
        .developers
        .iter()
        .map(|d| d.weekly_capacity_hours)
        .collect();
    polars::df!(
        "id" => ids,
        "name" => names,
        "weekly_hours" => hours
    )
}

fn items_frame(snapshot: &PlanningSnapshot) -> PolarsResult<DataFrame> {
    let ids: Vec<String> = snapshot.items.iter().map(|i| i.id.clone()).collect();
    let names: Vec<String> = snapshot.items.iter().map(|i| i.name.clone()).collect();
    let effort: Vec<f64> = snapshot.items.iter().map(|i| i.man_days).collect();
    let starts: Vec<String> = snapshot
        .items
        .iter()
        .map(|i| i.start_date.map(|d| d.to_string()).unwrap_or_default())
        .collect();
    let assignees: Vec<String> = snapshot
        .items
        .iter()
        .map(|i| i.assigned_developer_ids.join(","))
        .collect();
    polars::df!(
        "id" => ids,
        "name" => names,
        "man_days" => effort,
        "start_date" => starts,
        "developers" => assignees
    )
}

fn print_frame(frame: PolarsResult<DataFrame>) {
    match frame {
        Ok(df) => println!("{}", render_df_as_text_table(&df)),
        Err(e) => println!("Error building table: {}", e),
    }
}

fn print_snapshot(snapshot: &PlanningSnapshot) {
    println!("Developers:");
    print_frame(developers_frame(snapshot));
    println!("Items:");
    print_frame(items_frame(snapshot));
}

fn print_help() {
    println!(
        "Commands:\n  help                                       Show this help\n  show                                       Show developers and items\n  dev add <id> <weekly_hours> [name...]      Upsert a developer\n  dev rm <id>                                Remove a developer and its assignments\n  item add <id> <man_days> <YYYY-MM-DD|-> <devs_csv|-> [name...]\n                                             Upsert an item (devs like a,b)\n  item rm <id>                               Remove an item\n  compute                                    Compute timelines\n  conflicts                                  List capacity conflicts\n  chart <day|week|month>                     Draw a text Gantt chart\n  calendar show                              Display working days and holidays\n  calendar weekdays                          Reset to Monday-Friday, no holidays\n  calendar set <json_path>                   Load calendar config from JSON file\n  calendar save <json_path>                  Save calendar config to JSON file\n  config show                                Display scheduler configuration\n  config load <json_path>                    Load scheduler configuration\n  load json <path>                           Load snapshot from JSON\n  load csv <developers_path> <items_path>    Load snapshot from two CSV files\n  load sqlite <path>                         Load snapshot from a SQLite database\n  save json <path>                           Save snapshot to JSON\n  save csv <developers_path> <items_path>    Save snapshot to two CSV files\n  export <json|csv> <path>                   Compute and export timelines\n  quit|exit                                  Exit"
    );
}

fn print_calendar_info(config: &WorkCalendarConfig) {
    let working_days = config
        .working_days()
        .iter()
        .map(|wd| wd.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let holidays = config
        .holidays()
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    println!("Working days       : {}", working_days);
    println!("Holidays           : {}", holidays);
}

fn print_report(report: &TimelineReport) {
    println!("Computed ({})", report.to_cli_summary());
    print_frame(timelines_frame(report));
    for diagnostic in &report.diagnostics {
        println!("warning: {}", diagnostic);
    }
}

fn print_chart(report: &TimelineReport, scale: TimeScale) {
    let Some(window) = ChartWindow::from_timelines(&report.timelines, scale) else {
        println!("Nothing to chart.");
        return;
    };
    let label_width = report
        .timelines
        .iter()
        .map(|t| t.item_id.len())
        .max()
        .unwrap_or(0);
    let to_col = |percent: f64| ((percent / 100.0) * CHART_WIDTH as f64).round() as usize;

    println!("{} .. {} ({})", window.start(), window.end(), scale);
    let ticks = window.ticks();
    let mut axis = vec![' '; CHART_WIDTH];
    for tick in &ticks {
        let col = to_col(tick.position).min(CHART_WIDTH - 1);
        axis[col] = '+';
    }
    println!(
        "{:label_width$} |{}|",
        "",
        axis.into_iter().collect::<String>()
    );

    for timeline in &report.timelines {
        let geometry = window.bar(timeline);
        let start = to_col(geometry.left).min(CHART_WIDTH);
        let end = to_col(geometry.left + geometry.width).clamp(start, CHART_WIDTH);
        let conflicted = report
            .conflicts
            .iter()
            .any(|c| c.item_ids.contains(&timeline.item_id));
        let fill = if conflicted { '!' } else { '#' };
        let mut row = vec![' '; CHART_WIDTH];
        if end > start {
            row[start..end].iter_mut().for_each(|c| *c = fill);
        } else if start < CHART_WIDTH {
            row[start] = '|';
        }
        println!(
            "{:label_width$} |{}| {} -> {}",
            timeline.item_id,
            row.into_iter().collect::<String>(),
            timeline.start_date,
            timeline.end_date
        );
    }
    let labels = ticks
        .iter()
        .map(|t| t.label.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    println!("Ticks: {}", labels);
}

fn parse_list(input: &str) -> Vec<String> {
    if input == "-" {
        return Vec::new();
    }
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn rest_of_line<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.collect::<Vec<_>>().join(" ")
}

fn main() {
    init_tracing("warn");

    let mut snapshot = PlanningSnapshot::default();
    let mut config = SchedulerConfig::default();

    println!("Timeline Scheduler (CLI) - type 'help' for commands\n");

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
            "show" => print_snapshot(&snapshot),
            "dev" => match parts.next() {
                Some("add") => {
                    let (Some(id), Some(hours_s)) = (parts.next(), parts.next()) else {
                        println!("Usage: dev add <id> <weekly_hours> [name...]");
                        continue;
                    };
                    let hours: f64 = match hours_s.parse() {
                        Ok(v) => v,
                        Err(_) => {
                            println!("Invalid weekly_hours");
                            continue;
                        }
                    };
                    let developer = Developer::new(id, hours).with_name(rest_of_line(parts));
                    if snapshot.upsert_developer(developer) {
                        println!("Developer {id} added.");
                    } else {
                        println!("Developer {id} updated.");
                    }
                }
                Some("rm") => match parts.next() {
                    Some(id) if snapshot.remove_developer(id) => {
                        println!("Developer {id} removed.")
                    }
                    Some(id) => println!("Developer {id} not found."),
                    None => println!("Usage: dev rm <id>"),
                },
                _ => println!("Usage: dev add <id> <weekly_hours> [name...] | dev rm <id>"),
            },
            "item" => match parts.next() {
                Some("add") => {
                    let (Some(id), Some(effort_s), Some(date_s), Some(devs_s)) =
                        (parts.next(), parts.next(), parts.next(), parts.next())
                    else {
                        println!(
                            "Usage: item add <id> <man_days> <YYYY-MM-DD|-> <devs_csv|-> [name...]"
                        );
                        continue;
                    };
                    let man_days: f64 = match effort_s.parse() {
                        Ok(v) => v,
                        Err(_) => {
                            println!("Invalid man_days");
                            continue;
                        }
                    };
                    let start_date = if date_s == "-" {
                        None
                    } else {
                        match NaiveDate::parse_from_str(date_s, "%Y-%m-%d") {
                            Ok(d) => Some(d),
                            Err(_) => {
                                println!("Invalid date (YYYY-MM-DD)");
                                continue;
                            }
                        }
                    };
                    let mut item = SchedulableItem::new(id, man_days)
                        .assigned_to(parse_list(devs_s))
                        .with_name(rest_of_line(parts));
                    item.start_date = start_date;
                    if snapshot.upsert_item(item) {
                        println!("Item {id} added.");
                    } else {
                        println!("Item {id} updated.");
                    }
                }
                Some("rm") => match parts.next() {
                    Some(id) if snapshot.remove_item(id) => println!("Item {id} removed."),
                    Some(id) => println!("Item {id} not found."),
                    None => println!("Usage: item rm <id>"),
                },
                _ => println!("Usage: item add ... | item rm <id>"),
            },
            "compute" => {
                let report = compute_timelines(&snapshot, &config);
                print_report(&report);
            }
            "conflicts" => {
                let report = compute_timelines(&snapshot, &config);
                if report.conflicts.is_empty() {
                    println!("No capacity conflicts.");
                } else {
                    print_frame(conflicts_frame(&report));
                }
            }
            "chart" => {
                let scale = match parts.next().map(TimeScale::from_str) {
                    None => TimeScale::default(),
                    Some(Ok(scale)) => scale,
                    Some(Err(e)) => {
                        println!("{}", e);
                        continue;
                    }
                };
                let report = compute_timelines(&snapshot, &config);
                print_chart(&report, scale);
            }
            "calendar" => match parts.next() {
                Some("show") | None => print_calendar_info(&config.calendar),
                Some("weekdays") => {
                    config.calendar = WorkCalendarConfig::default();
                    println!("Calendar reset to Monday-Friday.");
                    print_calendar_info(&config.calendar);
                }
                Some("set") => match parts.next() {
                    Some(path) => match fs::read_to_string(path) {
                        Ok(contents) => match serde_json::from_str::<WorkCalendarConfig>(&contents)
                        {
                            Ok(calendar) => match WorkCalendar::from_config(&calendar) {
                                Ok(_) => {
                                    config.calendar = calendar;
                                    println!("Calendar updated from {}.", path);
                                    print_calendar_info(&config.calendar);
                                }
                                Err(e) => println!("Error applying calendar: {}", e),
                            },
                            Err(e) => println!("Invalid calendar JSON: {}", e),
                        },
                        Err(e) => println!("Error reading {}: {}", path, e),
                    },
                    None => println!("Usage: calendar set <json_path>"),
                },
                Some("save") => match parts.next() {
                    Some(path) => match serde_json::to_string_pretty(&config.calendar) {
                        Ok(json) => match fs::write(path, json) {
                            Ok(_) => println!("Calendar saved to {}.", path),
                            Err(e) => println!("Error writing {}: {}", path, e),
                        },
                        Err(e) => println!("Error serializing calendar: {}", e),
                    },
                    None => println!("Usage: calendar save <json_path>"),
                },
                Some(other) => {
                    println!("Unknown calendar command '{}'.", other);
                    println!("Usage: calendar show|weekdays|set <json_path>|save <json_path>");
                }
            },
            "config" => match parts.next() {
                Some("show") | None => match serde_json::to_string_pretty(&config) {
                    Ok(json) => println!("{}", json),
                    Err(e) => println!("Error serializing config: {}", e),
                },
                Some("load") => match parts.next() {
                    Some(path) => match SchedulerConfig::from_json_file(path) {
                        Ok(loaded) => {
                            config = loaded;
                            println!("Config loaded from {}.", path);
                        }
                        Err(e) => println!("Error loading config: {}", e),
                    },
                    None => println!("Usage: config load <json_path>"),
                },
                Some(other) => {
                    println!("Unknown config command '{}'.", other);
                    println!("Usage: config show|load <json_path>");
                }
            },
            "load" => {
                let loaded = match (parts.next(), parts.next(), parts.next()) {
                    (Some("json"), Some(path), _) => JsonSnapshotFile::new(path).load_snapshot(),
                    (Some("csv"), Some(devs), Some(items)) => {
                        CsvSnapshotFiles::new(devs, items).load_snapshot()
                    }
                    #[cfg(feature = "sqlite")]
                    (Some("sqlite"), Some(path), _) => {
                        timeline_scheduler::SqliteSnapshotSource::open(path)
                            .and_then(|source| source.load_snapshot())
                    }
                    _ => {
                        println!(
                            "Usage: load json <path> | load csv <developers> <items> | load sqlite <path>"
                        );
                        continue;
                    }
                };
                match loaded {
                    Ok(loaded) => {
                        snapshot = loaded;
                        println!(
                            "Snapshot loaded ({} developers, {} items).",
                            snapshot.developers.len(),
                            snapshot.items.len()
                        );
                    }
                    Err(e) => println!("Error loading snapshot: {}", e),
                }
            }
            "save" => {
                let result = match (parts.next(), parts.next(), parts.next()) {
                    (Some("json"), Some(path), _) => save_snapshot_to_json(&snapshot, path),
                    (Some("csv"), Some(devs), Some(items)) => {
                        save_snapshot_to_csv(&snapshot, devs, items)
                    }
                    _ => {
                        println!("Usage: save json <path> | save csv <developers> <items>");
                        continue;
                    }
                };
                match result {
                    Ok(_) => println!("Snapshot saved."),
                    Err(e) => println!("Error saving snapshot: {}", e),
                }
            }
            "export" => {
                let report = compute_timelines(&snapshot, &config);
                let result = match (parts.next(), parts.next()) {
                    (Some("json"), Some(path)) => save_report_to_json(&report, path),
                    (Some("csv"), Some(path)) => save_timelines_to_csv(&report, path),
                    _ => {
                        println!("Usage: export <json|csv> <path>");
                        continue;
                    }
                };
                match result {
                    Ok(_) => println!("Report exported ({}).", report.to_cli_summary()),
                    Err(e) => println!("Error exporting report: {}", e),
                }
            }
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}
