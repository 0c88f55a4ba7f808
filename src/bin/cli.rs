use std::io::{self, Write};

use devplan::{
    Epic, PlanDocument, PlanScheduler, PreassignedSprintPolicy, Story, Task, TeamMember, dates,
    params::MAX_WEEKS_PER_SPRINT,
    load_plan_from_json, load_team_from_csv, save_assignments_to_csv, save_plan_to_json,
};
use tracing_subscriber::EnvFilter;

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            if cell.len() > widths[ci] {
                widths[ci] = cell.len();
            }
        }
    }

    let mut sep = String::new();
    sep.push('+');
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let push_row = |out: &mut String, cells: &[String]| {
        out.push('|');
        for (ci, cell) in cells.iter().enumerate() {
            out.push(' ');
            out.push_str(cell);
            let pad = widths[ci].saturating_sub(cell.len());
            if pad > 0 {
                out.push_str(&" ".repeat(pad));
            }
            out.push_str(" |");
        }
        out.push('\n');
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    push_row(&mut out, &header_cells);
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        push_row(&mut out, row);
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn render_tree(doc: &PlanDocument) -> String {
    let mut rows = Vec::new();
    for epic in &doc.plan.epics {
        rows.push(vec![
            epic.key.clone(),
            "epic".into(),
            epic.name.clone(),
            epic.story_point.to_string(),
            String::new(),
            String::new(),
        ]);
        for story in &epic.stories {
            rows.push(vec![
                story.key.clone(),
                "story".into(),
                format!("  {}", story.name),
                story.story_point.to_string(),
                String::new(),
                String::new(),
            ]);
            for task in &story.tasks {
                rows.push(vec![
                    task.key.clone(),
                    "task".into(),
                    format!("    {}", task.name),
                    task.story_point.to_string(),
                    task.sprint_key.clone().unwrap_or_default(),
                    task.assignee.clone().unwrap_or_default(),
                ]);
            }
        }
    }
    render_table(&["key", "kind", "name", "points", "sprint", "assignee"], &rows)
}

fn render_team(doc: &PlanDocument) -> String {
    let rows: Vec<Vec<String>> = doc
        .params
        .team_members
        .iter()
        .map(|m| {
            vec![
                m.user_id.clone(),
                m.specialty.to_string(),
                m.story_points_per_sprint.to_string(),
            ]
        })
        .collect();
    render_table(&["user_id", "specialty", "points_per_sprint"], &rows)
}

fn render_sprints(doc: &PlanDocument) -> String {
    let mut rows = Vec::new();
    for sprint in &doc.plan.sprints {
        for story in &sprint.stories {
            for task in &story.tasks {
                rows.push(vec![
                    sprint.name.clone(),
                    format!(
                        "{}..{}",
                        dates::format_date(sprint.start_date),
                        dates::format_date(sprint.end_date)
                    ),
                    story.epic_name.clone(),
                    task.name.clone(),
                    task.story_point.to_string(),
                    task.assignee.clone(),
                    format!(
                        "{}..{}",
                        dates::format_date(task.start_date),
                        dates::format_date(task.end_date)
                    ),
                ]);
            }
        }
    }
    render_table(
        &["sprint", "dates", "epic", "task", "points", "assignee", "task_dates"],
        &rows,
    )
}

fn render_milestones(doc: &PlanDocument) -> String {
    let mut rows = Vec::new();
    for milestone in &doc.plan.milestones {
        for epic in &milestone.epics {
            rows.push(vec![
                milestone.name.clone(),
                format!(
                    "{}..{}",
                    dates::format_date(milestone.start_date),
                    dates::format_date(milestone.end_date)
                ),
                milestone.sprints.join(","),
                epic.name.clone(),
                format!(
                    "{}+{}/{}",
                    epic.prev_story_point, epic.story_point, epic.total_story_point
                ),
            ]);
        }
    }
    render_table(&["milestone", "dates", "sprints", "epic", "progress"], &rows)
}

fn print_help() {
    println!(
        "Commands:\n  help                                   Show this help\n  show                                   Show the work breakdown\n  team                                   Show the roster\n  member <user_id> <points> <specialty>  Add or replace a team member\n  epic   <key> <name...>                 Add an epic\n  story  <epic_key> <key> <name...>      Add a story to an epic\n  task   <story_key> <key> <points> <name...>\n                                         Add a task (name like \"[Backend] Build API\")\n  owner  <task_key> <user_id>            Pin a task to one person\n  weeks  <n>                             Set weeks per sprint\n  start  <YYYY-MM-DD>                    Set the sprint start date\n  policy <reset|keep>                    Pre-assigned sprint handling\n  schedule                               Allocate sprints and milestones\n  sprints                                Show sprint assignments\n  milestones                             Show milestones\n  save json <path>                       Save plan document\n  load json <path>                       Load plan document\n  export csv <path>                      Export task assignments\n  roster csv <path>                      Replace roster from CSV\n  quit|exit                              Exit"
    );
}

/// Keys are unique across epics, stories and tasks.
fn key_in_use(epics: &[Epic], key: &str) -> bool {
    epics.iter().any(|epic| {
        epic.key == key
            || epic.stories.iter().any(|story| {
                story.key == key || story.tasks.iter().any(|task| task.key == key)
            })
    })
}

fn find_story_mut<'a>(epics: &'a mut [Epic], key: &str) -> Option<&'a mut Story> {
    epics
        .iter_mut()
        .flat_map(|epic| epic.stories.iter_mut())
        .find(|story| story.key == key)
}

fn find_task_mut<'a>(epics: &'a mut [Epic], key: &str) -> Option<&'a mut Task> {
    epics
        .iter_mut()
        .flat_map(|epic| epic.stories.iter_mut())
        .flat_map(|story| story.tasks.iter_mut())
        .find(|task| task.key == key)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("devplan=warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    let mut doc = PlanDocument::default();
    let scheduler = PlanScheduler::new();

    println!("Development Plan Scheduler (CLI) - type 'help' for commands\n");

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
            "show" => println!("{}", render_tree(&doc)),
            "team" => println!("{}", render_team(&doc)),
            "sprints" => println!("{}", render_sprints(&doc)),
            "milestones" => println!("{}", render_milestones(&doc)),
            "member" => {
                let user = parts.next();
                let points = parts.next();
                let specialty: Vec<&str> = parts.collect();
                match (user, points, !specialty.is_empty()) {
                    (Some(user), Some(points), true) => {
                        let points: f64 = match points.parse() {
                            Ok(v) if v >= 0.0 => v,
                            _ => {
                                println!("Invalid points");
                                continue;
                            }
                        };
                        let member = TeamMember::new(user, specialty.join(" "), points);
                        let team = &mut doc.params.team_members;
                        match team.iter_mut().find(|m| m.user_id == member.user_id) {
                            Some(existing) => *existing = member,
                            None => team.push(member),
                        }
                        println!("Member {} set.\n{}", user, render_team(&doc));
                    }
                    _ => println!("Usage: member <user_id> <points> <specialty>"),
                }
            }
            "epic" => {
                let key = parts.next();
                let name: Vec<&str> = parts.collect();
                match (key, !name.is_empty()) {
                    (Some(key), true) => {
                        if key_in_use(&doc.plan.epics, key) {
                            println!("Key {} already in use.", key);
                            continue;
                        }
                        doc.plan.epics.push(Epic::new(key, name.join(" "), Vec::new()));
                        println!("Epic {} added.", key);
                    }
                    _ => println!("Usage: epic <key> <name...>"),
                }
            }
            "story" => {
                let epic_key = parts.next();
                let key = parts.next();
                let name: Vec<&str> = parts.collect();
                match (epic_key, key, !name.is_empty()) {
                    (Some(epic_key), Some(key), true) => {
                        if key_in_use(&doc.plan.epics, key) {
                            println!("Key {} already in use.", key);
                            continue;
                        }
                        match doc.plan.epics.iter_mut().find(|e| e.key == epic_key) {
                            Some(epic) => {
                                epic.stories.push(Story::new(key, name.join(" "), Vec::new()));
                                println!("Story {} added.", key);
                            }
                            None => println!("Epic {} not found.", epic_key),
                        }
                    }
                    _ => println!("Usage: story <epic_key> <key> <name...>"),
                }
            }
            "task" => {
                let story_key = parts.next();
                let key = parts.next();
                let points = parts.next();
                let name: Vec<&str> = parts.collect();
                match (story_key, key, points, !name.is_empty()) {
                    (Some(story_key), Some(key), Some(points), true) => {
                        let points: u32 = match points.parse() {
                            Ok(v) => v,
                            Err(_) => {
                                println!("Invalid points");
                                continue;
                            }
                        };
                        if key_in_use(&doc.plan.epics, key) {
                            println!("Key {} already in use.", key);
                            continue;
                        }
                        match find_story_mut(&mut doc.plan.epics, story_key) {
                            Some(story) => {
                                story.tasks.push(Task::new(key, name.join(" "), points));
                                devplan::rollup(&mut doc.plan.epics);
                                println!("Task {} added.", key);
                            }
                            None => println!("Story {} not found.", story_key),
                        }
                    }
                    _ => println!("Usage: task <story_key> <key> <points> <name...>"),
                }
            }
            "owner" => match (parts.next(), parts.next()) {
                (Some(task_key), Some(user)) => {
                    match find_task_mut(&mut doc.plan.epics, task_key) {
                        Some(task) => {
                            task.owner = Some(user.to_string());
                            println!("Task {} pinned to {}.", task_key, user);
                        }
                        None => println!("Task {} not found.", task_key),
                    }
                }
                _ => println!("Usage: owner <task_key> <user_id>"),
            },
            "weeks" => match parts.next().map(str::parse::<u32>) {
                Some(Ok(weeks)) if (1..=MAX_WEEKS_PER_SPRINT).contains(&weeks) => {
                    doc.params.weeks_per_sprint = weeks;
                    println!("Weeks per sprint set to {}.", weeks);
                }
                _ => println!("Usage: weeks <n> (1..={})", MAX_WEEKS_PER_SPRINT),
            },
            "start" => match parts.next().and_then(dates::parse_date) {
                Some(date) => {
                    doc.params.sprint_start_date = date;
                    println!("Sprint start date set to {}.", dates::format_date(date));
                }
                None => println!("Invalid date (YYYY-MM-DD)"),
            },
            "policy" => match parts.next() {
                Some("reset") => {
                    doc.params.preassigned_sprint_policy = PreassignedSprintPolicy::Reset;
                    println!("Pre-assigned sprints will be reset.");
                }
                Some("keep") => {
                    doc.params.preassigned_sprint_policy = PreassignedSprintPolicy::Keep;
                    println!("Pre-assigned sprints will be kept.");
                }
                _ => println!("Usage: policy <reset|keep>"),
            },
            "schedule" => {
                let report = scheduler.schedule(doc.plan.clone(), &doc.params);
                println!("Scheduled ({})", report.summary.to_cli_summary());
                if !report.is_complete() {
                    println!(
                        "Dropped tasks: {}",
                        report.dropped_task_keys().join(", ")
                    );
                }
                doc.plan = report.plan;
                println!("{}", render_sprints(&doc));
            }
            "save" | "load" | "export" | "roster" => {
                let format = parts.next();
                let path = parts.next();
                match (cmd, format, path) {
                    ("save", Some("json"), Some(path)) => match save_plan_to_json(&doc, path) {
                        Ok(_) => println!("Plan saved to {}.", path),
                        Err(e) => println!("Save error: {}", e),
                    },
                    ("load", Some("json"), Some(path)) => match load_plan_from_json(path) {
                        Ok(loaded) => {
                            doc = loaded;
                            println!("Plan loaded from {}.", path);
                        }
                        Err(e) => println!("Load error: {}", e),
                    },
                    ("export", Some("csv"), Some(path)) => {
                        match save_assignments_to_csv(&doc.plan, path) {
                            Ok(_) => println!("Assignments exported to {}.", path),
                            Err(e) => println!("Export error: {}", e),
                        }
                    }
                    ("roster", Some("csv"), Some(path)) => match load_team_from_csv(path) {
                        Ok(team) => {
                            doc.params.team_members = team;
                            println!("Roster loaded from {}.\n{}", path, render_team(&doc));
                        }
                        Err(e) => println!("Roster error: {}", e),
                    },
                    _ => println!(
                        "Usage: save json <path> | load json <path> | export csv <path> | roster csv <path>"
                    ),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
