use chrono::NaiveDate;
use devplan::calculations::rollup::is_consistent;
use devplan::{
    Epic, Plan, PlanScheduler, PreassignedSprintPolicy, SchedulingParams, Story, Task, TeamMember,
};
use std::collections::HashSet;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn payments_plan() -> Plan {
    Plan::new(vec![Epic::new(
        "E1",
        "Payments",
        vec![Story::new(
            "S1",
            "Checkout",
            vec![
                Task::new("T1", "[Backend] Card API", 5),
                Task::new("T2", "[Backend] Refunds", 5),
            ],
        )],
    )])
}

fn backend_params(capacity: f64) -> SchedulingParams {
    SchedulingParams::new(2, d(2024, 1, 1)).with_member(TeamMember::new("bo", "Backend", capacity))
}

#[test]
fn single_epic_fits_one_sprint_and_one_milestone() {
    let report = PlanScheduler::new().schedule(payments_plan(), &backend_params(10.0));

    assert!(report.is_complete());
    let plan = &report.plan;
    assert_eq!(plan.sprints.len(), 1);
    assert_eq!(plan.sprints[0].start_date, d(2024, 1, 1));
    assert_eq!(plan.sprints[0].end_date, d(2024, 1, 15));

    assert_eq!(plan.milestones.len(), 1);
    let milestone = &plan.milestones[0];
    assert_eq!(milestone.start_date, d(2024, 1, 1));
    assert_eq!(milestone.end_date, d(2024, 1, 15));
    assert_eq!(milestone.sprints, vec!["SPRINT-1"]);
    assert_eq!(milestone.epics.len(), 1);
    assert_eq!(milestone.epics[0].key, "E1");
    assert_eq!(milestone.epics[0].story_point, 10);
    assert_eq!(milestone.epics[0].total_story_point, 10);

    assert_eq!(report.summary.total_story_points, 10);
    assert_eq!(report.summary.scheduled_story_points, 10);
    assert_eq!(report.summary.finish, Some(d(2024, 1, 15)));
    assert_eq!(
        report.summary.to_cli_summary(),
        "tasks=2/2, points=10/10, sprints=1, milestones=1, finish=2024-01-15"
    );
}

#[test]
fn undersized_team_yields_empty_but_valid_plan() {
    let report = PlanScheduler::new().schedule(payments_plan(), &backend_params(4.0));

    assert!(!report.is_complete());
    assert_eq!(report.dropped_task_keys(), ["T1".to_string(), "T2".to_string()]);
    assert!(report.plan.sprints.is_empty());
    assert!(report.plan.milestones.is_empty());
    assert_eq!(report.plan.scheduled_story_points(), 0);
    assert_eq!(report.plan.epics[0].story_point, 10);
}

#[test]
fn rollup_holds_after_scheduling() {
    let plan = Plan::new(vec![
        Epic::new(
            "",
            "Accounts",
            vec![
                Story::new("", "Sign up", vec![Task::new("", "[Frontend] Form", 3)]),
                Story::new(
                    "",
                    "Sign in",
                    vec![
                        Task::new("", "[Backend] Session", 2),
                        Task::new("", "[QA] Regression", 1),
                    ],
                ),
            ],
        ),
        Epic::new("", "Empty", Vec::new()),
    ]);
    let params = SchedulingParams::new(1, d(2024, 5, 6))
        .with_member(TeamMember::new("fs", "Full-stack", 8.0))
        .with_member(TeamMember::new("qa", "QA", 3.0));

    let report = PlanScheduler::new().schedule(plan, &params);

    assert!(report.is_complete());
    assert!(is_consistent(&report.plan.epics));
    assert_eq!(report.plan.epics[0].story_point, 6);
    assert_eq!(report.plan.epics[1].story_point, 0);
    assert_eq!(report.plan.epics[0].key, "E1");
    assert_eq!(report.plan.epics[0].stories[1].tasks[0].key, "E1-2-1");
    assert_eq!(report.plan.sprints[0].end_date, d(2024, 5, 13));
}

#[test]
fn every_scheduled_task_appears_in_exactly_one_sprint() {
    let stories = (1..=4)
        .map(|s| {
            let tasks = (1..=5)
                .map(|t| {
                    let tag = if t % 2 == 0 { "[Frontend]" } else { "[Backend]" };
                    Task::new(format!("T{s}-{t}"), format!("{tag} piece {t}"), t)
                })
                .collect();
            Story::new(format!("S{s}"), format!("Story {s}"), tasks)
        })
        .collect();
    let plan = Plan::new(vec![Epic::new("E1", "Big", stories)]);
    let params = SchedulingParams::new(2, d(2024, 2, 5))
        .with_member(TeamMember::new("bo", "Backend", 8.0))
        .with_member(TeamMember::new("fi", "Frontend", 6.0));

    let report = PlanScheduler::new().schedule(plan, &params);
    assert!(report.is_complete());

    let mut seen = HashSet::new();
    for sprint in &report.plan.sprints {
        for task in sprint.tasks() {
            assert!(seen.insert(task.key.clone()), "{} scheduled twice", task.key);
            let source = report.plan.find_task(&task.key).unwrap();
            assert_eq!(source.sprint_key.as_deref(), Some(sprint.key.as_str()));
        }
    }
    assert_eq!(seen.len(), report.plan.task_count());

    let mut milestone_sprints = HashSet::new();
    for milestone in &report.plan.milestones {
        for key in &milestone.sprints {
            assert!(milestone_sprints.insert(key.clone()));
        }
    }
    for pair in report.plan.milestones.windows(2) {
        assert!(pair[0].start_date <= pair[1].start_date);
    }
}

#[test]
fn pre_assigned_sprint_is_reset_by_default() {
    let mut plan = payments_plan();
    plan.epics[0].stories[0].tasks[0].sprint_key = Some("SPRINT-9".into());

    let report = PlanScheduler::new().schedule(plan, &backend_params(10.0));

    let task = report.plan.find_task("T1").unwrap();
    assert_eq!(task.sprint_key.as_deref(), Some("SPRINT-1"));
}

#[test]
fn keep_policy_leaves_pre_assigned_task_alone() {
    let mut plan = payments_plan();
    plan.epics[0].stories[0].tasks[0].sprint_key = Some("SPRINT-9".into());
    let mut params = backend_params(10.0);
    params.preassigned_sprint_policy = PreassignedSprintPolicy::Keep;

    let report = PlanScheduler::new().schedule(plan, &params);

    assert!(report.is_complete());
    assert_eq!(
        report.plan.find_task("T1").unwrap().sprint_key.as_deref(),
        Some("SPRINT-9")
    );
    assert_eq!(report.plan.scheduled_story_points(), 5);
}

#[test]
fn schedule_many_keeps_job_order() {
    let jobs = vec![
        (payments_plan(), backend_params(10.0)),
        (payments_plan(), backend_params(4.0)),
        (payments_plan(), backend_params(5.0)),
    ];

    let reports = PlanScheduler::new().with_sprint_buffer(2).schedule_many(jobs);

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].plan.sprints.len(), 1);
    assert!(reports[1].plan.sprints.is_empty());
    assert_eq!(reports[2].plan.sprints.len(), 2);
    assert_eq!(reports[2].summary.finish, Some(d(2024, 1, 29)));
}

#[test]
fn story_keys_repeated_across_epics_keep_their_own_epic() {
    let plan = Plan::new(vec![
        Epic::new(
            "E1",
            "Billing",
            vec![Story::new("S1", "Invoices", vec![Task::new("T1", "[Backend] a", 2)])],
        ),
        Epic::new(
            "E2",
            "Search",
            vec![Story::new("S1", "Indexing", vec![Task::new("T2", "[Backend] b", 3)])],
        ),
    ]);

    let report = PlanScheduler::new().schedule(plan, &backend_params(10.0));

    let sprint = &report.plan.sprints[0];
    assert_eq!(sprint.stories.len(), 2);
    assert_eq!(sprint.stories[0].epic_key, "E1");
    assert_eq!(sprint.stories[0].story_point, 2);
    assert_eq!(sprint.stories[1].epic_key, "E2");
    assert_eq!(sprint.stories[1].story_point, 3);

    let epics = &report.plan.milestones[0].epics;
    assert_eq!(epics.len(), 2);
    assert_eq!((epics[0].key.as_str(), epics[0].story_point), ("E1", 2));
    assert_eq!((epics[1].key.as_str(), epics[1].story_point), ("E2", 3));
}

#[test]
fn sprint_length_beyond_calendar_drops_work_instead_of_failing() {
    let params = SchedulingParams::new(u32::MAX, d(2024, 1, 1))
        .with_member(TeamMember::new("bo", "Backend", 10.0));

    let report = PlanScheduler::new().schedule(payments_plan(), &params);

    assert!(report.plan.sprints.is_empty());
    assert!(report.plan.milestones.is_empty());
    assert_eq!(report.dropped_task_keys(), ["T1".to_string(), "T2".to_string()]);
}

#[test]
fn vanishing_capacity_is_bounded() {
    let params = SchedulingParams::new(2, d(2024, 1, 1))
        .with_member(TeamMember::new("bo", "Backend", 1e-300));

    let report = PlanScheduler::new().schedule(payments_plan(), &params);

    assert!(report.plan.sprints.is_empty());
    assert_eq!(report.dropped_task_keys().len(), 2);
}
