use chrono::NaiveDate;
use devplan::{
    Allocation, CapacityModel, Epic, SkillPool, SprintAllocator, Story, Task, TeamMember,
};
use std::collections::HashMap;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn one_story(tasks: Vec<Task>) -> Vec<Epic> {
    vec![Epic::new(
        "E1",
        "Payments",
        vec![Story::new("S1", "Checkout", tasks)],
    )]
}

#[test]
fn two_backend_tasks_fill_first_sprint_exactly() {
    let mut epics = one_story(vec![
        Task::new("T1", "[Backend] Card API", 5),
        Task::new("T2", "[Backend] Refunds", 5),
    ]);
    let members = [TeamMember::new("bo", "Backend", 10.0)];
    let allocator = SprintAllocator::default();

    let template = CapacityModel::from_members(&members);
    assert_eq!(allocator.estimate_sprint_count(&epics, &template), 7);

    let allocation = allocator.allocate(&mut epics, &members, 14, d(2024, 1, 1));
    assert!(allocation.is_complete());

    let sprints = allocation.sprints();
    assert_eq!(sprints.len(), 1);
    assert_eq!(sprints[0].key, "SPRINT-1");
    assert_eq!(sprints[0].start_date, d(2024, 1, 1));
    assert_eq!(sprints[0].end_date, d(2024, 1, 15));
    assert_eq!(sprints[0].story_point, 10);
    assert_eq!(sprints[0].stories.len(), 1);
    assert_eq!(sprints[0].stories[0].tasks.len(), 2);

    for task in &epics[0].stories[0].tasks {
        assert_eq!(task.sprint_key.as_deref(), Some("SPRINT-1"));
        assert_eq!(task.assignee.as_deref(), Some("bo"));
    }
}

#[test]
fn oversized_tasks_are_dropped_without_error() {
    let mut epics = one_story(vec![
        Task::new("T1", "[Backend] Card API", 5),
        Task::new("T2", "[Backend] Refunds", 5),
    ]);
    let members = [TeamMember::new("bo", "Backend", 4.0)];

    let allocation = SprintAllocator::default().allocate(&mut epics, &members, 14, d(2024, 1, 1));

    match &allocation {
        Allocation::PartiallyScheduled {
            sprints,
            dropped_task_keys,
        } => {
            assert!(sprints.is_empty());
            assert_eq!(dropped_task_keys, &vec!["T1".to_string(), "T2".to_string()]);
        }
        Allocation::Scheduled(_) => panic!("expected dropped tasks"),
    }
    assert!(epics[0].stories[0].tasks.iter().all(|t| t.sprint_key.is_none()));
}

#[test]
fn untagged_task_is_never_placed() {
    let mut epics = one_story(vec![
        Task::new("T1", "Implement X", 1),
        Task::new("T2", "[Backend] Implement Y", 1),
    ]);
    let members = [TeamMember::new("bo", "Backend", 10.0)];

    let allocation = SprintAllocator::default().allocate(&mut epics, &members, 14, d(2024, 1, 1));

    assert_eq!(allocation.dropped_task_keys(), ["T1".to_string()]);
    assert_eq!(allocation.sprints().len(), 1);
    assert_eq!(allocation.sprints()[0].story_point, 1);
}

#[test]
fn empty_roster_drops_everything() {
    let mut epics = one_story(vec![Task::new("T1", "[Frontend] Form", 2)]);

    let allocation = SprintAllocator::default().allocate(&mut epics, &[], 14, d(2024, 1, 1));

    assert!(allocation.sprints().is_empty());
    assert_eq!(allocation.dropped_task_keys(), ["T1".to_string()]);
}

#[test]
fn full_stack_member_covers_both_pools_at_half_rate() {
    let mut epics = one_story(vec![
        Task::new("T1", "[Backend] API", 5),
        Task::new("T2", "[Frontend] Form", 5),
        Task::new("T3", "[Backend] Webhook", 3),
    ]);
    let members = [TeamMember::new("fs", "Full-stack", 10.0)];

    let allocation = SprintAllocator::default().allocate(&mut epics, &members, 14, d(2024, 1, 1));

    assert!(allocation.is_complete());
    let sprints = allocation.sprints();
    assert_eq!(sprints.len(), 2);
    assert_eq!(sprints[0].story_point, 10);
    assert_eq!(sprints[1].story_point, 3);
    let tasks = &epics[0].stories[0].tasks;
    assert_eq!(tasks[2].sprint_key.as_deref(), Some("SPRINT-2"));
    assert_eq!(tasks[2].start_date, Some(d(2024, 1, 15)));
}

#[test]
fn fixed_owner_restricts_assignment() {
    let mut epics = one_story(vec![
        Task::new("T1", "[Backend] API", 5).with_owner("cy"),
        Task::new("T2", "[Backend] Cron", 5).with_owner("nobody"),
    ]);
    let members = [
        TeamMember::new("bo", "Backend", 10.0),
        TeamMember::new("cy", "Backend", 10.0),
    ];

    let allocation = SprintAllocator::default().allocate(&mut epics, &members, 14, d(2024, 1, 1));

    let tasks = &epics[0].stories[0].tasks;
    assert_eq!(tasks[0].assignee.as_deref(), Some("cy"));
    assert_eq!(allocation.dropped_task_keys(), ["T2".to_string()]);
}

#[test]
fn tasks_of_one_story_split_across_sprints_stay_grouped_per_sprint() {
    let mut epics = vec![Epic::new(
        "E1",
        "Platform",
        vec![
            Story::new(
                "S1",
                "Auth",
                vec![
                    Task::new("T1", "[Backend] Login", 6),
                    Task::new("T2", "[Backend] Logout", 6),
                ],
            ),
            Story::new("S2", "Audit", vec![Task::new("T3", "[Backend] Trail", 4)]),
        ],
    )];
    let members = [TeamMember::new("bo", "Backend", 10.0)];

    let allocation = SprintAllocator::default().allocate(&mut epics, &members, 14, d(2024, 1, 1));
    let sprints = allocation.sprints();

    assert_eq!(sprints.len(), 2);
    let first: Vec<&str> = sprints[0].stories.iter().map(|s| s.key.as_str()).collect();
    let second: Vec<&str> = sprints[1].stories.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(first, vec!["S1", "S2"]);
    assert_eq!(second, vec!["S1"]);
    assert_eq!(sprints[0].stories[0].story_point, 6);
    assert_eq!(sprints[0].stories[1].story_point, 4);
    assert_eq!(sprints[0].stories[1].epic_key, "E1");
}

#[test]
fn assignments_never_exceed_pool_or_member_capacity() {
    let tasks: Vec<Task> = (0..24)
        .map(|i| {
            let tag = match i % 3 {
                0 => "[Backend]",
                1 => "[Frontend]",
                _ => "[QA]",
            };
            Task::new(format!("T{i}"), format!("{tag} item {i}"), (i % 5) as u32 + 1)
        })
        .collect();
    let mut epics = one_story(tasks);
    let members = [
        TeamMember::new("bo", "Backend", 8.0),
        TeamMember::new("fs", "Full-stack", 6.0),
        TeamMember::new("fi", "Frontend Developer", 5.0),
        TeamMember::new("qa", "QA Engineer", 5.0),
    ];
    let template = CapacityModel::from_members(&members);

    let allocation = SprintAllocator::default().allocate(&mut epics, &members, 14, d(2024, 3, 4));
    assert!(allocation.is_complete());

    for sprint in allocation.sprints() {
        assert!(!sprint.stories.is_empty());
        let mut per_pool: HashMap<SkillPool, f64> = HashMap::new();
        let mut per_member: HashMap<&str, f64> = HashMap::new();
        for task in sprint.tasks() {
            *per_pool.entry(task.required_skill).or_default() += f64::from(task.story_point);
            *per_member.entry(task.assignee.as_str()).or_default() += f64::from(task.story_point);
            assert!(task.start_date >= sprint.start_date);
        }
        for (pool, used) in per_pool {
            assert!(used <= template.pool_remaining(pool) + 1e-9, "{pool} over capacity");
        }
        for (user, used) in per_member {
            let capacity = members
                .iter()
                .find(|m| m.user_id == user)
                .unwrap()
                .story_points_per_sprint;
            assert!(used <= capacity + 1e-9, "{user} over capacity");
        }
    }
}
