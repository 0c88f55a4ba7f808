use crate::dates;
use crate::plan::{Epic, Milestone, MilestoneEpic, Sprint};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

/// An epic finishing this many days (or more) after the running milestone
/// opens a new milestone.
pub const DEFAULT_MILESTONE_GAP_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilestoneConfig {
    pub gap_days: i64,
}

impl Default for MilestoneConfig {
    fn default() -> Self {
        Self {
            gap_days: DEFAULT_MILESTONE_GAP_DAYS,
        }
    }
}

/// Where one epic's work landed across the sprint plan.
#[derive(Debug, Clone)]
struct EpicSpan {
    key: String,
    name: String,
    sprints: Vec<String>,
    story_point: u32,
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug, Clone)]
struct DraftMilestone {
    start: NaiveDate,
    end: NaiveDate,
    sprints: Vec<String>,
}

impl DraftMilestone {
    fn open(span: &EpicSpan) -> Self {
        Self {
            start: span.start,
            end: span.end,
            sprints: span.sprints.clone(),
        }
    }

    fn absorb(&mut self, span: &EpicSpan) {
        self.start = self.start.min(span.start);
        self.end = self.end.max(span.end);
        for key in &span.sprints {
            if !self.sprints.contains(key) {
                self.sprints.push(key.clone());
            }
        }
    }
}

/// Groups a sprint plan into milestones using the epic completion gap.
#[derive(Debug, Clone, Default)]
pub struct MilestoneGrouper {
    config: MilestoneConfig,
}

impl MilestoneGrouper {
    pub fn new(config: MilestoneConfig) -> Self {
        Self { config }
    }

    pub fn group(&self, sprints: &[Sprint], epics: &[Epic]) -> Vec<Milestone> {
        let spans = Self::epic_spans(sprints);
        let mut drafts = self.fold_spans(&spans);
        Self::claim_sprints(&mut drafts);

        let by_key: HashMap<&str, &Sprint> = sprints
            .iter()
            .map(|sprint| (sprint.key.as_str(), sprint))
            .collect();
        Self::settle_spans(&mut drafts, &by_key);

        let epic_totals: HashMap<&str, (&str, u32)> = epics
            .iter()
            .map(|epic| (epic.key.as_str(), (epic.name.as_str(), epic.story_point)))
            .collect();
        let milestones = Self::attribute_progress(&drafts, &by_key, &epic_totals, &spans);
        tracing::debug!(
            milestones = milestones.len(),
            epics = spans.len(),
            "milestones grouped"
        );
        milestones
    }

    /// Per-epic sprint membership and date range, in encounter order.
    fn epic_spans(sprints: &[Sprint]) -> Vec<EpicSpan> {
        let mut spans: Vec<EpicSpan> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for sprint in sprints {
            for story in &sprint.stories {
                let idx = *index.entry(story.epic_key.clone()).or_insert_with(|| {
                    spans.push(EpicSpan {
                        key: story.epic_key.clone(),
                        name: story.epic_name.clone(),
                        sprints: Vec::new(),
                        story_point: 0,
                        start: sprint.start_date,
                        end: sprint.end_date,
                    });
                    spans.len() - 1
                });
                let span = &mut spans[idx];
                if !span.sprints.contains(&sprint.key) {
                    span.sprints.push(sprint.key.clone());
                }
                span.story_point += story.story_point;
                span.start = span.start.min(sprint.start_date);
                span.end = span.end.max(sprint.end_date);
            }
        }
        spans
    }

    fn fold_spans(&self, spans: &[EpicSpan]) -> Vec<DraftMilestone> {
        let mut drafts: Vec<DraftMilestone> = Vec::new();
        for span in spans {
            match drafts.last_mut() {
                Some(current)
                    if dates::add_days(current.end, self.config.gap_days)
                        .is_none_or(|limit| span.end < limit) =>
                {
                    current.absorb(span);
                }
                _ => drafts.push(DraftMilestone::open(span)),
            }
        }
        drafts
    }

    /// A sprint stays with the first milestone that lists it.
    fn claim_sprints(drafts: &mut [DraftMilestone]) {
        let mut claimed: HashSet<String> = HashSet::new();
        for draft in drafts.iter_mut() {
            draft.sprints.retain(|key| claimed.insert(key.clone()));
        }
    }

    /// Re-derives each milestone's dates from the sprints it kept, drops
    /// milestones left without sprints and orders the rest by start date.
    fn settle_spans(drafts: &mut Vec<DraftMilestone>, by_key: &HashMap<&str, &Sprint>) {
        drafts.retain(|draft| !draft.sprints.is_empty());
        for draft in drafts.iter_mut() {
            draft
                .sprints
                .sort_by_key(|key| by_key.get(key.as_str()).map(|s| s.start_date));
            let members = draft.sprints.iter().filter_map(|key| by_key.get(key.as_str()));
            let mut bounds: Option<(NaiveDate, NaiveDate)> = None;
            for sprint in members {
                bounds = Some(match bounds {
                    None => (sprint.start_date, sprint.end_date),
                    Some((start, end)) => (start.min(sprint.start_date), end.max(sprint.end_date)),
                });
            }
            if let Some((start, end)) = bounds {
                draft.start = start;
                draft.end = end;
            }
        }
        drafts.sort_by_key(|draft| draft.start);
    }

    fn attribute_progress(
        drafts: &[DraftMilestone],
        by_key: &HashMap<&str, &Sprint>,
        epic_totals: &HashMap<&str, (&str, u32)>,
        spans: &[EpicSpan],
    ) -> Vec<Milestone> {
        let mut carried: HashMap<String, u32> = HashMap::new();
        let mut milestones = Vec::with_capacity(drafts.len());

        for (idx, draft) in drafts.iter().enumerate() {
            let mut entries: Vec<MilestoneEpic> = Vec::new();
            for key in &draft.sprints {
                let Some(sprint) = by_key.get(key.as_str()) else {
                    continue;
                };
                for story in &sprint.stories {
                    let position = entries.iter().position(|e| e.key == story.epic_key);
                    let entry = match position {
                        Some(pos) => &mut entries[pos],
                        None => {
                            let (name, total) = epic_totals
                                .get(story.epic_key.as_str())
                                .map(|(name, total)| (name.to_string(), *total))
                                .unwrap_or_else(|| {
                                    spans
                                        .iter()
                                        .find(|span| span.key == story.epic_key)
                                        .map_or((story.epic_name.clone(), 0), |span| {
                                            (span.name.clone(), span.story_point)
                                        })
                                });
                            entries.push(MilestoneEpic {
                                key: story.epic_key.clone(),
                                name,
                                story_point: 0,
                                prev_story_point: carried
                                    .get(&story.epic_key)
                                    .copied()
                                    .unwrap_or(0),
                                total_story_point: total,
                            });
                            let last = entries.len() - 1;
                            &mut entries[last]
                        }
                    };
                    entry.story_point += story.story_point;
                }
            }

            for entry in &entries {
                *carried.entry(entry.key.clone()).or_default() += entry.story_point;
            }

            milestones.push(Milestone {
                key: format!("MILESTONE-{}", idx + 1),
                name: format!("Milestone {}", idx + 1),
                start_date: draft.start,
                end_date: draft.end,
                story_point: entries.iter().map(|e| e.story_point).sum(),
                epics: entries,
                sprints: draft.sprints.clone(),
            });
        }
        milestones
    }
}
