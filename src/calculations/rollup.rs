use crate::plan::{Epic, Story, Task};

/// Bottom-up story point aggregation through the work tree.
pub trait Rollup {
    /// Recomputes this node from its children and returns the new total.
    fn roll_up(&mut self) -> u32;
}

impl Rollup for Task {
    fn roll_up(&mut self) -> u32 {
        self.story_point
    }
}

impl Rollup for Story {
    fn roll_up(&mut self) -> u32 {
        self.story_point = self.tasks.iter_mut().map(Rollup::roll_up).sum();
        self.story_point
    }
}

impl Rollup for Epic {
    fn roll_up(&mut self) -> u32 {
        self.story_point = self.stories.iter_mut().map(Rollup::roll_up).sum();
        self.story_point
    }
}

/// Rolls up every epic; returns the plan total.
pub fn rollup(epics: &mut [Epic]) -> u32 {
    epics.iter_mut().map(Rollup::roll_up).sum()
}

/// Whether every parent already equals the sum of its children.
pub fn is_consistent(epics: &[Epic]) -> bool {
    epics.iter().all(|epic| {
        let stories_ok = epic.stories.iter().all(|story| {
            story.story_point == story.tasks.iter().map(|t| t.story_point).sum::<u32>()
        });
        stories_ok
            && epic.story_point == epic.stories.iter().map(|s| s.story_point).sum::<u32>()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Vec<Epic> {
        vec![Epic::new(
            "E1",
            "Auth",
            vec![
                Story::new(
                    "S1",
                    "Login",
                    vec![Task::new("T1", "[Backend] API", 3), Task::new("T2", "[Frontend] Form", 2)],
                ),
                Story::new("S2", "Empty", Vec::new()),
            ],
        )]
    }

    #[test]
    fn rollup_sums_children() {
        let mut epics = tree();
        epics[0].story_point = 99;
        assert_eq!(rollup(&mut epics), 5);
        assert_eq!(epics[0].stories[0].story_point, 5);
        assert_eq!(epics[0].stories[1].story_point, 0);
        assert!(is_consistent(&epics));
    }

    #[test]
    fn rollup_is_idempotent() {
        let mut epics = tree();
        rollup(&mut epics);
        let once = epics.clone();
        rollup(&mut epics);
        assert_eq!(once, epics);
    }
}
