//! Temporal clustering of clicks.
//!
//! A zoom session is triggered once per group of clicks, not once per click.
//! Input must already be sorted by capture time; it is never re-sorted.

use zoomreel_project_model::event::ClickEvent;

/// Consecutive clicks whose gaps all stay below the grouping threshold.
///
/// Always holds at least one click.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickGroup {
    clicks: Vec<ClickEvent>,
}

impl ClickGroup {
    fn start(click: ClickEvent) -> Self {
        Self {
            clicks: vec![click],
        }
    }

    pub fn clicks(&self) -> &[ClickEvent] {
        &self.clicks
    }

    pub fn first(&self) -> &ClickEvent {
        &self.clicks[0]
    }

    pub fn last(&self) -> &ClickEvent {
        &self.clicks[self.clicks.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.clicks.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.clicks.is_empty()
    }

    /// Time between the first and last click.
    pub fn span_secs(&self) -> f64 {
        self.last().captured_at_secs - self.first().captured_at_secs
    }
}

/// Partition clicks into groups, starting a new group whenever the gap to
/// the previous click is at least `max_gap_secs`.
pub fn group_clicks(events: &[ClickEvent], max_gap_secs: f64) -> Vec<ClickGroup> {
    let mut groups: Vec<ClickGroup> = Vec::new();

    for click in events {
        match groups.last_mut() {
            Some(group) if click.captured_at_secs - group.last().captured_at_secs < max_gap_secs => {
                group.clicks.push(*click);
            }
            _ => groups.push(ClickGroup::start(*click)),
        }
    }

    tracing::debug!(
        clicks = events.len(),
        groups = groups.len(),
        max_gap_secs,
        "Grouped clicks"
    );
    groups
}

/// Concatenate groups back into a single click stream.
pub fn flatten_groups(groups: &[ClickGroup]) -> Vec<ClickEvent> {
    groups
        .iter()
        .flat_map(|g| g.clicks.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn click(t: f64) -> ClickEvent {
        ClickEvent::new(t, 0.0, 0.0, 1920, 1080)
    }

    #[test]
    fn test_empty_input() {
        assert!(group_clicks(&[], 3.0).is_empty());
    }

    #[test]
    fn test_gap_at_threshold_splits() {
        let clicks = vec![click(0.0), click(2.5), click(5.5), click(6.0), click(20.0)];
        let groups = group_clicks(&clicks, 3.0);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1].len(), 2);
        assert_eq!(groups[2].len(), 1);
        assert!((groups[0].span_secs() - 2.5).abs() < 1e-9);
        assert_eq!(groups[1].first().captured_at_secs, 5.5);
    }

    #[test]
    fn test_two_close_clicks_form_one_group() {
        let groups = group_clicks(&[click(2.0), click(2.3)], 3.0);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
        assert!(!groups[0].is_empty());
    }

    fn sorted_clicks() -> impl Strategy<Value = Vec<ClickEvent>> {
        prop::collection::vec((0.0f64..6.0, 0.0f64..1920.0, 0.0f64..1080.0), 0..40).prop_map(
            |steps| {
                let mut t = 0.0;
                steps
                    .into_iter()
                    .map(|(dt, x, y)| {
                        t += dt;
                        ClickEvent::new(t, x, y, 1920, 1080)
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn prop_groups_partition_input(clicks in sorted_clicks(), gap in 0.1f64..5.0) {
            let groups = group_clicks(&clicks, gap);
            prop_assert_eq!(flatten_groups(&groups), clicks.clone());
            for group in &groups {
                prop_assert!(!group.is_empty());
                for pair in group.clicks().windows(2) {
                    prop_assert!(pair[1].captured_at_secs - pair[0].captured_at_secs < gap);
                }
            }
            for pair in groups.windows(2) {
                prop_assert!(
                    pair[1].first().captured_at_secs - pair[0].last().captured_at_secs >= gap
                );
            }
        }

        #[test]
        fn prop_regrouping_is_idempotent(clicks in sorted_clicks(), gap in 0.1f64..5.0) {
            let groups = group_clicks(&clicks, gap);
            let regrouped = group_clicks(&flatten_groups(&groups), gap);
            prop_assert_eq!(regrouped, groups);
        }
    }
}
