//! Controller deduplication
//!
//! Many pods usually share one controller. The aggregator keeps the first
//! resolved instance of each `(kind, name)` seen during a namespace scan so
//! each controller is inspected once.

use crate::model::{ControllerKind, ResolvedController};
use std::collections::HashMap;

/// Per-kind keyed collections of resolved controllers for one namespace scan
#[derive(Debug, Default)]
pub struct ControllerAggregator {
    by_kind: HashMap<ControllerKind, HashMap<String, ResolvedController>>,
}

impl ControllerAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a controller; returns `false` if this identity was already seen
    pub fn observe(&mut self, controller: ResolvedController) -> bool {
        let collection = self.by_kind.entry(controller.kind).or_default();
        if collection.contains_key(&controller.name) {
            return false;
        }
        collection.insert(controller.name.clone(), controller);
        true
    }

    pub fn contains(&self, kind: ControllerKind, name: &str) -> bool {
        self.by_kind
            .get(&kind)
            .is_some_and(|collection| collection.contains_key(name))
    }

    /// Number of unique controllers observed
    pub fn len(&self) -> usize {
        self.by_kind.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Yield every unique controller exactly once, in unspecified order
    pub fn drain_all(self) -> impl Iterator<Item = (ControllerKind, ResolvedController)> {
        self.by_kind
            .into_iter()
            .flat_map(|(kind, collection)| collection.into_values().map(move |c| (kind, c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Volume;
    use std::collections::HashSet;

    fn controller(kind: ControllerKind, name: &str, path: &str) -> ResolvedController {
        ResolvedController {
            namespace: "default".to_string(),
            kind,
            name: name.to_string(),
            volumes: vec![Volume::host_path("v", path)],
        }
    }

    #[test]
    fn test_observe_is_idempotent() {
        let mut aggregator = ControllerAggregator::new();
        assert!(aggregator.is_empty());

        assert!(aggregator.observe(controller(ControllerKind::Deployment, "web", "/a")));
        for _ in 0..4 {
            assert!(!aggregator.observe(controller(ControllerKind::Deployment, "web", "/a")));
        }

        assert_eq!(aggregator.len(), 1);
        assert!(aggregator.contains(ControllerKind::Deployment, "web"));
    }

    #[test]
    fn test_first_observation_wins() {
        let mut aggregator = ControllerAggregator::new();
        aggregator.observe(controller(ControllerKind::Job, "batch", "/first"));
        aggregator.observe(controller(ControllerKind::Job, "batch", "/second"));

        let drained: Vec<_> = aggregator.drain_all().collect();
        assert_eq!(drained.len(), 1);
        assert_eq!(
            drained[0].1.volumes[0].host_path.as_ref().map(|h| h.path.as_str()),
            Some("/first")
        );
    }

    #[test]
    fn test_same_name_different_kinds_are_distinct() {
        let mut aggregator = ControllerAggregator::new();
        assert!(aggregator.observe(controller(ControllerKind::Deployment, "app", "/a")));
        assert!(aggregator.observe(controller(ControllerKind::StatefulSet, "app", "/a")));
        assert!(!aggregator.contains(ControllerKind::DaemonSet, "app"));
        assert_eq!(aggregator.len(), 2);
    }

    #[test]
    fn test_drain_all_visits_every_entry() {
        let mut aggregator = ControllerAggregator::new();
        for kind in ControllerKind::ALL {
            for name in ["one", "two", "three"] {
                aggregator.observe(controller(kind, name, "/x"));
                aggregator.observe(controller(kind, name, "/x"));
            }
        }

        let drained: HashSet<(ControllerKind, String)> = aggregator
            .drain_all()
            .map(|(kind, c)| {
                assert_eq!(kind, c.kind);
                (kind, c.name)
            })
            .collect();
        assert_eq!(drained.len(), 15);
        assert!(drained.contains(&(ControllerKind::CronJob, "two".to_string())));
    }
}
