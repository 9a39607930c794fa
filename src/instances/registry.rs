use super::models::Instance;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// All known instances and the selection policy over them.
///
/// The registry is rebuilt wholesale by a directory refresh and annotated in
/// place afterwards; individual entries are never deleted.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    instances: Vec<Instance>,
    /// Epoch of the last successful directory rebuild.
    refreshed_at: i64,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole registry with a fresh directory parse.
    ///
    /// Local annotations (ban list, https check) are reapplied afterwards by
    /// `apply_local_policy`; every fresh entry starts with `updated` false.
    pub fn rebuild(&mut self, instances: Vec<Instance>, now: i64) {
        info!("directory rebuild: {} instances advertise api support", instances.len());
        self.instances = instances;
        self.refreshed_at = now;
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Instance> {
        self.instances.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.instances.iter()
    }

    /// Seconds since the last successful rebuild.
    pub fn directory_age(&self, now: i64) -> i64 {
        now - self.refreshed_at
    }

    /// One-time local annotations for freshly rebuilt entries.
    pub fn apply_local_policy(&mut self, banned: &HashSet<String>) {
        for instance in self.instances.iter_mut().filter(|i| !i.updated) {
            if banned.contains(&instance.name) {
                instance.banned = true;
                debug!("instance {} banned by local preference", instance.name);
            }
            if instance.kind != "https" {
                instance.enabled = false;
            }
            instance.updated = true;
        }
    }

    /// Pick one eligible instance, scanning forward from `start` with a
    /// single wraparound. Returns None when no instance qualifies, which is
    /// a recoverable condition for callers.
    pub fn select_from(&self, start: usize, now: i64) -> Option<String> {
        if self.instances.is_empty() {
            return None;
        }
        let len = self.instances.len();
        (0..len)
            .map(|offset| &self.instances[(start + offset) % len])
            .find(|instance| instance.is_eligible(now))
            .map(|instance| instance.name.clone())
    }

    /// Put an instance on cooldown after a failure attributed to it.
    pub fn penalize(&mut self, name: &str, now: i64, cooldown_secs: i64) {
        if let Some(instance) = self.instances.iter_mut().find(|i| i.name == name) {
            instance.cooldown_until = now + cooldown_secs;
            warn!("instance {} on cooldown for {}s", name, cooldown_secs);
        }
    }

    /// Ban an instance immediately; persists only via the preference store.
    pub fn ban(&mut self, name: &str) {
        if let Some(instance) = self.instances.iter_mut().find(|i| i.name == name) {
            instance.banned = true;
        }
    }

    /// First eligible instance whose popular feed is due for a refresh.
    pub fn next_popular_due(&self, now: i64) -> Option<String> {
        self.instances
            .iter()
            .find(|i| i.is_eligible(now) && now >= i.next_popular_refresh_at)
            .map(|i| i.name.clone())
    }

    /// Schedule the next popular refresh of an instance.
    pub fn schedule_popular(&mut self, name: &str, at: i64) {
        if let Some(instance) = self.instances.iter_mut().find(|i| i.name == name) {
            instance.next_popular_refresh_at = at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_instance(name: &str) -> Instance {
        Instance {
            name: name.to_string(),
            base_url: format!("https://{}", name),
            kind: "https".to_string(),
            region: "US".to_string(),
            api_enabled: true,
            enabled: true,
            banned: false,
            directory_health: 100.0,
            updated: false,
            cooldown_until: 0,
            next_popular_refresh_at: 0,
        }
    }

    fn make_registry(names: &[&str]) -> InstanceRegistry {
        let mut registry = InstanceRegistry::new();
        registry.rebuild(names.iter().map(|n| make_instance(n)).collect(), 1000);
        registry
    }

    #[test]
    fn test_select_on_empty_registry_returns_none() {
        let registry = InstanceRegistry::new();
        assert_eq!(registry.select_from(0, 1000), None);
    }

    #[test]
    fn test_select_wraps_around_once() {
        let mut registry = make_registry(&["a.com", "b.com", "c.com"]);
        // Only the first entry is eligible; a scan starting past it must wrap.
        registry.penalize("b.com", 1000, 600);
        registry.penalize("c.com", 1000, 600);

        assert_eq!(registry.select_from(2, 1000), Some("a.com".to_string()));
    }

    #[test]
    fn test_select_skips_cooled_down_instances() {
        let mut registry = make_registry(&["a.com", "b.com"]);
        registry.penalize("a.com", 1000, 600);

        for start in 0..2 {
            assert_eq!(registry.select_from(start, 1000), Some("b.com".to_string()));
        }
        // Cooldown expiry makes it eligible again.
        assert_eq!(registry.select_from(0, 1601), Some("a.com".to_string()));
    }

    #[test]
    fn test_select_none_when_all_cooled() {
        let mut registry = make_registry(&["a.com", "b.com"]);
        registry.penalize("a.com", 1000, 600);
        registry.penalize("b.com", 1000, 600);

        assert_eq!(registry.select_from(0, 1000), None);
        assert_eq!(registry.select_from(1, 1000), None);
    }

    #[test]
    fn test_apply_local_policy_bans_and_latches() {
        let mut registry = make_registry(&["a.com", "bad.com"]);
        let banned: HashSet<String> = ["bad.com".to_string()].into_iter().collect();

        registry.apply_local_policy(&banned);

        let bad = registry.iter().find(|i| i.name == "bad.com").unwrap();
        assert!(bad.banned);
        assert!(bad.updated);
        let good = registry.iter().find(|i| i.name == "a.com").unwrap();
        assert!(!good.banned);
        assert!(good.updated);

        // A second pass sees no unannotated entries and changes nothing.
        registry.apply_local_policy(&HashSet::new());
        assert!(registry.iter().find(|i| i.name == "bad.com").unwrap().banned);
    }

    #[test]
    fn test_apply_local_policy_disables_non_https() {
        let mut registry = InstanceRegistry::new();
        let mut onion = make_instance("t.onion");
        onion.kind = "onion".to_string();
        registry.rebuild(vec![onion], 1000);

        registry.apply_local_policy(&HashSet::new());

        assert!(!registry.get(0).unwrap().enabled);
    }

    #[test]
    fn test_banned_instances_are_never_selected() {
        let mut registry = make_registry(&["a.com", "b.com"]);
        registry.ban("a.com");

        for start in 0..2 {
            assert_eq!(registry.select_from(start, 1000), Some("b.com".to_string()));
        }
    }

    #[test]
    fn test_rebuild_replaces_everything() {
        let mut registry = make_registry(&["a.com", "b.com"]);
        registry.ban("a.com");

        registry.rebuild(vec![make_instance("c.com")], 2000);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(0).unwrap().name, "c.com");
        assert_eq!(registry.directory_age(2600), 600);
    }

    #[test]
    fn test_popular_scheduling() {
        let mut registry = make_registry(&["a.com", "b.com"]);
        registry.schedule_popular("a.com", 5000);

        assert_eq!(registry.next_popular_due(1000), Some("b.com".to_string()));

        registry.schedule_popular("b.com", 4000);
        assert_eq!(registry.next_popular_due(1000), None);
        assert_eq!(registry.next_popular_due(4500), Some("b.com".to_string()));
        assert_eq!(registry.next_popular_due(5000), Some("a.com".to_string()));
    }

    #[test]
    fn test_popular_due_respects_eligibility() {
        let mut registry = make_registry(&["a.com"]);
        registry.penalize("a.com", 1000, 600);

        assert_eq!(registry.next_popular_due(1000), None);
    }
}
