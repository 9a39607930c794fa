/// One independently operated mirror of the upstream video API.
#[derive(Debug, Clone)]
pub struct Instance {
    /// Host name, unique within the registry.
    pub name: String,
    pub base_url: String,
    /// Transport type from the directory; anything but "https" stays disabled.
    pub kind: String,
    pub region: String,
    pub api_enabled: bool,
    pub enabled: bool,
    /// Set only from the user's persisted ban list, never by directory data.
    pub banned: bool,
    /// 90-day uptime ratio from the directory, 0 when unmonitored.
    pub directory_health: f64,
    /// Local policy (ban list, https check) applied once after a rebuild.
    pub updated: bool,
    /// Epoch until which selection skips this instance, 0 = none.
    pub cooldown_until: i64,
    /// Epoch at which the popular feed is due again.
    pub next_popular_refresh_at: i64,
}

impl Instance {
    pub fn is_eligible(&self, now: i64) -> bool {
        self.enabled && self.api_enabled && !self.banned && now >= self.cooldown_until
    }
}
