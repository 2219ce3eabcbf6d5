use crate::config::NoiseConfig;

/// Line-level noise classification. Ad keywords can discard a whole listing;
/// skip keywords (delivery badges, cashback notices) only mute the line.
pub struct NoiseFilter<'a> {
    cfg: &'a NoiseConfig,
}

impl<'a> NoiseFilter<'a> {
    pub fn new(cfg: &'a NoiseConfig) -> Self {
        NoiseFilter { cfg }
    }

    pub fn is_ad(&self, line: &str) -> bool {
        self.cfg.ad_keywords.iter().any(|kw| keyword_hit(line, kw))
    }

    pub fn is_skip(&self, line: &str) -> bool {
        self.cfg.skip_keywords.iter().any(|kw| keyword_hit(line, kw))
    }

    /// Noise of either kind; such lines never become anchors and never
    /// contribute fields.
    pub fn is_noise(&self, line: &str) -> bool {
        self.is_ad(line) || self.is_skip(line)
    }

    pub fn allowlisted(&self, name: &str) -> bool {
        self.cfg.allowlist.iter().any(|kw| name.contains(kw.as_str()))
    }
}

/// Keywords of up to two ASCII chars ("AD") only match as the entire line;
/// everything else matches as a substring.
fn keyword_hit(line: &str, kw: &str) -> bool {
    if kw.len() <= 2 && kw.is_ascii() {
        line == kw
    } else {
        line.contains(kw)
    }
}
