//! Initial attributes of new windows, derived from their metadata

use crate::core::{TagMask, MISSING_VALUE};
use serde::{Deserialize, Serialize};

// ============================= RuleMerge ============================
// ====================================================================

/// What a later matching rule does with the fields it leaves unspecified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RuleMerge {
    /// Reset them to their defaults; only the last match counts
    Overwrite,
    /// Keep whatever an earlier match set
    Preserve,
}

impl Default for RuleMerge {
    fn default() -> Self {
        Self::Overwrite
    }
}

// =============================== Rule ===============================
// ====================================================================

/// A rule for new windows. Every pattern that is given must be a substring
/// of the window's corresponding property
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Rule {
    pub(crate) class:      Option<String>,
    pub(crate) instance:   Option<String>,
    pub(crate) title:      Option<String>,
    /// Bitmask of tags
    pub(crate) tags:       Option<TagMask>,
    pub(crate) floating:   Option<bool>,
    pub(crate) terminal:   Option<bool>,
    #[serde(alias = "no-swallow")]
    pub(crate) no_swallow: Option<bool>,
    /// Zero-based monitor index
    pub(crate) monitor:    Option<usize>,
    pub(crate) opacity:    Option<f64>,
}

/// Metadata of a window being matched
#[derive(Debug, Clone, Copy)]
pub(crate) struct WindowMeta<'a> {
    pub(crate) class:    &'a str,
    pub(crate) instance: &'a str,
    pub(crate) title:    &'a str,
}

impl<'a> WindowMeta<'a> {
    /// Create a new [`WindowMeta`], substituting missing values
    pub(crate) fn new(class: &'a str, instance: &'a str, title: &'a str) -> Self {
        let or_missing = |s: &'a str| if s.is_empty() { MISSING_VALUE } else { s };
        Self {
            class:    or_missing(class),
            instance: or_missing(instance),
            title:    or_missing(title),
        }
    }
}

impl Rule {
    /// Whether every given pattern is found in `meta`
    pub(crate) fn matches(&self, meta: &WindowMeta) -> bool {
        let found = |pattern: &Option<String>, value: &str| {
            pattern.as_ref().map_or(true, |p| value.contains(p.as_str()))
        };

        found(&self.class, meta.class)
            && found(&self.instance, meta.instance)
            && found(&self.title, meta.title)
    }
}

// ============================ RuleOutcome ===========================
// ====================================================================

/// Attributes accumulated from every matching [`Rule`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct RuleOutcome {
    pub(crate) tags:       TagMask,
    pub(crate) floating:   bool,
    pub(crate) terminal:   bool,
    pub(crate) no_swallow: bool,
    pub(crate) opacity:    Option<f64>,
    pub(crate) monitor:    Option<usize>,
}

impl RuleOutcome {
    /// Fold one matching rule into the outcome
    fn merge(&mut self, rule: &Rule, merge: RuleMerge) {
        fn pick<T: Copy>(current: T, given: Option<T>, default: T, merge: RuleMerge) -> T {
            match (given, merge) {
                (Some(value), _) => value,
                (None, RuleMerge::Overwrite) => default,
                (None, RuleMerge::Preserve) => current,
            }
        }

        self.tags = pick(self.tags, rule.tags, 0, merge);
        self.floating = pick(self.floating, rule.floating, false, merge);
        self.terminal = pick(self.terminal, rule.terminal, false, merge);
        self.no_swallow = pick(self.no_swallow, rule.no_swallow, false, merge);
        self.opacity = pick(self.opacity, rule.opacity.map(Some), None, merge);
    }

    /// Tags within `valid`, or `fallback` when none are left
    pub(crate) const fn resolve_tags(&self, valid: TagMask, fallback: TagMask) -> TagMask {
        if self.tags & valid == 0 {
            fallback
        } else {
            self.tags & valid
        }
    }
}

/// Scan the whole table in order. Later matches win field by field according
/// to `merge`; the monitor only moves to an index for which `monitor_exists`
/// holds
pub(crate) fn match_rules(
    rules: &[Rule],
    meta: &WindowMeta,
    merge: RuleMerge,
    monitor_exists: impl Fn(usize) -> bool,
) -> RuleOutcome {
    let mut outcome = RuleOutcome::default();

    for rule in rules.iter().filter(|r| r.matches(meta)) {
        log::debug!("rule {:?} matches {:?}", rule, meta);
        outcome.merge(rule, merge);

        if let Some(m) = rule.monitor.filter(|&m| monitor_exists(m)) {
            outcome.monitor = Some(m);
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::{match_rules, Rule, RuleMerge, WindowMeta};

    const T1: u32 = 1 << 1;
    const T2: u32 = 1 << 4;

    fn overlapping() -> Vec<Rule> {
        vec![
            Rule {
                class: Some("Fire".to_owned()),
                tags: Some(T1),
                opacity: Some(0.5),
                floating: Some(true),
                ..Rule::default()
            },
            Rule {
                title: Some("Mozilla".to_owned()),
                tags: Some(T2),
                ..Rule::default()
            },
        ]
    }

    fn firefox() -> WindowMeta<'static> {
        WindowMeta::new("Firefox", "Navigator", "Mozilla Firefox")
    }

    #[test]
    fn later_match_overwrites_everything() {
        let outcome = match_rules(&overlapping(), &firefox(), RuleMerge::Overwrite, |_| true);
        assert_eq!(outcome.tags, T2);
        assert_eq!(outcome.opacity, None);
        assert!(!outcome.floating);
    }

    #[test]
    fn later_match_preserves_unspecified() {
        let outcome = match_rules(&overlapping(), &firefox(), RuleMerge::Preserve, |_| true);
        assert_eq!(outcome.tags, T2);
        assert_eq!(outcome.opacity, Some(0.5));
        assert!(outcome.floating);
    }

    #[test]
    fn every_pattern_must_match() {
        let rules = vec![Rule {
            class: Some("Gimp".to_owned()),
            title: Some("Toolbox".to_owned()),
            floating: Some(true),
            ..Rule::default()
        }];

        let gimp = WindowMeta::new("Gimp", "gimp", "GNU Image Manipulation Program");
        assert!(!match_rules(&rules, &gimp, RuleMerge::Overwrite, |_| true).floating);

        let toolbox = WindowMeta::new("Gimp", "gimp", "Toolbox");
        assert!(match_rules(&rules, &toolbox, RuleMerge::Overwrite, |_| true).floating);
    }

    #[test]
    fn missing_metadata_uses_fallback() {
        let rules = vec![Rule {
            class: Some("broken".to_owned()),
            tags: Some(T1),
            ..Rule::default()
        }];

        let meta = WindowMeta::new("", "", "");
        assert_eq!(match_rules(&rules, &meta, RuleMerge::Overwrite, |_| true).tags, T1);
    }

    #[test]
    fn monitor_requires_existing_index() {
        let rules = vec![
            Rule { monitor: Some(1), ..Rule::default() },
            Rule { monitor: Some(5), ..Rule::default() },
        ];

        let outcome = match_rules(&rules, &firefox(), RuleMerge::Overwrite, |m| m < 2);
        assert_eq!(outcome.monitor, Some(1));
    }

    #[test]
    fn tags_fall_back_to_monitor_view() {
        let valid = 0x1FF;
        let mut rules = overlapping();
        rules[1].tags = Some(1 << 20);

        let outcome = match_rules(&rules, &firefox(), RuleMerge::Overwrite, |_| true);
        assert_eq!(outcome.resolve_tags(valid, 0b1), 0b1);
        assert_eq!(
            match_rules(&rules[..1], &firefox(), RuleMerge::Overwrite, |_| true)
                .resolve_tags(valid, 0b1),
            T1
        );
    }
}
