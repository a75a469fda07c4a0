// src/routing/mod.rs
pub mod rules;

pub use rules::{compile_rules, load_rule_spec, RoutingRule, RuleSpec};

/// First rule (in priority order) whose pattern matches `title` wins;
/// otherwise `default_destination`. `None` means "no thread", i.e. the
/// chat's general topic.
pub fn route<'a>(
    title: &str,
    rules: &'a [RoutingRule],
    default_destination: Option<&'a str>,
) -> Option<&'a str> {
    rules
        .iter()
        .find(|r| r.pattern.is_match(title))
        .map(|r| r.destination.as_str())
        .or(default_destination)
}

/// Rule set bundled with its fallback destination.
#[derive(Debug, Clone, Default)]
pub struct Router {
    rules: Vec<RoutingRule>,
    default_destination: Option<String>,
}

impl Router {
    /// `rules` must already be priority-sorted (as [`compile_rules`] returns them).
    pub fn new(rules: Vec<RoutingRule>, default_destination: Option<String>) -> Self {
        Self {
            rules,
            default_destination,
        }
    }

    pub fn route(&self, title: &str) -> Option<&str> {
        route(title, &self.rules, self.default_destination.as_deref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::RegexBuilder;

    fn rule(pattern: &str, destination: &str, priority: i32) -> RoutingRule {
        RoutingRule {
            pattern: RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .unwrap(),
            destination: destination.into(),
            priority,
        }
    }

    #[test]
    fn first_match_in_rule_order_wins() {
        let rules = vec![rule(r"\$", "money", 1), rule("THM", "thm", 4)];
        assert_eq!(route("THM bounty $500", &rules, Some("main")), Some("money"));
        assert_eq!(route("thm room walkthrough", &rules, Some("main")), Some("thm"));
    }

    #[test]
    fn falls_back_to_default() {
        let router = Router::new(vec![rule("xss", "web", 1)], Some("main".into()));
        assert_eq!(router.route("Kernel exploitation 101"), Some("main"));
        let no_default = Router::new(vec![rule("xss", "web", 1)], None);
        assert_eq!(no_default.route("Kernel exploitation 101"), None);
    }

    #[test]
    fn routing_is_deterministic() {
        let router = Router::new(
            vec![rule("recon", "recon", 2), rule("subdomain", "recon2", 2)],
            None,
        );
        let first = router.route("Subdomain recon at scale");
        for _ in 0..10 {
            assert_eq!(router.route("Subdomain recon at scale"), first);
        }
        assert_eq!(first, Some("recon"));
    }
}
