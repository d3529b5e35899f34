use serde::{Deserialize, Serialize};

/// Roles offered before any configuration override.
pub const DEFAULT_ROLES: &[&str] = &[
    "Electrician",
    "Plumber",
    "Carpenter",
    "Welder",
    "Mason",
    "Painter",
    "Mechanic",
    "Driver",
    "Cook",
    "Housekeeper",
    "Security Guard",
    "Cashier",
    "Sales Associate",
    "Customer Service Representative",
    "Warehouse Staff",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleOption {
    pub label: String,
    pub value: String,
    /// True for the synthesized "Add ..." entry.
    #[serde(default)]
    pub creatable: bool,
}

impl RoleOption {
    fn known(value: &str) -> Self {
        Self {
            label: value.to_string(),
            value: value.to_string(),
            creatable: false,
        }
    }

    fn create(query: &str) -> Self {
        Self {
            label: format!("Add \"{query}\""),
            value: query.to_string(),
            creatable: true,
        }
    }
}

/// Ranked role options for an autocomplete query.
///
/// Ranking: exact match, then prefix, then substring, all case-insensitive,
/// ties kept in `known` order. No match yields a single create option.
pub fn suggest_roles<S: AsRef<str>>(query: &str, known: &[S]) -> Vec<RoleOption> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();

    let mut ranked: Vec<(u8, &str)> = known
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter_map(|value| {
            let hay = value.to_lowercase();
            let rank = if hay == needle {
                0
            } else if hay.starts_with(&needle) {
                1
            } else if hay.contains(&needle) {
                2
            } else {
                return None;
            };
            Some((rank, value))
        })
        .collect();

    if ranked.is_empty() {
        return vec![RoleOption::create(query)];
    }
    // Stable sort keeps known-list order within a rank.
    ranked.sort_by_key(|(rank, _)| *rank);
    ranked
        .into_iter()
        .map(|(_, value)| RoleOption::known(value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(options: &[RoleOption]) -> Vec<&str> {
        options.iter().map(|o| o.value.as_str()).collect()
    }

    #[test]
    fn test_blank_query_returns_nothing() {
        assert!(suggest_roles("", DEFAULT_ROLES).is_empty());
        assert!(suggest_roles("   ", DEFAULT_ROLES).is_empty());
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let options = suggest_roles("ELEC", DEFAULT_ROLES);
        assert_eq!(values(&options), vec!["Electrician"]);
        assert!(!options[0].creatable);
    }

    #[test]
    fn test_ranks_exact_then_prefix_then_substring() {
        let known = ["Senior Cook", "Cook Assistant", "Cook", "Line Cook"];
        let options = suggest_roles("cook", &known);
        assert_eq!(
            values(&options),
            vec!["Cook", "Cook Assistant", "Senior Cook", "Line Cook"]
        );
    }

    #[test]
    fn test_no_match_synthesizes_create_option() {
        let options = suggest_roles("Astronaut", DEFAULT_ROLES);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].value, "Astronaut");
        assert_eq!(options[0].label, "Add \"Astronaut\"");
        assert!(options[0].creatable);
    }

    #[test]
    fn test_works_with_owned_option_lists() {
        let known = vec!["Barista".to_string(), "Baker".to_string()];
        assert_eq!(values(&suggest_roles("ba", &known)), vec!["Barista", "Baker"]);
    }
}
