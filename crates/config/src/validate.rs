use crate::error::{ErrorKind, Result};
use crate::types::AppConfig;
use std::collections::HashSet;

/// Directory of the artifact archive that holds the latest copies; no route
/// may share its name.
const RESERVED_ROUTE: &str = "latest";

/// Route and format names become directory and file names in the artifact
/// archive.
fn is_path_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
}

impl AppConfig {
    /// Check cross-references the schema alone can't express.
    ///
    /// Every problem is reported, not only the first. Caption templates are
    /// not checked here; a bad template only disables its own destination.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        let mut source_ids = HashSet::new();
        for source in &self.sources {
            if !source_ids.insert(source.id.as_str()) {
                problems.push(format!("duplicate source id '{}'", source.id));
            }
        }

        let mut route_names = HashSet::new();
        for route in &self.publishing.routes {
            if !route_names.insert(route.name.as_str()) {
                problems.push(format!("duplicate route name '{}'", route.name));
            }
            if !is_path_segment(&route.name) || route.name == RESERVED_ROUTE {
                problems.push(format!(
                    "route name '{}' must be made of letters, digits, '_', '-' or '.' and must not be '{RESERVED_ROUTE}'",
                    route.name
                ));
            }
            for format in route.formats.iter().filter(|f| !is_path_segment(f)) {
                problems.push(format!("route '{}' has an invalid format name '{format}'", route.name));
            }
            if route.formats.is_empty() {
                problems.push(format!("route '{}' has no formats", route.name));
            }
            for source in route.from_sources.iter().filter(|s| !source_ids.contains(s.as_str())) {
                problems.push(format!("route '{}' references unknown source '{source}'", route.name));
            }
            for (index, destination) in route.destinations.iter().enumerate() {
                if destination.chat_id.trim().is_empty() {
                    problems.push(format!("route '{}' destination #{index} has no chat id", route.name));
                }
            }
        }

        if self.telegram.timeout_secs == 0 {
            problems.push("telegram.timeout_secs must be positive".to_string());
        }

        match problems.is_empty() {
            true => Ok(()),
            false => exn::bail!(ErrorKind::Invalid(problems)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::types::{AppConfig, DestinationConfig, RouteConfig, SourceConfig, SourceSelector};
    use rstest::rstest;

    fn source(id: &str) -> SourceConfig {
        SourceConfig { id: id.to_string(), kind: "telegram".to_string(), telegram: None, selector: SourceSelector::default() }
    }

    fn route(name: &str, sources: &[&str], formats: &[&str]) -> RouteConfig {
        RouteConfig {
            name: name.to_string(),
            from_sources: sources.iter().map(|s| s.to_string()).collect(),
            formats: formats.iter().map(|s| s.to_string()).collect(),
            destinations: vec![DestinationConfig::new("@chan")],
        }
    }

    fn problems(config: &AppConfig) -> Vec<String> {
        match config.validate() {
            Ok(()) => Vec::new(),
            Err(err) => match &*err {
                ErrorKind::Invalid(problems) => problems.clone(),
                other => panic!("unexpected error: {other}"),
            },
        }
    }

    #[test]
    fn test_valid() {
        let mut config = AppConfig::default();
        config.sources = vec![source("a"), source("b")];
        config.publishing.routes = vec![route("one", &["a"], &["uri"]), route("two", &["a", "b"], &["ovpn", "npvt"])];
        assert!(problems(&config).is_empty());
    }

    #[rstest]
    #[case("Free Proxies")]
    #[case("бесплатно")]
    #[case("a/b")]
    #[case("..")]
    #[case("")]
    #[case("latest")]
    fn test_route_name_must_be_a_path_segment(#[case] name: &str) {
        let mut config = AppConfig::default();
        config.sources = vec![source("a")];
        config.publishing.routes = vec![route(name, &["a"], &["uri"])];
        let problems = problems(&config);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].starts_with(&format!("route name '{name}' must be made of")));
    }

    #[test]
    fn test_format_name_must_be_a_path_segment() {
        let mut config = AppConfig::default();
        config.sources = vec![source("a")];
        config.publishing.routes = vec![route("free-proxies.v2", &["a"], &["uri", "open vpn"])];
        assert_eq!(problems(&config), ["route 'free-proxies.v2' has an invalid format name 'open vpn'"]);
    }

    #[test]
    fn test_reports_every_problem() {
        let mut config = AppConfig::default();
        config.sources = vec![source("a"), source("a")];
        let mut blank = route("one", &["a", "ghost"], &[]);
        blank.destinations.push(DestinationConfig::new("  "));
        config.publishing.routes = vec![blank, route("one", &["a"], &["uri"])];
        config.telegram.timeout_secs = 0;

        let problems = problems(&config);
        assert_eq!(
            problems,
            [
                "duplicate source id 'a'",
                "route 'one' has no formats",
                "route 'one' references unknown source 'ghost'",
                "route 'one' destination #1 has no chat id",
                "duplicate route name 'one'",
                "telegram.timeout_secs must be positive",
            ]
        );
    }
}
