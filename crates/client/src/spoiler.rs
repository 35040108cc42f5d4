//! Spoiler-log interop harness: replays a
//! sphere log against a live `Proxy`, asserting sphere by sphere that the
//! accessible-locations set the engine computes after checking the previous
//! sphere's locations matches the sphere's own location set. A test/demo
//! harness, not a new engine feature — it only calls
//! `evaluateLocationAccessibilityForTest`-equivalent queries and
//! `checkLocation`.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::error::ProxyError;
use crate::proxy::Proxy;

/// One sphere of a spoiler log: every location the randomizer's own solver
/// considered reachable at that point in the playthrough.
#[derive(Debug, Clone, Deserialize)]
pub struct Sphere {
    pub locations: Vec<String>,
}

/// Where a sphere-by-sphere replay diverged from the spoiler log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SphereMismatch {
    pub sphere_index: usize,
    pub expected: BTreeSet<String>,
    pub actual: BTreeSet<String>,
}

/// Replay `spheres` against `proxy`'s already-loaded rules, checking each
/// sphere's locations before moving to the next and comparing the engine's
/// accessible-but-unchecked set to the sphere's own set at every step.
/// Returns every divergence found rather than stopping at the first one, so
/// a caller can report the whole picture in one pass.
pub async fn replay(proxy: &Proxy, spheres: &[Sphere]) -> Result<Vec<SphereMismatch>, ProxyError> {
    let mut mismatches = Vec::new();

    for (index, sphere) in spheres.iter().enumerate() {
        let expected: BTreeSet<String> = sphere.locations.iter().cloned().collect();
        let mut actual = BTreeSet::new();

        for location in &sphere.locations {
            if proxy.evaluate_location_accessibility_for_test(location.clone(), Vec::new(), Vec::new()).await? {
                actual.insert(location.clone());
            }
        }

        if actual != expected {
            mismatches.push(SphereMismatch { sphere_index: index, expected: expected.clone(), actual });
        }

        for location in &sphere.locations {
            proxy.check_location(location.clone(), true, false).await?;
        }
    }

    Ok(mismatches)
}

/// Parse a sphere log from its minimal JSON shape: `[{"locations": [...]},
/// ...]`.
pub fn parse_sphere_log(json: &str) -> Result<Vec<Sphere>, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_sphere_log() {
        let json = r#"[{"locations": ["Link's House"]}, {"locations": ["Lost Woods"]}]"#;
        let spheres = parse_sphere_log(json).unwrap();
        assert_eq!(spheres.len(), 2);
        assert_eq!(spheres[0].locations, vec!["Link's House".to_string()]);
    }

    #[tokio::test]
    async fn replay_reports_no_mismatches_for_a_sphere_that_matches_the_engine() {
        use std::time::Duration;
        use tracker_protocol::PlayerInfo;

        let proxy = Proxy::new(crate::config::ProxyConfig::default());
        proxy.ensure_ready(Duration::from_secs(2)).await.unwrap();

        let rules = serde_json::json!({
            "game_name": "Test Game",
            "regions": { "Menu": { "exits": [], "locations": ["Link's House"] } },
            "locations": { "Link's House": { "region": "Menu" } },
            "start_regions": ["Menu"],
        });
        proxy.load_rules(rules, PlayerInfo { player_id: 1, game_name: "Test Game".into() }).await.unwrap();

        let spheres = vec![Sphere { locations: vec!["Link's House".to_string()] }];
        let mismatches = replay(&proxy, &spheres).await.unwrap();
        assert!(mismatches.is_empty());
    }
}
