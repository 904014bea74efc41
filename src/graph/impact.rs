use std::collections::BTreeSet;

use super::{DependencyArtifact, DependencyMap};
use crate::models::{ImpactResult, RiskLevel};

/// Normalise either artifact shape into `file -> tokens`. For a graph the
/// tokens of a file are the targets of its outgoing edges.
pub fn normalize(artifact: &DependencyArtifact) -> DependencyMap {
    match artifact {
        DependencyArtifact::Map(map) => map.clone(),
        DependencyArtifact::Graph(graph) => {
            let mut map: DependencyMap = graph
                .nodes
                .iter()
                .map(|n| (n.clone(), Vec::new()))
                .collect();
            for edge in &graph.edges {
                if let Some(targets) = map.get_mut(&edge.source) {
                    targets.push(edge.target.clone());
                }
            }
            map
        }
    }
}

/// Substring match in either direction. Empty strings match nothing.
fn references(token: &str, path: &str) -> bool {
    !token.is_empty() && !path.is_empty() && (token.contains(path) || path.contains(token))
}

/// Direct and one-hop indirect dependents of `target_file`.
///
/// A file depends on a path when one of its tokens is a substring of the
/// path or the path is a substring of the token. Matching is the union of
/// both directions.
pub fn score(target_file: &str, artifact: &DependencyArtifact) -> ImpactResult {
    let map = normalize(artifact);

    let direct: BTreeSet<&str> = map
        .iter()
        .filter(|(file, _)| file.as_str() != target_file)
        .filter(|(_, tokens)| tokens.iter().any(|t| references(t, target_file)))
        .map(|(file, _)| file.as_str())
        .collect();

    let indirect: BTreeSet<&str> = map
        .iter()
        .filter(|(file, _)| file.as_str() != target_file && !direct.contains(file.as_str()))
        .filter(|(_, tokens)| {
            tokens
                .iter()
                .any(|t| direct.iter().any(|d| references(t, d)))
        })
        .map(|(file, _)| file.as_str())
        .collect();

    let score = direct.len() + indirect.len();
    ImpactResult {
        target_file: target_file.to_string(),
        direct: direct.into_iter().map(str::to_string).collect(),
        indirect: indirect.into_iter().map(str::to_string).collect(),
        score,
        risk: RiskLevel::from_score(score),
    }
}
