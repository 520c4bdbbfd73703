use crate::analysis::domain::{FlatDependency, Gav};
use std::fmt;

/// The coordinates on the current recursion path, root first, together with
/// the optionality of every edge between them.
///
/// Each recursion step extends a copy of its parent's chain, so sibling
/// branches never observe each other's path.
#[derive(Debug, Clone)]
pub struct AnalysisChain {
    chain: Vec<Gav>,
    optional_links: Vec<bool>,
}

/// A cycle found at the end of an analysis chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleData {
    /// Every edge of the cycle is mandatory
    pub hard: bool,
    /// Path from the root up to the first occurrence of the repeated coordinate
    pub preceding: Vec<Gav>,
    /// The repeated coordinate, the path back to it, and the coordinate again
    pub cycle: Vec<Gav>,
}

impl AnalysisChain {
    pub fn start(gav: Gav) -> Self {
        Self {
            chain: vec![gav],
            optional_links: Vec::new(),
        }
    }

    /// Returns a new chain extended by the edge to `dependency`
    pub fn next_node(&self, dependency: &FlatDependency) -> Self {
        let mut chain = self.chain.clone();
        let mut optional_links = self.optional_links.clone();
        chain.push(dependency.gav.clone());
        optional_links.push(dependency.optional);
        Self {
            chain,
            optional_links,
        }
    }

    pub fn depth(&self) -> usize {
        self.optional_links.len()
    }

    /// Checks whether the last coordinate already appears earlier on the path.
    ///
    /// The cycle is hard when every edge walked back to the earlier
    /// occurrence is mandatory, soft when at least one is optional.
    pub fn check_cycle(&self) -> Option<CycleData> {
        let last = self.chain.last()?;
        let mut hard = true;
        for index in (0..self.optional_links.len()).rev() {
            hard &= !self.optional_links[index];
            if &self.chain[index] == last {
                return Some(CycleData {
                    hard,
                    preceding: self.chain[..index].to_vec(),
                    cycle: self.chain[index..].to_vec(),
                });
            }
        }
        None
    }
}

impl fmt::Display for CycleData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self
            .cycle
            .iter()
            .map(|gav| gav.to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        write!(
            f,
            "{} cycle {} (after {} preceding node(s))",
            if self.hard { "hard" } else { "soft" },
            path,
            self.preceding.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gav(name: &str) -> Gav {
        format!("g:{}:1", name).parse().unwrap()
    }

    #[test]
    fn test_no_cycle_on_linear_path() {
        let chain = AnalysisChain::start(gav("a"))
            .next_node(&FlatDependency::required(gav("b")))
            .next_node(&FlatDependency::optional(gav("c")));
        assert_eq!(chain.depth(), 2);
        assert!(chain.check_cycle().is_none());
        assert!(AnalysisChain::start(gav("a")).check_cycle().is_none());
    }

    #[test]
    fn test_hard_mutual_cycle() {
        let chain = AnalysisChain::start(gav("a"))
            .next_node(&FlatDependency::required(gav("b")))
            .next_node(&FlatDependency::required(gav("a")));
        let cycle = chain.check_cycle().unwrap();
        assert!(cycle.hard);
        assert!(cycle.preceding.is_empty());
        assert_eq!(cycle.cycle, vec![gav("a"), gav("b"), gav("a")]);
        assert_eq!(
            cycle.to_string(),
            "hard cycle g:a:1 -> g:b:1 -> g:a:1 (after 0 preceding node(s))"
        );
    }

    #[test]
    fn test_soft_cycle_through_optional_edge() {
        let chain = AnalysisChain::start(gav("root"))
            .next_node(&FlatDependency::required(gav("a")))
            .next_node(&FlatDependency::optional(gav("b")))
            .next_node(&FlatDependency::required(gav("a")));
        let cycle = chain.check_cycle().unwrap();
        assert!(!cycle.hard);
        assert_eq!(cycle.preceding, vec![gav("root")]);
        assert_eq!(cycle.cycle, vec![gav("a"), gav("b"), gav("a")]);
    }

    #[test]
    fn test_self_cycle() {
        let chain = AnalysisChain::start(gav("a")).next_node(&FlatDependency::required(gav("a")));
        let cycle = chain.check_cycle().unwrap();
        assert!(cycle.hard);
        assert_eq!(cycle.cycle, vec![gav("a"), gav("a")]);
    }

    #[test]
    fn test_optional_edge_outside_cycle_keeps_it_hard() {
        let chain = AnalysisChain::start(gav("root"))
            .next_node(&FlatDependency::optional(gav("a")))
            .next_node(&FlatDependency::required(gav("b")))
            .next_node(&FlatDependency::required(gav("a")));
        assert!(chain.check_cycle().unwrap().hard);
    }
}
