use crate::analysis::domain::{
    BytecodeVersion, DependencyTree, EffectiveMetrics, Gav, LicenseCategory, PackageRecord,
};
use std::collections::{BTreeMap, HashSet};

/// A direct dependency's base-level record plus the edge leading to it
#[derive(Debug, Clone)]
pub struct DependencyPreview {
    pub record: PackageRecord,
    pub optional: bool,
    pub scope: String,
}

impl DependencyPreview {
    pub fn new(record: PackageRecord, optional: bool, scope: impl Into<String>) -> Self {
        Self {
            record,
            optional,
            scope: scope.into(),
        }
    }

    /// True when the dependency takes part in size, runtime and license aggregation
    fn contributes(&self) -> bool {
        !self.optional && !self.record.unresolved
    }
}

/// MetricsAggregator service computing effective (transitive) metrics
///
/// This service contains pure business logic. It never performs I/O and
/// works only on records that were already analyzed.
///
/// Only required, resolved dependencies contribute to size, bytecode
/// version and license exposure. Optional or unresolved subtrees are
/// counted but otherwise contribute nothing.
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// Computes effective metrics for `own` from its direct dependencies.
    ///
    /// # Returns
    /// `None` when `own` is unresolved, since unresolved records never carry
    /// effective metrics.
    pub fn compute(own: &PackageRecord, deps: &[DependencyPreview]) -> Option<EffectiveMetrics> {
        if own.unresolved {
            return None;
        }

        let required_dependency_count = deps.iter().filter(|d| !d.optional).count() as u32;
        let unresolved_required_count = deps
            .iter()
            .filter(|d| !d.optional && d.record.unresolved)
            .count() as u32;
        let optional_dependency_count = deps.iter().filter(|d| d.optional).count() as u32;

        let contributing: Vec<&PackageRecord> = deps
            .iter()
            .filter(|d| d.contributes())
            .map(|d| &d.record)
            .collect();

        let transitive_size_bytes = own.package_size.unwrap_or(0)
            + contributing
                .iter()
                .map(|record| record.transitive_size())
                .sum::<u64>();

        let effective_bytecode_version = contributing
            .iter()
            .filter_map(|record| Self::effective_bytecode(record))
            .chain(own.bytecode_version)
            .max();

        let dominant_license_category = contributing
            .iter()
            .map(|record| Self::dominant_license(record))
            .fold(own.own_license_category(), LicenseCategory::most_restrictive);

        let mut license_category_bytes = BTreeMap::new();
        *license_category_bytes
            .entry(own.own_license_category())
            .or_insert(0) += own.package_size.unwrap_or(0);
        for record in &contributing {
            Self::merge_license_bytes(&mut license_category_bytes, record);
        }

        Some(EffectiveMetrics {
            required_dependency_count,
            unresolved_required_count,
            optional_dependency_count,
            transitive_size_bytes,
            effective_bytecode_version,
            dominant_license_category: Some(dominant_license_category),
            license_category_bytes,
        })
    }

    /// Recomputes the total size of a materialized tree.
    ///
    /// The walk is depth-first over required, resolved edges and keeps a
    /// visited set, so a coordinate reached twice (including through a
    /// cycle) is only counted once.
    ///
    /// # Returns
    /// `None` when the root's own package size is unknown
    pub fn total_size(tree: &DependencyTree) -> Option<u64> {
        tree.record.package_size?;
        let mut visited = HashSet::new();
        Some(Self::traverse_total_size(tree, &mut visited))
    }

    fn traverse_total_size<'a>(tree: &'a DependencyTree, visited: &mut HashSet<&'a Gav>) -> u64 {
        if !visited.insert(&tree.record.gav) {
            return 0;
        }

        let own = tree.record.package_size.unwrap_or(0);
        own + tree
            .dependencies
            .iter()
            .filter(|node| !node.optional && !node.tree.record.unresolved)
            .map(|node| Self::traverse_total_size(&node.tree, visited))
            .sum::<u64>()
    }

    fn effective_bytecode(record: &PackageRecord) -> Option<BytecodeVersion> {
        match record.effective_metrics() {
            Some(metrics) => metrics
                .effective_bytecode_version
                .or(record.bytecode_version),
            None => record.bytecode_version,
        }
    }

    fn dominant_license(record: &PackageRecord) -> LicenseCategory {
        record
            .effective_metrics()
            .and_then(|metrics| metrics.dominant_license_category)
            .unwrap_or_else(|| record.own_license_category())
    }

    fn merge_license_bytes(target: &mut BTreeMap<LicenseCategory, u64>, record: &PackageRecord) {
        match record.effective_metrics() {
            Some(metrics) if !metrics.license_category_bytes.is_empty() => {
                for (category, bytes) in &metrics.license_category_bytes {
                    *target.entry(*category).or_insert(0) += bytes;
                }
            }
            _ => {
                *target.entry(record.own_license_category()).or_insert(0) +=
                    record.package_size.unwrap_or(0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::domain::DependencyNode;

    fn version(s: &str) -> BytecodeVersion {
        s.parse().unwrap()
    }

    fn own(size: u64, bytecode: &str) -> PackageRecord {
        let mut record = PackageRecord::resolved("org.example:own:1.0".parse().unwrap());
        record.package_size = Some(size);
        record.bytecode_version = Some(version(bytecode));
        record
    }

    fn resolved(name: &str, size: u64) -> PackageRecord {
        let mut record =
            PackageRecord::resolved(format!("org.example:{}:1.0", name).parse().unwrap());
        record.package_size = Some(size);
        record
    }

    fn unresolved(name: &str) -> PackageRecord {
        PackageRecord::unresolved(
            format!("org.example:{}:1.0", name).parse().unwrap(),
            "not found",
        )
    }

    fn required(record: PackageRecord) -> DependencyPreview {
        DependencyPreview::new(record, false, "compile")
    }

    fn optional(record: PackageRecord) -> DependencyPreview {
        DependencyPreview::new(record, true, "compile")
    }

    #[test]
    fn test_unresolved_own_gets_no_metrics() {
        let record = unresolved("own");
        assert!(MetricsAggregator::compute(&record, &[]).is_none());
        assert!(MetricsAggregator::compute(&record, &[required(resolved("a", 1))]).is_none());
    }

    #[test]
    fn test_leaf_package_metrics() {
        let metrics = MetricsAggregator::compute(&own(1000, "52.0"), &[]).unwrap();
        assert_eq!(metrics.required_dependency_count, 0);
        assert_eq!(metrics.unresolved_required_count, 0);
        assert_eq!(metrics.optional_dependency_count, 0);
        assert_eq!(metrics.transitive_size_bytes, 1000);
        assert_eq!(metrics.effective_bytecode_version, Some(version("52.0")));
        assert_eq!(
            metrics.dominant_license_category,
            Some(LicenseCategory::NoLicense)
        );
    }

    #[test]
    fn test_unresolved_required_dependencies() {
        let deps = vec![
            required(unresolved("a")),
            required(unresolved("b")),
            required(unresolved("c")),
        ];
        let metrics = MetricsAggregator::compute(&own(1000, "52.0"), &deps).unwrap();
        assert_eq!(metrics.required_dependency_count, 3);
        assert_eq!(metrics.unresolved_required_count, 3);
        assert_eq!(metrics.optional_dependency_count, 0);
        assert_eq!(metrics.transitive_size_bytes, 1000);
        assert_eq!(metrics.effective_bytecode_version, Some(version("52.0")));
    }

    #[test]
    fn test_counting_table() {
        // (optional, unresolved) for every dependency, then expected
        // (required, unresolved required, optional, size)
        let cases: Vec<(Vec<(bool, bool)>, (u32, u32, u32, u64))> = vec![
            (vec![], (0, 0, 0, 1000)),
            (vec![(false, false)], (1, 0, 0, 1010)),
            (vec![(false, true)], (1, 1, 0, 1000)),
            (vec![(true, false)], (0, 0, 1, 1000)),
            (vec![(true, true)], (0, 0, 1, 1000)),
            (
                vec![(false, false), (false, true), (true, false), (true, true)],
                (2, 1, 2, 1010),
            ),
            (
                vec![(false, false), (false, false), (false, false)],
                (3, 0, 0, 1030),
            ),
            (vec![(true, false), (true, false)], (0, 0, 2, 1000)),
            (vec![(false, true), (true, true)], (1, 1, 1, 1000)),
        ];

        for (index, (shape, expected)) in cases.into_iter().enumerate() {
            let deps: Vec<DependencyPreview> = shape
                .iter()
                .enumerate()
                .map(|(i, (is_optional, is_unresolved))| {
                    let name = format!("dep{}", i);
                    let record = if *is_unresolved {
                        unresolved(&name)
                    } else {
                        resolved(&name, 10)
                    };
                    DependencyPreview::new(record, *is_optional, "compile")
                })
                .collect();

            let metrics = MetricsAggregator::compute(&own(1000, "52.0"), &deps).unwrap();
            let actual = (
                metrics.required_dependency_count,
                metrics.unresolved_required_count,
                metrics.optional_dependency_count,
                metrics.transitive_size_bytes,
            );
            assert_eq!(actual, expected, "case {} with {:?}", index, shape);
        }
    }

    #[test]
    fn test_size_composition() {
        let mut deps = vec![
            required(resolved("a", 1)),
            required(resolved("b", 10)),
            required(resolved("c", 100)),
        ];
        let metrics = MetricsAggregator::compute(&own(1000, "52.0"), &deps).unwrap();
        assert_eq!(metrics.transitive_size_bytes, 1111);

        deps.push(optional(resolved("d", 9999)));
        let metrics = MetricsAggregator::compute(&own(1000, "52.0"), &deps).unwrap();
        assert_eq!(metrics.transitive_size_bytes, 1111);
        assert_eq!(metrics.optional_dependency_count, 1);
    }

    #[test]
    fn test_size_uses_child_effective_metrics() {
        let child = resolved("a", 10).with_effective_metrics(EffectiveMetrics {
            transitive_size_bytes: 500,
            ..Default::default()
        });
        let metrics = MetricsAggregator::compute(&own(1000, "52.0"), &[required(child)]).unwrap();
        assert_eq!(metrics.transitive_size_bytes, 1500);
    }

    #[test]
    fn test_unknown_own_size_counts_as_zero() {
        let mut record = own(0, "52.0");
        record.package_size = None;
        let metrics = MetricsAggregator::compute(&record, &[required(resolved("a", 7))]).unwrap();
        assert_eq!(metrics.transitive_size_bytes, 7);
    }

    #[test]
    fn test_bytecode_maximum() {
        let with_bytecode = |name: &str, v: &str| {
            let mut record = resolved(name, 1);
            record.bytecode_version = Some(version(v));
            record
        };
        let deps = vec![
            optional(with_bytecode("a", "65.0")),
            required(with_bytecode("b", "61.0")),
            required(with_bytecode("c", "61.65536")),
            required(with_bytecode("d", "52.0")),
        ];
        let metrics = MetricsAggregator::compute(&own(1000, "52.0"), &deps).unwrap();
        assert_eq!(metrics.effective_bytecode_version, Some(version("61.65536")));
    }

    #[test]
    fn test_missing_bytecode_does_not_lower_maximum() {
        let mut no_bytecode = own(1, "52.0");
        no_bytecode.bytecode_version = None;

        let metrics =
            MetricsAggregator::compute(&own(1000, "55.0"), &[required(resolved("a", 1))]).unwrap();
        assert_eq!(metrics.effective_bytecode_version, Some(version("55.0")));

        let metrics = MetricsAggregator::compute(&no_bytecode, &[]).unwrap();
        assert_eq!(metrics.effective_bytecode_version, None);
    }

    #[test]
    fn test_bytecode_prefers_child_effective_version() {
        let mut child = resolved("a", 1);
        child.bytecode_version = Some(version("50.0"));
        let child = child.with_effective_metrics(EffectiveMetrics {
            effective_bytecode_version: Some(version("61.0")),
            ..Default::default()
        });
        let metrics = MetricsAggregator::compute(&own(1, "52.0"), &[required(child)]).unwrap();
        assert_eq!(metrics.effective_bytecode_version, Some(version("61.0")));
    }

    #[test]
    fn test_dominant_license_is_most_restrictive_required_resolved() {
        let mut parent = own(100, "52.0");
        parent.license_categories = vec![LicenseCategory::Apache2];

        let mut gpl = resolved("gpl", 10);
        gpl.license_categories = vec![LicenseCategory::Gpl3];
        let mut agpl = resolved("agpl", 10);
        agpl.license_categories = vec![LicenseCategory::Agpl3];
        let mut mit = resolved("mit", 10);
        mit.license_categories = vec![LicenseCategory::Mit];

        let metrics = MetricsAggregator::compute(
            &parent,
            &[required(gpl.clone()), optional(agpl), required(mit.clone())],
        )
        .unwrap();
        assert_eq!(metrics.dominant_license_category, Some(LicenseCategory::Gpl3));

        let metrics = MetricsAggregator::compute(&parent, &[required(mit)]).unwrap();
        assert_eq!(metrics.dominant_license_category, Some(LicenseCategory::Apache2));
    }

    #[test]
    fn test_license_byte_breakdown() {
        let mut parent = own(100, "52.0");
        parent.license_categories = vec![LicenseCategory::Apache2];

        let mut mit = resolved("mit", 10);
        mit.license_categories = vec![LicenseCategory::Mit];
        let mut deep = resolved("deep", 20);
        deep.license_categories = vec![LicenseCategory::Apache2];
        let deep = deep.with_effective_metrics(EffectiveMetrics {
            transitive_size_bytes: 25,
            license_category_bytes: BTreeMap::from([
                (LicenseCategory::Apache2, 20),
                (LicenseCategory::Lgpl3, 5),
            ]),
            ..Default::default()
        });

        let metrics = MetricsAggregator::compute(
            &parent,
            &[required(mit), required(deep), required(unresolved("gone"))],
        )
        .unwrap();

        let breakdown: Vec<(LicenseCategory, u64)> = metrics
            .license_category_bytes
            .iter()
            .map(|(c, b)| (*c, *b))
            .collect();
        assert_eq!(
            breakdown,
            vec![
                (LicenseCategory::Lgpl3, 5),
                (LicenseCategory::Apache2, 120),
                (LicenseCategory::Mit, 10),
            ]
        );
        assert_eq!(metrics.transitive_size_bytes, 135);
    }

    fn tree(record: PackageRecord, children: Vec<(DependencyTree, bool)>) -> DependencyTree {
        DependencyTree::new(
            record,
            children
                .into_iter()
                .map(|(child, is_optional)| DependencyNode::new(child, is_optional, "compile"))
                .collect(),
        )
    }

    #[test]
    fn test_total_size_counts_revisited_coordinate_once() {
        // root(1000) -> a(10) -> shared(100)
        //            -> b(20) -> shared(100)
        //            -> opt(5000, optional)
        let shared = tree(resolved("shared", 100), vec![]);
        let a = tree(resolved("a", 10), vec![(shared.clone(), false)]);
        let b = tree(resolved("b", 20), vec![(shared, false)]);
        let opt = tree(resolved("opt", 5000), vec![]);
        let root = tree(
            own(1000, "52.0"),
            vec![(a, false), (b, false), (opt, true)],
        );

        assert_eq!(MetricsAggregator::total_size(&root), Some(1000 + 10 + 20 + 100));
    }

    #[test]
    fn test_total_size_terminates_on_materialized_cycle() {
        // a -> b -> a, as read back from storage with one level of repetition
        let a_again = tree(resolved("a", 10), vec![]);
        let b = tree(resolved("b", 20), vec![(a_again, false)]);
        let a = tree(resolved("a", 10), vec![(b, false)]);
        assert_eq!(MetricsAggregator::total_size(&a), Some(30));
    }

    #[test]
    fn test_total_size_skips_unresolved_and_requires_root_size() {
        let root = tree(
            resolved("root", 5),
            vec![(tree(unresolved("x"), vec![]), false)],
        );
        assert_eq!(MetricsAggregator::total_size(&root), Some(5));

        let mut unknown = resolved("root", 0);
        unknown.package_size = None;
        assert_eq!(MetricsAggregator::total_size(&tree(unknown, vec![])), None);
    }
}
