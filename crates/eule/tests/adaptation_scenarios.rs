//! Integration tests: heterogeneous inputs through the full pipeline.
//!
//! Covers JSON input, custom set-like types, registry extension points,
//! unadaptable values and cluster merging.

use eule::{
    AdaptStrategy, AnySet, CombinationKey, Element, EuleError, Euler, PartitionConfig, RawSet,
    RegionValue, SetLike, SetName, SetsInput, registry,
};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashSet};

fn elements(regions: &BTreeMap<CombinationKey, RegionValue>) -> BTreeMap<String, Vec<Element>> {
    regions
        .iter()
        .map(|(key, region)| (key.to_string(), region.elements()))
        .collect()
}

fn ints(values: &[i64]) -> Vec<Element> {
    values.iter().map(|&v| Element::from(v)).collect()
}

/// Tags backed by a sorted set; implements the contract itself.
#[derive(Debug, Clone, PartialEq)]
struct Tags(BTreeSet<Element>);

impl SetLike for Tags {
    type Item = Element;

    fn union(&self, other: &Self) -> Self {
        Tags(self.0.union(&other.0).cloned().collect())
    }
    fn intersection(&self, other: &Self) -> Self {
        Tags(self.0.intersection(&other.0).cloned().collect())
    }
    fn difference(&self, other: &Self) -> Self {
        Tags(self.0.difference(&other.0).cloned().collect())
    }
    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.0.iter().cloned()
    }
    fn from_elements<I: IntoIterator<Item = Element>>(elements: I) -> Self {
        Tags(elements.into_iter().collect())
    }
}

/// Breaks the contract: intersection keeps every element of the left side.
#[derive(Debug, Clone)]
struct Sticky(BTreeSet<Element>);

impl SetLike for Sticky {
    type Item = Element;

    fn union(&self, other: &Self) -> Self {
        Sticky(self.0.union(&other.0).cloned().collect())
    }
    fn intersection(&self, _other: &Self) -> Self {
        self.clone()
    }
    fn difference(&self, other: &Self) -> Self {
        Sticky(self.0.difference(&other.0).cloned().collect())
    }
    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.0.iter().cloned()
    }
    fn from_elements<I: IntoIterator<Item = Element>>(elements: I) -> Self {
        Sticky(elements.into_iter().collect())
    }
}

/// Closed integer range; knows nothing about the contract.
#[derive(Debug)]
struct Span {
    start: i64,
    end: i64,
}

/// Opaque handle used only with a detector.
#[derive(Debug)]
struct Labels(Vec<&'static str>);

#[test]
fn four_sets_from_json() {
    let input = SetsInput::from_json(&json!({
        "a": [1, 2, 3], "b": [2, 3, 4], "c": [3, 4, 5], "d": [3, 5, 6]
    }))
    .unwrap();
    let regions = eule::partition(&input).unwrap();

    let expected: BTreeMap<String, Vec<Element>> = [
        ("(a)", ints(&[1])),
        ("(d)", ints(&[6])),
        ("(a, b)", ints(&[2])),
        ("(b, c)", ints(&[4])),
        ("(c, d)", ints(&[5])),
        ("(a, b, c, d)", ints(&[3])),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    assert_eq!(elements(&regions), expected);

    let keys = eule::combination_keys(&input).unwrap();
    assert_eq!(keys.first(), Some(&CombinationKey::single("a")));
    assert_eq!(keys.last(), Some(&CombinationKey::of(["a", "b", "c", "d"])));
}

#[test]
fn mixed_containers_share_one_partition() {
    let input = SetsInput::mapping()
        .with_value("vec", vec![1u8, 2, 3])
        .with_value("hash", HashSet::from([2i64, 3, 4]))
        .with_value("tree", BTreeSet::from([3u32, 9]));
    let regions = eule::partition(&input).unwrap();

    assert_eq!(
        regions[&CombinationKey::of(["vec", "hash", "tree"])].elements(),
        ints(&[3])
    );
    assert_eq!(regions[&CombinationKey::single("hash")].elements(), ints(&[4]));
    assert!(matches!(
        regions[&CombinationKey::single("tree")],
        RegionValue::Ordered(_)
    ));
}

#[test]
fn float_sets_from_json_and_vectors() {
    let input = SetsInput::from_json(&json!({"x": [0.5, 1.5, 2]}))
        .unwrap()
        .with_value("y", vec![1.5f64, 2.0, 4.25]);
    let regions = eule::partition(&input).unwrap();

    assert_eq!(
        regions[&CombinationKey::of(["x", "y"])].elements(),
        vec![Element::from(1.5), Element::from(2)]
    );
    assert_eq!(regions[&CombinationKey::single("x")].elements(), vec![Element::from(0.5)]);
    assert_eq!(regions[&CombinationKey::single("y")].elements(), vec![Element::from(4.25)]);
}

#[test]
fn custom_set_like_type_needs_no_registration() {
    let tags = |items: &[&str]| Tags(items.iter().map(|&s| Element::from(s)).collect());
    let input = SetsInput::mapping()
        .with("red", RawSet::set_like(tags(&["apple", "cherry"])))
        .with("fruit", RawSet::set_like(tags(&["apple", "banana", "cherry"])));

    let diagram = eule::diagram(&input).unwrap();
    let shared = diagram.get(&CombinationKey::of(["red", "fruit"])).unwrap();
    assert!(shared.downcast_ref::<Tags>().is_some());
    assert_eq!(shared.len(), 2);

    let adapted = registry().adapt(&RawSet::set_like(tags(&["x"]))).unwrap();
    assert_eq!(adapted.strategy, AdaptStrategy::AlreadySetLike);
}

#[test]
fn set_like_values_ignore_catch_all_detectors() {
    let registry = eule::TypeRegistry::new();
    registry.register_detector("catch-all", |_| true, |_| Ok(AnySet::empty()));

    let tags = Tags([1, 2].map(Element::from).into_iter().collect());
    let adapted = registry.adapt(&RawSet::set_like(tags.clone())).unwrap();
    assert_eq!(adapted.strategy, AdaptStrategy::AlreadySetLike);
    assert_eq!(adapted.set.downcast_ref::<Tags>(), Some(&tags));

    let detected = registry.adapt(&RawSet::new(tags)).unwrap();
    assert_eq!(detected.strategy, AdaptStrategy::Detector("catch-all".into()));
    assert!(detected.set.is_empty());
}

#[test]
fn declared_set_like_types_adapt_without_wrapping() {
    let registry = eule::TypeRegistry::new();
    registry.register_set_like::<Tags>();
    let tags = Tags([3].map(Element::from).into_iter().collect());
    let adapted = registry.adapt(&RawSet::new(tags)).unwrap();
    assert_eq!(adapted.strategy, AdaptStrategy::Structural);
    assert_eq!(adapted.set.sorted_elements(), ints(&[3]));
}

#[test]
fn integer_value_is_rejected_with_name_and_type() {
    let input = SetsInput::mapping()
        .with_value("fine", vec![1])
        .with_value("broken", 42i32);
    match eule::partition(&input) {
        Err(EuleError::Adaptation { name, type_name, .. }) => {
            assert_eq!(name, SetName::from("broken"));
            assert_eq!(type_name, "i32");
        }
        other => panic!("expected an adaptation error, got {other:?}"),
    }
}

#[test]
fn json_number_is_rejected_with_name_and_type() {
    let input = SetsInput::from_json(&json!({"a": [1], "b": 5})).unwrap();
    let err = eule::partition(&input).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("set b (json number)"), "{message}");
    assert!(message.contains("SetLike"), "{message}");
}

#[test]
fn json_scalar_input_is_an_input_shape_error() {
    assert!(matches!(
        SetsInput::from_json(&json!("abc")),
        Err(EuleError::InputShape { .. })
    ));
}

#[test]
fn registered_type_adapter_is_used_everywhere() {
    eule::register_type(|span: &Span| {
        eule::OrderedSet::from_sequence((span.start..=span.end).map(Element::from))
    });

    let input = SetsInput::mapping()
        .with_value("low", Span { start: 1, end: 4 })
        .with_value("high", Span { start: 3, end: 6 });
    let regions = eule::partition(&input).unwrap();
    assert_eq!(
        regions[&CombinationKey::of(["low", "high"])].elements(),
        ints(&[3, 4])
    );
}

#[test]
fn registered_detector_is_used_everywhere() {
    eule::register_detector(
        "labels-detector",
        |value| value.is::<Labels>(),
        |value| {
            let labels = value.downcast_ref::<Labels>().ok_or("expected labels")?;
            Ok(AnySet::from_elements(labels.0.iter().map(|&l| Element::from(l))))
        },
    );

    let input = SetsInput::list([
        RawSet::new(Labels(vec!["a", "b"])),
        RawSet::new(Labels(vec!["b"])),
    ]);
    let boundaries = eule::boundaries(&input).unwrap();
    assert_eq!(boundaries[&SetName::Index(0)], vec![SetName::Index(1)]);
    assert!(
        registry()
            .detector_labels()
            .contains(&"labels-detector".to_string())
    );
}

#[test]
fn euler_facade_over_json() {
    let input = SetsInput::from_json_str(r#"{"x": [1, 2], "y": [1, 2]}"#).unwrap();
    let euler = Euler::new(&input).unwrap();
    assert_eq!(euler.keys(), vec![CombinationKey::of(["x", "y"])]);
    assert_eq!(euler.to_string(), "Euler({(x, y): [1, 2]})");
}

#[test]
fn cluster_collisions_are_tagged() {
    let cluster = |a: Vec<i32>, b: Vec<i32>| {
        SetsInput::mapping()
            .with_value("left", a)
            .with_value("right", b)
    };
    let clusters = [cluster(vec![1, 2], vec![2]), cluster(vec![7], vec![7, 8])];
    let config = PartitionConfig {
        workers: Some(2),
        verify: true,
        ..PartitionConfig::default()
    };

    let separate = eule::partition_clusters(&clusters, &config).unwrap();
    assert_eq!(separate.len(), 2);

    let merged = eule::partition_merged(&clusters, &config).unwrap();
    assert!(merged.has_collisions());
    assert_eq!(merged.collisions[0].key, CombinationKey::of(["left", "right"]));
    assert_eq!(
        merged.get(&CombinationKey::of(["left", "right"])).map(AnySet::sorted_elements),
        Some(ints(&[2]))
    );
    assert_eq!(merged.len(), 4);
}

#[test]
fn merged_clusters_are_verified_before_merging() {
    let sticky = |value: i64| RawSet::set_like(Sticky(BTreeSet::from([Element::from(value)])));
    let clusters = [SetsInput::mapping()
        .with("a", sticky(1))
        .with("b", sticky(2))];
    let checked = PartitionConfig {
        verify: true,
        ..PartitionConfig::default()
    };

    assert!(matches!(
        eule::partition_merged(&clusters, &checked),
        Err(EuleError::Kernel(_))
    ));
    assert!(eule::partition_clusters(&clusters, &checked).is_err());

    let unchecked = eule::partition_merged(&clusters, &PartitionConfig::default()).unwrap();
    assert!(!unchecked.is_empty());
}

#[test]
fn records_snapshot() {
    let input = SetsInput::from_json(&json!({"x": [2, 1], "y": [3, 2]})).unwrap();
    let diagram = eule::diagram(&input).unwrap();
    insta::assert_json_snapshot!(diagram.records(), @r###"
    [
      {
        "key": [
          "x"
        ],
        "elements": [
          1
        ]
      },
      {
        "key": [
          "y"
        ],
        "elements": [
          3
        ]
      },
      {
        "key": [
          "x",
          "y"
        ],
        "elements": [
          2
        ]
      }
    ]
    "###);
}
