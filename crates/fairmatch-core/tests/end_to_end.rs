use fairmatch_core::{
    CanonicalRecord, Comparison, Field, MatchingConfig, Matcher, NameWeights, PartialRatio,
    Schema, Similarity, SimilarityKind, canonicalize, compare_records, diff_all, load_str,
    normalize, score_record,
};
use serde_json::json;

fn raw(value: serde_json::Value) -> fairmatch_core::RawRecord {
    value.as_object().cloned().unwrap()
}

fn watch_show_sides() -> (Vec<CanonicalRecord>, Vec<CanonicalRecord>) {
    let left = vec![canonicalize(&raw(json!({
        "전시회 국문명": "워치 앤 주얼리 박람회",
        "영문명(Full Name)": "Watch and Jewellery Show",
    })))];
    let right = vec![canonicalize(&raw(json!({
        "전시회 국문명": "워치주얼리박람회",
        "영문명(Full Name)": "Watch & Jewellery Show 2025",
    })))];
    (left, right)
}

#[test]
fn canonicalize_is_idempotent_and_total() {
    let inputs = [
        json!({}),
        json!({"영문명(Full Name": "Waste Expo", "공식홈페이지": "https://www.wasteexpo.com"}),
        json!({"전시회 국문명": 1, "국가": null, "extra": {"nested": true}}),
    ];
    for input in inputs {
        let once = canonicalize(&raw(input));
        assert_eq!(once.iter().count(), 19);
        assert_eq!(canonicalize(&once.to_raw()), once);
        let keys: Vec<&str> = once.iter().map(|(f, _)| f.label()).collect();
        assert_eq!(keys[0], "전시회 국문명");
        assert_eq!(keys[18], "출처");
    }
}

#[test]
fn normalize_ignores_case_and_punctuation() {
    assert_eq!(normalize("  A -- B  "), normalize("a b"));
}

#[test]
fn identical_text_is_fully_similar() {
    for x in ["waste expo", "워치 주얼리 박람회", "ces"] {
        assert_eq!(PartialRatio.similarity(x, x), 1.0);
        assert_eq!(SimilarityKind::Sequence.build().similarity(x, x), 1.0);
    }
    assert_eq!(PartialRatio.similarity("", "anything"), 0.0);
}

#[test]
fn missing_secondary_name_does_not_dilute_score() {
    let a = CanonicalRecord::new().with(Field::KoreanName, "Waste Expo");
    let b = CanonicalRecord::new().with(Field::KoreanName, "Waste Expo 2026");
    let expected = PartialRatio.similarity(&normalize("Waste Expo"), &normalize("Waste Expo 2026"));
    assert_eq!(score_record(&a, &b, &MatchingConfig::default()), expected);
}

#[test]
fn threshold_above_one_yields_no_pairs() {
    let (left, right) = watch_show_sides();
    let config = MatchingConfig {
        threshold: 1.1,
        ..MatchingConfig::default()
    };
    let comparison = compare_records(&left, &right, &config);
    assert!(matches!(comparison, Comparison::NoMatches { threshold, .. } if threshold == 1.1));
    assert!(comparison.to_string().contains("1.10"));
}

#[test]
fn resolve_is_deterministic() {
    let (left, right) = watch_show_sides();
    let matcher = Matcher::new().with_threshold(0.5);
    assert_eq!(matcher.resolve(&left, &right), matcher.resolve(&left, &right));
}

#[test]
fn watch_and_jewellery_show_matches() {
    let (left, right) = watch_show_sides();
    for similarity in [SimilarityKind::Partial, SimilarityKind::Sequence] {
        let config = MatchingConfig {
            threshold: 0.7,
            similarity,
            weights: NameWeights::default(),
        };
        let comparison = compare_records(&left, &right, &config);
        assert_eq!(comparison.pairs().len(), 1, "{similarity}");
        assert!(comparison.pairs()[0].pair.score >= 0.7);
    }
}

#[test]
fn identical_records_have_no_differences() {
    let (left, _) = watch_show_sides();
    assert_eq!(diff_all(&left[0], &left[0]).differing_count(), 0);
}

#[test]
fn single_start_date_difference_is_flagged_once() {
    let a = CanonicalRecord::new()
        .with(Field::EnglishName, "Waste Expo")
        .with(Field::StartDate, "2025-05-06");
    let b = a.clone().with(Field::StartDate, "2025-05-07");
    let d = diff_all(&a, &b);
    assert_eq!(d.differing_count(), 1);
    assert_eq!(d.differing().next().map(|r| r.field.label()), Some("개최 시작"));
}

#[test]
fn loaded_collections_compare_end_to_end() {
    let left = load_str(
        "left.json",
        r#"{"data": [
            {"전시회 국문명": "워치 앤 주얼리 박람회", "영문명(Full Name)": "Watch and Jewellery Show", "개최 시작": "2025-05-06"},
            {"국가": "Japan"}
        ]}"#,
        &Schema::builtin(),
    )
    .unwrap();
    let right = load_str(
        "right.jsonl",
        "{\"전시회 국문명\": \"워치주얼리박람회\", \"영문명(FullName)\": \"Watch & Jewellery Show 2025\", \"개최 시작\": \"2025-05-07\"}\n\
         {\"전시회 국문명\": \"서울 국제 식품 산업대전\", \"영문명(Full Name)\": \"Seoul Food\"}\n",
        &Schema::builtin(),
    )
    .unwrap();
    assert_eq!(left.skipped.len(), 1);

    let config = MatchingConfig {
        threshold: 0.7,
        ..MatchingConfig::default()
    };
    let comparison = compare_records(&left.records, &right.records, &config);
    let pairs = comparison.pairs();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].pair.right_index, 0);
    assert_eq!(pairs[0].diff.differing().map(|r| r.field).collect::<Vec<_>>().len(), 3);
}
