use chartexec::{normalize, Normalizer, Resolver, ENTRY_MARKER};

const SAMPLES: &[&str] = &[
    "some preamble\n```python\nimport X\nchart = plot(data)\n```\nthanks!",
    "import X\nresult = do_stuff()",
    "Sure! Here is the chart:\n\n```python\nimport altair as alt\n<imports>\ndef plot(data):\n    <stub>\n    return chart\nchart = plot(data)\n```\n\nThis chart shows the distribution of horsepower.",
    "```\nimport matplotlib.pyplot as plt\n```\n```\nimport seaborn as sns\n```",
    "import polars as pl\ndef plot(data):\n    df = data.groupby('origin').agg(pl.col('mpg').mean()).sort('mpg', reverse=True)\n    return df\n",
    "just words, no code",
    "",
    "import X\n<imp<stub>orts>",
    "``<stub>`py\nimport a\n``<stub>`\ntrailing prose",
];

#[test]
fn normalize_is_idempotent() {
    for raw in SAMPLES {
        let once = normalize(raw);
        let twice = normalize(once.code());
        assert_eq!(once.code(), twice.code(), "input: {raw:?}");
    }
}

#[test]
fn entry_marker_appears_exactly_once() {
    for raw in SAMPLES {
        let unit = normalize(raw);
        assert_eq!(unit.code().matches(ENTRY_MARKER).count(), 1, "input: {raw:?}");
        assert!(unit.code().trim_end().ends_with(ENTRY_MARKER));
    }
}

#[test]
fn preamble_fences_and_trailing_prose_removed() {
    let unit = normalize(SAMPLES[0]);
    assert_eq!(unit.code(), "import X\nchart = plot(data)");
}

#[test]
fn missing_marker_is_appended() {
    let unit = normalize(SAMPLES[1]);
    assert_eq!(unit.code(), format!("{}\n{}", SAMPLES[1], ENTRY_MARKER));
}

#[test]
fn template_placeholders_and_commentary_removed() {
    let unit = normalize(SAMPLES[2]);
    assert!(unit.code().starts_with("import altair as alt"));
    assert!(!unit.code().contains("<imports>"));
    assert!(!unit.code().contains("<stub>"));
    assert!(!unit.code().contains("horsepower"));
    assert!(!unit.code().contains("```"));
}

#[test]
fn placeholders_exposed_by_removal_are_removed() {
    let unit = normalize(SAMPLES[7]);
    assert_eq!(unit.code(), "import X\n\nchart = plot(data)");

    let unit = normalize(SAMPLES[8]);
    assert_eq!(unit.code(), "import a\n\nchart = plot(data)");
}

#[test]
fn only_first_fenced_block_survives() {
    let unit = normalize(SAMPLES[3]);
    assert!(unit.code().contains("matplotlib"));
    assert!(!unit.code().contains("seaborn"));
}

#[test]
fn tabular_api_drift_is_rewritten() {
    let unit = normalize(SAMPLES[4]);
    assert!(unit.code().contains("data.group_by('origin')"));
    assert!(unit.code().contains("descending=True"));
}

#[test]
fn normalized_units_resolve_their_imports() {
    let normalizer = Normalizer::default();
    let unit = normalizer.normalize(SAMPLES[2]);
    let staged = chartexec::StagedDataset {
        path: "/tmp/cars.json".into(),
        format: chartexec::DatasetFormat::Json,
    };
    let ctx = Resolver::default().resolve(&unit, &staged).unwrap();
    assert!(ctx.get("alt").is_some());
    assert!(ctx.get("data").is_some());
}
