mod common;

use chrono::{TimeZone, Utc};
use common::*;
use serde_json::json;
use stratabase::prelude::*;

#[test]
fn primitives_coerce_across_friendly_representations() {
    let schema = layer_schema();
    let plain = json!({
        "color": 42,          // number -> string
        "opacity": "0.25",    // string -> number
        "show": "false",      // string -> boolean
    });
    let (stratum, diags) = stratum_from_plain(&schema, "definition", &plain);
    assert!(diags.is_empty());
    assert_eq!(stratum.get("color"), Some(&"42".into()));
    assert_eq!(stratum.get("opacity"), Some(&0.25.into()));
    assert_eq!(stratum.get("show"), Some(&false.into()));
}

#[test]
fn dates_parse_from_rfc3339() {
    let schema = compose(&[TraitFragment::builder("time")
        .register(FieldDescriptor::date("start"))
        .unwrap()
        .build()])
    .unwrap();
    let (stratum, diags) =
        stratum_from_plain(&schema, "definition", &json!({"start": "2014-08-01T00:00:00Z"}));
    assert!(diags.is_empty());
    assert_eq!(
        stratum.get("start"),
        Some(&Value::Date(Utc.with_ymd_and_hms(2014, 8, 1, 0, 0, 0).unwrap()))
    );
}

#[test]
fn irreconcilable_values_fault_with_a_field_path() {
    let schema = layer_schema();
    let plain = json!({
        "opacity": {"oops": true},
        "legend": {"title": ["not", "a", "string"]},
    });
    let (stratum, diags) = stratum_from_plain(&schema, "definition", &plain);

    let paths: Vec<&str> = diags.errors().map(|f| f.path()).collect();
    assert!(paths.contains(&"opacity"));
    assert!(paths.contains(&"legend.title"));

    // The bad fields are skipped, not substituted into the stratum.
    assert!(stratum.get("opacity").is_none());
    let legend = stratum.get("legend").unwrap().as_object().unwrap();
    assert!(!legend.contains_key("title"));
}

#[test]
fn unknown_keys_warn_and_drop_by_default() {
    let _ = env_logger::builder().is_test(true).try_init();
    let schema = layer_schema();
    let (stratum, diags) =
        stratum_from_plain(&schema, "definition", &json!({"color": "#fff", "futureField": 7}));
    assert!(stratum.get("futureField").is_none());
    assert_eq!(diags.warnings().count(), 1);
    assert!(matches!(
        diags.warnings().next().unwrap(),
        Fault::UnknownField { path } if path == "futureField"
    ));
}

#[test]
fn opt_in_passthrough_retains_unknown_keys_verbatim() {
    let schema = compose(&[TraitFragment::builder("open")
        .register(FieldDescriptor::string("name"))
        .unwrap()
        .retain_unknown()
        .build()])
    .unwrap();

    let plain = json!({"name": "x", "vendorExtension": {"deep": [1, 2]}});
    let (stratum, diags) = stratum_from_plain(&schema, "definition", &plain);
    assert!(diags.is_empty());
    assert_eq!(
        stratum.get("vendorExtension"),
        Some(&Value::Opaque(json!({"deep": [1, 2]})))
    );
    assert_eq!(stratum_to_plain(&stratum), plain);
}

#[test]
fn null_means_not_written() {
    let schema = layer_schema();
    let (stratum, diags) = stratum_from_plain(&schema, "definition", &json!({"color": null}));
    assert!(diags.is_empty());
    assert!(stratum.get("color").is_none());
}

#[test]
fn non_object_root_faults_to_an_empty_stratum() {
    let schema = layer_schema();
    let (stratum, diags) = stratum_from_plain(&schema, "definition", &json!([1, 2, 3]));
    assert!(stratum.is_empty());
    assert_eq!(diags.errors().count(), 1);
}

#[test]
fn strata_round_trip_through_plain_data() {
    let schema = layer_schema();
    let plain = json!({
        "color": "#336699",
        "opacity": 0.5,
        "show": true,
        "credit": "Example Org",
        "legend": {"title": "Depth", "position": "left"},
        "items": [
            {"id": 1, "name": "shallow", "color": "#aaddff"},
            {"id": 2, "name": "deep", "color": "#003366"},
        ],
    });

    let (first, diags) = stratum_from_plain(&schema, "definition", &plain);
    assert!(diags.is_empty());
    let (second, diags) = stratum_from_plain(&schema, "definition", &stratum_to_plain(&first));
    assert!(diags.is_empty());
    assert_eq!(first, second);
}

#[test]
fn resolved_view_serializes_every_field() {
    let mut model = layer_model();
    apply_plain(
        &mut model,
        "definition",
        &json!({"credit": "Example Org", "items": [{"id": 1, "name": "a"}]}),
    )
    .unwrap();
    model.set_value("user", "color", "#00ff00").unwrap();

    let (view, diags) = resolved_to_plain(&model);
    assert!(diags.is_empty());

    // Strata values, defaults and empties all appear: resolution is total.
    assert_eq!(view["color"], json!("#00ff00"));
    assert_eq!(view["opacity"], json!(1));
    assert_eq!(view["credit"], json!("Example Org"));
    assert_eq!(view["credit_url"], json!(""));
    assert_eq!(view["items"][0]["name"], json!("a"));
}
