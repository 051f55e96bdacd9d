mod common;

use common::*;
use quickcheck::{quickcheck, Arbitrary, Gen};
use serde_json::json;
use stratabase::prelude::*;

// Field names with a fixed kind each, so any two generated fragments stay
// kind-compatible and composition only exercises the metadata policy.
const STRING_FIELDS: &[&str] = &["alpha", "beta", "gamma"];
const NUMBER_FIELDS: &[&str] = &["delta", "epsilon"];
const BOOLEAN_FIELDS: &[&str] = &["zeta"];

#[derive(Clone, Debug)]
struct ArbFragment(TraitFragment);

impl Arbitrary for ArbFragment {
    fn arbitrary(g: &mut Gen) -> Self {
        let mut builder = TraitFragment::builder(format!("frag-{}", u16::arbitrary(g)));
        let mut used: Vec<&str> = Vec::new();
        for _ in 0..(usize::arbitrary(g) % 5) {
            let (name, mut descriptor) = match u8::arbitrary(g) % 3 {
                0 => {
                    let name = *g.choose(STRING_FIELDS).unwrap();
                    let mut d = FieldDescriptor::string(name);
                    if bool::arbitrary(g) {
                        d = d.with_default(String::arbitrary(g));
                    }
                    (name, d)
                }
                1 => {
                    let name = *g.choose(NUMBER_FIELDS).unwrap();
                    let mut d = FieldDescriptor::number(name);
                    if bool::arbitrary(g) {
                        let n = f64::arbitrary(g);
                        d = d.with_default(if n.is_finite() { n } else { 0.0 });
                    }
                    (name, d)
                }
                _ => {
                    let name = *g.choose(BOOLEAN_FIELDS).unwrap();
                    (name, FieldDescriptor::boolean(name))
                }
            };
            if used.contains(&name) {
                continue;
            }
            used.push(name);
            descriptor = descriptor.with_description(&String::arbitrary(g));
            if bool::arbitrary(g) {
                descriptor = descriptor.with_metadata_override();
            }
            builder = builder.register(descriptor).expect("names are deduplicated");
        }
        ArbFragment(builder.build())
    }
}

quickcheck! {
    fn composition_is_associative(a: ArbFragment, b: ArbFragment, c: ArbFragment) -> bool {
        let flat = compose(&[a.0.clone(), b.0.clone(), c.0.clone()]).unwrap();
        let nested = compose(&[
            TraitFragment::from_schema("ab", compose(&[a.0, b.0]).unwrap()),
            c.0,
        ])
        .unwrap();
        flat == nested
    }

    fn resolution_is_total(fragments: Vec<ArbFragment>, writes: Vec<(bool, u8, u8)>) -> bool {
        let fragments: Vec<TraitFragment> = fragments.into_iter().map(|f| f.0).collect();
        let schema = compose(&fragments).unwrap();
        let names: Vec<String> = schema.field_names().map(str::to_owned).collect();
        let mut model = StratifiedModel::new(schema, ["user", "definition"]);

        for (upper, field_ix, seed) in writes {
            if names.is_empty() {
                break;
            }
            let stratum = if upper { "user" } else { "definition" };
            let name = &names[field_ix as usize % names.len()];
            // Deliberately kind-blind writes: mismatches must degrade to
            // diagnostics, never to a resolution failure.
            let value: Value = match seed % 3 {
                0 => format!("v{seed}").into(),
                1 => f64::from(seed).into(),
                _ => (seed % 2 == 0).into(),
            };
            model.set_value(stratum, name, value).unwrap();
        }

        names.iter().all(|name| model.resolved(name).is_ok())
    }

    fn interchange_round_trips(color: String, opacity: u32, show: bool, credit: String) -> bool {
        let schema = layer_schema();
        let plain = json!({
            "color": color,
            "opacity": f64::from(opacity),
            "show": show,
            "credit": credit,
            "items": [{"id": 1, "name": "fixed"}],
        });
        let (first, _) = stratum_from_plain(&schema, "definition", &plain);
        let (second, diags) = stratum_from_plain(&schema, "definition", &stratum_to_plain(&first));
        diags.is_empty() && first == second
    }
}
