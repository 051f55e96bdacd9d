// Shared schema fixtures used across the integration suites.
#![allow(dead_code)]

use stratabase::prelude::*;

/// Styling fragment: the kind of reusable bundle a map-layer entity mixes in.
pub fn styling_fragment() -> TraitFragment {
    TraitFragment::builder("styling")
        .register(
            FieldDescriptor::string("color")
                .with_description("Fill color as a hex string")
                .with_default("#ffffff"),
        )
        .unwrap()
        .register(FieldDescriptor::number("opacity").with_default(1.0))
        .unwrap()
        .register(FieldDescriptor::boolean("show").with_default(true))
        .unwrap()
        .build()
}

pub fn attribution_fragment() -> TraitFragment {
    TraitFragment::builder("attribution")
        .register(FieldDescriptor::string("credit"))
        .unwrap()
        .register(FieldDescriptor::string("credit_url"))
        .unwrap()
        .build()
}

/// Legend fragment: a nested object plus an identity-keyed object array.
pub fn legend_fragment() -> TraitFragment {
    let legend_schema = TraitFragment::builder("legend-inner")
        .register(FieldDescriptor::string("title"))
        .unwrap()
        .register(FieldDescriptor::string("position").with_default("bottom"))
        .unwrap()
        .build()
        .schema()
        .clone();

    let item_schema = TraitFragment::builder("legend-item")
        .register(FieldDescriptor::string("name"))
        .unwrap()
        .register(FieldDescriptor::string("color"))
        .unwrap()
        .build()
        .schema()
        .clone();

    TraitFragment::builder("legend")
        .register(FieldDescriptor::object("legend", legend_schema))
        .unwrap()
        .register(FieldDescriptor::object_array("items", item_schema, "id"))
        .unwrap()
        .build()
}

/// The composed schema for a "map layer" entity kind.
pub fn layer_schema() -> Schema {
    compose(&[styling_fragment(), attribution_fragment(), legend_fragment()]).unwrap()
}

/// A fresh model with the conventional precedence: user edits beat the
/// fetched definition, which beats computed underrides.
pub fn layer_model() -> StratifiedModel {
    StratifiedModel::new(layer_schema(), ["user", "definition", "underride"])
}
