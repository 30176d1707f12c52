//! Helpers over raw field and property payloads.

mod object_property;
mod schema;

pub use object_property::{
    empty_object_property_value, is_object_property, object_property_value,
    remove_object_property_values, set_object_property_header, update_object_property,
    ADD, HEADERS, REMOVE, TOTAL,
};
pub use schema::{
    build_empty_cell, build_preview_text_field, create_property, define_control_type,
    filter_fields, is_richtext, is_region, strip_html, text_field_type, walk_model_tree,
    ControlType, ControlTypeOptions, FieldBuilder, HEADER_BREADCRUMB, HEADER_COMPACT,
    HEADER_DEFAULT, UNSUPPORTED_CONTROLS,
};

pub(crate) use schema::is_truthy;
