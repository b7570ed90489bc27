//! Turns [PCCaseAttributes] into the natural-language prompt sent to an image renderer.
//!

use crate::attributes::PCCaseAttributes;

const OPENING: &str = "A high-resolution render of";

fn joined(values: &Option<Vec<String>>) -> Option<String> {
    match values {
        Some(values) if !values.is_empty() => Some(values.join(" and ")),
        _ => None,
    }
}

/// Deterministic: the same attributes always produce the same prompt.
pub fn compose(attrs: &PCCaseAttributes) -> String {
    let mut subject = match joined(&attrs.shape) {
        Some(shape) => format!("{OPENING} a {shape} PC case"),
        None => format!("{OPENING} a PC case"),
    };
    if let Some(style) = joined(&attrs.style) {
        subject.push_str(&format!(" with a {style} aesthetic"));
    }

    let mut clauses = vec![subject];

    for (lead, values) in [
        ("made of", &attrs.material),
        ("featuring", &attrs.ventilation),
        ("illuminated by", &attrs.lighting),
        ("including", &attrs.features),
        ("set in", &attrs.environment),
    ] {
        if let Some(values) = joined(values) {
            clauses.push(format!("{lead} {values}"));
        }
    }

    format!("{}.", clauses.join("; "))
}
