//! `{{path}}` placeholder substitution.
//!
//! Authors reference run state inside message text and config values with
//! double-brace placeholders. The path may be dotted (`{{response.data.id}}`).
//! A handful of single-brace legacy placeholders (`{nom}`, `{prenom}`,
//! `{email}`) predate the variable system and resolve from the contact
//! profile. Unknown placeholders are left verbatim so authoring mistakes
//! stay visible in the delivered message.

use crate::context::ExecutionContext;

/// Substitutes every `{{path}}` and legacy `{field}` placeholder in `text`.
#[must_use]
pub fn resolve(text: &str, ctx: &ExecutionContext) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        match after_open.find("}}") {
            Some(close) => {
                let path = after_open[..close].trim();
                match lookup(path, ctx) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push_str("{{");
                        out.push_str(&after_open[..close]);
                        out.push_str("}}");
                    }
                }
                rest = &after_open[close + 2..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    resolve_legacy(&out, ctx)
}

fn lookup(path: &str, ctx: &ExecutionContext) -> Option<String> {
    match path {
        "message" => Some(ctx.message.clone()),
        "nom" | "name" => non_empty(&ctx.contact.name),
        "prenom" | "firstName" => non_empty(&ctx.contact.first_name),
        "email" => non_empty(&ctx.contact.email),
        _ => ctx.variables.get_text(path),
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

fn resolve_legacy(text: &str, ctx: &ExecutionContext) -> String {
    let pairs = [
        ("{nom}", ctx.contact.name.as_str()),
        ("{prenom}", ctx.contact.first_name.as_str()),
        ("{email}", ctx.contact.email.as_str()),
    ];
    let mut out = text.to_owned();
    for (placeholder, value) in pairs {
        if !value.is_empty() {
            out = out.replace(placeholder, value);
        }
    }
    out
}
