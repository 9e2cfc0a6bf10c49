//! Operator panel page.
//!
//! A single HTML page plus its script, compiled into the binary. The page
//! talks only to the JSON endpoints under `/dashboard/api`.

use axum::{
    http::header,
    response::{Html, IntoResponse},
};
use phone_teacher_core::persona::Preset;

const PAGE_TEMPLATE: &str = include_str!("../static/dashboard.html");
const SCRIPT: &str = include_str!("../static/dashboard.js");

fn preset_buttons() -> String {
    Preset::ALL
        .iter()
        .map(|preset| {
            format!(
                r#"<button class="btn-preset" data-preset="{name}_assistant">{label}</button>"#,
                name = preset.name(),
                label = preset.name().replace('_', " "),
            )
        })
        .collect::<Vec<_>>()
        .join("\n      ")
}

pub async fn index() -> Html<String> {
    Html(PAGE_TEMPLATE.replace("{{presets}}", &preset_buttons()))
}

pub async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        SCRIPT,
    )
}
