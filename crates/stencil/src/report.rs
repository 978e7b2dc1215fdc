//! Printing the run summary.

use console::Style;
use minijinja::Environment;
use stencil_render::RunSummary;

use crate::cli::OutputFormat;

const TEXT_REPORT: &str = r#"{% for path in written %}
{{ "written" | style("ok") }}  {{ path }}
{% endfor %}
{% for path in skipped %}
{{ "skipped" | style("warn") }}  {{ path }} (already exists, use --force to replace)
{% endfor %}
{% for failure in failures %}
{{ "failed" | style("error") }}   line {{ failure.line }}{% if failure.template %} [{{ failure.template }}{% if failure.output %} -> {{ failure.output }}{% endif %}]{% endif %}: {{ failure.message }}
{% endfor %}
{% if pruned %}
{{ pruned }} previous files removed
{% endif %}
{{ "Summary:" | style("header") }} {{ written | length }} files written, {{ skipped | length }} skipped, {{ rendered }} records rendered{% if stdout_writes %} ({{ stdout_writes }} to stdout){% endif %}, {{ failures | length | string | style("error" if failures else "ok") }} failed
"#;

fn style_for(name: &str) -> Style {
    match name {
        "ok" => Style::new().green(),
        "warn" => Style::new().yellow(),
        "error" => Style::new().red().bold(),
        "header" => Style::new().bold(),
        _ => Style::new(),
    }
}

/// Renders the human-readable report.
pub fn render_text(summary: &RunSummary, use_color: bool) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_keep_trailing_newline(true);
    env.add_filter("style", move |value: String, name: String| -> String {
        if use_color {
            style_for(&name).force_styling(true).apply_to(value).to_string()
        } else {
            value
        }
    });
    env.render_str(TEXT_REPORT, summary)
}

/// Renders the summary in the requested format.
pub fn render(summary: &RunSummary, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => {
            let use_color = console::Term::stdout().features().colors_supported();
            Ok(render_text(summary, use_color)?)
        }
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(summary)?;
            json.push('\n');
            Ok(json)
        }
    }
}
