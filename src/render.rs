//! Report rendering: markdown for files and terminals, standalone HTML for browsers.

use crate::analysis::{AnalysisReport, Persona};
use crate::client::display_text;
use pulldown_cmark::{Options, Parser, html};
use std::fmt::Write;

/// The whole report as markdown
pub fn report_markdown(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Analysis\n");
    let _ = writeln!(out, "> {}\n", report.problem.as_str().replace('\n', "\n> "));

    for persona in Persona::ALL {
        let _ = writeln!(out, "## {}\n", persona.label());
        let _ = writeln!(out, "{}\n", report.personas.text_for(persona).trim_end());
    }

    let _ = writeln!(out, "## Synthesis\n");
    let _ = writeln!(out, "{}", display_text(&report.synthesis).trim_end());
    out
}

/// Render markdown to an HTML fragment
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        // model output is rendered, never executed
        pulldown_cmark::Event::Html(raw) | pulldown_cmark::Event::InlineHtml(raw) => {
            pulldown_cmark::Event::Text(raw)
        }
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// The whole report as a standalone HTML page
pub fn report_html(report: &AnalysisReport) -> String {
    let body = markdown_to_html(&report_markdown(report));
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Analysis {}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        report.run_id, body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{PersonaResponses, ProblemStatement};
    use crate::client::{AttemptError, CallError};
    use std::time::Duration;
    use uuid::Uuid;

    fn sample_report() -> AnalysisReport {
        let mut personas = PersonaResponses::new();
        personas.insert(Persona::Security, Ok("**Use MFA**".to_string()));
        personas.insert(Persona::Design, Ok("<script>alert(1)</script>".to_string()));
        personas.insert(
            Persona::Efficiency,
            Err(CallError::exhausted(&AttemptError::Network("down".into()), 3)),
        );
        AnalysisReport {
            run_id: Uuid::new_v4(),
            problem: ProblemStatement::parse("Design a login flow", 5000).expect("valid"),
            personas,
            synthesis: Ok("Do all three.".to_string()),
            elapsed: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_markdown_has_every_section() {
        let markdown = report_markdown(&sample_report());
        assert!(markdown.contains("> Design a login flow"));
        assert!(markdown.contains("## Claude · Security Expert"));
        assert!(markdown.contains("Error: Network error."));
        assert!(markdown.contains("## Synthesis\n\nDo all three."));
    }

    #[test]
    fn test_html_escapes_raw_html() {
        let page = report_html(&sample_report());
        assert!(page.contains("<strong>Use MFA</strong>"));
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
    }
}
