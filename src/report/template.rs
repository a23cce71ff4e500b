//! `{{name}}` placeholder templates for the HTML report.
//!
//! Values are either text, escaped on output, or markup produced by another
//! template, inserted as is. Substitution is a single pass, so a value that
//! happens to contain `{{...}}` is never expanded again.

use std::borrow::Cow;
use thiserror::Error;

use crate::error::AppError;
use crate::utils::escape_markup;

#[derive(Error, Debug, PartialEq)]
pub enum TemplateError {
    #[error("unclosed placeholder at byte {0}")]
    Unclosed(usize),

    #[error("no value for placeholder `{0}`")]
    Missing(String),
}

impl From<TemplateError> for AppError {
    fn from(err: TemplateError) -> Self {
        AppError::Other(format!("Report template error: {}", err))
    }
}

enum Slot<'a> {
    Text(Cow<'a, str>),
    Html(String),
}

/// Named values for one [`render`] call
#[derive(Default)]
pub struct Vars<'a> {
    slots: Vec<(&'static str, Slot<'a>)>,
}

impl<'a> Vars<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain text; `&`, `<`, `>` and quotes are escaped when rendered
    pub fn text(mut self, name: &'static str, value: impl Into<Cow<'a, str>>) -> Self {
        self.slots.push((name, Slot::Text(value.into())));
        self
    }

    /// Markup rendered by another template
    pub fn html(mut self, name: &'static str, value: String) -> Self {
        self.slots.push((name, Slot::Html(value)));
        self
    }

    fn get(&self, name: &str) -> Option<&Slot<'a>> {
        self.slots.iter().find(|(n, _)| *n == name).map(|(_, slot)| slot)
    }
}

/// Substitute every `{{name}}` in `source`. A placeholder without a value is
/// an error rather than being left in the output.
pub fn render(source: &str, vars: &Vars) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    let mut offset = 0;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);

        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or(TemplateError::Unclosed(offset + start))?;
        let name = after[..end].trim();

        match vars.get(name) {
            Some(Slot::Text(value)) => out.push_str(&escape_markup(value)),
            Some(Slot::Html(value)) => out.push_str(value),
            None => return Err(TemplateError::Missing(name.to_string())),
        }

        let consumed = start + 2 + end + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Render the same template once per item and concatenate the results
pub fn render_each<'a, T>(
    source: &str,
    items: &'a [T],
    vars: impl Fn(&'a T) -> Vars<'a>,
) -> Result<String, TemplateError> {
    items.iter().try_fold(String::new(), |mut out, item| {
        out.push_str(&render(source, &vars(item))?);
        Ok(out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_escaped_html_is_not() {
        let vars = Vars::new()
            .text("ticker", "M&M.NS")
            .html("row", "<td>1</td>".to_string());
        let out = render("<tr>{{row}}<td>{{ ticker }}</td></tr>", &vars).unwrap();
        assert_eq!(out, "<tr><td>1</td><td>M&amp;M.NS</td></tr>");
    }

    #[test]
    fn test_values_are_not_expanded_again() {
        let vars = Vars::new().text("a", "{{b}}").text("b", "x");
        assert_eq!(render("{{a}}-{{b}}", &vars).unwrap(), "{{b}}-x");
    }

    #[test]
    fn test_missing_and_unclosed_placeholders() {
        assert_eq!(
            render("As of {{as_of}}", &Vars::new()),
            Err(TemplateError::Missing("as_of".to_string()))
        );
        assert_eq!(
            render("ok {{broken", &Vars::new().text("broken", "x")),
            Err(TemplateError::Unclosed(3))
        );
    }

    #[test]
    fn test_render_each() {
        let names = ["A<B", "C"];
        let out = render_each("<li>{{name}}</li>", &names, |n| Vars::new().text("name", *n));
        assert_eq!(out.unwrap(), "<li>A&lt;B</li><li>C</li>");

        let none: [&str; 0] = [];
        let out = render_each("<li>{{name}}</li>", &none, |n| Vars::new().text("name", *n));
        assert_eq!(out.unwrap(), "");
    }
}
