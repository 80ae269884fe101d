//! JSON and markup output of resource listings for the host site.

use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::models::{Page, Resource};

const RESOURCES_PLACEHOLDER: &str = "{{ resources }}";
const PAGINATION_PLACEHOLDER: &str = "{{ pagination }}";

/// Available resource formatters, selected by name in the config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatterKind {
    #[default]
    Default,
    Compact,
}

impl FormatterKind {
    pub fn formatter(self) -> Box<dyn ResourceFormatter> {
        match self {
            FormatterKind::Default => Box::new(DefaultFormatter),
            FormatterKind::Compact => Box::new(CompactFormatter),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Markup,
}

pub trait ResourceFormatter {
    fn render(&self, resource: &Resource) -> String;
}

/// Full card with styling hooks for every display field.
pub struct DefaultFormatter;

impl ResourceFormatter for DefaultFormatter {
    fn render(&self, resource: &Resource) -> String {
        let mut classes = format!(
            "resource resource--{} text--{}",
            resource.view_size, resource.text_display
        );
        if resource.favorite {
            classes.push_str(" resource--favorite");
        }

        let mut out = format!(
            "<article class=\"{}\" data-slug=\"{}\"",
            encode_double_quoted_attribute(&classes),
            encode_double_quoted_attribute(&resource.slug)
        );
        if !resource.background_color.is_empty() {
            let _ = write!(
                out,
                " style=\"background-color: {}\"",
                encode_double_quoted_attribute(&resource.background_color)
            );
        }
        out.push('>');

        if let Some(image) = resource.thumbnail.as_ref().or(resource.image.as_ref()) {
            let _ = write!(
                out,
                "<img src=\"{}\" alt=\"{}\">",
                encode_double_quoted_attribute(&image.path),
                encode_double_quoted_attribute(&resource.name)
            );
        }
        let _ = write!(
            out,
            "<h3>{}</h3><p class=\"meta\">{} - {}</p>",
            encode_text(&resource.name),
            encode_text(&resource.author),
            resource.resource_date.format("%Y-%m-%d")
        );
        let text = if resource.short_description.is_empty() {
            &resource.description
        } else {
            &resource.short_description
        };
        let _ = write!(out, "<div class=\"description\">{}</div>", encode_text(text));

        if !resource.media_url.is_empty() {
            let label = if resource.button_label.is_empty() {
                "Read more"
            } else {
                resource.button_label.as_str()
            };
            let target = if resource.new_page {
                " target=\"_blank\" rel=\"noopener\""
            } else {
                ""
            };
            let _ = write!(
                out,
                "<a class=\"button button--{}\" href=\"{}\"{}>{}</a>",
                encode_double_quoted_attribute(&resource.button_color),
                encode_double_quoted_attribute(&resource.media_url),
                target,
                encode_text(label)
            );
        }
        out.push_str("</article>");
        out
    }
}

/// One line per resource: name, linked when it has a media url.
pub struct CompactFormatter;

impl ResourceFormatter for CompactFormatter {
    fn render(&self, resource: &Resource) -> String {
        if resource.media_url.is_empty() {
            format!("<li>{}</li>", encode_text(&resource.name))
        } else {
            format!(
                "<li><a href=\"{}\">{}</a></li>",
                encode_double_quoted_attribute(&resource.media_url),
                encode_text(&resource.name)
            )
        }
    }
}

/// Renders listings with the configured formatter and optional templates.
pub struct Renderer {
    formatter: Box<dyn ResourceFormatter>,
    view_template: Option<String>,
    tag_template: Option<String>,
}

impl Renderer {
    pub fn from_config(config: &Config) -> Result<Self> {
        let view_template = match &config.templates.view {
            Some(path) => Some(std::fs::read_to_string(path)?),
            None => None,
        };
        let tag_template = match &config.templates.tag {
            Some(path) => Some(std::fs::read_to_string(path)?),
            None => None,
        };
        Ok(Self {
            formatter: config.formatter.formatter(),
            view_template,
            tag_template,
        })
    }

    pub fn render_page(&self, page: &Page<Resource>, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(page)?),
            OutputFormat::Markup => Ok(self.page_markup(page)),
        }
    }

    fn page_markup(&self, page: &Page<Resource>) -> String {
        let body = self.render_items(&page.items);
        let pagination = format!(
            "<nav class=\"pagination\" data-page=\"{}\" data-pages=\"{}\">{}{}</nav>",
            page.number,
            page.num_pages,
            if page.has_previous {
                format!("<a rel=\"prev\" href=\"?page={}\">Previous</a>", page.number - 1)
            } else {
                String::new()
            },
            if page.has_next {
                format!("<a rel=\"next\" href=\"?page={}\">Next</a>", page.number + 1)
            } else {
                String::new()
            }
        );
        match &self.view_template {
            Some(template) => template
                .replace(RESOURCES_PLACEHOLDER, &body)
                .replace(PAGINATION_PLACEHOLDER, &pagination),
            None => format!("<section class=\"resource-list\">{}{}</section>", body, pagination),
        }
    }

    /// Unpaginated markup for embedding a whole feed in a page.
    pub fn feed_markup(&self, resources: &[Resource]) -> String {
        let body = self.render_items(resources);
        match &self.tag_template {
            Some(template) => template.replace(RESOURCES_PLACEHOLDER, &body),
            None => format!("<div class=\"resource-feed\">{}</div>", body),
        }
    }

    fn render_items(&self, resources: &[Resource]) -> String {
        resources
            .iter()
            .map(|resource| self.formatter.render(resource))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
