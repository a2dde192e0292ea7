//! Server-rendered HTML views.

use minijinja::{Environment, Value, context};
use quire_shared::ErrorResponse;

const LAYOUT: (&str, &str) = ("layout.html", include_str!("../templates/layout.html"));
const ERROR: (&str, &str) = ("error.html", include_str!("../templates/error.html"));

const TEMPLATES: [(&str, &str); 7] = [
    LAYOUT,
    ERROR,
    ("posts/index.html", include_str!("../templates/posts/index.html")),
    ("posts/_form.html", include_str!("../templates/posts/_form.html")),
    ("posts/create.html", include_str!("../templates/posts/create.html")),
    ("posts/edit.html", include_str!("../templates/posts/edit.html")),
    ("posts/show.html", include_str!("../templates/posts/show.html")),
];

/// Compiled templates, shared by every worker.
///
/// Templates ending in `.html` are auto-escaped.
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    pub fn render(&self, name: &str, ctx: Value) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }
}

fn error_page(problem: &ErrorResponse) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(LAYOUT.0, LAYOUT.1)?;
    env.add_template(ERROR.0, ERROR.1)?;
    env.get_template(ERROR.0)?.render(context! { problem })
}

/// Render the error page for a problem.
///
/// Falls back to plain text if the page itself cannot be rendered.
pub fn render_error(problem: &ErrorResponse) -> String {
    error_page(problem).unwrap_or_else(|err| {
        tracing::error!(error = %err, "Failed to render error page");
        format!("{} {}", problem.status, problem.title)
    })
}
