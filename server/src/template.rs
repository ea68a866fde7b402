use minijinja::{AutoEscape, Environment, Output, State, Value};
use std::fmt::Write;

macro_rules! embed_templates {
    ($($name:literal),+ $(,)?) => {
        [$(($name, include_str!(concat!("../templates/", $name)))),+]
    };
}

/// Every page template, compiled into the binary.
const TEMPLATES: [(&str, &str); 19] = embed_templates!(
    "base.html",
    "includes/paginator.html",
    "includes/post_card.html",
    "index.html",
    "group.html",
    "posts/group_list.html",
    "posts/new.html",
    "posts/follow.html",
    "posts/profile.html",
    "posts/post.html",
    "about/author.html",
    "about/tech.html",
    "auth/login.html",
    "auth/signup.html",
    "auth/logged_out.html",
    "misc/400.html",
    "misc/404.html",
    "misc/500.html",
    "misc/503.html",
);

/// Builds the template environment. Fails if any template doesn't parse.
pub fn create_environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut environment = Environment::new();
    environment.set_auto_escape_callback(|_name| AutoEscape::Html);
    environment.set_formatter(html_formatter);
    environment.set_trim_blocks(true);
    environment.set_lstrip_blocks(true);
    for (name, source) in TEMPLATES {
        environment.add_template(name, source)?;
    }
    Ok(environment)
}

/// Escapes strings like the default formatter but leaves `/` as is, so that urls stay readable.
fn html_formatter(out: &mut Output<'_>, state: &State<'_, '_>, value: &Value) -> Result<(), minijinja::Error> {
    let escape = matches!(state.auto_escape(), AutoEscape::Html) && !value.is_safe();
    match value.as_str() {
        Some(text) if escape => {
            for c in text.chars() {
                match c {
                    '&' => out.write_str("&amp;")?,
                    '<' => out.write_str("&lt;")?,
                    '>' => out.write_str("&gt;")?,
                    '"' => out.write_str("&quot;")?,
                    '\'' => out.write_str("&#x27;")?,
                    c => out.write_char(c)?,
                }
            }
            Ok(())
        }
        _ => minijinja::escape_formatter(out, state, value),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use minijinja::context;

    #[test]
    fn templates_compile() {
        let environment = create_environment().unwrap_or_else(|err| panic!("{err:#}"));
        for (name, _) in TEMPLATES {
            assert!(environment.get_template(name).is_ok(), "{name} is missing");
        }
    }

    #[test]
    fn escaping() -> Result<(), minijinja::Error> {
        let environment = create_environment()?;
        let html = environment.get_template("misc/404.html")?.render(context! {
            client => context! { is_authenticated => false },
            path => "/<script>",
        })?;
        assert!(html.contains("/&lt;script&gt;"));
        assert!(!html.contains("/<script>"));

        let html = environment.render_str("{{ text }} {{ text|safe }}", context! { text => "<b>'a' & \"b\"</b>" })?;
        assert_eq!(html, "&lt;b&gt;&#x27;a&#x27; &amp; &quot;b&quot;&lt;/b&gt; <b>'a' & \"b\"</b>");
        Ok(())
    }
}
