use crate::{flash::FlashMessage, utils::markdown::escape};

const STYLES: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #f6f7f9; color: #1f2328; }
header { background: #1f2328; padding: 1rem 2rem; }
header a { color: #fff; margin-right: 1.5rem; text-decoration: none; }
main { max-width: 960px; margin: 2rem auto; padding: 0 1rem; }
.flash { padding: .75rem 1rem; border-radius: 6px; margin-bottom: 1rem; }
.flash-success { background: #dafbe1; border: 1px solid #4ac26b; }
.flash-error { background: #ffebe9; border: 1px solid #ff8182; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 1rem; }
.card { background: #fff; border-radius: 8px; padding: 1rem; box-shadow: 0 1px 3px rgba(0,0,0,.08); }
.card img, .media img, .media video { width: 100%; border-radius: 6px; }
.tech { display: inline-block; background: #ddf4ff; border-radius: 12px; padding: 2px 10px; margin: 2px; font-size: .85rem; }
form label { display: block; margin-top: .75rem; font-weight: 600; }
form input[type=text], form input[type=url], form input[type=number], form textarea, form select { width: 100%; padding: .4rem; }
.actions { margin-top: 1rem; display: flex; gap: .5rem; align-items: center; }
"#;

/// Wraps page content in the shared shell with navigation and the flash banner.
pub fn page(title: &str, flash: Option<&FlashMessage>, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | Portfolio</title>
<style>{STYLES}</style>
</head>
<body>
<header><nav><a href="/">Projects</a><a href="/add_project">Add Project</a></nav></header>
<main>
{flash}
{body}
</main>
</body>
</html>"#,
        title = escape(title),
        flash = flash.map(flash_banner).unwrap_or_default(),
    )
}

pub fn flash_banner(flash: &FlashMessage) -> String {
    format!(
        r#"<div class="flash flash-{}" role="alert">{}</div>"#,
        flash.level.as_str(),
        escape(&flash.message)
    )
}

pub fn not_found_page(message: &str) -> String {
    page(
        "Not Found",
        None,
        &format!(
            r#"<h1>404</h1><p>{}</p><p><a href="/">Back to projects</a></p>"#,
            escape(message)
        ),
    )
}

pub fn error_page(status: u16, message: &str) -> String {
    page(
        "Error",
        None,
        &format!(
            r#"<h1>{status}</h1><p>Something went wrong.</p><p>{}</p><p><a href="/">Back to projects</a></p>"#,
            escape(message)
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_is_escaped_and_styled() {
        let html = page("Home", Some(&FlashMessage::error("<b>bad</b>")), "");
        assert!(html.contains(r#"class="flash flash-error" role="alert""#));
        assert!(!html.contains("<b>bad</b>"));
        assert!(html.contains("&lt;b&gt;bad&lt;&#47;b&gt;"));
    }

    #[test]
    fn error_pages() {
        assert!(not_found_page("Project not found").contains("<h1>404</h1>"));
        assert!(error_page(502, "boom").contains("<h1>502</h1>"));
    }
}
