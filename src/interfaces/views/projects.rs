use crate::{
    entities::{
        demo_media::{DemoMedia, MediaType},
        project::{Project, ProjectFields},
    },
    flash::FlashMessage,
    utils::markdown::{escape, plain_excerpt, safe_markdown_to_html},
};

use super::layout::page;

const EXCERPT_CHARS: usize = 160;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit(i64),
}

impl FormMode {
    fn action(&self) -> String {
        match self {
            FormMode::Add => "/add_project".to_string(),
            FormMode::Edit(id) => format!("/edit_project/{id}"),
        }
    }

    fn heading(&self) -> &'static str {
        match self {
            FormMode::Add => "Add Project",
            FormMode::Edit(_) => "Edit Project",
        }
    }
}

fn technology_badges(project: &Project) -> String {
    project
        .technologies
        .iter()
        .map(|t| format!(r#"<span class="tech">{}</span>"#, escape(&t.name)))
        .collect()
}

fn thumbnail(project: &Project) -> String {
    if project.image_url.is_empty() {
        return String::new();
    }
    format!(
        r#"<img src="{}" alt="{}" loading="lazy">"#,
        escape(&project.image_url),
        escape(&project.title)
    )
}

pub fn index_page(projects: &[Project], flash: Option<&FlashMessage>) -> String {
    let body = if projects.is_empty() {
        r#"<h1>Projects</h1><p>No projects yet. <a href="/add_project">Add the first one</a>.</p>"#.to_string()
    } else {
        let cards: String = projects
            .iter()
            .map(|p| {
                format!(
                    r#"<article class="card">{thumb}<h2><a href="/project/{id}">{title}</a></h2><p>{excerpt}</p><div>{techs}</div></article>"#,
                    thumb = thumbnail(p),
                    id = p.id,
                    title = escape(&p.title),
                    excerpt = escape(&plain_excerpt(&p.description, EXCERPT_CHARS)),
                    techs = technology_badges(p),
                )
            })
            .collect();
        format!(r#"<h1>Projects</h1><section class="grid">{cards}</section>"#)
    };

    page("Projects", flash, &body)
}

fn media_item(media: &DemoMedia) -> String {
    let url = escape(&media.media_url);
    let label = escape(media.media_name.as_deref().unwrap_or(""));
    let caption = media
        .caption
        .as_deref()
        .map(|c| format!("<figcaption>{}</figcaption>", escape(c)))
        .unwrap_or_default();

    let element = match media.media_type {
        MediaType::Image => format!(r#"<img src="{url}" alt="{label}" loading="lazy">"#),
        MediaType::Video => format!(
            r#"<video src="{url}" controls{autoplay}{muted} playsinline></video>"#,
            autoplay = if media.autoplay { " autoplay" } else { "" },
            muted = if media.muted { " muted" } else { "" },
        ),
    };

    format!(r#"<figure class="media">{element}{caption}</figure>"#)
}

fn media_section(project: &Project, media_type: MediaType, heading: &str) -> String {
    let items: String = project.demo_of_type(media_type).map(media_item).collect();
    if items.is_empty() {
        return String::new();
    }
    format!(r#"<section><h2>{heading}</h2><div class="grid">{items}</div></section>"#)
}

fn link(url: &str, label: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    format!(
        r#"<a href="{}" target="_blank" rel="noopener noreferrer">{label}</a>"#,
        escape(url)
    )
}

fn demo_media_form(project_id: i64) -> String {
    format!(
        r#"<section class="card">
<h2>Add Demo Media</h2>
<form method="post" action="/project/{project_id}/demo_media" enctype="multipart/form-data">
<label for="file">File</label><input type="file" id="file" name="file" accept="image/*,video/*" required>
<label for="media_type">Type</label>
<select id="media_type" name="media_type"><option value="image">Image</option><option value="video">Video</option></select>
<label for="media_name">Name</label><input type="text" id="media_name" name="media_name" maxlength="100">
<label for="caption">Caption</label><input type="text" id="caption" name="caption">
<label for="order_index">Position</label><input type="number" id="order_index" name="order_index" min="0">
<label><input type="checkbox" name="autoplay"> Autoplay (videos)</label>
<label><input type="checkbox" name="muted" checked> Muted (videos)</label>
<div class="actions"><button type="submit">Upload</button></div>
</form>
</section>"#
    )
}

pub fn project_detail_page(project: &Project, flash: Option<&FlashMessage>) -> String {
    let id = project.id;
    let body = format!(
        r#"<article>
<h1>{title}</h1>
{thumb}
<div class="description">{description}</div>
<div>{techs}</div>
<p>{github} {demo}</p>
{images}
{videos}
<div class="actions">
<a href="/edit_project/{id}">Edit</a>
<form method="post" action="/delete_project/{id}" onsubmit="return confirm('Delete this project?');"><button type="submit">Delete</button></form>
</div>
</article>
{media_form}"#,
        title = escape(&project.title),
        thumb = thumbnail(project),
        description = safe_markdown_to_html(&project.description),
        techs = technology_badges(project),
        github = link(&project.github_url, "GitHub"),
        demo = link(&project.demo_url, "Live demo"),
        images = media_section(project, MediaType::Image, "Screenshots"),
        videos = media_section(project, MediaType::Video, "Videos"),
        media_form = demo_media_form(id),
    );

    page(&project.title, flash, &body)
}

/// Add and edit share one form. Demo files chosen on edit replace the
/// existing set; leaving them empty keeps it.
pub fn project_form_page(mode: FormMode, fields: &ProjectFields, flash: Option<&FlashMessage>) -> String {
    let replace_note = match mode {
        FormMode::Add => "",
        FormMode::Edit(_) => "<p><small>Choosing demo files replaces all current demo media.</small></p>",
    };
    let cancel = match mode {
        FormMode::Add => r#"<a href="/">Cancel</a>"#.to_string(),
        FormMode::Edit(id) => format!(r#"<a href="/project/{id}">Cancel</a>"#),
    };

    let body = format!(
        r#"<h1>{heading}</h1>
<form method="post" action="{action}" enctype="multipart/form-data" class="card">
<label for="title">Title</label><input type="text" id="title" name="title" maxlength="100" required value="{title}">
<label for="description">Description (Markdown)</label><textarea id="description" name="description" rows="8" required>{description}</textarea>
<label for="technologies">Technologies (comma separated)</label><input type="text" id="technologies" name="technologies" value="{technologies}">
<label for="github_url">GitHub URL</label><input type="url" id="github_url" name="github_url" maxlength="500" value="{github_url}">
<label for="demo_url">Demo URL</label><input type="url" id="demo_url" name="demo_url" maxlength="500" value="{demo_url}">
<label for="image_url">Image URL</label><input type="url" id="image_url" name="image_url" maxlength="500" value="{image_url}">
<label for="image">Or upload an image</label><input type="file" id="image" name="image" accept="image/*">
<label for="demo_images">Demo images</label><input type="file" id="demo_images" name="demo_images" accept="image/*" multiple>
<label for="demo_videos">Demo videos</label><input type="file" id="demo_videos" name="demo_videos" accept="video/*" multiple>
<label><input type="checkbox" name="video_autoplay"> Autoplay videos</label>
<label><input type="checkbox" name="video_muted" checked> Mute videos</label>
{replace_note}
<div class="actions"><button type="submit">Save</button>{cancel}</div>
</form>"#,
        heading = mode.heading(),
        action = mode.action(),
        title = escape(&fields.title),
        description = escape(&fields.description),
        technologies = escape(&fields.technologies),
        github_url = escape(&fields.github_url),
        demo_url = escape(&fields.demo_url),
        image_url = escape(&fields.image_url),
    );

    page(mode.heading(), flash, &body)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::entities::technology::Technology;

    fn project() -> Project {
        let now = Utc::now();
        Project {
            id: 7,
            title: "<Portfolio>".into(),
            description: "**Bold** intro\n\n<script>alert(1)</script>".into(),
            github_url: "https://github.com/me/portfolio".into(),
            demo_url: String::new(),
            image_url: String::new(),
            created_at: now,
            updated_at: now,
            technologies: vec![Technology { id: 1, name: "Rust".into(), project_id: 7 }],
            demo_media: vec![DemoMedia {
                id: 1,
                project_id: 7,
                media_type: MediaType::Video,
                media_url: "https://cdn/v.mp4".into(),
                media_name: None,
                caption: None,
                order_index: 0,
                width: None,
                height: None,
                duration_seconds: None,
                format: Some("mp4".into()),
                autoplay: false,
                muted: true,
                created_at: now,
            }],
        }
    }

    #[test]
    fn detail_page_escapes_title_and_sanitizes_description() {
        let html = project_detail_page(&project(), None);
        assert!(html.contains("&lt;Portfolio&gt;"));
        assert!(html.contains("<strong>Bold</strong>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains(r#"action="/delete_project/7""#));
        assert!(html.contains(" muted"));
        assert!(!html.contains(" autoplay "));
    }

    #[test]
    fn index_lists_projects_or_an_empty_notice() {
        assert!(index_page(&[], None).contains("No projects yet"));
        let html = index_page(&[project()], None);
        assert!(html.contains(r#"href="/project/7""#));
        assert!(html.contains(r#"<span class="tech">Rust</span>"#));
    }

    #[test]
    fn edit_form_is_prefilled() {
        let fields = ProjectFields::from_project(&project());
        let html = project_form_page(FormMode::Edit(7), &fields, None);
        assert!(html.contains(r#"action="/edit_project/7""#));
        assert!(html.contains(r#"value="Rust""#));
        assert!(html.contains("replaces"));

        let add = project_form_page(FormMode::Add, &ProjectFields::default(), None);
        assert!(add.contains(r#"action="/add_project""#));
    }
}
