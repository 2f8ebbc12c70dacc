use actix_multipart::form::MultipartForm;
use actix_web::{web, Either, HttpResponse, ResponseError};
use tracing::{error, info, instrument, warn};

use crate::{
    entities::{
        demo_media::DemoMediaUpload,
        project::{ProjectFields, ProjectSubmission, ProjectUpload},
    },
    errors::AppError,
    flash::{redirect_with_flash, FlashMessage},
    handlers::page_error::{html, PageError},
    utils::uploads::{demo_media_submission, project_submission},
    views::projects::{index_page, project_detail_page, project_form_page, FormMode},
    AppState,
};

type ProjectForm = Result<Either<MultipartForm<ProjectUpload>, web::Form<ProjectFields>>, actix_web::Error>;

/// Renders a page, consuming the flash message that was waiting for it.
fn render(body: String, flash: &Option<FlashMessage>) -> HttpResponse {
    let mut response = html(actix_web::http::StatusCode::OK, body);
    if flash.is_some() {
        if let Err(e) = response.add_removal_cookie(&FlashMessage::removal_cookie()) {
            warn!("Failed to clear flash cookie: {}", e);
        }
    }
    response
}

async fn read_submission(form: ProjectForm) -> Result<ProjectSubmission, AppError> {
    match form {
        Ok(Either::Left(multipart)) => project_submission(multipart.into_inner()).await,
        Ok(Either::Right(fields)) => Ok(ProjectSubmission::from_fields(fields.into_inner())),
        Err(e) => Err(AppError::field(
            "form",
            format!("Expected multipart/form-data or application/x-www-form-urlencoded: {e}"),
        )),
    }
}

/// Re-renders the form with what was submitted and the reason it failed.
fn form_failure(mode: FormMode, fields: &ProjectFields, err: &AppError) -> HttpResponse {
    let message = match (err, mode) {
        (AppError::ValidationError(_), _) => err.user_message(),
        (_, FormMode::Add) => format!("Error adding project: {}", err.user_message()),
        (_, FormMode::Edit(_)) => format!("Error updating project: {}", err.user_message()),
    };
    html(
        err.status_code(),
        project_form_page(mode, fields, Some(&FlashMessage::error(message))),
    )
}

#[instrument(skip(state, flash))]
pub async fn index(
    state: web::Data<AppState>,
    flash: Option<FlashMessage>,
) -> Result<HttpResponse, PageError> {
    let projects = state.project_handler.list_projects().await?;
    Ok(render(index_page(&projects, flash.as_ref()), &flash))
}

pub async fn add_project_form(flash: Option<FlashMessage>) -> HttpResponse {
    render(project_form_page(FormMode::Add, &ProjectFields::default(), flash.as_ref()), &flash)
}

#[instrument(skip(state, form))]
pub async fn add_project(state: web::Data<AppState>, form: ProjectForm) -> HttpResponse {
    let submission = match read_submission(form).await {
        Ok(submission) => submission,
        Err(e) => return form_failure(FormMode::Add, &ProjectFields::default(), &e),
    };
    let fields = submission.fields.clone();

    match state.project_handler.create_project(submission).await {
        Ok(project) => {
            info!("Project {} added", project.id);
            redirect_with_flash("/", &FlashMessage::success("Project added successfully!"), &state.cookie_key)
        }
        Err(e) => {
            error!("Failed to add project: {}", e);
            form_failure(FormMode::Add, &fields, &e)
        }
    }
}

#[instrument(skip(state, flash))]
pub async fn project_detail(
    path: web::Path<i64>,
    state: web::Data<AppState>,
    flash: Option<FlashMessage>,
) -> Result<HttpResponse, PageError> {
    let project = state.project_handler.get_project(path.into_inner()).await?;
    Ok(render(project_detail_page(&project, flash.as_ref()), &flash))
}

#[instrument(skip(state, flash))]
pub async fn edit_project_form(
    path: web::Path<i64>,
    state: web::Data<AppState>,
    flash: Option<FlashMessage>,
) -> Result<HttpResponse, PageError> {
    let id = path.into_inner();
    let project = state.project_handler.get_project(id).await?;
    let fields = ProjectFields::from_project(&project);
    Ok(render(project_form_page(FormMode::Edit(id), &fields, flash.as_ref()), &flash))
}

#[instrument(skip(state, form))]
pub async fn edit_project(
    path: web::Path<i64>,
    state: web::Data<AppState>,
    form: ProjectForm,
) -> Result<HttpResponse, PageError> {
    let id = path.into_inner();
    let submission = match read_submission(form).await {
        Ok(submission) => submission,
        Err(e) => {
            let project = state.project_handler.get_project(id).await?;
            return Ok(form_failure(FormMode::Edit(id), &ProjectFields::from_project(&project), &e));
        }
    };
    let fields = submission.fields.clone();

    match state.project_handler.update_project(id, submission).await {
        Ok(_) => Ok(redirect_with_flash(
            &format!("/project/{id}"),
            &FlashMessage::success("Project updated successfully!"),
            &state.cookie_key,
        )),
        Err(e @ AppError::NotFound(_)) => Err(e.into()),
        Err(e) => {
            error!("Failed to update project {}: {}", id, e);
            Ok(form_failure(FormMode::Edit(id), &fields, &e))
        }
    }
}

#[instrument(skip(state))]
pub async fn delete_project(
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, PageError> {
    let id = path.into_inner();
    let cleanup = state.project_handler.delete_project(id).await?;

    if cleanup.deleted < cleanup.attempted {
        warn!(
            "Project {} deleted; {} of {} stored files removed",
            id, cleanup.deleted, cleanup.attempted
        );
    }

    Ok(redirect_with_flash(
        "/",
        &FlashMessage::success("Project deleted successfully!"),
        &state.cookie_key,
    ))
}

#[instrument(skip(state, form))]
pub async fn add_demo_media(
    path: web::Path<i64>,
    state: web::Data<AppState>,
    form: Result<MultipartForm<DemoMediaUpload>, actix_web::Error>,
) -> Result<HttpResponse, PageError> {
    let project_id = path.into_inner();

    let result = match form {
        Ok(form) => match demo_media_submission(form.into_inner()).await {
            Ok((fields, file)) => state.project_handler.add_demo_media(project_id, fields, file).await,
            Err(e) => Err(e),
        },
        Err(e) => Err(AppError::field("form", format!("Expected multipart/form-data: {e}"))),
    };

    match result {
        Ok(media) => {
            info!("Added demo {} {} to project {}", media.media_type, media.id, project_id);
            Ok(redirect_with_flash(
                &format!("/project/{project_id}"),
                &FlashMessage::success("Demo media added successfully!"),
                &state.cookie_key,
            ))
        }
        Err(e @ AppError::NotFound(_)) => Err(e.into()),
        Err(e) => {
            error!("Failed to add demo media to project {}: {}", project_id, e);
            let project = state.project_handler.get_project(project_id).await?;
            let flash = FlashMessage::error(format!("Error adding demo media: {}", e.user_message()));
            Ok(html(e.status_code(), project_detail_page(&project, Some(&flash))))
        }
    }
}
