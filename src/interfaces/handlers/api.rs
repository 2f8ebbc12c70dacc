use actix_web::{web, HttpResponse};
use tracing::instrument;

use crate::{
    entities::project::{Project, ProjectResponse},
    errors::AppError,
    AppState,
};

#[instrument(skip(state))]
pub async fn list_projects(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let projects = state.project_handler.list_projects().await?;
    let body: Vec<ProjectResponse> = projects.iter().map(Project::to_response).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[instrument(skip(state))]
pub async fn get_project(
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let project = state.project_handler.get_project(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(project.to_response()))
}
