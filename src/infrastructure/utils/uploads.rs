use actix_multipart::form::tempfile::TempFile;
use futures::future::try_join_all;
use tokio::fs;

use crate::{
    entities::{
        demo_media::{is_checked, DemoMediaFields, DemoMediaUpload},
        project::{ProjectFields, ProjectSubmission, ProjectUpload},
        upload::UploadedFile,
    },
    errors::AppError,
};

/// Reads a spooled multipart file into memory. Browsers send an empty part
/// for file inputs left blank; those come back as `None`.
pub async fn read_temp_file(temp: TempFile) -> Result<Option<UploadedFile>, AppError> {
    if temp.size == 0 {
        return Ok(None);
    }

    let bytes = fs::read(temp.file.path()).await?;

    Ok(Some(UploadedFile {
        file_name: temp.file_name.filter(|name| !name.trim().is_empty()),
        content_type: temp.content_type.map(|mime| mime.to_string()),
        bytes,
    }))
}

pub async fn read_temp_files(files: Vec<TempFile>) -> Result<Vec<UploadedFile>, AppError> {
    let read = try_join_all(files.into_iter().map(read_temp_file)).await?;
    Ok(read.into_iter().flatten().collect())
}

pub async fn project_submission(form: ProjectUpload) -> Result<ProjectSubmission, AppError> {
    let fields = ProjectFields::from_upload(&form);
    let video_autoplay = is_checked(form.video_autoplay.as_ref().map(|t| t.0.as_str()));
    let video_muted = form.video_muted.as_ref().map_or(true, |t| is_checked(Some(t.0.as_str())));

    let image = match form.image {
        Some(temp) => read_temp_file(temp).await?,
        None => None,
    };

    Ok(ProjectSubmission {
        fields,
        image,
        demo_images: read_temp_files(form.demo_images).await?,
        demo_videos: read_temp_files(form.demo_videos).await?,
        video_autoplay,
        video_muted,
    })
}

pub async fn demo_media_submission(form: DemoMediaUpload) -> Result<(DemoMediaFields, Option<UploadedFile>), AppError> {
    let fields = DemoMediaFields::from_upload(&form);
    let file = read_temp_file(form.file).await?;
    Ok((fields, file))
}
