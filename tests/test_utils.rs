#![allow(dead_code)]

use std::{net::TcpListener, sync::Arc};

use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use async_trait::async_trait;
use chrono::Utc;
use mockall::mock;
use portfolio_projects::{
    entities::{
        demo_media::{DemoMedia, DemoMediaInsert, MediaType},
        project::{Project, ProjectInsert, ProjectUpdate},
        technology::Technology,
        upload::UploadedFile,
    },
    errors::{AppError, StorageError},
    repositories::project::ProjectRepository,
    routes::configure_routes,
    settings::{AppConfig, AppEnvironment},
    storage::MediaStorage,
    AppState,
};
use reqwest::{header::SET_COOKIE, redirect::Policy, Client, Response};

pub const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

mock! {
    pub ProjectRepo {}

    #[async_trait]
    impl ProjectRepository for ProjectRepo {
        async fn check_connection(&self) -> Result<(), AppError>;
        async fn create_project(&self, project: &ProjectInsert) -> Result<i64, AppError>;
        async fn get_project_by_id(&self, id: i64) -> Result<Project, AppError>;
        async fn list_projects(&self) -> Result<Vec<Project>, AppError>;
        async fn count_projects(&self) -> Result<i64, AppError>;
        async fn update_project(&self, id: i64, update: &ProjectUpdate) -> Result<(), AppError>;
        async fn delete_project(&self, id: i64) -> Result<(), AppError>;
        async fn add_demo_media(&self, project_id: i64, media: &DemoMediaInsert) -> Result<DemoMedia, AppError>;
        async fn normalize_media_urls(&self) -> Result<u64, AppError>;
    }
}

mock! {
    pub Storage {}

    #[async_trait]
    impl MediaStorage for Storage {
        async fn upload(&self, file: &UploadedFile, folder: &str) -> Result<String, StorageError>;
        async fn delete(&self, public_url: &str) -> Result<bool, StorageError>;
        async fn check_connection(&self) -> Result<bool, StorageError>;
    }
}

pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub config: AppConfig,
}

impl TestApp {
    /// Serves the full route table on an ephemeral port, backed by the given mocks.
    pub async fn spawn(repo: MockProjectRepo, storage: MockStorage) -> Self {
        let config = test_config();

        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let state = web::Data::new(AppState::with_services(&config, Arc::new(repo), Arc::new(storage)));
        let max_upload_bytes = config.max_upload_bytes();

        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .wrap(NormalizePath::trim())
                .configure(configure_routes(max_upload_bytes))
        })
        .listen(listener)
        .expect("Failed to bind server")
        .workers(config.worker_count)
        .run();

        tokio::spawn(server);

        // Redirects are asserted on, not followed
        let client = Client::builder()
            .redirect(Policy::none())
            .build()
            .expect("Failed to build client");

        TestApp { address, client, config }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client.get(self.url(path)).send().await.expect("GET failed")
    }

    pub async fn get_with_cookie(&self, path: &str, cookie: &str) -> Response {
        self.client
            .get(self.url(path))
            .header(reqwest::header::COOKIE, cookie)
            .send()
            .await
            .expect("GET failed")
    }

    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Response {
        self.client.post(self.url(path)).form(fields).send().await.expect("POST failed")
    }

    pub async fn post_multipart(&self, path: &str, form: reqwest::multipart::Form) -> Response {
        self.client.post(self.url(path)).multipart(form).send().await.expect("POST failed")
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        name: "Portfolio Projects Test".to_string(),
        port: 0,
        host: "127.0.0.1".to_string(),
        worker_count: 1,
        database_url: "postgres://localhost/portfolio_test".into(),
        database_max_connections: 2,
        secret_key: "test_secret_key_that_is_long_enough_to_sign_cookies".into(),
        storage_url: "https://test.supabase.co".into(),
        storage_key: "test-service-key".into(),
        storage_bucket: "portfolio-media".into(),
        cors_allowed_origins: vec!["*".to_string()],
        max_upload_mb: 20,
    }
}

/// `name=value` of the first cookie the response sets, ready for a Cookie header.
pub fn first_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(str::to_string)
}

pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn png_part(name: &str) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(PNG_BYTES.to_vec())
        .file_name(name.to_string())
        .mime_str("image/png")
        .unwrap()
}

pub fn demo(id: i64, project_id: i64, media_type: MediaType, url: &str) -> DemoMedia {
    DemoMedia {
        id,
        project_id,
        media_type,
        media_url: url.to_string(),
        media_name: None,
        caption: None,
        order_index: id as i32,
        width: None,
        height: None,
        duration_seconds: None,
        format: None,
        autoplay: false,
        muted: true,
        created_at: Utc::now(),
    }
}

pub fn sample_project(id: i64) -> Project {
    let now = Utc::now();
    Project {
        id,
        title: format!("Project{id}"),
        description: "A **test** project".to_string(),
        github_url: "https://github.com/me/project".to_string(),
        demo_url: String::new(),
        image_url: String::new(),
        created_at: now,
        updated_at: now,
        technologies: vec![
            Technology { id: 1, name: "Go".into(), project_id: id },
            Technology { id: 2, name: "Rust".into(), project_id: id },
        ],
        demo_media: Vec::new(),
    }
}

/// A project whose thumbnail and demo media all live in the test bucket.
pub fn project_with_files(id: i64) -> Project {
    let base = "https://test.supabase.co/storage/v1/object/public/portfolio-media";
    Project {
        image_url: format!("{base}/project_images/thumb.png"),
        demo_media: vec![
            demo(1, id, MediaType::Image, &format!("{base}/demo_images/a.png")),
            demo(2, id, MediaType::Video, &format!("{base}/demo_videos/b.mp4")),
        ],
        ..sample_project(id)
    }
}
