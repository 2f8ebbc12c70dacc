use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::{
    entities::{
        demo_media::{DemoMedia, DemoMediaInsert},
        project::{Project, ProjectInsert, ProjectRow, ProjectUpdate},
        technology::Technology,
    },
    errors::AppError,
    repositories::sqlx_repo::SqlxProjectRepo,
};

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn check_connection(&self) -> Result<(), AppError>;

    /// Inserts the project with its technologies and demo media in one transaction.
    async fn create_project(&self, project: &ProjectInsert) -> Result<i64, AppError>;

    async fn get_project_by_id(&self, id: i64) -> Result<Project, AppError>;

    /// All projects, newest first.
    async fn list_projects(&self) -> Result<Vec<Project>, AppError>;

    async fn count_projects(&self) -> Result<i64, AppError>;

    /// Overwrites the project fields and replaces its technology set (and
    /// its demo media set when the update carries one) in one transaction.
    async fn update_project(&self, id: i64, update: &ProjectUpdate) -> Result<(), AppError>;

    /// Deletes the project and every row it owns in one transaction.
    async fn delete_project(&self, id: i64) -> Result<(), AppError>;

    /// Appends one demo media item. A missing order index becomes one past
    /// the project's current maximum, or 0 for the first item.
    async fn add_demo_media(&self, project_id: i64, media: &DemoMediaInsert) -> Result<DemoMedia, AppError>;

    /// Strips trailing `?` left on stored media URLs; returns rows fixed.
    async fn normalize_media_urls(&self) -> Result<u64, AppError>;
}

impl SqlxProjectRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxProjectRepo { pool }
    }

    async fn load_children(
        &self,
        project_ids: &[i64],
    ) -> Result<(HashMap<i64, Vec<Technology>>, HashMap<i64, Vec<DemoMedia>>), AppError> {
        let technologies = sqlx::query_as::<_, Technology>(
            r#"
            SELECT id, name, project_id
            FROM technologies
            WHERE project_id = ANY($1)
            ORDER BY id
            "#
        )
        .bind(project_ids)
        .fetch_all(&self.pool)
        .await?;

        let demo_media = sqlx::query_as::<_, DemoMedia>(
            r#"
            SELECT * FROM demo_media
            WHERE project_id = ANY($1)
            ORDER BY order_index, id
            "#
        )
        .bind(project_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut tech_by_project: HashMap<i64, Vec<Technology>> = HashMap::new();
        for tech in technologies {
            tech_by_project.entry(tech.project_id).or_default().push(tech);
        }

        let mut media_by_project: HashMap<i64, Vec<DemoMedia>> = HashMap::new();
        for media in demo_media {
            media_by_project.entry(media.project_id).or_default().push(media);
        }

        Ok((tech_by_project, media_by_project))
    }
}

async fn insert_technologies(
    conn: &mut PgConnection,
    project_id: i64,
    names: &[String],
) -> Result<(), sqlx::Error> {
    if names.is_empty() {
        return Ok(());
    }

    let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO technologies (name, project_id) ");
    builder.push_values(names, |mut row, name| {
        row.push_bind(name).push_bind(project_id);
    });
    builder.build().execute(conn).await?;

    Ok(())
}

async fn insert_demo_media(
    conn: &mut PgConnection,
    project_id: i64,
    media: &DemoMediaInsert,
) -> Result<DemoMedia, sqlx::Error> {
    sqlx::query_as::<_, DemoMedia>(
        r#"
        INSERT INTO demo_media (
            project_id, media_type, media_url, media_name, caption, order_index,
            width, height, duration_seconds, format, autoplay, muted
        )
        VALUES (
            $1, $2, $3, $4, $5,
            COALESCE($6, (SELECT COALESCE(MAX(order_index), -1) + 1 FROM demo_media WHERE project_id = $1)),
            $7, $8, $9, $10, $11, $12
        )
        RETURNING *
        "#
    )
    .bind(project_id)
    .bind(media.media_type)
    .bind(&media.media_url)
    .bind(&media.media_name)
    .bind(&media.caption)
    .bind(media.order_index)
    .bind(media.width)
    .bind(media.height)
    .bind(media.duration_seconds)
    .bind(&media.format)
    .bind(media.autoplay)
    .bind(media.muted)
    .fetch_one(conn)
    .await
}

#[async_trait]
impl ProjectRepository for SqlxProjectRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    async fn create_project(&self, project: &ProjectInsert) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO projects (title, description, github_url, demo_url, image_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#
        )
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.github_url)
        .bind(&project.demo_url)
        .bind(&project.image_url)
        .fetch_one(&mut *tx)
        .await?;

        insert_technologies(&mut *tx, id, &project.technologies).await?;

        for media in &project.demo_media {
            insert_demo_media(&mut *tx, id, media).await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    async fn get_project_by_id(&self, id: i64) -> Result<Project, AppError> {
        let row = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(AppError::project_not_found)?;

        let (mut technologies, mut demo_media) = self.load_children(&[id]).await?;

        Ok(Project::from_parts(
            row,
            technologies.remove(&id).unwrap_or_default(),
            demo_media.remove(&id).unwrap_or_default(),
        ))
    }

    async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            "SELECT * FROM projects ORDER BY created_at DESC, id DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let (mut technologies, mut demo_media) = self.load_children(&ids).await?;

        let projects = rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                Project::from_parts(
                    row,
                    technologies.remove(&id).unwrap_or_default(),
                    demo_media.remove(&id).unwrap_or_default(),
                )
            })
            .collect();

        Ok(projects)
    }

    async fn count_projects(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn update_project(&self, id: i64, update: &ProjectUpdate) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE projects SET
                title = $1,
                description = $2,
                github_url = $3,
                demo_url = $4,
                image_url = $5,
                updated_at = NOW()
            WHERE id = $6
            RETURNING id
            "#
        )
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.github_url)
        .bind(&update.demo_url)
        .bind(&update.image_url)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            return Err(AppError::project_not_found());
        }

        sqlx::query("DELETE FROM technologies WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_technologies(&mut *tx, id, &update.technologies).await?;

        if let Some(demo_media) = &update.demo_media {
            sqlx::query("DELETE FROM demo_media WHERE project_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for media in demo_media {
                insert_demo_media(&mut *tx, id, media).await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_project(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM technologies WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM demo_media WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::project_not_found());
        }

        tx.commit().await?;
        Ok(())
    }

    async fn add_demo_media(&self, project_id: i64, media: &DemoMediaInsert) -> Result<DemoMedia, AppError> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM projects WHERE id = $1)")
            .bind(project_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(AppError::project_not_found());
        }

        let inserted = insert_demo_media(&mut *tx, project_id, media).await?;

        tx.commit().await?;
        Ok(inserted)
    }

    async fn normalize_media_urls(&self) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let projects = sqlx::query(
            "UPDATE projects SET image_url = RTRIM(image_url, '?') WHERE image_url LIKE '%?'"
        )
        .execute(&mut *tx)
        .await?;

        let media = sqlx::query(
            "UPDATE demo_media SET media_url = RTRIM(media_url, '?') WHERE media_url LIKE '%?'"
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(projects.rows_affected() + media.rows_affected())
    }
}
