/// gRPC server implementation for chore-service
///
/// Implements all RPCs from chore_service.proto:
/// - Authentication: Login (the only unauthenticated entry point)
/// - Users: CreateUser, ListUsers
/// - Categories: CreateCategory, ListCategories
/// - Tasks: CreateTask, ListTasks
/// - Task feed: AddTaskToFeed, ListTasksFeed
///
/// Everything except Login sits behind the `grpc-auth` layer, which has
/// already validated the caller's token by the time a handler runs.
use crate::db;
use crate::error::ChoreError;
use crate::models;
use crate::security::{hash_secret, verify_secret};
use sqlx::PgPool;
use std::sync::Arc;
use token_core::TokenManager;
use tonic::{Request, Response, Status};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::chorepoints::v1::chore_service_server::ChoreService;
use super::chorepoints::v1::*;

/// Chore service gRPC server
#[derive(Clone)]
pub struct ChoreServer {
    db: PgPool,
    tokens: Arc<TokenManager>,
}

impl ChoreServer {
    pub fn new(db: PgPool, tokens: Arc<TokenManager>) -> Self {
        Self { db, tokens }
    }
}

#[tonic::async_trait]
impl ChoreService for ChoreServer {
    /// Exchange a username plus password or PIN for a bearer token.
    ///
    /// Unknown username and wrong secret produce the same response, so a
    /// caller cannot probe which usernames exist.
    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> std::result::Result<Response<LoginResponse>, Status> {
        let req = request.into_inner();

        if req.username.is_empty() {
            return Err(Status::invalid_argument("username is required"));
        }

        let has_password = !req.password.is_empty();
        let has_pin = !req.pin.is_empty();
        if has_password && has_pin {
            return Err(Status::invalid_argument(
                "supply either a password or a pin, not both",
            ));
        }
        if !has_password && !has_pin {
            return Err(Status::invalid_argument("supply either a password or a pin"));
        }

        let user = db::users::find_by_username(&self.db, &req.username)
            .await?
            .ok_or(ChoreError::InvalidCredentials)?;

        let authenticated = if has_pin {
            verify_secret(&req.pin, &user.pin_hash)?
        } else {
            verify_secret(&req.password, &user.password_hash)?
        };

        if !authenticated {
            warn!(username = %req.username, "login rejected: credential mismatch");
            return Err(ChoreError::InvalidCredentials.into());
        }

        let token = self.tokens.issue(&user.username).map_err(|err| {
            error!(error = %err, "unable to issue access token");
            Status::internal("unable to issue access token")
        })?;

        info!(username = %user.username, "login succeeded");

        Ok(Response::new(LoginResponse {
            token,
            is_admin: user.is_admin,
            is_parent: user.is_parent,
        }))
    }

    async fn create_user(
        &self,
        request: Request<CreateUserRequest>,
    ) -> std::result::Result<Response<CreateUserResponse>, Status> {
        let user = request
            .into_inner()
            .user
            .ok_or_else(|| Status::invalid_argument("user is required"))?;

        if user.username.is_empty() {
            return Err(Status::invalid_argument("username is required"));
        }
        if user.password.is_empty() {
            return Err(Status::invalid_argument("password is required"));
        }
        if user.pin.is_empty() {
            return Err(Status::invalid_argument("pin is required"));
        }

        let password_hash = hash_secret(&user.password)?;
        let pin_hash = hash_secret(&user.pin)?;

        let created = db::users::create_user(
            &self.db,
            models::NewUser {
                username: user.username,
                email: user.email,
                is_admin: user.is_admin,
                is_parent: user.is_parent,
                avatar: user.avatar,
                password_hash,
                pin_hash,
            },
        )
        .await?;

        info!(user_id = %created.id, username = %created.username, "user created");

        Ok(Response::new(CreateUserResponse {
            user: Some(user_to_proto(created)),
        }))
    }

    async fn list_users(
        &self,
        _request: Request<ListUsersRequest>,
    ) -> std::result::Result<Response<ListUsersResponse>, Status> {
        let users = db::users::list_users(&self.db).await?;

        Ok(Response::new(ListUsersResponse {
            users: users.into_iter().map(user_to_proto).collect(),
        }))
    }

    async fn create_category(
        &self,
        request: Request<CreateCategoryRequest>,
    ) -> std::result::Result<Response<CreateCategoryResponse>, Status> {
        let category = request
            .into_inner()
            .category
            .ok_or_else(|| Status::invalid_argument("category is required"))?;

        if category.name.is_empty() {
            return Err(Status::invalid_argument("name is required"));
        }

        let created = db::categories::create_category(
            &self.db,
            models::NewCategory {
                name: category.name,
                description: category.description,
                color: category.color,
            },
        )
        .await?;

        info!(category_id = %created.id, "category created");

        Ok(Response::new(CreateCategoryResponse {
            category: Some(category_to_proto(created)),
        }))
    }

    async fn list_categories(
        &self,
        _request: Request<ListCategoriesRequest>,
    ) -> std::result::Result<Response<ListCategoriesResponse>, Status> {
        let categories = db::categories::list_categories(&self.db).await?;

        Ok(Response::new(ListCategoriesResponse {
            categories: categories.into_iter().map(category_to_proto).collect(),
        }))
    }

    async fn create_task(
        &self,
        request: Request<CreateTaskRequest>,
    ) -> std::result::Result<Response<CreateTaskResponse>, Status> {
        let task = request
            .into_inner()
            .task
            .ok_or_else(|| Status::invalid_argument("task is required"))?;

        if task.name.is_empty() {
            return Err(Status::invalid_argument("name is required"));
        }

        let created = db::tasks::create_task(
            &self.db,
            models::NewTask {
                category_id: parse_uuid(&task.category_id, "category_id")?,
                assignee_id: parse_uuid(&task.assignee_id, "assignee_id")?,
                name: task.name,
                description: task.description,
                points: task.points,
                is_repeatable: task.is_repeatable,
            },
        )
        .await?;

        info!(task_id = %created.id, "task created");

        Ok(Response::new(CreateTaskResponse {
            task: Some(task_to_proto(created)),
        }))
    }

    async fn list_tasks(
        &self,
        _request: Request<ListTasksRequest>,
    ) -> std::result::Result<Response<ListTasksResponse>, Status> {
        let tasks = db::tasks::list_tasks(&self.db).await?;

        Ok(Response::new(ListTasksResponse {
            tasks: tasks.into_iter().map(task_to_proto).collect(),
        }))
    }

    async fn add_task_to_feed(
        &self,
        request: Request<AddTaskToFeedRequest>,
    ) -> std::result::Result<Response<AddTaskToFeedResponse>, Status> {
        let entry = request
            .into_inner()
            .entry
            .ok_or_else(|| Status::invalid_argument("entry is required"))?;

        let created = db::task_feed::add_entry(
            &self.db,
            models::NewTaskFeedEntry {
                task_id: parse_uuid(&entry.task_id, "task_id")?,
                assignee_id: parse_uuid(&entry.assignee_id, "assignee_id")?,
                is_complete: entry.is_complete,
                is_approved: entry.is_approved,
                points: entry.points,
            },
        )
        .await?;

        info!(entry_id = %created.id, "task feed entry created");

        Ok(Response::new(AddTaskToFeedResponse {
            entry: Some(feed_entry_to_proto(created)),
        }))
    }

    async fn list_tasks_feed(
        &self,
        _request: Request<ListTasksFeedRequest>,
    ) -> std::result::Result<Response<ListTasksFeedResponse>, Status> {
        let entries = db::task_feed::list_entries(&self.db).await?;

        Ok(Response::new(ListTasksFeedResponse {
            entries: entries.into_iter().map(feed_entry_to_proto).collect(),
        }))
    }
}

fn parse_uuid(value: &str, field: &str) -> std::result::Result<Uuid, Status> {
    Uuid::parse_str(value).map_err(|_| Status::invalid_argument(format!("invalid {field}")))
}

fn user_to_proto(user: models::User) -> User {
    User {
        id: user.id.to_string(),
        username: user.username,
        email: user.email,
        is_admin: user.is_admin,
        is_parent: user.is_parent,
        avatar: user.avatar,
        points: user.points,
        is_active: user.is_active,
    }
}

fn category_to_proto(category: models::Category) -> Category {
    Category {
        id: category.id.to_string(),
        name: category.name,
        description: category.description,
        color: category.color,
    }
}

fn task_to_proto(task: models::Task) -> Task {
    Task {
        id: task.id.to_string(),
        category_id: task.category_id.to_string(),
        assignee_id: task.assignee_id.to_string(),
        name: task.name,
        description: task.description,
        points: task.points,
        is_repeatable: task.is_repeatable,
    }
}

fn feed_entry_to_proto(entry: models::TaskFeedEntry) -> TaskFeedEntry {
    TaskFeedEntry {
        id: entry.id.to_string(),
        task_id: entry.task_id.to_string(),
        assignee_id: entry.assignee_id.to_string(),
        is_complete: entry.is_complete,
        is_approved: entry.is_approved,
        points: entry.points,
    }
}
