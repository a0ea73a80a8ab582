use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Taskflow API",
        description = "Task management with an event-publishing workflow"
    ),
    nest(
        (path = "/tasks", api = domain_tasks::TasksApiDoc)
    )
)]
pub struct ApiDoc;
