//! taskboard users / requests commands

use serde::Serialize;

use super::Context;
use crate::api::TaskApi;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::task::{ServiceRequestSummary, UserSummary};

#[derive(Serialize)]
struct UsersReport {
    users: Vec<UserSummary>,
}

#[derive(Serialize)]
struct RequestsReport {
    service_requests: Vec<ServiceRequestSummary>,
}

pub async fn run_users(ctx: &Context) -> Result<()> {
    let users = ctx.api().list_users().await?;

    let mut human = HumanOutput::new(format!("taskboard users: {} user(s)", users.len()));
    for user in &users {
        let mut line = user.id.clone();
        if let Some(name) = user.name.as_deref() {
            line.push_str(&format!(" {name}"));
        }
        if let Some(email) = user.email.as_deref() {
            line.push_str(&format!(" <{email}>"));
        }
        human.push_detail(line);
    }

    emit_success(ctx.output, "users", &UsersReport { users }, Some(&human))
}

pub async fn run_requests(ctx: &Context) -> Result<()> {
    let service_requests = ctx.api().list_service_requests().await?;

    let mut human = HumanOutput::new(format!(
        "taskboard requests: {} service request(s)",
        service_requests.len()
    ));
    for request in &service_requests {
        human.push_detail(format!(
            "{} {}",
            request.id,
            request.title.as_deref().unwrap_or("(untitled)")
        ));
    }

    emit_success(
        ctx.output,
        "requests",
        &RequestsReport { service_requests },
        Some(&human),
    )
}
