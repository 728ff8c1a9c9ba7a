//! GraphQL API over posts, categories, tags and files.
//!
//! Authorization relies on the optional [`AuthUser`] attached as request
//! data by [`graphql_handler`].

pub mod engagement;
pub mod mutation;
pub mod query;
pub mod types;

use std::sync::Arc;

use async_graphql::{
    Context, EmptySubscription, Error, Schema,
    http::GraphiQLSource,
};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Extension,
    extract::State,
    response::{Html, IntoResponse},
};
use tracing::error;

use myblog_core::{BlogError, Repositories};

use crate::{AppState, auth::AuthUser};

use self::{engagement::EngagementSource, mutation::MutationRoot, query::QueryRoot};

pub type BlogSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Public site URL used when composing post permalinks.
#[derive(Debug, Clone)]
pub struct SiteUrl(pub String);

pub fn build_schema(
    repositories: Repositories,
    engagement: Arc<dyn EngagementSource>,
    base_url: impl Into<String>,
) -> BlogSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(repositories)
        .data(engagement)
        .data(SiteUrl(base_url.into()))
        .finish()
}

pub async fn graphql_handler(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = req.into_inner();
    if let Some(Extension(user)) = user {
        request = request.data(user);
    }
    state.schema.execute(request).await.into()
}

pub async fn graphiql_handler() -> impl IntoResponse {
    Html(
        GraphiQLSource::build()
            .endpoint("/graphql")
            .title("myblog GraphiQL")
            .finish(),
    )
}

/// Map a domain error onto the plain status text clients expect.
pub(crate) fn gql_error(err: BlogError) -> Error {
    let message = match &err {
        BlogError::NotFound(_) => "Not Found",
        BlogError::Validation(_) => "Bad Request",
        BlogError::Unauthorized => "Unauthorized",
        BlogError::Forbidden => "Forbidden",
        other => {
            error!(error = %other, "graphql resolver failed");
            "Internal Server Error"
        }
    };
    Error::new(message)
}

pub(crate) fn current_user<'a>(ctx: &'a Context<'_>) -> Result<&'a AuthUser, Error> {
    ctx.data_opt::<AuthUser>()
        .ok_or_else(|| gql_error(BlogError::Unauthorized))
}

/// Clamp client-supplied paging to what the repositories accept.
pub(crate) fn pagination(offset: i64, limit: i64) -> (u64, i64) {
    (u64::try_from(offset).unwrap_or(0), limit.max(0))
}
