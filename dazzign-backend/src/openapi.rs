use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(description = "Dazzign PC case design API", license(name = "MIT or Apache2", identifier="MIT Apache2.0"), title = "Dazzign", version = env!("CARGO_PKG_VERSION")),
    paths(
        crate::health,
        crate::nodes::post_node,
        crate::nodes::get_root_nodes,
        crate::nodes::get_node,
        crate::nodes::get_node_tree,
        crate::nodes::get_node_lineage,
        crate::generation::generate_image,
        crate::generation::text_to_spec,
    ),
    tags(
        (name = "node", description = "Design node storage and lineage"),
        (name = "generation", description = "Attribute extraction and image generation"),
    )
)]
pub struct ApiDoc;

pub(crate) fn api_route<T: Clone + Sync + Send + 'static>() -> Router<T> {
    let doc = ApiDoc::openapi();
    Router::new().merge(SwaggerUi::new("/api/v1/swagger-ui").url("/api/v1/openapi.json", doc))
}
