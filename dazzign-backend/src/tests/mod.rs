use crate::entity::node;
use crate::generation::Generator;
use crate::lineage::NodeLineage;
use crate::middleware::PROCESS_TIME_HEADER;
use crate::nodes::{NodeTreeResponse, RootNodesResponse};
use crate::providers::chain::tests::{FailingExtractor, FailingRenderer};
use crate::providers::placeholder::PLACEHOLDER_PNG_BASE64;
use crate::providers::{ExtractorChain, RendererChain};
use crate::{build_app, AppState};
use axum_test::*;
use dazzign_shared::node::{GenerateRequest, NodeDraft, ToSpecRequest, ToSpecResponse};
use serde_json::json;
use std::sync::{Arc, Once};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(|| {
        tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new(
                "dazzign_backend=debug,tower_http=debug,info",
            ))
            .with(tracing_subscriber::fmt::layer())
            .init();
    });
}

async fn setup_test_server() -> TestServer {
    init_logging();
    let shared_state = Arc::new(AppState::test().await);
    TestServer::new(build_app(&shared_state)).unwrap()
}

async fn setup_failing_server() -> TestServer {
    init_logging();
    let generator = Generator::new(
        ExtractorChain::new(vec![Box::new(FailingExtractor)]),
        RendererChain::new(vec![Box::new(FailingRenderer)]),
    );
    let shared_state = Arc::new(AppState::test_with_generator(generator).await);
    TestServer::new(build_app(&shared_state)).unwrap()
}

async fn create(server: &TestServer, draft: NodeDraft) -> node::Model {
    let res = server.post("/api/v1/node").json(&draft).await;
    res.assert_status_ok();
    res.json::<node::Model>()
}

fn ids(nodes: &[node::Model]) -> Vec<i32> {
    nodes.iter().map(|n| n.id).collect()
}

#[tokio::test]
async fn test_health() {
    let server = setup_test_server().await;
    let res = server.get("/health").await;
    res.assert_status_ok();
    res.assert_json(&json!({"status": "ok"}));
    assert!(res.maybe_header(PROCESS_TIME_HEADER).is_some());
}

#[tokio::test]
async fn test_process_time_header_on_errors() {
    let server = setup_test_server().await;
    let res = server.get("/api/v1/node/31337").expect_failure().await;
    assert_eq!(res.status_code(), 404);
    let value = res.header(PROCESS_TIME_HEADER);
    let seconds: f64 = value
        .to_str()
        .expect("header should be ascii")
        .parse()
        .expect("header should be a float");
    assert!(seconds >= 0.0);
}

#[tokio::test]
async fn test_api_node_save_load() {
    let server = setup_test_server().await;

    let root = create(&server, NodeDraft::new("a black mid-tower")).await;
    assert!(root.is_root);
    assert_eq!(root.parent_id, None);

    // caller-supplied is_root is ignored
    let res = server
        .post("/api/v1/node")
        .json(&json!({"prompt": "sneaky", "parent_id": root.id, "is_root": true}))
        .await;
    res.assert_status_ok();
    let child = res.json::<node::Model>();
    assert!(!child.is_root);
    assert_eq!(child.parent_id, Some(root.id));

    let res = server
        .get(&format!("/api/v1/node/{}", child.id))
        .expect_success()
        .await;
    assert_eq!(res.json::<node::Model>(), child);

    let res = server
        .get(&format!("/api/v1/node/{}", child.id + 1000))
        .expect_failure()
        .await;
    assert_eq!(res.status_code(), 404);
    assert!(res.json::<serde_json::Value>()["error"].is_string());
}

#[tokio::test]
async fn test_api_node_missing_parent() {
    let server = setup_test_server().await;
    let res = server
        .post("/api/v1/node")
        .json(&NodeDraft::new("orphan").parent(4242))
        .expect_failure()
        .await;
    assert_eq!(res.status_code(), 404);

    let res = server.get("/api/v1/node/root").await;
    assert_eq!(res.json::<RootNodesResponse>().total, 0);
}

#[tokio::test]
async fn test_api_tree_and_lineage() {
    let server = setup_test_server().await;

    let a = create(&server, NodeDraft::new("a")).await;
    let b = create(&server, NodeDraft::new("b").parent(a.id)).await;
    let c = create(&server, NodeDraft::new("c").parent(b.id)).await;
    let d = create(&server, NodeDraft::new("d").parent(c.id)).await;

    let res = server.get(&format!("/api/v1/node/{}/tree", a.id)).await;
    res.assert_status_ok();
    let tree = res.json::<NodeTreeResponse>().tree;
    assert_eq!(tree.node, a);
    assert_eq!(tree.children[0].node, b);
    assert_eq!(tree.children[0].children[0].node, c);
    assert_eq!(tree.children[0].children[0].children[0].node, d);
    assert!(tree.children[0].children[0].children[0].children.is_empty());

    let res = server
        .get("/api/v1/node/9999/tree")
        .expect_failure()
        .await;
    assert_eq!(res.status_code(), 404);

    let res = server.get(&format!("/api/v1/node/{}/lineage", c.id)).await;
    res.assert_status_ok();
    let lineage = res.json::<NodeLineage>();
    assert_eq!(ids(&lineage.ancestors), vec![b.id, a.id]);
    assert_eq!(ids(&lineage.descendants), vec![d.id]);

    let lineage = server
        .get(&format!("/api/v1/node/{}/lineage", a.id))
        .await
        .json::<NodeLineage>();
    assert_eq!(ids(&lineage.descendants), vec![b.id, c.id]);

    // unknown ids are not an error
    let res = server.get("/api/v1/node/9999/lineage").await;
    res.assert_status_ok();
    res.assert_json(&json!({"ancestors": [], "descendants": []}));
}

#[tokio::test]
async fn test_api_root_pagination() {
    let server = setup_test_server().await;

    let mut roots = Vec::new();
    for i in 0..3 {
        let root = create(&server, NodeDraft::new(format!("root {i}"))).await;
        create(&server, NodeDraft::new("child").parent(root.id)).await;
        roots.push(root);
    }

    let res = server.get("/api/v1/node/root").await;
    res.assert_status_ok();
    let page = res.json::<RootNodesResponse>();
    assert_eq!(page.total, 3);
    assert_eq!(page.page, 1);
    assert_eq!(page.page_size, 20);
    assert!(page.nodes.iter().all(|n| n.is_root));
    assert_eq!(
        ids(&page.nodes),
        roots.iter().rev().map(|n| n.id).collect::<Vec<_>>()
    );

    let page = server
        .get("/api/v1/node/root")
        .add_query_param("page", 2)
        .add_query_param("page_size", 1)
        .await
        .json::<RootNodesResponse>();
    assert_eq!(page.total, 3);
    assert_eq!(ids(&page.nodes), vec![roots[1].id]);

    server
        .get("/api/v1/node/root")
        .add_query_param("page_size", 100)
        .await
        .assert_status_ok();

    for (page, page_size) in [(1, 0), (1, 101), (0, 20)] {
        let res = server
            .get("/api/v1/node/root")
            .add_query_param("page", page)
            .add_query_param("page_size", page_size)
            .expect_failure()
            .await;
        assert_eq!(res.status_code(), 400, "page={page} page_size={page_size}");
    }
}

#[tokio::test]
async fn test_api_root_pagination_past_the_end() {
    let server = setup_test_server().await;
    create(&server, NodeDraft::new("lonely root")).await;

    for page in [u64::MAX, 100_000_000_000_000_000, 2] {
        let res = server
            .get("/api/v1/node/root")
            .add_query_param("page", page)
            .add_query_param("page_size", 100)
            .await;
        res.assert_status_ok();
        let body = res.json::<RootNodesResponse>();
        assert!(body.nodes.is_empty(), "page={page}");
        assert_eq!(body.total, 1);
        assert_eq!(body.page, page);
    }
}

#[tokio::test]
async fn test_api_generate_placeholder() {
    let server = setup_test_server().await;

    let res = server
        .post("/api/v1/image-gen/generate")
        .json(&GenerateRequest {
            prompt: "A futuristic cube with RGB lighting in a dark room".to_string(),
            ..Default::default()
        })
        .await;
    assert_eq!(res.status_code(), 201);
    let root = res.json::<node::Model>();
    assert!(root.is_root);
    assert_eq!(root.image_base64.as_deref(), Some(PLACEHOLDER_PNG_BASE64));
    assert_eq!(
        root.spec_json,
        Some(json!({
            "shape": ["Cube"],
            "style": ["Futuristic"],
            "lighting": ["RGB lighting"],
            "environment": ["Dark Room"],
        }))
    );
    let params = root.request_params.clone().expect("request_params");
    assert_eq!(
        params["prompt"],
        "A high-resolution render of a Cube PC case with a Futuristic aesthetic; \
         illuminated by RGB lighting; set in Dark Room."
    );
    assert_eq!(params["provider"], "placeholder");

    let res = server
        .post("/api/v1/image-gen/generate")
        .json(&GenerateRequest {
            prompt: "now in white".to_string(),
            parent_id: Some(root.id),
            action_type: Some("edit".to_string()),
            ..Default::default()
        })
        .await;
    assert_eq!(res.status_code(), 201);
    let child = res.json::<node::Model>();
    assert_eq!(child.parent_id, Some(root.id));
    assert_eq!(child.action_type, "edit");

    let res = server
        .post("/api/v1/image-gen/generate")
        .json(&GenerateRequest {
            prompt: "lost".to_string(),
            parent_id: Some(root.id + 100),
            ..Default::default()
        })
        .expect_failure()
        .await;
    assert_eq!(res.status_code(), 404);

    let res = server
        .post("/api/v1/image-gen/generate")
        .json(&GenerateRequest {
            prompt: "bad image".to_string(),
            image_base64: Some("%%%".to_string()),
            ..Default::default()
        })
        .expect_failure()
        .await;
    assert_eq!(res.status_code(), 400);
}

#[tokio::test]
async fn test_api_generate_with_failing_providers() {
    let server = setup_failing_server().await;

    let res = server
        .post("/api/v1/image-gen/generate")
        .json(&GenerateRequest {
            prompt: "anything at all".to_string(),
            ..Default::default()
        })
        .await;
    assert_eq!(res.status_code(), 201);
    let node = res.json::<node::Model>();
    assert_eq!(node.image_base64.as_deref(), Some(PLACEHOLDER_PNG_BASE64));
    assert_eq!(node.spec_json, Some(json!({})));

    let spec = server
        .post("/api/v1/text-gen/text-to-image")
        .json(&ToSpecRequest {
            prompt: "a wooden cube".to_string(),
            image_base64: None,
        })
        .await
        .json::<ToSpecResponse>();
    assert!(spec.attributes.is_empty());
    assert_eq!(spec.structured_prompt, "A high-resolution render of a PC case.");
}

#[tokio::test]
async fn test_api_to_spec() {
    let server = setup_test_server().await;
    let res = server
        .post("/api/v1/text-gen/text-to-image")
        .json(&ToSpecRequest {
            prompt: "A minimalist aluminum slim case with mesh front".to_string(),
            image_base64: None,
        })
        .await;
    res.assert_status_ok();
    let spec = res.json::<ToSpecResponse>();
    assert_eq!(spec.prompt, "A minimalist aluminum slim case with mesh front");
    assert_eq!(spec.attributes.shape, Some(vec!["Slim".to_string()]));
    assert_eq!(
        spec.structured_prompt,
        "A high-resolution render of a Slim PC case with a Minimalist aesthetic; \
         made of Aluminum; featuring Mesh."
    );
}

#[tokio::test]
async fn test_api_openapi_document() {
    let server = setup_test_server().await;
    let res = server.get("/api/v1/openapi.json").await;
    res.assert_status_ok();
    let doc = res.json::<serde_json::Value>();
    assert!(doc["paths"]["/api/v1/node/{id}/lineage"].is_object());
}
