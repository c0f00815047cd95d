use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, MethodResponse, Value, PASSWORD, USERNAME};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn rpc_request(uri: &str, body: serde_json::Value) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::HOST, "blog.test")
        .body(body.to_string())
        .unwrap()
}

fn creds() -> [serde_json::Value; 2] {
    [
        serde_json::json!({ "string": USERNAME }),
        serde_json::json!({ "string": PASSWORD }),
    ]
}

async fn call(uri: &str, method: &str, params: Vec<serde_json::Value>) -> MethodResponse {
    let resp = app()
        .oneshot(rpc_request(
            uri,
            serde_json::json!({ "methodName": method, "params": params }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

fn expect_params(response: MethodResponse) -> Value {
    match response {
        MethodResponse::Params(value) => value,
        MethodResponse::Fault(fault) => panic!("unexpected fault: {fault:?}"),
    }
}

// --- discovery ---

#[tokio::test]
async fn supported_methods_lists_sixteen() {
    let value = expect_params(call("/xmlrpc.php", "mt.supportedMethods", vec![]).await);
    let Value::Array(methods) = value else {
        panic!("expected array");
    };
    assert_eq!(methods.len(), 16);
    assert!(methods.contains(&Value::String("wp.getUsersBlogs".to_string())));
}

#[tokio::test]
async fn users_blogs_report_endpoints_from_host() {
    let [user, pass] = creds();
    let value = expect_params(call("/xmlrpc.php", "wp.getUsersBlogs", vec![user, pass]).await);
    let Value::Array(blogs) = value else {
        panic!("expected array");
    };
    assert_eq!(blogs.len(), 2);
    let Value::Struct(second) = &blogs[1] else {
        panic!("expected struct");
    };
    assert_eq!(
        second["xmlrpc"],
        Value::String("http://blog.test/blog2/xmlrpc.php".to_string())
    );
}

// --- faults ---

#[tokio::test]
async fn bad_credentials_fault_403() {
    let response = call(
        "/xmlrpc.php",
        "wp.getUsersBlogs",
        vec![
            serde_json::json!({ "string": USERNAME }),
            serde_json::json!({ "string": "wrong" }),
        ],
    )
    .await;
    let MethodResponse::Fault(fault) = response else {
        panic!("expected fault");
    };
    assert_eq!(fault.fault_code, 403);
    assert_eq!(fault.fault_string, "Incorrect username or password.");
}

#[tokio::test]
async fn unknown_post_faults_404() {
    let [user, pass] = creds();
    let response = call(
        "/xmlrpc.php",
        "metaWeblog.getPost",
        vec![serde_json::json!({ "string": "99" }), user, pass],
    )
    .await;
    let MethodResponse::Fault(fault) = response else {
        panic!("expected fault");
    };
    assert_eq!(fault.fault_code, 404);
}

#[tokio::test]
async fn unknown_method_faults() {
    let response = call("/xmlrpc.php", "wp.deleteEverything", vec![]).await;
    let MethodResponse::Fault(fault) = response else {
        panic!("expected fault");
    };
    assert_eq!(fault.fault_code, -32601);
}

#[tokio::test]
async fn malformed_envelope_returns_422() {
    let resp = app()
        .oneshot(rpc_request("/xmlrpc.php", serde_json::json!({ "params": [] })))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn missing_content_type_returns_415() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/xmlrpc.php")
                .body(r#"{"methodName":"mt.supportedMethods"}"#.to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = body_bytes(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("application/json"));
}

#[tokio::test]
async fn get_is_not_allowed() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/xmlrpc.php")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// --- per-blog data ---

#[tokio::test]
async fn categories_are_per_blog() {
    let [user, pass] = creds();
    let main = expect_params(
        call(
            "/xmlrpc.php",
            "wp.getCategories",
            vec![serde_json::json!({ "int": 0 }), user.clone(), pass.clone()],
        )
        .await,
    );
    let second = expect_params(
        call(
            "/blog2/xmlrpc.php",
            "wp.getCategories",
            vec![serde_json::json!({ "string": "2" }), user, pass],
        )
        .await,
    );

    let (Value::Array(main), Value::Array(second)) = (main, second) else {
        panic!("expected arrays");
    };
    assert_eq!(main.len(), 3);
    assert_eq!(second.len(), 1);
}

// --- post lifecycle ---

#[tokio::test]
async fn post_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();
    let [user, pass] = creds();

    let send = |method: &str, params: Vec<serde_json::Value>| {
        rpc_request(
            "/xmlrpc.php",
            serde_json::json!({ "methodName": method, "params": params }),
        )
    };

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(send(
            "metaWeblog.newPost",
            vec![
                serde_json::json!({ "int": 0 }),
                user.clone(),
                pass.clone(),
                serde_json::json!({ "struct": {
                    "title": { "string": "Walk dog" },
                    "mt_keywords": { "array": [{ "string": "pets" }] }
                }}),
                serde_json::json!({ "boolean": false }),
            ],
        ))
        .await
        .unwrap();
    let id = expect_params(body_json(resp).await);
    assert_eq!(id, Value::String("1".to_string()));

    // read back
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(send(
            "metaWeblog.getPost",
            vec![serde_json::json!({ "string": "1" }), user.clone(), pass.clone()],
        ))
        .await
        .unwrap();
    let Value::Struct(post) = expect_params(body_json(resp).await) else {
        panic!("expected struct");
    };
    assert_eq!(post["title"], Value::String("Walk dog".to_string()));
    assert_eq!(post["mt_keywords"], Value::String("pets".to_string()));
    assert_eq!(post["post_status"], Value::String("draft".to_string()));

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(send(
            "blogger.deletePost",
            vec![
                serde_json::json!({ "string": "" }),
                serde_json::json!({ "int": 1 }),
                user.clone(),
                pass.clone(),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(expect_params(body_json(resp).await), Value::Bool(true));

    // gone
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(send(
            "metaWeblog.getPost",
            vec![serde_json::json!({ "string": "1" }), user, pass],
        ))
        .await
        .unwrap();
    let response: MethodResponse = body_json(resp).await;
    assert!(matches!(response, MethodResponse::Fault(f) if f.fault_code == 404));
}
