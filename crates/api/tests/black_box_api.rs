mod common;

use reqwest::StatusCode;
use serde_json::Value;

use common::{TestServer, admin_token, mint_jwt, user_token};

#[tokio::test]
async fn health_is_anonymous() {
    let server = TestServer::spawn().await;
    let res = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn index_bypasses_protected_group() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Welcome");
    assert!(body["signed_in_as"].is_null());

    let res = client
        .get(server.url("/"))
        .bearer_auth(user_token())
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["signed_in_as"], "user@aliencube.org");
}

#[tokio::test]
async fn whoami_requires_authentication() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()["www-authenticate"], "Bearer");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(body["message"], "Authorization has been denied for this request.");

    let res = client
        .get(server.url("/whoami"))
        .bearer_auth(user_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "user@aliencube.org");
    assert_eq!(body["roles"], serde_json::json!(["User"]));
    assert_eq!(body["authorization"]["operation"], "system.whoami");
    assert_eq!(body["authorization"]["outcome"], "accepted");
}

#[tokio::test]
async fn my_profile_is_admin_only() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/my-profile"))
        .bearer_auth(user_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(res.headers().get("www-authenticate").is_none());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");
    assert_eq!(body["message"], "This request has been forbidden.");

    let res = client
        .get(server.url("/my-profile"))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["email"], "test@aliencube.org");
}

#[tokio::test]
async fn ping_applies_group_and_operation_lists() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/api/ping/bob")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(server.url("/api/ping/bob"))
        .bearer_auth(user_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(server.url("/api/ping/bob"))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Hello, bob");
}

#[tokio::test]
async fn invalid_token_is_treated_as_anonymous() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let forged = mint_jwt("someone-else", "mallory", &["Admin"]);

    let res = client
        .get(server.url("/api/ping/bob"))
        .bearer_auth(&forged)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(server.url("/"))
        .bearer_auth(&forged)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn unbound_route_is_not_found() {
    let server = TestServer::spawn().await;
    let res = reqwest::get(server.url("/nope")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn explain_reports_the_failed_check() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/authz/explain/ping.get"))
        .bearer_auth(user_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["operation"], "ping.get");
    assert_eq!(body["group"], "ping");
    assert_eq!(body["bypass"], false);
    assert_eq!(body["result"]["outcome"], "denied");
    assert_eq!(body["result"]["denial"], "forbidden");

    // global, group, operation
    let explanations = body["explanations"].as_array().unwrap();
    assert_eq!(explanations.len(), 3);
    assert_eq!(explanations[0]["decision"], "accepted");
    assert_eq!(explanations[2]["decision"], "forbidden");
    assert_eq!(explanations[2]["failed_check"], "role_list");
    assert_eq!(explanations[2]["allowed_roles"], serde_json::json!(["Admin"]));

    let res = client
        .get(server.url("/authz/explain/home.index"))
        .bearer_auth(user_token())
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["bypass"], true);
    assert_eq!(body["result"]["outcome"], "bypassed");

    let res = client
        .get(server.url("/authz/explain/no.such.op"))
        .bearer_auth(user_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_routes_reject_plain_users() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .delete(server.url("/admin/cache"))
        .bearer_auth(user_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .delete(server.url("/admin/cache"))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
