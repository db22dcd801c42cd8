#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use serde_json::{Value, json};

use common::{seed_admin, seed_user, setup};
use complaint_desk::models::password_reset_tokens;

fn token_from(url: &str) -> String {
    reqwest::Url::parse(url)
        .unwrap()
        .query_pairs()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
        .unwrap()
}

fn reset_body(email: &str, token: &str, password: &str, kind: &str) -> Value {
    json!({
        "email": email,
        "token": token,
        "password": password,
        "password_confirmation": password,
        "type": kind
    })
}

#[actix_web::test]
async fn reset_flow_for_a_user() {
    let env = setup().await;
    let app = spawn_app!(env);
    seed_user(&env.db, "jdoe", "jdoe@example.com", "oldpass1").await;

    let req = test::TestRequest::post()
        .uri("/api/password/forgot")
        .set_json(json!({ "email": "jdoe@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Password reset link has been sent to your email address.");

    let mail = env.mailer.last().unwrap();
    assert_eq!(mail.to, "jdoe@example.com");
    assert!(mail.url.starts_with("http://localhost:4200/reset-password?"));
    assert!(mail.url.ends_with("&type=user"));
    let token = token_from(&mail.url);
    assert_eq!(token.len(), 64);

    // stored hashed, never in clear
    let row = password_reset_tokens::Entity::find().one(&env.db).await.unwrap().unwrap();
    assert_ne!(row.token_hash, token);

    let req = test::TestRequest::post()
        .uri("/api/password/reset")
        .set_json(reset_body("jdoe@example.com", &token, "newpass1", "user"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["message"],
        "Password has been reset successfully. You can now login with your new password."
    );

    let login = |password: &str| {
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "username": "jdoe", "password": password }))
            .to_request()
    };
    assert_eq!(test::call_service(&app, login("newpass1")).await.status(), StatusCode::OK);
    assert_eq!(test::call_service(&app, login("oldpass1")).await.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // single use
    let req = test::TestRequest::post()
        .uri("/api/password/reset")
        .set_json(reset_body("jdoe@example.com", &token, "another1", "user"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["email"][0], "Invalid or expired reset token.");
}

#[actix_web::test]
async fn expired_token_is_rejected_and_removed() {
    let env = setup().await;
    let app = spawn_app!(env);
    seed_user(&env.db, "jdoe", "jdoe@example.com", "oldpass1").await;

    let req = test::TestRequest::post()
        .uri("/api/password/forgot/user")
        .set_json(json!({ "email": "jdoe@example.com" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    let token = token_from(&env.mailer.last().unwrap().url);

    let row = password_reset_tokens::Entity::find().one(&env.db).await.unwrap().unwrap();
    let mut stale: password_reset_tokens::ActiveModel = row.into();
    stale.created_at = Set(Utc::now() - Duration::minutes(61));
    stale.update(&env.db).await.unwrap();

    let req = test::TestRequest::post()
        .uri("/api/password/reset")
        .set_json(reset_body("jdoe@example.com", &token, "newpass1", "user"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["token"][0], "Reset token has expired. Please request a new one.");

    assert_eq!(password_reset_tokens::Entity::find().count(&env.db).await.unwrap(), 0);
}

#[actix_web::test]
async fn wrong_token_and_unknown_email() {
    let env = setup().await;
    let app = spawn_app!(env);
    seed_user(&env.db, "jdoe", "jdoe@example.com", "oldpass1").await;

    let req = test::TestRequest::post()
        .uri("/api/password/forgot")
        .set_json(json!({ "email": "jdoe@example.com" }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/password/reset")
        .set_json(reset_body("jdoe@example.com", "guessed-token", "newpass1", "user"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["token"][0], "Invalid reset token.");

    let req = test::TestRequest::post()
        .uri("/api/password/forgot")
        .set_json(json!({ "email": "nobody@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["email"][0], "We could not find an account with that email address.");

    let req = test::TestRequest::post()
        .uri("/api/password/forgot/admin")
        .set_json(json!({ "email": "jdoe@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["email"][0], "We could not find an admin with that email address.");
}

#[actix_web::test]
async fn forgot_prefers_users_and_replaces_old_tokens() {
    let env = setup().await;
    let app = spawn_app!(env);
    seed_user(&env.db, "shared", "shared@example.com", "userpass").await;
    seed_admin(&env.db, "shared", "shared@example.com", "adminpass").await;

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/password/forgot")
            .set_json(json!({ "email": "shared@example.com" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    assert_eq!(env.mailer.count(), 2);
    assert!(env.mailer.last().unwrap().url.ends_with("&type=user"));
    assert_eq!(password_reset_tokens::Entity::find().count(&env.db).await.unwrap(), 1);

    let req = test::TestRequest::post()
        .uri("/api/password/forgot/admin")
        .set_json(json!({ "email": "shared@example.com" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    let token = token_from(&env.mailer.last().unwrap().url);
    assert_eq!(password_reset_tokens::Entity::find().count(&env.db).await.unwrap(), 2);

    let req = test::TestRequest::post()
        .uri("/api/password/reset")
        .set_json(reset_body("shared@example.com", &token, "adminpass2", "admin"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/auth/admin/login")
        .set_json(json!({ "email": "shared@example.com", "password": "adminpass2" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // the user's password is untouched
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "shared@example.com", "password": "userpass" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn reset_requires_a_known_principal_type() {
    let env = setup().await;
    let app = spawn_app!(env);
    seed_user(&env.db, "jdoe", "jdoe@example.com", "oldpass1").await;

    let req = test::TestRequest::post()
        .uri("/api/password/reset")
        .set_json(reset_body("jdoe@example.com", "whatever", "newpass1", "guest"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["type"][0], "The selected type is invalid.");

    let req = test::TestRequest::post()
        .uri("/api/password/reset")
        .set_json(json!({ "email": "jdoe@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["token"].is_array());
}
