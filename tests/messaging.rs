#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{Value, json};

use common::{bearer, file_complaint, seed_admin, seed_user, setup};
use complaint_desk::errors::ApiError;
use complaint_desk::models::PrincipalRef;
use complaint_desk::models::dto::SendMessageRequest;
use complaint_desk::services::MessageService;

#[actix_web::test]
async fn owner_and_assigned_admin_can_talk() {
    let env = setup().await;
    let app = spawn_app!(env);
    let user = seed_user(&env.db, "jdoe", "jdoe@example.com", "secret12").await;
    let admin = seed_admin(&env.db, "boss", "boss@example.com", "Admin@123").await;
    let complaint = file_complaint(&env, user.id, Some(admin.id)).await;
    let user_token = env.token_for(PrincipalRef::user(user.id)).await;
    let admin_token = env.token_for(PrincipalRef::admin(admin.id)).await;
    let uri = format!("/api/complaints/{}/messages", complaint.complaint.id);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&user_token))
        .set_json(json!({ "message": "Any update?" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let sent: Value = test::read_body_json(resp).await;
    assert_eq!(sent["sender_type"], "user");
    assert_eq!(sent["sender"]["email"], "jdoe@example.com");
    assert_eq!(sent["is_read"], false);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&admin_token))
        .set_json(json!({ "message": "Technician booked for Monday" }))
        .to_request();
    let sent: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(sent["sender_type"], "admin");
    assert_eq!(sent["sender"]["role"], "admin");
    assert!(sent["sender"].get("email").is_none());

    let req = test::TestRequest::get().uri(&uri).insert_header(bearer(&user_token)).to_request();
    let messages: Value = test::call_and_read_body_json(&app, req).await;
    let texts: Vec<&str> = messages.as_array().unwrap().iter().map(|m| m["message"].as_str().unwrap()).collect();
    assert_eq!(texts, vec!["Any update?", "Technician booked for Monday"]);
}

#[actix_web::test]
async fn outsiders_are_refused() {
    let env = setup().await;
    let app = spawn_app!(env);
    let owner = seed_user(&env.db, "owner", "owner@example.com", "secret12").await;
    let stranger = seed_user(&env.db, "stranger", "stranger@example.com", "secret12").await;
    let assigned = seed_admin(&env.db, "assigned", "assigned@example.com", "Admin@123").await;
    let bystander = seed_admin(&env.db, "bystander", "bystander@example.com", "Admin@123").await;
    let complaint = file_complaint(&env, owner.id, Some(assigned.id)).await;
    let id = complaint.complaint.id;

    let message = MessageService::send(
        &env.db,
        id,
        PrincipalRef::user(owner.id),
        SendMessageRequest { message: "hello".to_string() },
    )
    .await
    .unwrap();

    for token in [
        env.token_for(PrincipalRef::user(stranger.id)).await,
        env.token_for(PrincipalRef::admin(bystander.id)).await,
    ] {
        let requests = vec![
            test::TestRequest::get().uri(&format!("/api/complaints/{}/messages", id)),
            test::TestRequest::post()
                .uri(&format!("/api/complaints/{}/messages", id))
                .set_json(json!({ "message": "let me in" })),
            test::TestRequest::get().uri(&format!("/api/complaints/{}/messages/unread-count", id)),
            test::TestRequest::put().uri(&format!("/api/messages/{}/read", message.id)),
        ];

        for request in requests {
            let resp = test::call_service(&app, request.insert_header(bearer(&token)).to_request()).await;
            assert_eq!(resp.status(), StatusCode::FORBIDDEN);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], "Unauthorized");
        }
    }

    let token = env.token_for(PrincipalRef::user(owner.id)).await;
    let req = test::TestRequest::get()
        .uri("/api/complaints/9999/messages")
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::put().uri("/api/messages/9999/read").insert_header(bearer(&token)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn unassigned_complaint_has_no_admin_side() {
    let env = setup().await;
    let user = seed_user(&env.db, "jdoe", "jdoe@example.com", "secret12").await;
    let admin = seed_admin(&env.db, "boss", "boss@example.com", "Admin@123").await;
    let complaint = file_complaint(&env, user.id, None).await;

    let result = MessageService::list(&env.db, complaint.complaint.id, PrincipalRef::admin(admin.id)).await;
    assert!(matches!(result, Err(ApiError::Forbidden(_))));
}

#[actix_web::test]
async fn own_messages_cannot_be_marked_read() {
    let env = setup().await;
    let app = spawn_app!(env);
    let user = seed_user(&env.db, "jdoe", "jdoe@example.com", "secret12").await;
    let admin = seed_admin(&env.db, "boss", "boss@example.com", "Admin@123").await;
    let complaint = file_complaint(&env, user.id, Some(admin.id)).await;
    let token = env.token_for(PrincipalRef::user(user.id)).await;

    let own = MessageService::send(
        &env.db,
        complaint.complaint.id,
        PrincipalRef::user(user.id),
        SendMessageRequest { message: "mine".to_string() },
    )
    .await
    .unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/messages/{}/read", own.id))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Cannot mark own message as read");
}

#[actix_web::test]
async fn unread_count_drops_one_per_confirmation() {
    let env = setup().await;
    let app = spawn_app!(env);
    let user = seed_user(&env.db, "jdoe", "jdoe@example.com", "secret12").await;
    let admin = seed_admin(&env.db, "boss", "boss@example.com", "Admin@123").await;
    let complaint = file_complaint(&env, user.id, Some(admin.id)).await;
    let id = complaint.complaint.id;
    let user_token = env.token_for(PrincipalRef::user(user.id)).await;
    let admin_token = env.token_for(PrincipalRef::admin(admin.id)).await;

    let mut admin_messages = Vec::new();
    for text in ["first", "second", "third"] {
        let message = MessageService::send(
            &env.db,
            id,
            PrincipalRef::admin(admin.id),
            SendMessageRequest { message: text.to_string() },
        )
        .await
        .unwrap();
        admin_messages.push(message.id);
    }
    // the user's own message never counts for the user
    MessageService::send(&env.db, id, PrincipalRef::user(user.id), SendMessageRequest { message: "ok".to_string() })
        .await
        .unwrap();

    let unread = |token: &str| {
        test::TestRequest::get()
            .uri(&format!("/api/complaints/{}/messages/unread-count", id))
            .insert_header(bearer(token))
            .to_request()
    };

    let body: Value = test::call_and_read_body_json(&app, unread(&user_token)).await;
    assert_eq!(body["unread_count"], 3);
    let body: Value = test::call_and_read_body_json(&app, unread(&admin_token)).await;
    assert_eq!(body["unread_count"], 1);

    for (done, message_id) in admin_messages.iter().enumerate() {
        let req = test::TestRequest::put()
            .uri(&format!("/api/messages/{}/read", message_id))
            .insert_header(bearer(&user_token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Message marked as read");

        let body: Value = test::call_and_read_body_json(&app, unread(&user_token)).await;
        assert_eq!(body["unread_count"], (2 - done) as u64);
    }
}

#[actix_web::test]
async fn message_body_is_validated() {
    let env = setup().await;
    let user = seed_user(&env.db, "jdoe", "jdoe@example.com", "secret12").await;
    let complaint = file_complaint(&env, user.id, None).await;
    let owner = PrincipalRef::user(user.id);

    let too_long = "x".repeat(5001);
    for body in ["", "   ", too_long.as_str()] {
        let result = MessageService::send(
            &env.db,
            complaint.complaint.id,
            owner,
            SendMessageRequest { message: body.to_string() },
        )
        .await;
        assert!(matches!(result, Err(ApiError::Validation(_))), "accepted {:?}", body.len());
    }
}

#[actix_web::test]
async fn missing_message_field_is_a_validation_error() {
    let env = setup().await;
    let app = spawn_app!(env);
    let user = seed_user(&env.db, "jdoe", "jdoe@example.com", "secret12").await;
    let complaint = file_complaint(&env, user.id, None).await;
    let token = env.token_for(PrincipalRef::user(user.id)).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/complaints/{}/messages", complaint.complaint.id))
        .insert_header(bearer(&token))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["message"].is_array());
}
