mod common;

use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, web};

use common::{TestEnv, seed_admin, seed_user, setup};
use complaint_desk::client::poller::SessionSource;
use complaint_desk::client::{ApiClient, ClientError, ConversationPoller};
use complaint_desk::models::dto::{LoginRequest, NewComplaint, UpdateStatusRequest};
use complaint_desk::models::{ComplaintStatus, PrincipalKind, PrincipalRef, Priority};
use complaint_desk::routes;

/// Runs the API on an ephemeral port; returns its `/api` base URL.
fn serve(env: &TestEnv) -> (String, actix_web::dev::ServerHandle) {
    let db = web::Data::new(env.db.clone());
    let config = web::Data::new(env.config.clone());
    let store = web::Data::new(env.store.clone());
    let mailer = env.mailer_data();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(db.clone())
            .app_data(config.clone())
            .app_data(store.clone())
            .app_data(mailer.clone())
            .configure(routes::configure_app)
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();

    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    (format!("http://{}/api", addr), handle)
}

#[actix_web::test]
async fn client_drives_the_whole_workflow() {
    let env = setup().await;
    let jdoe = seed_user(&env.db, "jdoe", "jdoe@example.com", "secret12").await;
    let admin = seed_admin(&env.db, "boss", "boss@example.com", "Admin@123").await;
    let (base_url, server) = serve(&env);
    let client = ApiClient::new(base_url);

    // one login entry point for both kinds
    let user = client.login(&LoginRequest::with_username("jdoe", "secret12")).await.unwrap();
    assert_eq!(user.kind, PrincipalKind::User);
    assert_eq!(user.principal_ref(), PrincipalRef::user(jdoe.id));
    let boss = client.login(&LoginRequest::with_email("boss@example.com", "Admin@123")).await.unwrap();
    assert!(boss.is_admin());
    assert_eq!(boss.principal_ref(), PrincipalRef::admin(admin.id));
    match client.login(&LoginRequest::with_username("ghost", "nope")).await {
        Err(ClientError::LoginFailed { user, admin }) => {
            assert_eq!(user.status(), Some(422));
            assert_eq!(admin.status(), Some(422));
        }
        other => panic!("unexpected: {:?}", other.map(|s| s.token)),
    }

    assert_eq!(client.categories().await.unwrap().len(), 6);
    assert_eq!(client.available_admins().await.unwrap()[0].id, admin.id);

    let photo = env.storage_dir.path().join("upload-source.png");
    tokio::fs::write(&photo, b"not really a png").await.unwrap();
    let complaint = client
        .submit_complaint(
            &user,
            &NewComplaint {
                category_id: 2,
                subject: "Payroll error".to_string(),
                description: "March salary is short".to_string(),
                assigned_to: Some(admin.id),
                priority: Some(Priority::High),
                ..Default::default()
            },
            Some(&photo),
        )
        .await
        .unwrap();
    let id = complaint.complaint.id;
    assert_eq!(complaint.complaint.priority, Priority::High);

    let attachment = complaint.attachment.expect("attachment stored");
    let bytes = reqwest::get(client.attachment_url(&attachment.file_path))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"not really a png");

    // chat, observed through the poller
    let poller = ConversationPoller::start(
        Arc::new(SessionSource { client: client.clone(), session: user.clone() }),
        id,
        Duration::from_millis(100),
    );
    let mut updates = poller.subscribe();
    client.send_message(&boss, id, "Looking into it").await.unwrap();
    loop {
        updates.changed().await.unwrap();
        if !updates.borrow_and_update().is_empty() {
            break;
        }
    }
    poller.stop();

    assert_eq!(client.unread_count(&user, id).await.unwrap(), 1);
    let messages = client.messages(&user, id).await.unwrap();
    client.mark_read(&user, messages[0].id).await.unwrap();
    assert_eq!(client.unread_count(&user, id).await.unwrap(), 0);

    let updated = client
        .update_status(
            &boss,
            id,
            &UpdateStatusRequest { status: ComplaintStatus::InProgress, comments: None, resolution_details: None },
        )
        .await
        .unwrap();
    assert_eq!(updated.updates.len(), 1);

    match client.delete_complaint(&user, id).await {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status, 403);
            assert!(message.contains("already In Progress"));
        }
        other => panic!("unexpected: {:?}", other),
    }

    let stats = client.statistics(&boss).await.unwrap();
    assert_eq!(stats.in_progress, 1);

    let kept = user.clone();
    client.logout(user).await.unwrap();
    match client.my_complaints(&kept).await {
        Err(ClientError::Api { status, .. }) => assert_eq!(status, 401),
        other => panic!("unexpected: {:?}", other.map(|list| list.len())),
    }

    server.stop(true).await;
}
